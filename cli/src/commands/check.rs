//! Check command - probe a single port.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use super::{load_config, manager};

pub async fn run(port: u16, host: Option<String>, json: bool) -> Result<ExitCode> {
    let config = load_config().await?;
    let host = host.unwrap_or(config.host.clone());
    let manager = manager(&config);

    let available = manager.probe(&host, port)?;
    let processes = if available {
        Vec::new()
    } else {
        manager.get_processes_using_port(port).await
    };

    if json {
        let report = json!({
            "host": host,
            "port": port,
            "available": available,
            "processes": processes,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if available {
        println!("Port {} on {} is available", port, host);
    } else {
        println!("Port {} on {} is in use", port, host);
        for process in &processes {
            println!("  {} [{}]", process, process.process_type());
        }
    }

    Ok(if available {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
