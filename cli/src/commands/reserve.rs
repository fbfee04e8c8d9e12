//! Reserve command - hold ports open until interrupted.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use super::{load_config, manager};

pub async fn run(port: u16, count: usize, host: Option<String>, json: bool) -> Result<ExitCode> {
    let config = load_config().await?;
    let host = host.unwrap_or(config.host.clone());

    let reservation = manager(&config).reserve_port(&host, port, count)?;

    if json {
        let report = json!({
            "id": reservation.id(),
            "host": reservation.host(),
            "ports": reservation.ports(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let ports: Vec<String> = reservation.ports().iter().map(u16::to_string).collect();
        println!("Reserved {} on {}", ports.join(", "), reservation.host());
        println!("Press Ctrl+C to release.");
    }

    tokio::signal::ctrl_c().await?;
    reservation.release();

    if !json {
        println!("Released.");
    }
    Ok(ExitCode::SUCCESS)
}
