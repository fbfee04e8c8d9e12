//! Resolve command - pick the desired port or the next free one.

use std::process::ExitCode;

use anyhow::Result;

use super::{load_config, manager};

pub async fn run(port: u16, host: Option<String>, name: &str, json: bool) -> Result<ExitCode> {
    let config = load_config().await?;
    let host = host.unwrap_or(config.host.clone());

    let resolution = manager(&config).resolve_port(&host, port, name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(ExitCode::SUCCESS);
    }

    // Only the port goes to stdout so `PORT=$(portguard resolve 8000)` works.
    if let Some(conflict) = &resolution.conflict {
        eprintln!("{}", conflict);
        eprintln!("Using port {} instead", resolution.port);
    }
    println!("{}", resolution.port);

    Ok(ExitCode::SUCCESS)
}
