//! Find command - print the first free port at or above a port.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use super::{load_config, manager};

pub async fn run(
    port: u16,
    host: Option<String>,
    max_attempts: Option<u16>,
    json: bool,
) -> Result<ExitCode> {
    let config = load_config().await?;
    let host = host.unwrap_or(config.host.clone());
    let max_attempts = max_attempts.unwrap_or(config.max_attempts);

    let found = manager(&config).find_available_port(&host, port, max_attempts)?;

    if json {
        let report = json!({ "host": host, "start": port, "port": found });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", found);
    }

    Ok(ExitCode::SUCCESS)
}
