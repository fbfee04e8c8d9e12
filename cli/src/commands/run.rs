//! Run command - launch an external server on a resolved port.

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use portguard_core::CommandLauncher;

use super::{load_config, manager};

pub async fn run(
    port: Option<u16>,
    host: Option<String>,
    name: Option<String>,
    command: Vec<String>,
) -> Result<ExitCode> {
    let config = load_config().await?;
    let launcher = CommandLauncher::new(command)?;
    let host = host.unwrap_or(config.host.clone());
    let name = name.unwrap_or_else(|| launcher.program().to_string());

    let port = match port.or_else(|| config.services.get(&name).copied()) {
        Some(port) => port,
        None => {
            return Err(anyhow!(
                "No port given and none configured for {}; pass --port or run \
                 `portguard config set-service {} <port>`",
                name,
                name
            ))
        }
    };

    let status = manager(&config)
        .run_command_with_port_handling(&launcher, &host, port, &name)
        .await?;

    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}
