//! Who command - show the processes holding a port.

use std::process::ExitCode;

use anyhow::Result;

use super::list::print_table;
use super::{load_config, manager};

pub async fn run(port: u16, json: bool) -> Result<ExitCode> {
    let config = load_config().await?;
    let mut processes = manager(&config).list_listening_ports().await?;
    processes.retain(|p| p.port == port);

    if json {
        println!("{}", serde_json::to_string_pretty(&processes)?);
    } else if processes.is_empty() {
        println!("No process is listening on port {}.", port);
    } else {
        print_table(&processes);
    }

    Ok(ExitCode::SUCCESS)
}
