//! List command - show all listening ports.

use std::process::ExitCode;

use anyhow::Result;
use portguard_core::{ProcessInfo, ProcessType};

use super::{load_config, manager};

pub async fn run(port_filter: Option<u16>, name_filter: Option<String>, json: bool) -> Result<ExitCode> {
    let config = load_config().await?;
    let mut processes = manager(&config).list_listening_ports().await?;

    if let Some(p) = port_filter {
        processes.retain(|process| process.port == p);
    }
    if let Some(ref name) = name_filter {
        let name_lower = name.to_lowercase();
        processes.retain(|process| process.name.to_lowercase().contains(&name_lower));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&processes)?);
        return Ok(ExitCode::SUCCESS);
    }

    if processes.is_empty() {
        println!("No listening ports found.");
        return Ok(ExitCode::SUCCESS);
    }

    print_table(&processes);
    println!("\nTotal: {} ports", processes.len());
    Ok(ExitCode::SUCCESS)
}

/// Print processes as a fixed-width table.
pub fn print_table(processes: &[ProcessInfo]) {
    println!(
        "{:<6} {:<8} {:<20} {:<15} {:<10} {:<5} COMMAND",
        "PORT", "PID", "PROCESS", "ADDRESS", "USER", "TYPE"
    );
    println!("{}", "-".repeat(80));

    for process in processes {
        println!(
            "{:<6} {:<8} {:<20} {:<15} {:<10} {:<5} {}",
            process.port,
            process.pid,
            truncate(&process.name, 20),
            truncate(&process.address, 15),
            truncate(&process.user, 10),
            type_label(process.process_type()),
            truncate(&process.command, 30)
        );
    }
}

fn type_label(process_type: ProcessType) -> &'static str {
    match process_type {
        ProcessType::WebServer => "Web",
        ProcessType::Database => "DB",
        ProcessType::Development => "Dev",
        ProcessType::System => "Sys",
        ProcessType::Other => "-",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("node", 20), "node");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_type_label() {
        let process = ProcessInfo::new(1, "postgres", 5432, "*");
        assert_eq!(type_label(process.process_type()), "DB");
    }
}
