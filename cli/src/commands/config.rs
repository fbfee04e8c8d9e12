//! Config command - show or change `~/.portguard/config.json`.

use std::process::ExitCode;

use anyhow::Result;
use portguard_core::ConfigStore;

pub async fn show(json: bool) -> Result<ExitCode> {
    let store = ConfigStore::new()?;
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Config file:  {}", store.path().display());
    println!("Host:         {}", config.host);
    println!("Max attempts: {}", config.max_attempts);
    if config.services.is_empty() {
        println!("Services:     (none)");
    } else {
        println!("Services:");
        for (name, port) in &config.services {
            println!("  {:<20} {}", name, port);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn set_service(name: &str, port: u16) -> Result<ExitCode> {
    ConfigStore::new()?.set_service_port(name, port).await?;
    println!("{} -> {}", name, port);
    Ok(ExitCode::SUCCESS)
}

pub async fn remove_service(name: &str) -> Result<ExitCode> {
    ConfigStore::new()?.remove_service_port(name).await?;
    println!("Removed {}", name);
    Ok(ExitCode::SUCCESS)
}

pub async fn set_host(host: &str) -> Result<ExitCode> {
    ConfigStore::new()?.set_host(host).await?;
    println!("Host set to {}", host);
    Ok(ExitCode::SUCCESS)
}

pub async fn set_max_attempts(max_attempts: u16) -> Result<ExitCode> {
    ConfigStore::new()?.set_max_attempts(max_attempts).await?;
    println!("Max attempts set to {}", max_attempts);
    Ok(ExitCode::SUCCESS)
}
