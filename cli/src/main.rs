//! PortGuard CLI - Resolve port conflicts before starting dev servers
//!
//! A command-line tool for checking ports, finding who holds them,
//! picking free alternatives and launching servers on them.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portguard")]
#[command(author, version, about = "Resolve port conflicts before starting dev servers")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a port can be bound
    Check {
        port: u16,

        /// Host to probe (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Show processes listening on a port
    Who { port: u16 },

    /// Find the first free port at or above a port
    Find {
        port: u16,

        #[arg(long)]
        host: Option<String>,

        /// How many ports to try (defaults to the configured value)
        #[arg(short = 'n', long)]
        max_attempts: Option<u16>,
    },

    /// Resolve a desired port, falling back to the next free one
    Resolve {
        port: u16,

        #[arg(long)]
        host: Option<String>,

        /// Service name used in conflict reports
        #[arg(long, default_value = "service")]
        name: String,
    },

    /// Hold free ports until interrupted
    Reserve {
        port: u16,

        /// Number of ports to reserve
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        #[arg(long)]
        host: Option<String>,
    },

    /// Run a server command on a resolved port
    ///
    /// `{port}` and `{host}` in the command are replaced, and PORT/HOST are
    /// set in its environment.
    Run {
        /// Desired port (defaults to the configured port for --name)
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Service name (defaults to the program name)
        #[arg(long)]
        name: Option<String>,

        /// Command to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the preferred port for a service
    SetService { name: String, port: u16 },
    /// Forget the preferred port for a service
    #[command(alias = "rm")]
    RemoveService { name: String },
    /// Set the default host
    SetHost { host: String },
    /// Set how many ports a search tries
    SetMaxAttempts { max_attempts: u16 },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Check { port, host } => commands::check::run(port, host, cli.json).await?,
        Commands::Who { port } => commands::who::run(port, cli.json).await?,
        Commands::Find {
            port,
            host,
            max_attempts,
        } => commands::find::run(port, host, max_attempts, cli.json).await?,
        Commands::Resolve { port, host, name } => {
            commands::resolve::run(port, host, &name, cli.json).await?
        }
        Commands::Reserve { port, count, host } => {
            commands::reserve::run(port, count, host, cli.json).await?
        }
        Commands::Run {
            port,
            host,
            name,
            command,
        } => commands::run::run(port, host, name, command).await?,
        Commands::List { port, name } => commands::list::run(port, name, cli.json).await?,
        Commands::Config { action } => match action {
            None => commands::config::show(cli.json).await?,
            Some(ConfigAction::SetService { name, port }) => {
                commands::config::set_service(&name, port).await?
            }
            Some(ConfigAction::RemoveService { name }) => {
                commands::config::remove_service(&name).await?
            }
            Some(ConfigAction::SetHost { host }) => commands::config::set_host(&host).await?,
            Some(ConfigAction::SetMaxAttempts { max_attempts }) => {
                commands::config::set_max_attempts(max_attempts).await?
            }
        },
    };

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_forwards_trailing_command() {
        let cli = Cli::try_parse_from([
            "portguard", "run", "--port", "8000", "--", "uvicorn", "app:app", "--port", "{port}",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { port, command, .. } => {
                assert_eq!(port, Some(8000));
                assert_eq!(command, vec!["uvicorn", "app:app", "--port", "{port}"]);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_reserve_defaults_to_one_port() {
        let cli = Cli::try_parse_from(["portguard", "reserve", "9000", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Reserve { port, count, host } => {
                assert_eq!(port, 9000);
                assert_eq!(count, 1);
                assert!(host.is_none());
            }
            _ => panic!("expected reserve command"),
        }
    }
}
