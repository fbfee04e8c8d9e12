//! External dev-server launcher.
//!
//! Runs a command such as `uvicorn app:app --port {port}` on a resolved port.
//! Arguments are forwarded unchanged apart from `{port}` and `{host}`
//! placeholders, and `PORT`/`HOST` are set in the child's environment.
//!
//! On Ctrl-C the child is asked to stop (SIGTERM on Unix), given a short
//! grace period, then killed.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Grace period between the terminate request and a forced kill.
const GRACEFUL_STOP_TIMEOUT_MS: u64 = 500;

/// A command line to run once a port has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandLauncher {
    /// Build a launcher from a program followed by its arguments.
    pub fn new<I, S>(command: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = command.into_iter().map(Into::into);
        let program = parts
            .next()
            .filter(|p: &String| !p.trim().is_empty())
            .ok_or_else(|| Error::InvalidQuery("no command given".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            env: Vec::new(),
        })
    }

    /// Add an extra environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with `{port}` and `{host}` substituted.
    pub fn render_args(&self, host: &str, port: u16) -> Vec<String> {
        let port = port.to_string();
        self.args
            .iter()
            .map(|a| a.replace("{port}", &port).replace("{host}", host))
            .collect()
    }

    fn build(&self, host: &str, port: u16) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.render_args(host, port))
            .env("PORT", port.to_string())
            .env("HOST", host)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }

    /// Run the command until it exits or Ctrl-C is received.
    pub async fn launch(&self, host: &str, port: u16) -> Result<ExitStatus> {
        let mut child = self.build(host, port).spawn().map_err(|e| {
            Error::CommandFailed(format!("Failed to start {}: {}", self.program, e))
        })?;
        info!(program = %self.program, pid = ?child.id(), host, port, "Launched server command");

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = tokio::signal::ctrl_c() => {
                info!(program = %self.program, "Interrupted, stopping server command");
                stop_gracefully(&mut child).await
            }
        }
    }
}

/// Ask the child to terminate, then force kill after the grace period.
async fn stop_gracefully(child: &mut Child) -> Result<ExitStatus> {
    request_terminate(child);

    match timeout(Duration::from_millis(GRACEFUL_STOP_TIMEOUT_MS), child.wait()).await {
        Ok(status) => Ok(status?),
        Err(_) => {
            warn!(pid = ?child.id(), "Server command ignored terminate request, killing");
            child.kill().await?;
            Ok(child.wait().await?)
        }
    }
}

#[cfg(unix)]
fn request_terminate(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        debug!(pid, error = %e, "Failed to send SIGTERM");
    }
}

#[cfg(not(unix))]
fn request_terminate(_child: &Child) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandLauncher::new(Vec::<String>::new()).is_err());
        assert!(CommandLauncher::new([""]).is_err());
    }

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let launcher = CommandLauncher::new([
            "uvicorn",
            "app:app",
            "--host",
            "{host}",
            "--port",
            "{port}",
            "--reload",
        ])
        .unwrap();

        assert_eq!(launcher.program(), "uvicorn");
        assert_eq!(
            launcher.render_args("0.0.0.0", 8001),
            vec!["app:app", "--host", "0.0.0.0", "--port", "8001", "--reload"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_injects_port_env() {
        let launcher =
            CommandLauncher::new(["sh", "-c", "test \"$PORT\" = 8123 && test \"$1\" = 8123", "sh", "{port}"])
                .unwrap();
        let status = launcher.launch("127.0.0.1", 8123).await.unwrap();
        assert!(status.success());
    }
}
