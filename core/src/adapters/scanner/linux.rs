//! Linux process lookup using ss and ps.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;

use crate::domain::ProcessInfo;
use crate::error::{Error, Result};

use super::utils::{parse_address, truncate_command};
use super::Scanner;

/// Linux-specific socket table scanner.
pub struct LinuxScanner;

struct LinuxProcessInfo {
    user: String,
    command: String,
}

impl LinuxScanner {
    pub fn new() -> Self {
        Self
    }

    /// Owner and full command line for every process, keyed by PID.
    ///
    /// Executes: `ps -axo pid,user,command --no-headers`
    async fn get_process_infos(&self) -> HashMap<u32, LinuxProcessInfo> {
        let output = match Command::new("ps")
            .args(["-axo", "pid,user,command", "--no-headers"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(_) => return HashMap::new(),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut infos = HashMap::new();
        for line in stdout.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                continue;
            }

            let pid: u32 = match parts[0].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            infos.insert(
                pid,
                LinuxProcessInfo {
                    user: parts[1].to_string(),
                    command: truncate_command(&parts[2..].join(" ")),
                },
            );
        }

        infos
    }

    /// Parse `ss -Htlnp` output.
    ///
    /// ```text
    /// LISTEN 0 4096 [::ffff:127.0.0.1]:63342 *:* users:(("rustrover",pid=53561,fd=54))
    /// LISTEN 0 511  0.0.0.0:8000 0.0.0.0:* users:(("uvicorn",pid=10,fd=3),("uvicorn",pid=11,fd=3))
    /// ```
    ///
    /// Sockets owned by other users have no `users:` column unless ss runs as
    /// root; those lines are skipped.
    fn parse_ss_output(
        &self,
        output: &str,
        process_infos: &HashMap<u32, LinuxProcessInfo>,
    ) -> Result<Vec<ProcessInfo>> {
        let regex = Regex::new(r#"\("([^"]+)",pid=(\d+),fd=(\d+)\)"#)
            .map_err(|e| Error::ParseError(e.to_string()))?;

        let mut processes = Vec::new();
        let mut seen: HashSet<(u16, u32)> = HashSet::new();

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let Some((address, port)) = parse_address(components[3]) else {
                continue;
            };

            let users = components[5..].join(" ");
            for caps in regex.captures_iter(&users) {
                let pid: u32 = match caps[2].parse() {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                // Dual-stack sockets show up once per family
                if !seen.insert((port, pid)) {
                    continue;
                }

                let name = caps[1].to_string();
                let mut process = ProcessInfo::new(pid, name.clone(), port, address.clone());
                if let Some(info) = process_infos.get(&pid) {
                    process = process.with_details(info.user.clone(), info.command.clone());
                } else {
                    process.command = name;
                }
                processes.push(process);
            }
        }

        processes.sort_by_key(|p| (p.port, p.pid));
        Ok(processes)
    }
}

impl Default for LinuxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for LinuxScanner {
    /// Executes: `ss -Htlnp`
    ///
    /// -H no header, -t TCP, -l listening, -n numeric, -p owning process.
    async fn scan(&self) -> Result<Vec<ProcessInfo>> {
        let output = Command::new("ss")
            .args(["-Htlnp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    Error::ProcessEnumerationUnavailable(format!("ss not usable: {}", e))
                }
                _ => Error::CommandFailed(format!("Failed to run ss: {}", e)),
            })?;

        if !output.status.success() {
            return Err(Error::ProcessEnumerationUnavailable(format!(
                "ss exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ss output: {}", e)))?;

        let process_infos = self.get_process_infos().await;
        self.parse_ss_output(&stdout, &process_infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos() -> HashMap<u32, LinuxProcessInfo> {
        let mut infos = HashMap::new();
        infos.insert(
            55316,
            LinuxProcessInfo {
                user: "root".to_string(),
                command: "nginx: master process".to_string(),
            },
        );
        infos.insert(
            53561,
            LinuxProcessInfo {
                user: "dev".to_string(),
                command: "node server.js".to_string(),
            },
        );
        infos
    }

    #[test]
    fn test_parse_ss_output() {
        let scanner = LinuxScanner::new();
        let output = r#"LISTEN 0 4096 [::ffff:127.0.0.1]:3000 *:* users:(("node",pid=53561,fd=187))
LISTEN 0 511 0.0.0.0:80 0.0.0.0:* users:(("nginx",pid=55316,fd=6))"#;

        let processes = scanner.parse_ss_output(output, &infos()).unwrap();
        assert_eq!(processes.len(), 2);

        assert_eq!(processes[0].port, 80);
        assert_eq!(processes[0].name, "nginx");
        assert_eq!(processes[0].address, "*");
        assert_eq!(processes[0].user, "root");

        assert_eq!(processes[1].port, 3000);
        assert_eq!(processes[1].command, "node server.js");
    }

    #[test]
    fn test_multiple_owners_and_deduplication() {
        let scanner = LinuxScanner::new();
        let output = r#"LISTEN 0 511 0.0.0.0:8000 0.0.0.0:* users:(("uvicorn",pid=10,fd=3),("uvicorn",pid=11,fd=3))
LISTEN 0 511 [::]:8000 [::]:* users:(("uvicorn",pid=10,fd=4))"#;

        let processes = scanner.parse_ss_output(output, &HashMap::new()).unwrap();
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].pid, 10);
        assert_eq!(processes[1].pid, 11);
        assert_eq!(processes[0].command, "uvicorn");
    }

    #[test]
    fn test_lines_without_owner_are_skipped() {
        let scanner = LinuxScanner::new();
        let output = "LISTEN 0 128 127.0.0.1:5432 0.0.0.0:*";
        assert!(scanner
            .parse_ss_output(output, &HashMap::new())
            .unwrap()
            .is_empty());
    }
}
