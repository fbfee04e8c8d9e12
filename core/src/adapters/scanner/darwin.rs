//! macOS process lookup using lsof and ps.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::process::Stdio;

use tokio::process::Command;

use crate::domain::ProcessInfo;
use crate::error::{Error, Result};

use super::utils::{parse_address, truncate_command};
use super::Scanner;

/// macOS-specific socket table scanner.
pub struct DarwinScanner;

impl DarwinScanner {
    pub fn new() -> Self {
        Self
    }

    /// Full command line for every process, keyed by PID.
    async fn get_process_commands(&self) -> HashMap<u32, String> {
        let output = match Command::new("/bin/ps")
            .args(["-axo", "pid,command"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(_) => return HashMap::new(),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut commands = HashMap::new();

        for line in stdout.lines().skip(1) {
            let mut parts = line.trim().splitn(2, char::is_whitespace);
            let (Some(pid_str), Some(command)) = (parts.next(), parts.next()) else {
                continue;
            };
            let pid: u32 = match pid_str.trim().parse() {
                Ok(p) => p,
                Err(_) => continue,
            };
            commands.insert(pid, truncate_command(command.trim()));
        }

        commands
    }

    /// Parse `lsof -iTCP -sTCP:LISTEN -P -n +c 0` output.
    fn parse_lsof_output(&self, output: &str, commands: &HashMap<u32, String>) -> Vec<ProcessInfo> {
        let mut processes = Vec::new();
        let mut seen: HashSet<(u16, u32)> = HashSet::new();

        for line in output.lines().skip(1) {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 9 {
                continue;
            }

            let name = components[0].replace("\\x20", " ").replace("\\x2f", "/");

            let pid: u32 = match components[1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };
            let user = components[2].to_string();

            let Some(address_part) = components[8..]
                .iter()
                .rev()
                .find(|c| c.contains(':') && !c.starts_with("0x") && !c.starts_with("0t"))
            else {
                continue;
            };

            let Some((address, port)) = parse_address(address_part) else {
                continue;
            };

            if !seen.insert((port, pid)) {
                continue;
            }

            let command = commands.get(&pid).cloned().unwrap_or_else(|| name.clone());
            processes.push(ProcessInfo::new(pid, name, port, address).with_details(user, command));
        }

        processes.sort_by_key(|p| (p.port, p.pid));
        processes
    }
}

impl Default for DarwinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for DarwinScanner {
    async fn scan(&self) -> Result<Vec<ProcessInfo>> {
        let output = Command::new("/usr/sbin/lsof")
            .args(["-iTCP", "-sTCP:LISTEN", "-P", "-n", "+c", "0"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    Error::ProcessEnumerationUnavailable(format!("lsof not usable: {}", e))
                }
                _ => Error::CommandFailed(format!("Failed to run lsof: {}", e)),
            })?;

        // lsof exits 1 with empty output when nothing is listening
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        let commands = self.get_process_commands().await;
        Ok(self.parse_lsof_output(&stdout, &commands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsof_output() {
        let scanner = DarwinScanner::new();
        let mut commands = HashMap::new();
        commands.insert(34805, "node server.js".to_string());

        let output = r#"COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
nginx        1  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:80 (LISTEN)
"#;

        let processes = scanner.parse_lsof_output(output, &commands);
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].port, 80);
        assert_eq!(processes[0].command, "nginx");
        assert_eq!(processes[1].port, 3000);
        assert_eq!(processes[1].address, "[::1]");
        assert_eq!(processes[1].command, "node server.js");
    }
}
