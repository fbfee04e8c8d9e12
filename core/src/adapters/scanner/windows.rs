//! Windows process lookup using netstat and tasklist.

use std::collections::{HashMap, HashSet};
use std::process::Stdio;

use tokio::process::Command;

use crate::domain::ProcessInfo;
use crate::error::{Error, Result};

use super::utils::parse_address;
use super::Scanner;

/// Windows-specific socket table scanner.
pub struct WindowsScanner;

impl WindowsScanner {
    pub fn new() -> Self {
        Self
    }

    /// Parse `netstat -ano -p TCP` into (port, pid, address) triples.
    ///
    /// ```text
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
    ///   TCP    [::]:445               [::]:0                 LISTENING       4
    /// ```
    fn parse_netstat_output(output: &str) -> Vec<(u16, u32, String)> {
        let mut results = Vec::new();
        let mut seen: HashSet<(u16, u32)> = HashSet::new();

        for line in output.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            // The state column is translated on localized installs; a
            // listening socket always has foreign port 0.
            if parts.len() < 5 || parts[0] != "TCP" || !parts[2].ends_with(":0") {
                continue;
            }

            let Some((address, port)) = parse_address(parts[1]) else {
                continue;
            };
            let pid: u32 = match parts[4].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            if seen.insert((port, pid)) {
                results.push((port, pid, address));
            }
        }

        results
    }

    /// Parse `tasklist /FO CSV /NH` into a PID -> image name map.
    ///
    /// ```text
    /// "node.exe","1234","Console","1","25,000 K"
    /// ```
    fn parse_tasklist_output(output: &str) -> HashMap<u32, String> {
        let mut names = HashMap::new();
        for line in output.lines() {
            let fields: Vec<&str> = line.split("\",\"").map(|f| f.trim_matches('"')).collect();
            if fields.len() < 2 {
                continue;
            }
            if let Ok(pid) = fields[1].parse::<u32>() {
                names.insert(pid, fields[0].to_string());
            }
        }
        names
    }

    async fn run(program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::ProcessEnumerationUnavailable(format!("{} not usable: {}", program, e))
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "{} exited with {}",
                program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for WindowsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for WindowsScanner {
    async fn scan(&self) -> Result<Vec<ProcessInfo>> {
        let netstat = Self::run("netstat", &["-ano", "-p", "TCP"]).await?;
        let listening = Self::parse_netstat_output(&netstat);

        // Names are best effort; netstat alone already identifies the holder.
        let names = match Self::run("tasklist", &["/FO", "CSV", "/NH"]).await {
            Ok(out) => Self::parse_tasklist_output(&out),
            Err(_) => HashMap::new(),
        };

        let mut processes: Vec<ProcessInfo> = listening
            .into_iter()
            .map(|(port, pid, address)| {
                let name = names
                    .get(&pid)
                    .cloned()
                    .unwrap_or_else(|| format!("PID {}", pid));
                ProcessInfo::new(pid, name.clone(), port, address).with_details("", name)
            })
            .collect();

        processes.sort_by_key(|p| (p.port, p.pid));
        Ok(processes)
    }
}
