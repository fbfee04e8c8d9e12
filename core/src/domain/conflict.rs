//! Port conflict report.

use serde::{Deserialize, Serialize};

use super::ProcessInfo;

/// A desired port that turned out to be taken, and who holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConflict {
    pub host: String,
    pub desired_port: u16,
    pub service_name: String,
    pub processes: Vec<ProcessInfo>,
}

impl PortConflict {
    pub fn new(
        host: impl Into<String>,
        desired_port: u16,
        service_name: impl Into<String>,
        processes: Vec<ProcessInfo>,
    ) -> Self {
        Self {
            host: host.into(),
            desired_port,
            service_name: service_name.into(),
            processes,
        }
    }

    /// Comma-separated list of holders, or a placeholder when none were found.
    pub fn holders(&self) -> String {
        if self.processes.is_empty() {
            return "unknown process".to_string();
        }
        self.processes
            .iter()
            .map(|p| format!("{} [{}]", p, p.process_type()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for PortConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Port {} for {} on {} is in use by {}",
            self.desired_port,
            self.service_name,
            self.host,
            self.holders()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_processes() {
        let conflict = PortConflict::new(
            "0.0.0.0",
            8000,
            "svc",
            vec![ProcessInfo::new(77, "nginx", 8000, "*")],
        );
        assert_eq!(
            conflict.to_string(),
            "Port 8000 for svc on 0.0.0.0 is in use by nginx (PID: 77) [Web Server]"
        );
    }

    #[test]
    fn test_display_without_processes() {
        let conflict = PortConflict::new("127.0.0.1", 5000, "api", Vec::new());
        assert!(conflict.to_string().ends_with("unknown process"));
    }
}
