//! Process domain models.

use serde::{Deserialize, Serialize};

// ============================================================================
// ProcessType
// ============================================================================

/// Category of process based on its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProcessType {
    /// Web servers (nginx, apache, caddy, etc.)
    WebServer,
    /// Database servers (postgres, mysql, redis, etc.)
    Database,
    /// Development tools (node, python, vite, etc.)
    Development,
    /// System processes (launchd, kernel services, etc.)
    System,
    /// Other/unknown processes
    #[default]
    Other,
}

impl ProcessType {
    /// Detect the process type from a process name and its command line.
    pub fn detect(process_name: &str, command: &str) -> Self {
        let name = process_name.to_lowercase();
        let command = command.to_lowercase();
        let matches = |patterns: &[&str]| {
            patterns
                .iter()
                .any(|p| name.contains(p) || command.contains(p))
        };

        const WEB_SERVERS: &[&str] = &[
            "nginx", "apache", "httpd", "caddy", "traefik", "lighttpd", "envoy", "haproxy",
        ];
        if matches(WEB_SERVERS) {
            return ProcessType::WebServer;
        }

        const DATABASES: &[&str] = &[
            "postgres", "mysql", "mariadb", "redis", "mongo", "sqlite",
            "cockroach", "clickhouse", "cassandra", "elasticsearch", "memcached",
        ];
        if matches(DATABASES) {
            return ProcessType::Database;
        }

        const DEV_TOOLS: &[&str] = &[
            "uvicorn", "gunicorn", "flask", "django", "node", "npm", "yarn", "pnpm",
            "bun", "deno", "python", "ruby", "php", "java", "cargo", "rustc", "vite",
            "webpack", "esbuild", "next", "nuxt", "remix", "astro", "turbo", "parcel",
        ];
        if matches(DEV_TOOLS) {
            return ProcessType::Development;
        }

        const SYSTEM_PROCS: &[&str] = &[
            "launchd", "rapportd", "sharingd", "airplay", "controlcenter", "kernel",
            "systemd", "dbus", "svchost", "lsass", "wininit",
        ];
        if matches(SYSTEM_PROCS) {
            return ProcessType::System;
        }

        ProcessType::Other
    }

    /// Get the display name for this process type.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessType::WebServer => "Web Server",
            ProcessType::Database => "Database",
            ProcessType::Development => "Development",
            ProcessType::System => "System",
            ProcessType::Other => "Other",
        }
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// ProcessInfo
// ============================================================================

/// A process found listening on a port.
///
/// Produced by reading the OS socket tables; `user` and `command` are empty
/// when the platform tool does not report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process ID.
    pub pid: u32,
    /// Short process name (e.g., "node", "python3").
    pub name: String,
    /// The port the process is listening on.
    pub port: u16,
    /// Listening address (e.g., "127.0.0.1", "*", "[::1]").
    pub address: String,
    /// Username of the process owner.
    #[serde(default)]
    pub user: String,
    /// Full command line that started the process.
    #[serde(default)]
    pub command: String,
}

impl ProcessInfo {
    /// Create a process entry with only the fields every platform reports.
    pub fn new(pid: u32, name: impl Into<String>, port: u16, address: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            port,
            address: address.into(),
            user: String::new(),
            command: String::new(),
        }
    }

    /// Attach owner and command line details.
    pub fn with_details(mut self, user: impl Into<String>, command: impl Into<String>) -> Self {
        self.user = user.into();
        self.command = command.into();
        self
    }

    /// Detect the process type based on the name and command.
    pub fn process_type(&self) -> ProcessType {
        ProcessType::detect(&self.name, &self.command)
    }
}

impl std::fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_type_detect() {
        assert_eq!(ProcessType::detect("nginx", ""), ProcessType::WebServer);
        assert_eq!(ProcessType::detect("postgres", ""), ProcessType::Database);
        assert_eq!(ProcessType::detect("node", ""), ProcessType::Development);
        assert_eq!(ProcessType::detect("launchd", ""), ProcessType::System);
        assert_eq!(ProcessType::detect("unknown", ""), ProcessType::Other);
    }

    #[test]
    fn test_process_type_from_command() {
        let info = ProcessInfo::new(4242, "python3.12", 8000, "0.0.0.0")
            .with_details("dev", "python3.12 -m uvicorn app:app --reload");
        assert_eq!(info.process_type(), ProcessType::Development);
    }

    #[test]
    fn test_display() {
        let info = ProcessInfo::new(1234, "node", 3000, "*");
        assert_eq!(info.to_string(), "node (PID: 1234)");
    }
}
