//! Port query domain model.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A (host, port) pair to check for bindability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortQuery {
    host: String,
    port: u16,
}

impl PortQuery {
    /// Create a query, rejecting port 0 and an empty host.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::InvalidQuery("host must not be empty".to_string()));
        }
        if port == 0 {
            return Err(Error::InvalidQuery(
                "port must be in range 1-65535".to_string(),
            ));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The same host with a different port.
    pub fn with_port(&self, port: u16) -> Result<Self> {
        Self::new(self.host.clone(), port)
    }

    /// Whether binding this port normally requires elevated privileges.
    pub fn is_privileged(&self) -> bool {
        self.port < 1024
    }
}

impl std::fmt::Display for PortQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_port_zero() {
        assert!(matches!(
            PortQuery::new("127.0.0.1", 0),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_rejects_empty_host() {
        assert!(PortQuery::new("  ", 8000).is_err());
    }

    #[test]
    fn test_display() {
        let q = PortQuery::new("0.0.0.0", 8000).unwrap();
        assert_eq!(q.to_string(), "0.0.0.0:8000");

        let q = PortQuery::new("::1", 3000).unwrap();
        assert_eq!(q.to_string(), "[::1]:3000");
    }

    #[test]
    fn test_privileged() {
        assert!(PortQuery::new("localhost", 80).unwrap().is_privileged());
        assert!(!PortQuery::new("localhost", 8080).unwrap().is_privileged());
    }
}
