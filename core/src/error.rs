//! Error types for the portguard-core library.

use thiserror::Error;

/// Result type alias for portguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during port probing, lookup and resolution.
#[derive(Error, Debug)]
pub enum Error {
    /// The bind probe failed for a reason other than the port being occupied.
    #[error("Failed to probe {host}:{port}: {reason}")]
    PortProbe {
        host: String,
        port: u16,
        reason: String,
    },

    /// Every candidate in the scan range was occupied.
    #[error("No available port found in {attempts} attempts starting at {start}")]
    NoPortAvailable { start: u16, attempts: u16 },

    /// The OS socket/process tables could not be read.
    #[error("Process enumeration unavailable: {0}")]
    ProcessEnumerationUnavailable(String),

    /// A query was rejected before touching the network.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_port_available_display() {
        let err = Error::NoPortAvailable {
            start: 8000,
            attempts: 50,
        };
        assert_eq!(
            err.to_string(),
            "No available port found in 50 attempts starting at 8000"
        );
    }

    #[test]
    fn test_probe_error_display() {
        let err = Error::PortProbe {
            host: "nowhere.invalid".to_string(),
            port: 3000,
            reason: "host did not resolve".to_string(),
        };
        assert!(err.to_string().contains("nowhere.invalid:3000"));
    }
}
