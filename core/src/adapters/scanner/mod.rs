//! Socket table scanner adapters.
//!
//! Platform-specific implementations of process lookup.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

mod utils;

use tracing::debug;

use crate::domain::ProcessInfo;
use crate::error::Result;
use crate::ports::ProcessLookup;

/// The process scanner for the current platform.
pub struct ProcessScanner {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinScanner,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxScanner,

    #[cfg(target_os = "windows")]
    inner: windows::WindowsScanner,
}

impl ProcessScanner {
    /// Create a new scanner for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinScanner::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxScanner::new(),

            #[cfg(target_os = "windows")]
            inner: windows::WindowsScanner::new(),
        }
    }

    /// Scan all listening TCP sockets.
    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
    pub async fn scan(&self) -> Result<Vec<ProcessInfo>> {
        self.inner.scan().await
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    pub async fn scan(&self) -> Result<Vec<ProcessInfo>> {
        Err(crate::error::Error::ProcessEnumerationUnavailable(format!(
            "no socket table scanner for {}",
            std::env::consts::OS
        )))
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLookup for ProcessScanner {
    async fn processes_on_port(&self, port: u16) -> Result<Vec<ProcessInfo>> {
        let mut processes = self.scan().await?;
        processes.retain(|p| p.port == port);
        debug!(port, count = processes.len(), "Looked up processes on port");
        Ok(processes)
    }

    async fn listening(&self) -> Result<Vec<ProcessInfo>> {
        self.scan().await
    }
}

/// Internal trait for platform-specific implementations.
#[allow(dead_code)]
trait Scanner: Send + Sync {
    fn scan(&self) -> impl std::future::Future<Output = Result<Vec<ProcessInfo>>> + Send;
}
