//! Process lookup port (interface).

use crate::domain::ProcessInfo;
use crate::error::Result;

/// Port for inspecting which processes hold listening sockets.
///
/// Implementations handle platform-specific details (ss, lsof, netstat).
/// They may fail with `ProcessEnumerationUnavailable`; callers on the
/// port-resolution path treat that as "no processes found".
pub trait ProcessLookup: Send + Sync {
    /// Processes listening on the given TCP port.
    fn processes_on_port(
        &self,
        port: u16,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessInfo>>> + Send;

    /// Every listening TCP socket with its owning process, sorted by port.
    fn listening(&self) -> impl std::future::Future<Output = Result<Vec<ProcessInfo>>> + Send;
}
