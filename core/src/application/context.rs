//! Resolved-port scope.

use tracing::debug;

use crate::domain::PortConflict;

/// A port resolved for a service, valid for the lifetime of this value.
///
/// Nothing is held open: the caller binds and owns its server. Dropping the
/// context only marks the end of the scope.
#[derive(Debug)]
pub struct PortContext {
    host: String,
    port: u16,
    service_name: String,
    conflict: Option<PortConflict>,
}

impl PortContext {
    pub(crate) fn new(
        host: impl Into<String>,
        port: u16,
        service_name: impl Into<String>,
        conflict: Option<PortConflict>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            service_name: service_name.into(),
            conflict,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The conflict that forced a different port, if any.
    pub fn conflict(&self) -> Option<&PortConflict> {
        self.conflict.as_ref()
    }
}

impl Drop for PortContext {
    fn drop(&mut self) {
        debug!(service = %self.service_name, port = self.port, "Port context ended");
    }
}
