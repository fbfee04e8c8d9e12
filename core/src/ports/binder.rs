//! Port binder port (interface).

use crate::domain::PortQuery;
use crate::error::Result;

/// Port for binding local TCP sockets.
///
/// An availability probe is a `try_bind` whose guard is dropped right away;
/// a reservation keeps the guard alive for as long as the port is held.
pub trait PortBinder: Send + Sync {
    /// Whatever keeps the port bound. Dropping it releases the port.
    type Guard: Send;

    /// Try to bind the queried address.
    ///
    /// Returns `Ok(Some(guard))` if the bind succeeded, `Ok(None)` if the port
    /// is occupied or binding it is not permitted, and `Err(PortProbe)` for any
    /// other failure (e.g. the host does not resolve).
    fn try_bind(&self, query: &PortQuery) -> Result<Option<Self::Guard>>;
}
