//! Port reservation guard.

use tracing::debug;
use uuid::Uuid;

use crate::adapters::BoundPort;

/// Ports held for the lifetime of this value.
///
/// Every port listed by [`ports`](Self::ports) has a bound socket behind it,
/// so it cannot be taken by anyone else until the reservation is dropped,
/// released, or the port is handed out with [`take`](Self::take).
#[derive(Debug)]
pub struct PortReservation<G = BoundPort> {
    id: Uuid,
    host: String,
    held: Vec<(u16, G)>,
}

impl<G> PortReservation<G> {
    pub(crate) fn new(host: impl Into<String>, held: Vec<(u16, G)>) -> Self {
        let reservation = Self {
            id: Uuid::new_v4(),
            host: host.into(),
            held,
        };
        debug!(
            reservation = %reservation.id,
            host = %reservation.host,
            ports = ?reservation.ports(),
            "Reserved ports"
        );
        reservation
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Ports currently held, in ascending order.
    pub fn ports(&self) -> Vec<u16> {
        self.held.iter().map(|(port, _)| *port).collect()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.held.iter().any(|(p, _)| *p == port)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Hand a held port over to the caller.
    ///
    /// The returned guard keeps the port bound; the reservation no longer
    /// lists it.
    pub fn take(&mut self, port: u16) -> Option<G> {
        let index = self.held.iter().position(|(p, _)| *p == port)?;
        let (_, guard) = self.held.remove(index);
        debug!(reservation = %self.id, port, "Handed out reserved port");
        Some(guard)
    }

    /// Release every held port now.
    pub fn release(self) {
        drop(self);
    }
}

impl<G> Drop for PortReservation<G> {
    fn drop(&mut self) {
        if !self.held.is_empty() {
            debug!(reservation = %self.id, ports = ?self.ports(), "Releasing reserved ports");
        }
    }
}
