//! Application layer - Use case services.
//!
//! `PortManager` orchestrates the bind probe and process lookup ports to
//! check, resolve and reserve ports. `PortContext` and `PortReservation` are
//! the scoped values it hands back.

mod context;
mod port_manager;
mod reservation;

pub use context::PortContext;
pub use port_manager::{PortManager, PortManagerSettings, PortResolution};
pub use reservation::PortReservation;
