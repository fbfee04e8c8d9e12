//! Domain layer - Pure data models.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod conflict;
mod process;
mod query;

pub use conflict::PortConflict;
pub use process::{ProcessInfo, ProcessType};
pub use query::PortQuery;
