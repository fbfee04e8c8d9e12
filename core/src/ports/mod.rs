//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the operating system. Implementations live in `adapters`.

mod binder;
mod lookup;

pub use binder::PortBinder;
pub use lookup::ProcessLookup;
