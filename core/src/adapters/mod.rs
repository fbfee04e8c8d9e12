//! Adapters layer - Operating system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`,
//! plus the launcher used to start external server commands.

pub mod binder;
pub mod launcher;
pub mod scanner;

// Re-export main types for convenience
pub use binder::{BoundPort, TcpBinder};
pub use launcher::CommandLauncher;
pub use scanner::ProcessScanner;
