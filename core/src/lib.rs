//! PortGuard Core Library
//!
//! Detect and resolve local TCP port conflicts before starting a server.
//! Provides functionality to:
//! - Check whether a (host, port) pair can be bound
//! - Find which processes hold a port
//! - Pick the next free port when the desired one is taken
//! - Reserve ports for a scope by holding their sockets open
//! - Start a server (in-process or an external command) on a resolved port
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Socket, socket-table and command implementations
//! - `application`: The `PortManager` service
//!
//! # Platform Support
//! - Linux: Uses `ss` and `ps` to find port owners
//! - macOS: Uses `lsof` and `ps`
//! - Windows: Uses `netstat` and `tasklist`
//!
//! Elsewhere, owner lookup reports nothing and port resolution still works.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

use std::future::Future;
use std::process::ExitStatus;

pub use adapters::{BoundPort, CommandLauncher, ProcessScanner, TcpBinder};
pub use application::{PortContext, PortManager, PortManagerSettings, PortReservation, PortResolution};
pub use config::{Config, ConfigStore, DEFAULT_HOST, DEFAULT_MAX_ATTEMPTS};
pub use domain::{PortConflict, PortQuery, ProcessInfo, ProcessType};
pub use error::{Error, Result};
pub use ports::{PortBinder, ProcessLookup};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Whether (host, port) can be bound right now.
pub fn check_port_available(host: &str, port: u16) -> bool {
    PortManager::system().check_port_available(host, port)
}

/// Processes listening on a port. Empty when none are found or the OS
/// tables cannot be read.
pub async fn get_processes_using_port(port: u16) -> Vec<ProcessInfo> {
    PortManager::system().get_processes_using_port(port).await
}

/// First free port on [`DEFAULT_HOST`] at or above `start_port`.
pub fn find_available_port(start_port: u16, max_attempts: u16) -> Result<u16> {
    PortManager::system().find_available_port(DEFAULT_HOST, start_port, max_attempts)
}

/// The desired port if free, otherwise the next free one above it.
pub async fn handle_port_conflict(host: &str, desired_port: u16, service_name: &str) -> Result<u16> {
    PortManager::system()
        .handle_port_conflict(host, desired_port, service_name)
        .await
}

/// Resolve a port and call `start(host, port, options)` with it.
pub async fn start_server_with_port_handling<F, Fut, O, T>(
    start: F,
    host: &str,
    port: u16,
    service_name: &str,
    options: O,
) -> Result<T>
where
    F: FnOnce(String, u16, O) -> Fut,
    Fut: Future<Output = T>,
{
    PortManager::system()
        .start_server_with_port_handling(start, host, port, service_name, options)
        .await
}

/// Resolve a port, bind it, and pass the tokio listener to `serve`.
pub async fn serve_with_port_handling<F, Fut, T>(
    host: &str,
    port: u16,
    service_name: &str,
    serve: F,
) -> Result<T>
where
    F: FnOnce(tokio::net::TcpListener) -> Fut,
    Fut: Future<Output = T>,
{
    PortManager::system()
        .serve_with_port_handling(host, port, service_name, serve)
        .await
}

/// Run an external server command on a resolved port.
pub async fn run_command_with_port_handling(
    launcher: &CommandLauncher,
    host: &str,
    port: u16,
    service_name: &str,
) -> Result<ExitStatus> {
    PortManager::system()
        .run_command_with_port_handling(launcher, host, port, service_name)
        .await
}

/// Resolve a port for the lifetime of the returned context.
pub async fn port_context(host: &str, port: u16, service_name: &str) -> Result<PortContext> {
    PortManager::system()
        .port_context(host, port, service_name)
        .await
}

/// Hold `count` distinct free ports at or above `port` until the
/// reservation is dropped.
pub fn reserve_port(host: &str, port: u16, count: usize) -> Result<PortReservation> {
    PortManager::system().reserve_port(host, port, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::TcpListener;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// A port the OS just handed out, still bound.
    fn occupied_port() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_checked_free_port_can_be_bound() {
        let (listener, start) = occupied_port();
        drop(listener);

        let port = find_available_port(start, 50).unwrap();
        assert!(port >= start);
        assert!(check_port_available("127.0.0.1", port));
        assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[test]
    fn test_occupied_port_is_unavailable() {
        let (_listener, port) = occupied_port();
        assert!(!check_port_available("127.0.0.1", port));
    }

    #[tokio::test]
    async fn test_handle_port_conflict_on_real_socket() {
        let (_listener, port) = occupied_port();

        let resolved = handle_port_conflict("127.0.0.1", port, "test").await.unwrap();
        assert!(resolved > port);
        assert!(check_port_available("127.0.0.1", resolved));
    }

    #[tokio::test]
    async fn test_handle_port_conflict_keeps_free_port() {
        let (listener, port) = occupied_port();
        drop(listener);

        let resolved = handle_port_conflict("127.0.0.1", port, "test").await.unwrap();
        assert_eq!(resolved, port);
    }

    #[tokio::test]
    async fn test_no_processes_on_unoccupied_port() {
        let (listener, port) = occupied_port();
        drop(listener);

        assert!(get_processes_using_port(port).await.is_empty());
    }

    #[test]
    fn test_reservation_holds_sockets() {
        let (listener, start) = occupied_port();
        drop(listener);

        let mut reservation = reserve_port("127.0.0.1", start, 3).unwrap();
        let ports = reservation.ports();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports.iter().collect::<HashSet<_>>().len(), 3);
        assert!(ports.iter().all(|p| *p >= start));
        assert!(ports.iter().all(|p| !check_port_available("127.0.0.1", *p)));

        let handed_out = reservation.take(ports[0]).unwrap().into_listener();
        assert_eq!(handed_out.local_addr().unwrap().port(), ports[0]);

        drop(reservation);
        assert!(check_port_available("127.0.0.1", ports[1]));
        assert!(check_port_available("127.0.0.1", ports[2]));
        assert!(!check_port_available("127.0.0.1", ports[0]));
    }

    #[tokio::test]
    async fn test_port_context_yields_free_port() {
        let (_listener, port) = occupied_port();

        let context = port_context("127.0.0.1", port, "ctx").await.unwrap();
        assert!(context.port() > port);
        assert!(context.conflict().is_some());
        assert!(TcpListener::bind(("127.0.0.1", context.port())).is_ok());
    }

    #[tokio::test]
    async fn test_serve_with_port_handling() {
        let (_listener, port) = occupied_port();

        let served = serve_with_port_handling("127.0.0.1", port, "echo", |listener| async move {
            let addr = listener.local_addr().unwrap();
            let client = tokio::spawn(async move {
                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                stream.write_all(b"ping").await.unwrap();
            });

            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            client.await.unwrap();
            (addr.port(), buf)
        })
        .await
        .unwrap();

        assert!(served.0 > port);
        assert_eq!(&served.1, b"ping");
    }

    #[tokio::test]
    async fn test_start_server_with_port_handling() {
        let (_listener, port) = occupied_port();

        let started = start_server_with_port_handling(
            |host, port, reload: bool| async move { (host, port, reload) },
            "127.0.0.1",
            port,
            "generic",
            true,
        )
        .await
        .unwrap();

        assert_eq!(started.0, "127.0.0.1");
        assert!(started.1 > port);
        assert!(started.2);
    }
}
