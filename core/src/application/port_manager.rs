//! Port conflict detection and resolution service.

use std::future::Future;
use std::process::ExitStatus;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapters::{CommandLauncher, ProcessScanner, TcpBinder};
use crate::config::{Config, DEFAULT_MAX_ATTEMPTS};
use crate::domain::{PortConflict, PortQuery, ProcessInfo};
use crate::error::{Error, Result};
use crate::ports::{PortBinder, ProcessLookup};

use super::{PortContext, PortReservation};

/// Tunables for port searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortManagerSettings {
    /// Candidates tried by conflict resolution and reservations.
    pub max_attempts: u16,
}

impl Default for PortManagerSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl From<&Config> for PortManagerSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// Outcome of resolving a desired port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResolution {
    /// The port to bind.
    pub port: u16,
    /// Set when the desired port was taken.
    pub conflict: Option<PortConflict>,
}

impl PortResolution {
    /// Whether a different port than the desired one was chosen.
    pub fn changed(&self) -> bool {
        self.conflict.is_some()
    }
}

/// Application service for port availability, conflict handling and reservation.
///
/// Binding goes through the `PortBinder` trait and process inspection through
/// `ProcessLookup`, so either can be swapped out.
pub struct PortManager<B = TcpBinder, L = ProcessScanner> {
    binder: B,
    lookup: L,
    settings: PortManagerSettings,
}

impl PortManager {
    /// Manager backed by real sockets and the platform process scanner.
    pub fn system() -> Self {
        Self::new(TcpBinder::new(), ProcessScanner::new())
    }
}

impl Default for PortManager {
    fn default() -> Self {
        Self::system()
    }
}

impl<B: PortBinder, L: ProcessLookup> PortManager<B, L> {
    pub fn new(binder: B, lookup: L) -> Self {
        Self {
            binder,
            lookup,
            settings: PortManagerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PortManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> PortManagerSettings {
        self.settings
    }

    /// Bind probe that surfaces probe failures.
    ///
    /// `Ok(false)` means occupied or not permitted; `Err` means the probe
    /// itself could not be carried out.
    pub fn probe(&self, host: &str, port: u16) -> Result<bool> {
        let query = PortQuery::new(host, port)?;
        // The guard is dropped here, so nothing stays bound.
        Ok(self.binder.try_bind(&query)?.is_some())
    }

    /// Whether (host, port) can be bound right now.
    pub fn check_port_available(&self, host: &str, port: u16) -> bool {
        match self.probe(host, port) {
            Ok(available) => available,
            Err(e) => {
                debug!(host, port, error = %e, "Port probe failed, treating as unavailable");
                false
            }
        }
    }

    /// Processes listening on the port. Empty when enumeration is not possible.
    pub async fn get_processes_using_port(&self, port: u16) -> Vec<ProcessInfo> {
        match self.lookup.processes_on_port(port).await {
            Ok(processes) => processes,
            Err(e) => {
                debug!(port, error = %e, "Process enumeration failed");
                Vec::new()
            }
        }
    }

    /// Every listening socket with its owner.
    pub async fn list_listening_ports(&self) -> Result<Vec<ProcessInfo>> {
        self.lookup.listening().await
    }

    /// First bindable port in `start_port .. start_port + max_attempts`.
    pub fn find_available_port(&self, host: &str, start_port: u16, max_attempts: u16) -> Result<u16> {
        self.bind_first(host, start_port, max_attempts)
            .map(|(port, _guard)| port)
    }

    /// Scan upward and keep the first successful bind.
    fn bind_first(&self, host: &str, start_port: u16, max_attempts: u16) -> Result<(u16, B::Guard)> {
        if max_attempts == 0 {
            return Err(Error::InvalidQuery(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let query = PortQuery::new(host, start_port)?;

        let mut attempts: u16 = 0;
        for port in (start_port..=u16::MAX).take(usize::from(max_attempts)) {
            attempts += 1;
            if let Some(guard) = self.binder.try_bind(&query.with_port(port)?)? {
                debug!(host, start_port, port, attempts, "Found available port");
                return Ok((port, guard));
            }
        }

        Err(Error::NoPortAvailable {
            start: start_port,
            attempts,
        })
    }

    /// Resolve the desired port and keep it bound.
    async fn acquire(
        &self,
        host: &str,
        desired_port: u16,
        service_name: &str,
    ) -> Result<(PortResolution, B::Guard)> {
        let query = PortQuery::new(host, desired_port)?;
        if let Some(guard) = self.binder.try_bind(&query)? {
            debug!(service = service_name, %query, "Desired port is available");
            let resolution = PortResolution {
                port: desired_port,
                conflict: None,
            };
            return Ok((resolution, guard));
        }

        let processes = self.get_processes_using_port(desired_port).await;
        let conflict = PortConflict::new(host, desired_port, service_name, processes);
        warn!(
            service = service_name,
            port = desired_port,
            holders = %conflict.holders(),
            "Port conflict detected"
        );

        let next = desired_port.checked_add(1).ok_or(Error::NoPortAvailable {
            start: desired_port,
            attempts: 1,
        })?;
        let (port, guard) = self.bind_first(host, next, self.settings.max_attempts)?;
        info!(
            service = service_name,
            from = desired_port,
            to = port,
            "Using alternative port"
        );

        Ok((
            PortResolution {
                port,
                conflict: Some(conflict),
            },
            guard,
        ))
    }

    /// Resolve the desired port, reporting the conflict if there is one.
    pub async fn resolve_port(
        &self,
        host: &str,
        desired_port: u16,
        service_name: &str,
    ) -> Result<PortResolution> {
        let (resolution, _guard) = self.acquire(host, desired_port, service_name).await?;
        Ok(resolution)
    }

    /// The desired port if it is free, otherwise the next free port above it.
    pub async fn handle_port_conflict(
        &self,
        host: &str,
        desired_port: u16,
        service_name: &str,
    ) -> Result<u16> {
        self.resolve_port(host, desired_port, service_name)
            .await
            .map(|r| r.port)
    }

    /// Resolve a port, then call `start(host, port, options)`.
    ///
    /// `options` is passed through untouched, so any framework-specific
    /// settings reach the start function as given.
    pub async fn start_server_with_port_handling<F, Fut, O, T>(
        &self,
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
        let port = self.handle_port_conflict(host, port, service_name).await?;
        info!(service = service_name, host, port, "Starting server");
        Ok(start(host.to_string(), port, options).await)
    }

    /// Run an external server command on a resolved port.
    pub async fn run_command_with_port_handling(
        &self,
        launcher: &CommandLauncher,
        host: &str,
        port: u16,
        service_name: &str,
    ) -> Result<ExitStatus> {
        self.start_server_with_port_handling(
            |host, port, launcher: CommandLauncher| async move { launcher.launch(&host, port).await },
            host,
            port,
            service_name,
            launcher.clone(),
        )
        .await?
    }

    /// Resolve a port for the duration of the returned context.
    pub async fn port_context(
        &self,
        host: &str,
        port: u16,
        service_name: &str,
    ) -> Result<PortContext> {
        let resolution = self.resolve_port(host, port, service_name).await?;
        Ok(PortContext::new(
            host,
            resolution.port,
            service_name,
            resolution.conflict,
        ))
    }

    /// Hold `count` distinct free ports at or above `port`.
    ///
    /// Scans at most `max_attempts` candidates (or `count`, if larger). On
    /// failure every port bound so far is released.
    pub fn reserve_port(
        &self,
        host: &str,
        port: u16,
        count: usize,
    ) -> Result<PortReservation<B::Guard>> {
        if count == 0 {
            return Err(Error::InvalidQuery(
                "reservation count must be at least 1".to_string(),
            ));
        }
        let query = PortQuery::new(host, port)?;

        // Only `port..=65535` exists above the start.
        let remaining = usize::from(u16::MAX - port) + 1;
        if count > remaining {
            debug!(host, port, count, remaining, "Reservation larger than the port range");
            return Err(Error::NoPortAvailable {
                start: port,
                attempts: 0,
            });
        }

        let width = usize::from(self.settings.max_attempts).max(count);
        let mut held = Vec::with_capacity(count);
        let mut attempts: u16 = 0;

        for candidate in (port..=u16::MAX).take(width) {
            attempts += 1;
            if let Some(guard) = self.binder.try_bind(&query.with_port(candidate)?)? {
                held.push((candidate, guard));
                if held.len() == count {
                    return Ok(PortReservation::new(host, held));
                }
            }
        }

        debug!(host, port, count, found = held.len(), "Reservation incomplete, releasing");
        Err(Error::NoPortAvailable {
            start: port,
            attempts,
        })
    }
}

impl<L: ProcessLookup> PortManager<TcpBinder, L> {
    /// Resolve a port, bind it, and hand the listener to `serve`.
    ///
    /// The socket used for the availability check is the one passed on, so
    /// no other process can grab the port in between.
    pub async fn serve_with_port_handling<F, Fut, T>(
        &self,
        host: &str,
        port: u16,
        service_name: &str,
        serve: F,
    ) -> Result<T>
    where
        F: FnOnce(tokio::net::TcpListener) -> Fut,
        Fut: Future<Output = T>,
    {
        let (resolution, bound) = self.acquire(host, port, service_name).await?;
        let listener = bound.into_listener();
        listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(listener)?;

        info!(service = service_name, host, port = resolution.port, "Serving");
        Ok(serve(listener).await)
    }
}
