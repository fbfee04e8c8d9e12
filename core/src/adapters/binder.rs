//! TCP bind probe.
//!
//! A probe resolves the host, binds a listening socket on every resolved
//! address and reports whether all of them succeeded. The sockets are
//! returned in a [`BoundPort`] guard; probes drop it immediately.
//!
//! Sockets are created through `socket2` without `SO_REUSEADDR`. With it,
//! BSD-derived stacks (macOS) let `127.0.0.1:p` bind while another process
//! listens on `0.0.0.0:p`, hiding the conflict. The flip side is that a port
//! still in `TIME_WAIT` also reads as taken.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::debug;

use crate::domain::PortQuery;
use crate::error::{Error, Result};
use crate::ports::PortBinder;

/// Binder backed by real listening sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpBinder;

impl TcpBinder {
    pub fn new() -> Self {
        Self
    }

    fn resolve(query: &PortQuery) -> Result<Vec<SocketAddr>> {
        let mut addrs: Vec<SocketAddr> = (query.host(), query.port())
            .to_socket_addrs()
            .map_err(|e| Error::PortProbe {
                host: query.host().to_string(),
                port: query.port(),
                reason: format!("could not resolve host: {}", e),
            })?
            .collect();
        // Hosts files commonly list the same address twice; IPv4 sorts first.
        addrs.sort();
        addrs.dedup();

        if addrs.is_empty() {
            return Err(Error::PortProbe {
                host: query.host().to_string(),
                port: query.port(),
                reason: "host resolved to no addresses".to_string(),
            });
        }
        Ok(addrs)
    }
}

impl PortBinder for TcpBinder {
    type Guard = BoundPort;

    fn try_bind(&self, query: &PortQuery) -> Result<Option<BoundPort>> {
        let addrs = Self::resolve(query)?;
        let multi = addrs.len() > 1;
        let mut listeners = Vec::with_capacity(addrs.len());

        for addr in addrs {
            match bind_listener(addr) {
                Ok(listener) => listeners.push(listener),
                Err(e) => match classify_bind_error(query, addr, multi, &e)? {
                    BindFailure::Unavailable => return Ok(None),
                    BindFailure::SkipAddress => {}
                },
            }
        }

        let mut listeners = listeners.into_iter();
        let Some(primary) = listeners.next() else {
            return Err(Error::PortProbe {
                host: query.host().to_string(),
                port: query.port(),
                reason: "no resolved address could be bound".to_string(),
            });
        };

        Ok(Some(BoundPort {
            port: query.port(),
            primary,
            extra: listeners.collect(),
        }))
    }
}

/// A listening socket on `addr`, without address reuse.
fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(128)?;
    Ok(socket.into())
}

/// How a failed bind on one resolved address affects the probe.
#[derive(Debug, PartialEq, Eq)]
enum BindFailure {
    /// The port cannot be used on this host.
    Unavailable,
    /// Ignore this address and keep binding the others.
    SkipAddress,
}

/// Occupied and not-permitted binds make the port unavailable; anything else
/// is a probe error.
fn classify_bind_error(
    query: &PortQuery,
    addr: SocketAddr,
    multi: bool,
    err: &io::Error,
) -> Result<BindFailure> {
    match err.kind() {
        ErrorKind::AddrInUse => {
            debug!(%addr, "Port is in use");
            Ok(BindFailure::Unavailable)
        }
        ErrorKind::PermissionDenied => {
            debug!(
                %addr,
                privileged = query.is_privileged() && !running_as_root(),
                "Permission denied binding port"
            );
            Ok(BindFailure::Unavailable)
        }
        // "localhost" often resolves to ::1 on hosts without IPv6.
        _ if multi && addr.is_ipv6() => {
            debug!(%addr, error = %err, "Skipping unusable IPv6 address");
            Ok(BindFailure::SkipAddress)
        }
        _ => Err(Error::PortProbe {
            host: query.host().to_string(),
            port: query.port(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// Listening sockets bound on one port. Dropping this releases the port.
#[derive(Debug)]
pub struct BoundPort {
    port: u16,
    primary: TcpListener,
    extra: Vec<TcpListener>,
}

impl BoundPort {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local addresses held by this guard.
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        std::iter::once(&self.primary)
            .chain(&self.extra)
            .filter_map(|l| l.local_addr().ok())
            .collect()
    }

    /// All bound listeners, one per resolved address.
    pub fn into_listeners(self) -> Vec<TcpListener> {
        let mut listeners = vec![self.primary];
        listeners.extend(self.extra);
        listeners
    }

    /// The listener on the first resolved address. Any other addresses are released.
    pub fn into_listener(self) -> TcpListener {
        self.primary
    }
}
