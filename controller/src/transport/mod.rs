//! Transport: one-way datagram delivery of wire commands.
//!
//! There is no handshake, acknowledgment or sequencing.  Loss is masked by
//! the dispatcher re-sending on its cooldown.

pub mod dispatch;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, info};

pub use dispatch::{ChangeRule, DispatchConfig, DispatchOutcome, DispatchStats, Dispatcher};

/// Default receiver address.
pub const DEFAULT_HOST: &str = "192.168.1.8";

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 4210;

/// Something that can carry one payload to the receiver.
pub trait Transport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        (**self).send(payload)
    }
}

/// Non-blocking UDP sender bound to an ephemeral local port.
pub struct UdpTransport {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpTransport {
    /// Resolve `host:port` and bind a local socket of the matching family.
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let dest = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}:{}", host, port),
            )
        })?;
        let local: SocketAddr = if dest.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        info!(%dest, local = ?socket.local_addr().ok(), "UDP transport ready");
        Ok(Self { socket, dest })
    }

    pub fn destination(&self) -> SocketAddr {
        self.dest
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(payload, self.dest)?;
        if n != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {} of {} bytes", n, payload.len()),
            ));
        }
        debug!(bytes = n, "datagram sent");
        Ok(())
    }
}

/// Dry-run transport: logs payloads instead of sending them.
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        info!(payload = %String::from_utf8_lossy(payload), "dry run");
        Ok(())
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Records every payload; can be switched to fail on demand.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    pub sent: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    pub fail: std::rc::Rc<std::cell::Cell<bool>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn payloads(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

#[cfg(test)]
impl Transport for RecordingTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        if self.fail.get() {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "link down"));
        }
        self.sent
            .borrow_mut()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }
}
