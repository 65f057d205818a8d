use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use super::protocol::RECV_BUFFER_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("failed to configure socket: {0}")]
    Configure(#[from] io::Error),
}

/// Datagram I/O used by the sync engine. Implementations never block.
pub trait Transport {
    /// Fire-and-forget send to the subnet broadcast target.
    fn broadcast(&mut self, data: &[u8]) -> io::Result<usize>;

    fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Drains every datagram currently queued.
    fn poll_incoming(&mut self) -> Vec<(Vec<u8>, SocketAddr)>;

    /// Address our own broadcasts arrive from, for self-filtering.
    fn self_addr(&self) -> SocketAddr;
}

pub struct LanEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    self_addr: SocketAddr,
    broadcast_addr: SocketAddr,
    recv_buffer: [u8; RECV_BUFFER_SIZE],
}

impl LanEndpoint {
    /// Binds a non-blocking, broadcast-enabled socket on `bind_addr`.
    pub fn bind(bind_addr: SocketAddr, broadcast_addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind_addr).map_err(|source| TransportError::Bind {
            addr: bind_addr,
            source,
        })?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;
        let self_addr = resolve_self_addr(local_addr, broadcast_addr);

        Ok(Self {
            socket,
            local_addr,
            self_addr,
            broadcast_addr,
            recv_buffer: [0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn broadcast_addr(&self) -> SocketAddr {
        self.broadcast_addr
    }
}

impl Transport for LanEndpoint {
    fn broadcast(&mut self, data: &[u8]) -> io::Result<usize> {
        self.socket.send_to(data, self.broadcast_addr)
    }

    fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, addr)
    }

    fn poll_incoming(&mut self) -> Vec<(Vec<u8>, SocketAddr)> {
        let mut datagrams = Vec::new();

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => {
                    datagrams.push((self.recv_buffer[..size].to_vec(), addr));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if skips_datagram(&e) => {
                    log::debug!("skipped datagram: {}", e);
                }
                Err(e) => {
                    log::debug!("receive stopped: {}", e);
                    break;
                }
            }
        }

        datagrams
    }

    fn self_addr(&self) -> SocketAddr {
        self.self_addr
    }
}

/// Errors tied to a single queued datagram rather than the socket. Windows
/// reports an ICMP port unreachable for an earlier send as a reset on the
/// next receive, and an oversized datagram as WSAEMSGSIZE.
fn skips_datagram(e: &io::Error) -> bool {
    const WSAEMSGSIZE: i32 = 10040;

    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
    ) || (cfg!(windows) && e.raw_os_error() == Some(WSAEMSGSIZE))
}

/// Address our broadcasts carry as their source. A socket bound to all
/// interfaces learns it by routing a throwaway socket toward the broadcast
/// target; connecting a UDP socket sends nothing.
fn resolve_self_addr(local_addr: SocketAddr, broadcast_addr: SocketAddr) -> SocketAddr {
    if !local_addr.ip().is_unspecified() {
        return local_addr;
    }

    match probe_local_ip(broadcast_addr) {
        Ok(ip) if !ip.is_unspecified() => SocketAddr::new(ip, local_addr.port()),
        Ok(_) => {
            log::warn!(
                "Could not resolve routable address, self-filtering uses {}",
                local_addr
            );
            local_addr
        }
        Err(e) => {
            log::warn!(
                "Could not resolve routable address ({}), self-filtering uses {}",
                e,
                local_addr
            );
            local_addr
        }
    }
}

fn probe_local_ip(target: SocketAddr) -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_broadcast(true)?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}
