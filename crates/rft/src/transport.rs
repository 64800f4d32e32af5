// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking UDP endpoint with a bounded receive.
//!
//! The one place the crate touches sockets. `recv_timeout` is the only
//! blocking point in a transfer; a timeout is a normal outcome (`Ok(None)`)
//! that the drivers turn into retransmission, never an error.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::config::{DATA_HEADER_LEN, MAX_PAYLOAD};
use crate::{Error, Result};

/// Receive buffer large enough for any packet of either dialect.
pub const RECV_BUF_LEN: usize = DATA_HEADER_LEN + MAX_PAYLOAD;

/// A bound UDP socket for one direction of a transfer.
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind to `addr` with `SO_REUSEADDR`, so a restarted role can rebind
    /// its port immediately.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let domain = Domain::for_address(addr);
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| Error::BindFailed(e.to_string()))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| Error::BindFailed(e.to_string()))?;
        socket
            .bind(&addr.into())
            .map_err(|e| Error::BindFailed(format!("{}: {}", addr, e)))?;

        let socket: UdpSocket = socket.into();
        log::debug!("[udp] bound {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    /// Bind to an OS-assigned ephemeral port on the loopback interface.
    pub fn bind_ephemeral() -> Result<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram to `dest`.
    pub fn send_to(&self, buf: &[u8], dest: SocketAddr) -> Result<()> {
        self.socket.send_to(buf, dest)?;
        Ok(())
    }

    /// Block until a datagram arrives.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.set_read_timeout(None)?;
        Ok(self.socket.recv_from(buf)?)
    }

    /// Block until a datagram arrives or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout. The timeout is clamped up to 1 ms;
    /// `set_read_timeout` rejects zero and the drivers may legitimately
    /// compute a nearly-elapsed deadline.
    pub fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>> {
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(timeout))?;
        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_loopback_send_receive() {
        let a = UdpEndpoint::bind_ephemeral().unwrap();
        let b = UdpEndpoint::bind_ephemeral().unwrap();

        a.send_to(b"hello", b.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; RECV_BUF_LEN];
        let (len, from) = b
            .recv_timeout(&mut buf, Duration::from_secs(2))
            .unwrap()
            .expect("datagram should arrive on loopback");
        assert_eq!(&buf[..len], b"hello");
        assert_eq!(from, a.local_addr().unwrap());
    }

    #[test]
    fn test_recv_timeout_elapses() {
        let ep = UdpEndpoint::bind_ephemeral().unwrap();

        let start = Instant::now();
        let mut buf = [0u8; RECV_BUF_LEN];
        let got = ep.recv_timeout(&mut buf, Duration::from_millis(30)).unwrap();
        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_zero_timeout_is_clamped_not_error() {
        let ep = UdpEndpoint::bind_ephemeral().unwrap();
        let mut buf = [0u8; RECV_BUF_LEN];
        assert!(ep.recv_timeout(&mut buf, Duration::ZERO).unwrap().is_none());
    }
}
