// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rft - ARQ file transfer over UDP
//!
//! Reliable, ordered delivery of a file over an unreliable, unordered,
//! duplicate-prone datagram transport, using three ARQ strategies of
//! increasing sophistication plus an unreliable baseline:
//!
//! | Variant | Window | Ack style | Retransmission |
//! |---------|--------|-----------|----------------|
//! | `basic` | none | none | none (fire-and-forget) |
//! | `stop-and-wait` | 1 packet | per-packet | whole packet on timeout or wrong ack |
//! | `go-back-n` | fixed N | cumulative | whole window on timeout |
//! | `selective-repeat` | fixed N | selective | single packet, per-packet timer |
//!
//! ## Protocol Flow (selective repeat)
//!
//! ```text
//! Sender                                    Receiver
//!   |                                          |
//!   |--- DATA (seq=0) ------------------------>| delivered
//!   |--- DATA (seq=1) ----------X (lost)       |
//!   |--- DATA (seq=2) ------------------------>| buffered (gap at 1)
//!   |<-- ACK (seq=0) --------------------------|
//!   |<-- ACK (seq=2) --------------------------|
//!   |                                          |
//!   |--- DATA (seq=1) [timer expiry] --------->| gap filled, 1+2 flushed
//!   |<-- ACK (seq=1) --------------------------|
//! ```
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`wire`] | Packet codec for the two header dialects |
//! | [`seq`] | Modular sequence-number arithmetic and window predicates |
//! | [`timer`] | Cancellable retransmission deadlines (min-heap) |
//! | [`arq`] | The sender/receiver state machines, one module per variant |
//! | [`transport`] | Blocking UDP endpoint with bounded receive |
//! | [`session`] | Drivers that pump an engine against sockets and a file sink |
//!
//! The state machines in [`arq`] are sans-IO: they consume decoded packets,
//! acks and timeouts and hand back what to transmit or deliver, which keeps
//! them unit-testable without sockets. The [`session`] drivers own the
//! sockets, the single blocking point (`recv_timeout`), and the file
//! source/sink.

pub mod arq;
pub mod config;
pub mod seq;
pub mod session;
pub mod timer;
pub mod transport;
pub mod wire;

pub use config::TransferConfig;
pub use session::TransferReport;

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by rft operations.
///
/// Transport timeouts are deliberately NOT an error: they are the normal
/// signal that drives retransmission, and surface as `Ok(None)` from
/// [`transport::UdpEndpoint::recv_timeout`].
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Datagram shorter than the fixed header (or declared content) requires.
    ///
    /// `kind` names the message being decoded ("data", "ack", ...).
    Truncated {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
    /// Header flag byte outside the values the dialect defines.
    InvalidFlag { kind: &'static str, flag: u8 },
    /// Payload exceeds the fixed maximum segment size.
    PayloadTooLarge(usize),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Window size is zero or larger than half the sequence space.
    InvalidWindow(u64),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Failed to bind a UDP socket to the requested address.
    BindFailed(String),
    /// I/O error with underlying cause.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated {
                kind,
                expected,
                got,
            } => write!(
                f,
                "truncated {} datagram: need {} bytes, got {}",
                kind, expected, got
            ),
            Error::InvalidFlag { kind, flag } => {
                write!(f, "invalid flag byte {:#04x} in {} datagram", flag, kind)
            }
            Error::PayloadTooLarge(len) => write!(
                f,
                "payload of {} bytes exceeds maximum of {}",
                len,
                config::MAX_PAYLOAD
            ),
            Error::InvalidWindow(w) => write!(
                f,
                "window size {} out of range (1..={})",
                w,
                config::MAX_WINDOW
            ),
            Error::BindFailed(msg) => write!(f, "failed to bind socket: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
