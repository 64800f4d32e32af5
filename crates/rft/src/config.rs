// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants and per-transfer configuration.

use std::time::Duration;

use crate::{Error, Result};

/// Maximum payload carried by a single data packet, in bytes.
pub const MAX_PAYLOAD: usize = 1024;

/// Fixed data header length, identical for both dialects.
pub const DATA_HEADER_LEN: usize = 3;

/// Ack length in the stop-wait dialect (bare sequence number).
pub const STOP_WAIT_ACK_LEN: usize = 2;

/// Ack length in the windowed dialect (flag byte + sequence number).
pub const WINDOWED_ACK_LEN: usize = 3;

/// Flag byte for a regular data packet (windowed dialect).
pub const FLAG_DATA: u8 = 0;

/// Flag byte for an acknowledgement (windowed dialect).
pub const FLAG_ACK: u8 = 1;

/// Flag byte for the final data packet (windowed dialect).
pub const FLAG_EOF: u8 = 255;

/// Windowed receivers take data on `port` and send acks to `port + 1`.
pub const ACK_PORT_OFFSET: u16 = 1;

/// Inter-packet pacing for the basic (fire-and-forget) sender.
pub const BASIC_PACING: Duration = Duration::from_millis(5);

/// Default bounded wait for the final ack before assuming delivery
/// (go-back-n and selective-repeat senders).
pub const DEFAULT_FINAL_ACK_GRACE: Duration = Duration::from_millis(2000);

/// Largest admissible window: half the sequence space, above which a
/// retransmitted packet from the previous window cycle is indistinguishable
/// from a new one.
pub const MAX_WINDOW: u64 = crate::seq::SEQ_MODULUS / 2;

/// Per-transfer tuning for the ARQ senders and receivers.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Retransmission timeout.
    pub timeout: Duration,
    /// Window size (max outstanding unacked packets). Ignored by
    /// stop-and-wait, which always has exactly one packet in flight.
    pub window: u64,
    /// Bounded wait for the final ack before assuming delivery succeeded.
    pub final_ack_grace: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            window: 4,
            final_ack_grace: DEFAULT_FINAL_ACK_GRACE,
        }
    }
}

impl TransferConfig {
    /// Create a config with the given timeout and window, default grace.
    pub fn new(timeout: Duration, window: u64) -> Self {
        Self {
            timeout,
            window,
            ..Self::default()
        }
    }

    /// Reject windows the sequence space cannot disambiguate.
    pub fn validate(&self) -> Result<()> {
        validate_window(self.window)
    }
}

/// Reject window sizes the sequence space cannot disambiguate.
pub fn validate_window(window: u64) -> Result<()> {
    if window == 0 || window > MAX_WINDOW {
        return Err(Error::InvalidWindow(window));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TransferConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let cfg = TransferConfig::new(Duration::from_millis(100), 0);
        assert!(matches!(cfg.validate(), Err(Error::InvalidWindow(0))));
    }

    #[test]
    fn test_window_above_half_sequence_space_rejected() {
        let cfg = TransferConfig::new(Duration::from_millis(100), MAX_WINDOW + 1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_window_at_half_sequence_space_accepted() {
        let cfg = TransferConfig::new(Duration::from_millis(100), MAX_WINDOW);
        assert!(cfg.validate().is_ok());
    }
}
