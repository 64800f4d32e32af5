// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-order-only receiver engine, shared by stop-and-wait and go-back-n.
//!
//! A packet is delivered iff its sequence number is the next expected one;
//! anything else (duplicate or out-of-order) is discarded but still
//! re-acknowledged with the last successfully delivered sequence number, so
//! the sender eventually retransmits what is actually missing. Before the
//! first delivery there is nothing to acknowledge and the receiver stays
//! silent, leaving the sender to its timeout.

use crate::seq;
use crate::wire::DataPacket;

/// What the driver should do with one received data packet.
#[derive(Debug, PartialEq, Eq)]
pub struct RecvVerdict {
    /// Write the packet's payload to the sink.
    pub deliver: bool,
    /// Send an ack for this (wire) sequence number.
    pub ack: Option<u16>,
}

/// Receiver engine for the in-order variants.
#[derive(Debug, Default)]
pub struct InOrderReceiver {
    next_expected: u64,
    complete: bool,
}

impl InOrderReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one decoded data packet.
    pub fn on_data(&mut self, pkt: &DataPacket) -> RecvVerdict {
        if !self.complete && pkt.seq == seq::wire(self.next_expected) {
            self.next_expected += 1;
            if pkt.eof {
                self.complete = true;
            }
            return RecvVerdict {
                deliver: true,
                ack: Some(pkt.seq),
            };
        }

        // Duplicate or out-of-order: cumulative re-ack of the last delivery.
        let ack = self
            .next_expected
            .checked_sub(1)
            .map(seq::wire);
        RecvVerdict {
            deliver: false,
            ack,
        }
    }

    /// True once the EOF-flagged packet has been delivered.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Unwrapped count of packets delivered so far.
    pub fn delivered(&self) -> u64 {
        self.next_expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(seq: u16, eof: bool) -> DataPacket {
        DataPacket {
            seq,
            eof,
            payload: vec![seq as u8],
        }
    }

    #[test]
    fn test_in_order_delivery() {
        let mut rx = InOrderReceiver::new();

        for n in 0u16..3 {
            let verdict = rx.on_data(&data(n, n == 2));
            assert!(verdict.deliver);
            assert_eq!(verdict.ack, Some(n));
        }
        assert!(rx.is_complete());
        assert_eq!(rx.delivered(), 3);
    }

    #[test]
    fn test_duplicate_is_discarded_but_reacked() {
        let mut rx = InOrderReceiver::new();
        rx.on_data(&data(0, false));

        let verdict = rx.on_data(&data(0, false));
        assert!(!verdict.deliver);
        assert_eq!(verdict.ack, Some(0));
        assert_eq!(rx.delivered(), 1);
    }

    #[test]
    fn test_out_of_order_is_discarded_with_cumulative_ack() {
        let mut rx = InOrderReceiver::new();
        rx.on_data(&data(0, false));

        // 2 arrives while 1 is missing: discard, re-ack 0
        let verdict = rx.on_data(&data(2, false));
        assert!(!verdict.deliver);
        assert_eq!(verdict.ack, Some(0));

        // 1 then 2 complete the stream
        assert!(rx.on_data(&data(1, false)).deliver);
        assert!(rx.on_data(&data(2, true)).deliver);
        assert!(rx.is_complete());
    }

    #[test]
    fn test_silent_before_first_delivery() {
        let mut rx = InOrderReceiver::new();

        let verdict = rx.on_data(&data(3, false));
        assert!(!verdict.deliver);
        assert_eq!(verdict.ack, None);
    }

    #[test]
    fn test_eof_on_wrong_seq_does_not_terminate() {
        let mut rx = InOrderReceiver::new();
        rx.on_data(&data(0, false));

        // EOF packet arrives out of order: not delivered, not terminal
        let verdict = rx.on_data(&data(2, true));
        assert!(!verdict.deliver);
        assert!(!rx.is_complete());
    }

    #[test]
    fn test_next_expected_wraps_on_wire() {
        let mut rx = InOrderReceiver {
            next_expected: 65535,
            complete: false,
        };

        assert!(rx.on_data(&data(65535, false)).deliver);
        // unwrapped 65536 folds back to wire 0
        assert!(rx.on_data(&data(0, false)).deliver);
        assert_eq!(rx.delivered(), 65537);
    }
}
