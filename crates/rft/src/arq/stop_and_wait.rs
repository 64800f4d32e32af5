// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stop-and-wait sender engine: exactly one packet in flight.
//!
//! The cycle is send, block for the ack, advance. A receive timeout or an
//! ack for any other sequence number means the same packet goes out again.
//! Throughput is bounded by one round trip per packet; the win is that the
//! state machine is two fields.

use super::{final_seq, packet_for};
use crate::seq;
use crate::wire::DataPacket;

/// Result of feeding an ack to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The outstanding packet was acknowledged; the window advanced.
    Advanced,
    /// Ack for some other sequence number: resend the outstanding packet.
    WrongAck,
}

/// Stop-and-wait sender engine.
#[derive(Debug)]
pub struct StopAndWaitSender {
    data: Vec<u8>,
    seq_num: u64,
    final_seq: u64,
    retransmits: u64,
}

impl StopAndWaitSender {
    pub fn new(data: Vec<u8>) -> Self {
        let final_seq = final_seq(data.len());
        Self {
            data,
            seq_num: 0,
            final_seq,
            retransmits: 0,
        }
    }

    /// The packet currently in flight, or `None` once the transfer is done.
    pub fn current_packet(&self) -> Option<DataPacket> {
        if self.is_complete() {
            return None;
        }
        Some(packet_for(&self.data, self.seq_num, self.final_seq))
    }

    /// Process a received ack.
    pub fn on_ack(&mut self, ack: u16) -> AckOutcome {
        if !self.is_complete() && ack == seq::wire(self.seq_num) {
            self.seq_num += 1;
            AckOutcome::Advanced
        } else {
            self.retransmits += 1;
            AckOutcome::WrongAck
        }
    }

    /// Process an ack-wait timeout: the packet will be resent.
    pub fn on_timeout(&mut self) {
        self.retransmits += 1;
    }

    /// True once the EOF packet has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.seq_num > self.final_seq
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn file_len(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arq::in_order::InOrderReceiver;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_advances_only_on_matching_ack() {
        let mut tx = StopAndWaitSender::new(payload(3000));

        let pkt = tx.current_packet().unwrap();
        assert_eq!(pkt.seq, 0);

        assert_eq!(tx.on_ack(1), AckOutcome::WrongAck);
        assert_eq!(tx.current_packet().unwrap().seq, 0);

        assert_eq!(tx.on_ack(0), AckOutcome::Advanced);
        assert_eq!(tx.current_packet().unwrap().seq, 1);
        assert_eq!(tx.retransmits(), 1);
    }

    #[test]
    fn test_timeout_counts_retransmit() {
        let mut tx = StopAndWaitSender::new(payload(10));
        tx.on_timeout();
        tx.on_timeout();
        assert_eq!(tx.retransmits(), 2);
        assert_eq!(tx.current_packet().unwrap().seq, 0);
    }

    #[test]
    fn test_duplicate_ack_does_not_advance_twice() {
        let mut tx = StopAndWaitSender::new(payload(3000));

        assert_eq!(tx.on_ack(0), AckOutcome::Advanced);
        // replayed ack for 0 must not move the window again
        assert_eq!(tx.on_ack(0), AckOutcome::WrongAck);
        assert_eq!(tx.current_packet().unwrap().seq, 1);
    }

    #[test]
    fn test_completes_after_final_ack() {
        let mut tx = StopAndWaitSender::new(payload(2500)); // packets 0..=2

        for n in 0u16..3 {
            assert!(!tx.is_complete());
            let pkt = tx.current_packet().unwrap();
            assert_eq!(pkt.seq, n);
            assert_eq!(pkt.eof, n == 2);
            assert_eq!(tx.on_ack(n), AckOutcome::Advanced);
        }
        assert!(tx.is_complete());
        assert!(tx.current_packet().is_none());
    }

    // ------------------------------------------------------------------
    // Pump against the in-order receiver
    // ------------------------------------------------------------------

    #[test]
    fn test_pump_lossless_round_trip() {
        let data = payload(5000);
        let mut tx = StopAndWaitSender::new(data.clone());
        let mut rx = InOrderReceiver::new();
        let mut sink = Vec::new();

        while let Some(pkt) = tx.current_packet() {
            let verdict = rx.on_data(&pkt);
            if verdict.deliver {
                sink.extend_from_slice(&pkt.payload);
            }
            tx.on_ack(verdict.ack.expect("in-order delivery always acks"));
        }

        assert!(tx.is_complete());
        assert!(rx.is_complete());
        assert_eq!(sink, data);
        assert_eq!(tx.retransmits(), 0);
    }

    #[test]
    fn test_pump_dropped_ack_no_double_write() {
        // Drop exactly one ack: the sender must resend the identical packet
        // and the receiver must not write its bytes twice.
        let data = payload(2500);
        let mut tx = StopAndWaitSender::new(data.clone());
        let mut rx = InOrderReceiver::new();
        let mut sink = Vec::new();
        let mut drop_ack_for = Some(1u16);

        while let Some(pkt) = tx.current_packet() {
            let verdict = rx.on_data(&pkt);
            if verdict.deliver {
                sink.extend_from_slice(&pkt.payload);
            }
            let ack = verdict.ack.unwrap();
            if drop_ack_for == Some(ack) {
                drop_ack_for = None;
                tx.on_timeout(); // ack never arrives
                continue;
            }
            tx.on_ack(ack);
        }

        assert_eq!(sink, data);
        assert_eq!(tx.retransmits(), 1);
    }
}
