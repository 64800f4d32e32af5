// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Go-back-n sender engine: sliding window, cumulative acks, one timer for
//! the whole window.
//!
//! `base` is the oldest unacknowledged packet and `next` the next to frame;
//! transmission proceeds while fewer than `window` packets are outstanding.
//! A cumulative ack for `k` slides `base` to `k + 1` and restarts the window
//! timer; an ack-wait timeout rewinds `next` to `base` so the entire
//! outstanding window goes out again - the defining "go back N".
//!
//! Stale acks (at or below the last slide) are discarded; the driver keeps
//! reading with the remaining window-timer budget rather than restarting it,
//! so a duplicating peer cannot hold the timer open forever.

use super::{final_seq, packet_for};
use crate::seq;
use crate::wire::DataPacket;

/// Result of feeding an ack to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Window slid forward to `base`.
    Advanced,
    /// Ack at or below the previous base: discarded.
    Stale,
}

/// Go-back-n sender engine.
#[derive(Debug)]
pub struct GoBackNSender {
    data: Vec<u8>,
    /// Oldest unacknowledged sequence number.
    base: u64,
    /// Next sequence number to frame.
    next: u64,
    final_seq: u64,
    window: u64,
    retransmits: u64,
}

impl GoBackNSender {
    pub fn new(data: Vec<u8>, window: u64) -> Self {
        let final_seq = final_seq(data.len());
        Self {
            data,
            base: 0,
            next: 0,
            final_seq,
            window,
            retransmits: 0,
        }
    }

    /// Next packet to put on the wire, while the window has room.
    pub fn poll_transmit(&mut self) -> Option<DataPacket> {
        if self.next - self.base < self.window && self.next <= self.final_seq {
            let pkt = packet_for(&self.data, self.next, self.final_seq);
            self.next += 1;
            Some(pkt)
        } else {
            None
        }
    }

    /// Process a received ack, with cumulative semantics.
    pub fn on_ack(&mut self, ack: u16) -> AckOutcome {
        match seq::unwrap_in_range(ack, self.base, self.next) {
            Some(acked) => {
                self.base = acked + 1;
                AckOutcome::Advanced
            }
            None => AckOutcome::Stale,
        }
    }

    /// Ack-wait timeout: rewind so the whole outstanding window is resent.
    ///
    /// Returns the number of packets that will be retransmitted.
    pub fn on_timeout(&mut self) -> u64 {
        let outstanding = self.next - self.base;
        self.next = self.base;
        self.retransmits += outstanding;
        outstanding
    }

    /// Packets sent but not yet cumulatively acknowledged.
    pub fn outstanding(&self) -> u64 {
        self.next - self.base
    }

    /// True once the EOF packet's ack has slid the window past it.
    pub fn is_complete(&self) -> bool {
        self.base > self.final_seq
    }

    /// Everything has been sent and only the final packet's ack is missing.
    /// This is where "final ack lost" and "transfer complete" become
    /// indistinguishable and the bounded grace wait applies.
    pub fn in_endgame(&self) -> bool {
        self.next > self.final_seq && self.base == self.final_seq
    }

    pub fn base_wire(&self) -> u16 {
        seq::wire(self.base)
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn file_len(&self) -> u64 {
        self.data.len() as u64
    }
}
