// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Selective-repeat engines: per-packet timers on the sender, a reorder
//! buffer on the receiver.
//!
//! The defining difference from go-back-n: every outstanding packet has its
//! own independently cancellable deadline, so a single lost packet costs
//! exactly one retransmission. The sender keeps up to `window` packets
//! outstanding inside the contiguous range `[base, base + window)`, where
//! `base` is the oldest unacknowledged sequence number; an ack cancels that
//! packet's timer and may admit the next unsent packet, and an expired timer
//! re-sends just its packet and re-arms (periodic resend until acked).
//!
//! The receiver buffers any packet inside `[next_expected, next_expected +
//! window)` and acks it individually; a packet just below the window is a
//! duplicate of something already delivered and is re-acked without being
//! stored; anything else is dropped without an ack. After each store the
//! buffer drains while contiguous, stopping at the first gap.
//!
//! ## Final-ack ambiguity
//!
//! Once only the EOF packet's ack is outstanding, a lost ack is
//! indistinguishable from a completed transfer. The sender keeps
//! retransmitting on expiry but bounds the wait with a grace period, after
//! which it assumes delivery and tears down. The grace period is
//! configurable; the assumption is logged.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::{final_seq, packet_for};
use crate::config::TransferConfig;
use crate::seq;
use crate::timer::TimerQueue;
use crate::wire::DataPacket;

/// Result of feeding an ack to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// A still-armed packet was acknowledged (unwrapped sequence number).
    Acked(u64),
    /// Ack for a packet with no armed timer: already acked or never sent.
    Duplicate,
}

/// Selective-repeat sender engine.
#[derive(Debug)]
pub struct SelectiveRepeatSender {
    data: Vec<u8>,
    next_unsent: u64,
    final_seq: u64,
    window: u64,
    timeout: Duration,
    timers: TimerQueue,
    retransmits: u64,
}

impl SelectiveRepeatSender {
    pub fn new(data: Vec<u8>, config: &TransferConfig) -> Self {
        let final_seq = final_seq(data.len());
        Self {
            data,
            next_unsent: 0,
            final_seq,
            window: config.window,
            timeout: config.timeout,
            timers: TimerQueue::new(),
            retransmits: 0,
        }
    }

    /// Oldest unacknowledged sequence number (window base).
    fn base(&self) -> u64 {
        self.timers.min_key().unwrap_or(self.next_unsent)
    }

    /// Next first-time transmission, while the window admits one. Arms the
    /// packet's timer.
    pub fn poll_transmit(&mut self, now: Instant) -> Option<DataPacket> {
        if self.next_unsent <= self.final_seq && self.next_unsent < self.base() + self.window {
            let seq_num = self.next_unsent;
            self.timers.arm(seq_num, now + self.timeout);
            self.next_unsent += 1;
            Some(packet_for(&self.data, seq_num, self.final_seq))
        } else {
            None
        }
    }

    /// Process a received ack: cancel the matching timer, if still armed.
    pub fn on_ack(&mut self, ack: u16) -> AckOutcome {
        match seq::unwrap_in_range(ack, self.base(), self.next_unsent) {
            Some(seq_num) if self.timers.cancel(seq_num) => AckOutcome::Acked(seq_num),
            _ => AckOutcome::Duplicate,
        }
    }

    /// Retransmit one packet whose timer has elapsed at `now`, re-arming it.
    pub fn poll_expired(&mut self, now: Instant) -> Option<DataPacket> {
        let seq_num = self.timers.pop_expired(now)?;
        self.timers.arm(seq_num, now + self.timeout);
        self.retransmits += 1;
        Some(packet_for(&self.data, seq_num, self.final_seq))
    }

    /// Earliest armed retransmission deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Unacknowledged packets currently outstanding.
    pub fn outstanding(&self) -> usize {
        self.timers.len()
    }

    /// True once everything is sent and every timer is cancelled.
    pub fn is_complete(&self) -> bool {
        self.next_unsent > self.final_seq && self.timers.is_empty()
    }

    /// Only the EOF packet's ack remains outstanding.
    pub fn in_endgame(&self) -> bool {
        self.next_unsent > self.final_seq
            && self.timers.len() == 1
            && self.timers.contains(self.final_seq)
    }

    /// Grace expiry: assume the final ack was lost in our favor and tear
    /// down all timers.
    pub fn abandon_final_ack(&mut self) {
        self.timers.clear();
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn file_len(&self) -> u64 {
        self.data.len() as u64
    }
}

/// What the driver should do with one received data packet.
#[derive(Debug, PartialEq, Eq)]
pub struct RecvVerdict {
    /// Payloads that became deliverable, in sequence order.
    pub deliver: Vec<Vec<u8>>,
    /// Send a selective ack for this (wire) sequence number.
    pub ack: Option<u16>,
}

/// Selective-repeat receiver engine.
#[derive(Debug)]
pub struct SelectiveRepeatReceiver {
    next_expected: u64,
    window: u64,
    buffer: BTreeMap<u64, Vec<u8>>,
    eof_seq: Option<u64>,
    complete: bool,
}

impl SelectiveRepeatReceiver {
    pub fn new(window: u64) -> Self {
        Self {
            next_expected: 0,
            window,
            buffer: BTreeMap::new(),
            eof_seq: None,
            complete: false,
        }
    }

    /// Process one decoded data packet.
    pub fn on_data(&mut self, pkt: &DataPacket) -> RecvVerdict {
        let next_wire = seq::wire(self.next_expected);
        if !self.complete && seq::in_window(pkt.seq, next_wire, self.window) {
            // In window: buffer (re-receipt of a buffered packet overwrites
            // with identical bytes) and drain while contiguous.
            let seq_num = self.next_expected + u64::from(seq::distance(next_wire, pkt.seq));
            self.buffer.insert(seq_num, pkt.payload.clone());
            if pkt.eof {
                self.eof_seq = Some(seq_num);
            }

            let mut deliver = Vec::new();
            while let Some(payload) = self.buffer.remove(&self.next_expected) {
                deliver.push(payload);
                if self.eof_seq == Some(self.next_expected) {
                    self.complete = true;
                    break;
                }
                self.next_expected += 1;
            }
            return RecvVerdict {
                deliver,
                ack: Some(pkt.seq),
            };
        }

        let behind = u64::from(seq::distance(pkt.seq, next_wire));
        if behind >= 1 && behind <= self.window {
            // Duplicate of an already-delivered packet: re-ack, don't store.
            RecvVerdict {
                deliver: Vec::new(),
                ack: Some(pkt.seq),
            }
        } else {
            // Beyond the window (or ancient): drop without an ack.
            RecvVerdict {
                deliver: Vec::new(),
                ack: None,
            }
        }
    }

    /// True once the EOF packet's sequence number has been flushed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Packets currently buffered out of order.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
