// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The ARQ state machines.
//!
//! One module per protocol variant, each holding the sender engine (and,
//! where the variant has its own, the receiver engine) plus its tests:
//!
//! | Module | Sender | Receiver |
//! |--------|--------|----------|
//! | [`stop_and_wait`] | one packet in flight, resend on timeout or wrong ack | shared [`in_order`] |
//! | [`go_back_n`] | sliding window, cumulative acks, window-wide resend | shared [`in_order`] |
//! | [`selective_repeat`] | per-packet timers, single-packet resend | reorder buffer, per-packet acks |
//!
//! All engines are sans-IO. They take ownership of the file bytes, hand out
//! [`DataPacket`]s to transmit, and consume decoded acks and timeout/expiry
//! events; the [`session`](crate::session) drivers do the socket work.
//! Sequence numbers are counted in unwrapped `u64` here and folded onto the
//! 16-bit wire counter at the packet boundary.

pub mod go_back_n;
pub mod in_order;
pub mod selective_repeat;
pub mod stop_and_wait;

use crate::config::MAX_PAYLOAD;
use crate::seq;
use crate::wire::DataPacket;

/// Sequence number of the last packet for a file of `file_len` bytes.
///
/// An empty file still occupies one (empty, EOF-flagged) packet so the
/// receiver has something to terminate on.
pub(crate) fn final_seq(file_len: usize) -> u64 {
    if file_len == 0 {
        0
    } else {
        (file_len as u64 + MAX_PAYLOAD as u64 - 1) / MAX_PAYLOAD as u64 - 1
    }
}

/// Frame the packet for unwrapped sequence number `seq_num`.
pub(crate) fn packet_for(data: &[u8], seq_num: u64, final_seq: u64) -> DataPacket {
    let start = (seq_num as usize) * MAX_PAYLOAD;
    let end = (start + MAX_PAYLOAD).min(data.len());
    DataPacket {
        seq: seq::wire(seq_num),
        eof: seq_num == final_seq,
        payload: data[start.min(data.len())..end].to_vec(),
    }
}
