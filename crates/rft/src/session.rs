// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transfer drivers: pump an ARQ engine against UDP endpoints and a file
//! source/sink.
//!
//! One sender and one receiver driver per variant. The drivers own the
//! sockets and the single blocking point (`recv_timeout`); all protocol
//! decisions stay in the [`arq`](crate::arq) engines. Decode failures are
//! fatal and abort the session; receive timeouts are the retransmission
//! signal.
//!
//! Stop-and-wait and basic use one socket per role and ack to the
//! datagram's source address. The windowed variants split directions:
//! data flows to `port`, acks flow back to `port + 1`.

use std::io::Write;
use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use crate::arq::go_back_n::{self, GoBackNSender};
use crate::arq::in_order::InOrderReceiver;
use crate::arq::selective_repeat::{self, SelectiveRepeatReceiver, SelectiveRepeatSender};
use crate::arq::stop_and_wait::{AckOutcome, StopAndWaitSender};
use crate::arq::{final_seq, packet_for};
use crate::config::{self, TransferConfig, BASIC_PACING};
use crate::transport::{UdpEndpoint, RECV_BUF_LEN};
use crate::wire::{stop_wait, windowed};
use crate::Result;

/// Read-only statistics for a completed transfer.
///
/// Advisory only; not part of the protocol's correctness surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// File size in bytes.
    pub file_size: u64,
    /// Wall-clock duration of the transfer.
    pub elapsed: Duration,
    /// Data packets retransmitted.
    pub retransmissions: u64,
}

impl TransferReport {
    pub fn file_size_kb(&self) -> u64 {
        self.file_size / 1024
    }

    pub fn transfer_time_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn throughput_kb_per_sec(&self) -> f64 {
        let secs = self.transfer_time_secs();
        if secs == 0.0 {
            return 0.0;
        }
        self.file_size_kb() as f64 / secs
    }
}

impl std::fmt::Display for TransferReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{\n\tFile Size: {}kb,\n\tTransfer Time: {:.3}s,\n\tThroughput: {:.3}kb/s,\n\tRetransmissions: {}\n}}",
            self.file_size_kb(),
            self.transfer_time_secs(),
            self.throughput_kb_per_sec(),
            self.retransmissions
        )
    }
}

// ============================================================================
// Basic (fire-and-forget)
// ============================================================================

/// Send `data` unreliably: every packet exactly once, fixed pacing, no acks.
pub fn send_basic(endpoint: &UdpEndpoint, peer: SocketAddr, data: Vec<u8>) -> Result<TransferReport> {
    let start = Instant::now();
    let last = final_seq(data.len());

    for seq_num in 0..=last {
        let pkt = packet_for(&data, seq_num, last);
        endpoint.send_to(&stop_wait::encode_data(&pkt), peer)?;
        log::debug!("[BASIC-TX] sent seq={} eof={}", pkt.seq, pkt.eof);
        thread::sleep(BASIC_PACING);
    }

    log::info!("[BASIC-TX] {} bytes sent to {}", data.len(), peer);
    Ok(TransferReport {
        file_size: data.len() as u64,
        elapsed: start.elapsed(),
        retransmissions: 0,
    })
}

/// Receive an unreliable transfer, writing payloads in arrival order.
pub fn recv_basic<W: Write>(endpoint: &UdpEndpoint, sink: &mut W) -> Result<u64> {
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut bytes = 0u64;

    loop {
        let (len, _) = endpoint.recv_from(&mut buf)?;
        let pkt = stop_wait::decode_data(&buf[..len])?;
        log::debug!("[BASIC-RX] received seq={} eof={}", pkt.seq, pkt.eof);
        sink.write_all(&pkt.payload)?;
        bytes += pkt.payload.len() as u64;
        if pkt.eof {
            break;
        }
    }

    log::info!("[BASIC-RX] {} bytes received", bytes);
    Ok(bytes)
}

// ============================================================================
// Stop-and-wait
// ============================================================================

/// Send `data` with one packet in flight and per-packet acks.
pub fn send_stop_and_wait(
    endpoint: &UdpEndpoint,
    peer: SocketAddr,
    data: Vec<u8>,
    config: &TransferConfig,
) -> Result<TransferReport> {
    let start = Instant::now();
    let mut engine = StopAndWaitSender::new(data);
    let mut buf = [0u8; RECV_BUF_LEN];

    while let Some(pkt) = engine.current_packet() {
        let frame = stop_wait::encode_data(&pkt);
        endpoint.send_to(&frame, peer)?;
        log::debug!("[SW-TX] sent seq={} eof={}", pkt.seq, pkt.eof);

        loop {
            match endpoint.recv_timeout(&mut buf, config.timeout)? {
                Some((len, _)) => {
                    let ack = stop_wait::decode_ack(&buf[..len])?;
                    match engine.on_ack(ack) {
                        AckOutcome::Advanced => {
                            log::debug!("[SW-TX] acked seq={}", ack);
                            break;
                        }
                        AckOutcome::WrongAck => {
                            log::debug!("[SW-TX] wrong ack {} for seq={}, resending", ack, pkt.seq);
                            endpoint.send_to(&frame, peer)?;
                        }
                    }
                }
                None => {
                    engine.on_timeout();
                    log::debug!("[SW-TX] ack wait timed out, resending seq={}", pkt.seq);
                    endpoint.send_to(&frame, peer)?;
                }
            }
        }
    }

    log::info!("[SW-TX] {} bytes sent to {}", engine.file_len(), peer);
    Ok(TransferReport {
        file_size: engine.file_len(),
        elapsed: start.elapsed(),
        retransmissions: engine.retransmits(),
    })
}

/// Receive a stop-and-wait transfer, acking to each datagram's source.
pub fn recv_stop_and_wait<W: Write>(endpoint: &UdpEndpoint, sink: &mut W) -> Result<u64> {
    let mut receiver = InOrderReceiver::new();
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut bytes = 0u64;

    while !receiver.is_complete() {
        let (len, from) = endpoint.recv_from(&mut buf)?;
        let pkt = stop_wait::decode_data(&buf[..len])?;
        log::debug!("[SW-RX] received seq={} eof={}", pkt.seq, pkt.eof);

        let verdict = receiver.on_data(&pkt);
        if verdict.deliver {
            sink.write_all(&pkt.payload)?;
            bytes += pkt.payload.len() as u64;
        }
        if let Some(ack) = verdict.ack {
            endpoint.send_to(&stop_wait::encode_ack(ack), from)?;
            log::debug!("[SW-RX] acked seq={}", ack);
        }
    }

    log::info!("[SW-RX] {} bytes received", bytes);
    Ok(bytes)
}

// ============================================================================
// Go-back-n
// ============================================================================

/// Send `data` with a cumulative-ack sliding window. Data goes out on
/// `data_out` to `peer`; acks arrive on `ack_in`.
pub fn send_go_back_n(
    data_out: &UdpEndpoint,
    ack_in: &UdpEndpoint,
    peer: SocketAddr,
    data: Vec<u8>,
    config: &TransferConfig,
) -> Result<TransferReport> {
    config.validate()?;
    let start = Instant::now();
    let mut engine = GoBackNSender::new(data, config.window);
    let mut grace_deadline: Option<Instant> = None;
    let mut buf = [0u8; RECV_BUF_LEN];

    'transfer: while !engine.is_complete() {
        while let Some(pkt) = engine.poll_transmit() {
            data_out.send_to(&windowed::encode_data(&pkt), peer)?;
            log::debug!("[GBN-TX] sent seq={} eof={}", pkt.seq, pkt.eof);
        }

        if engine.in_endgame() && grace_deadline.is_none() {
            grace_deadline = Some(Instant::now() + config.final_ack_grace);
        }

        // Window timer: wait for an ack that slides the base; stale acks
        // spend the remaining budget instead of restarting it.
        let deadline = Instant::now() + config.timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                if grace_deadline.is_some_and(|g| now >= g) {
                    log::warn!(
                        "[GBN-TX] no ack for final packet within grace period, assuming delivery"
                    );
                    break 'transfer;
                }
                let resent = engine.on_timeout();
                log::debug!(
                    "[GBN-TX] window timed out, resending {} packets from seq={}",
                    resent,
                    engine.base_wire()
                );
                continue 'transfer;
            }

            if let Some((len, _)) = ack_in.recv_timeout(&mut buf, deadline - now)? {
                let ack = windowed::decode_ack(&buf[..len])?;
                match engine.on_ack(ack) {
                    go_back_n::AckOutcome::Advanced => {
                        log::debug!("[GBN-TX] acked through seq={}", ack);
                        continue 'transfer;
                    }
                    go_back_n::AckOutcome::Stale => {
                        log::debug!("[GBN-TX] stale ack {}, discarded", ack);
                    }
                }
            }
        }
    }

    log::info!("[GBN-TX] {} bytes sent to {}", engine.file_len(), peer);
    Ok(TransferReport {
        file_size: engine.file_len(),
        elapsed: start.elapsed(),
        retransmissions: engine.retransmits(),
    })
}

/// Receive a go-back-n transfer, acking cumulatively to `ack_dest`.
pub fn recv_go_back_n<W: Write>(
    data_in: &UdpEndpoint,
    ack_dest: SocketAddr,
    sink: &mut W,
) -> Result<u64> {
    let mut receiver = InOrderReceiver::new();
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut bytes = 0u64;

    while !receiver.is_complete() {
        let (len, _) = data_in.recv_from(&mut buf)?;
        let pkt = windowed::decode_data(&buf[..len])?;
        log::debug!("[GBN-RX] received seq={} eof={}", pkt.seq, pkt.eof);

        let verdict = receiver.on_data(&pkt);
        if verdict.deliver {
            sink.write_all(&pkt.payload)?;
            bytes += pkt.payload.len() as u64;
        }
        if let Some(ack) = verdict.ack {
            data_in.send_to(&windowed::encode_ack(ack), ack_dest)?;
            log::debug!("[GBN-RX] acked through seq={}", ack);
        }
    }

    log::info!("[GBN-RX] {} bytes received", bytes);
    Ok(bytes)
}

// ============================================================================
// Selective repeat
// ============================================================================

/// Send `data` with per-packet timers and selective acks. Data goes out on
/// `data_out` to `peer`; acks arrive on `ack_in`.
pub fn send_selective_repeat(
    data_out: &UdpEndpoint,
    ack_in: &UdpEndpoint,
    peer: SocketAddr,
    data: Vec<u8>,
    config: &TransferConfig,
) -> Result<TransferReport> {
    config.validate()?;
    let start = Instant::now();
    let mut engine = SelectiveRepeatSender::new(data, config);
    let mut grace_deadline: Option<Instant> = None;
    let mut buf = [0u8; RECV_BUF_LEN];

    while !engine.is_complete() {
        let now = Instant::now();
        while let Some(pkt) = engine.poll_transmit(now) {
            data_out.send_to(&windowed::encode_data(&pkt), peer)?;
            log::debug!("[SR-TX] sent seq={} eof={}", pkt.seq, pkt.eof);
        }
        while let Some(pkt) = engine.poll_expired(now) {
            data_out.send_to(&windowed::encode_data(&pkt), peer)?;
            log::debug!("[SR-TX] timer expired, resending seq={}", pkt.seq);
        }

        if engine.in_endgame() && grace_deadline.is_none() {
            grace_deadline = Some(now + config.final_ack_grace);
        }

        // Sleep until the earliest retransmission deadline (or the grace
        // cutoff), waking early for any ack.
        let mut wake_at = engine.next_deadline().unwrap_or(now + config.timeout);
        if let Some(grace) = grace_deadline {
            wake_at = wake_at.min(grace);
        }
        let wait = wake_at.saturating_duration_since(Instant::now());

        match ack_in.recv_timeout(&mut buf, wait)? {
            Some((len, _)) => {
                let ack = windowed::decode_ack(&buf[..len])?;
                match engine.on_ack(ack) {
                    selective_repeat::AckOutcome::Acked(seq_num) => {
                        log::debug!("[SR-TX] acked seq={} ({} outstanding)", seq_num, engine.outstanding());
                    }
                    selective_repeat::AckOutcome::Duplicate => {
                        log::debug!("[SR-TX] duplicate ack {}, ignored", ack);
                    }
                }
            }
            None => {
                if engine.in_endgame() && grace_deadline.is_some_and(|g| Instant::now() >= g) {
                    log::warn!(
                        "[SR-TX] no ack for final packet within grace period, assuming delivery"
                    );
                    engine.abandon_final_ack();
                }
            }
        }
    }

    log::info!("[SR-TX] {} bytes sent to {}", engine.file_len(), peer);
    Ok(TransferReport {
        file_size: engine.file_len(),
        elapsed: start.elapsed(),
        retransmissions: engine.retransmits(),
    })
}

/// Receive a selective-repeat transfer, acking each in-window packet to
/// `ack_dest` and flushing the reorder buffer as gaps fill.
pub fn recv_selective_repeat<W: Write>(
    data_in: &UdpEndpoint,
    ack_dest: SocketAddr,
    sink: &mut W,
    window: u64,
) -> Result<u64> {
    config::validate_window(window)?;
    let mut receiver = SelectiveRepeatReceiver::new(window);
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut bytes = 0u64;

    while !receiver.is_complete() {
        let (len, _) = data_in.recv_from(&mut buf)?;
        let pkt = windowed::decode_data(&buf[..len])?;
        log::debug!("[SR-RX] received seq={} eof={}", pkt.seq, pkt.eof);

        let verdict = receiver.on_data(&pkt);
        for payload in &verdict.deliver {
            sink.write_all(payload)?;
            bytes += payload.len() as u64;
        }
        match verdict.ack {
            Some(ack) => {
                data_in.send_to(&windowed::encode_ack(ack), ack_dest)?;
                log::debug!("[SR-RX] acked seq={}", ack);
            }
            None => {
                log::debug!("[SR-RX] seq={} outside window, dropped", pkt.seq);
            }
        }
    }

    log::info!("[SR-RX] {} bytes received", bytes);
    Ok(bytes)
}
