// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rft-send - transmit a file over UDP with a choice of ARQ strategy.
//!
//! The windowed strategies (go-back-n, selective-repeat) send data to
//! `host:port` and listen for acks on `port + 1`.

use clap::{Args as ClapArgs, Parser, Subcommand};
use rft::session;
use rft::transport::UdpEndpoint;
use rft::TransferConfig;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// Send a file over UDP
#[derive(Parser, Debug)]
#[command(name = "rft-send")]
#[command(version, about = "Send a file over UDP with a choice of ARQ strategy")]
struct Cli {
    #[command(subcommand)]
    protocol: Protocol,
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Receiver hostname or address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Receiver data port
    #[arg(short, long)]
    port: u16,

    /// File to send
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Protocol {
    /// Fire-and-forget: no acks, no retransmission
    Basic {
        #[command(flatten)]
        target: Target,
    },
    /// One packet in flight, resend on timeout
    StopAndWait {
        #[command(flatten)]
        target: Target,

        /// Retransmission timeout in milliseconds
        #[arg(short, long)]
        timeout: u64,
    },
    /// Sliding window with cumulative acks and window-wide resend
    GoBackN {
        #[command(flatten)]
        target: Target,

        /// Retransmission timeout in milliseconds
        #[arg(short, long)]
        timeout: u64,

        /// Window size in packets
        #[arg(short, long)]
        window: u64,

        /// Bounded wait for the final ack, in milliseconds
        #[arg(long, default_value = "2000")]
        grace: u64,
    },
    /// Per-packet timers and selective acks
    SelectiveRepeat {
        #[command(flatten)]
        target: Target,

        /// Retransmission timeout in milliseconds
        #[arg(short, long)]
        timeout: u64,

        /// Window size in packets
        #[arg(short, long)]
        window: u64,

        /// Bounded wait for the final ack, in milliseconds
        #[arg(long, default_value = "2000")]
        grace: u64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.protocol {
        Protocol::Basic { target } => {
            let (peer, data) = prepare(&target)?;
            let endpoint = UdpEndpoint::bind("0.0.0.0:0".parse()?)?;
            let report = session::send_basic(&endpoint, peer, data)?;
            finish(&target, &report);
        }
        Protocol::StopAndWait { target, timeout } => {
            let (peer, data) = prepare(&target)?;
            let endpoint = UdpEndpoint::bind("0.0.0.0:0".parse()?)?;
            let config = TransferConfig::new(Duration::from_millis(timeout), 1);
            let report = session::send_stop_and_wait(&endpoint, peer, data, &config)?;
            finish(&target, &report);
        }
        Protocol::GoBackN {
            target,
            timeout,
            window,
            grace,
        } => {
            let (peer, data) = prepare(&target)?;
            let (data_out, ack_in) = windowed_endpoints(&target)?;
            let config = config_with_grace(timeout, window, grace);
            let report = session::send_go_back_n(&data_out, &ack_in, peer, data, &config)?;
            finish(&target, &report);
        }
        Protocol::SelectiveRepeat {
            target,
            timeout,
            window,
            grace,
        } => {
            let (peer, data) = prepare(&target)?;
            let (data_out, ack_in) = windowed_endpoints(&target)?;
            let config = config_with_grace(timeout, window, grace);
            let report = session::send_selective_repeat(&data_out, &ack_in, peer, data, &config)?;
            finish(&target, &report);
        }
    }
    Ok(())
}

/// Resolve the peer address and read the whole file up front.
fn prepare(target: &Target) -> Result<(SocketAddr, Vec<u8>), Box<dyn std::error::Error>> {
    let peer = (target.host.as_str(), target.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("could not resolve {}", target.host))?;
    let data = std::fs::read(&target.file)
        .map_err(|e| format!("{}: {}", target.file.display(), e))?;
    Ok((peer, data))
}

/// Ephemeral data socket plus the ack listener on `port + 1`.
fn windowed_endpoints(target: &Target) -> rft::Result<(UdpEndpoint, UdpEndpoint)> {
    let data_out = UdpEndpoint::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
    let ack_in = UdpEndpoint::bind(SocketAddr::from((
        [0, 0, 0, 0],
        target.port + rft::config::ACK_PORT_OFFSET,
    )))?;
    Ok((data_out, ack_in))
}

fn config_with_grace(timeout: u64, window: u64, grace: u64) -> TransferConfig {
    TransferConfig {
        timeout: Duration::from_millis(timeout),
        window,
        final_ack_grace: Duration::from_millis(grace),
    }
}

fn finish(target: &Target, report: &rft::TransferReport) {
    println!(
        "{} successfully sent to {}:{}",
        target.file.display(),
        target.host,
        target.port
    );
    println!("{}", report);
}
