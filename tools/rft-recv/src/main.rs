// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rft-recv - receive a file over UDP with a choice of ARQ strategy.
//!
//! The windowed strategies (go-back-n, selective-repeat) take data on
//! `port` and send acks to `ack_host:port + 1`.

use clap::{Args as ClapArgs, Parser, Subcommand};
use rft::session;
use rft::transport::UdpEndpoint;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

/// Receive a file over UDP
#[derive(Parser, Debug)]
#[command(name = "rft-recv")]
#[command(version, about = "Receive a file over UDP with a choice of ARQ strategy")]
struct Cli {
    #[command(subcommand)]
    protocol: Protocol,
}

#[derive(ClapArgs, Debug)]
struct Listen {
    /// Data port to listen on
    #[arg(short, long)]
    port: u16,

    /// File to write
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct AckPath {
    /// Host to send acks to (the sender)
    #[arg(long, default_value = "127.0.0.1")]
    ack_host: String,
}

#[derive(Subcommand, Debug)]
enum Protocol {
    /// Fire-and-forget: write payloads in arrival order
    Basic {
        #[command(flatten)]
        listen: Listen,
    },
    /// In-order delivery with per-packet acks
    StopAndWait {
        #[command(flatten)]
        listen: Listen,
    },
    /// In-order delivery with cumulative acks
    GoBackN {
        #[command(flatten)]
        listen: Listen,

        #[command(flatten)]
        ack_path: AckPath,
    },
    /// Out-of-order tolerant delivery with a reorder buffer
    SelectiveRepeat {
        #[command(flatten)]
        listen: Listen,

        #[command(flatten)]
        ack_path: AckPath,

        /// Receive window size in packets
        #[arg(short, long)]
        window: u64,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("interrupted; partial file kept");
        std::process::exit(130);
    }) {
        eprintln!("error: failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.protocol {
        Protocol::Basic { listen } => {
            let endpoint = bind_data(&listen)?;
            let mut sink = open_sink(&listen)?;
            let bytes = session::recv_basic(&endpoint, &mut sink)?;
            finish(&listen, &mut sink, bytes)?;
        }
        Protocol::StopAndWait { listen } => {
            let endpoint = bind_data(&listen)?;
            let mut sink = open_sink(&listen)?;
            let bytes = session::recv_stop_and_wait(&endpoint, &mut sink)?;
            finish(&listen, &mut sink, bytes)?;
        }
        Protocol::GoBackN { listen, ack_path } => {
            let endpoint = bind_data(&listen)?;
            let ack_dest = resolve_ack_dest(&ack_path, &listen)?;
            let mut sink = open_sink(&listen)?;
            let bytes = session::recv_go_back_n(&endpoint, ack_dest, &mut sink)?;
            finish(&listen, &mut sink, bytes)?;
        }
        Protocol::SelectiveRepeat {
            listen,
            ack_path,
            window,
        } => {
            let endpoint = bind_data(&listen)?;
            let ack_dest = resolve_ack_dest(&ack_path, &listen)?;
            let mut sink = open_sink(&listen)?;
            let bytes = session::recv_selective_repeat(&endpoint, ack_dest, &mut sink, window)?;
            finish(&listen, &mut sink, bytes)?;
        }
    }
    Ok(())
}

fn bind_data(listen: &Listen) -> rft::Result<UdpEndpoint> {
    UdpEndpoint::bind(SocketAddr::from(([0, 0, 0, 0], listen.port)))
}

/// Create the output file before any packet arrives, so an unwritable path
/// fails the session up front.
fn open_sink(listen: &Listen) -> Result<BufWriter<File>, Box<dyn std::error::Error>> {
    let file = File::create(&listen.file)
        .map_err(|e| format!("{}: {}", listen.file.display(), e))?;
    Ok(BufWriter::new(file))
}

fn resolve_ack_dest(
    ack_path: &AckPath,
    listen: &Listen,
) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let port = listen.port + rft::config::ACK_PORT_OFFSET;
    Ok((ack_path.ack_host.as_str(), port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("could not resolve {}", ack_path.ack_host))?)
}

fn finish(
    listen: &Listen,
    sink: &mut BufWriter<File>,
    bytes: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    sink.flush()?;
    println!(
        "{} successfully received ({} bytes)",
        listen.file.display(),
        bytes
    );
    Ok(())
}
