// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Liveness probe against an in-process echo server.
//!
//! Starts an echo server on the liveness address, then probes it in rounds
//! separated by a random pause, printing each reply with its round-trip
//! time. Runs until `--rounds` rounds are done (forever by default).

use std::process;
use std::thread;

use anyhow::{anyhow, Result};
use switchyard::cli::{load_and_init, parse_tool_args, PingArgs};
use switchyard::devices::{EchoServer, LivenessClient, LivenessConfig};
use switchyard::transports::inproc::Context;
use tracing::{error, info};

fn run() -> Result<()> {
    let args: PingArgs = parse_tool_args();
    let (config, _guard) = load_and_init(&args)?;

    let liveness = LivenessConfig::from(&config);
    let ctx = Context::with_config(liveness.transport.clone())?;

    let server = EchoServer::bind(&ctx, liveness.transport.clone(), &liveness.address)?;
    let server_handle = thread::Builder::new()
        .name("echo".to_string())
        .spawn(move || server.run())?;

    let client = LivenessClient::connect(&ctx, liveness)?;
    let outcome = client.run_with(|probe| {
        println!("{}: {:.2} ms", probe.message, probe.latency.as_secs_f64() * 1000.0);
    });

    ctx.terminate();
    let echoed = server_handle
        .join()
        .map_err(|_| anyhow!("echo server thread panicked"))??;

    let report = outcome?;
    info!(
        "{} rounds, {} probes, {} echoed, mean {:?}",
        report.rounds,
        report.probes,
        echoed.echoed,
        report.mean()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{e:#}");
        eprintln!("ping: {e:#}");
        process::exit(1);
    }
}
