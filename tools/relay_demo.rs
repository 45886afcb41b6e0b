// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fan-in relay session.
//!
//! Binds a relay on the inbound/outbound addresses, starts the configured
//! producers and a consumer, prints every message the consumer receives and
//! exits once all of them arrived.

use std::process;

use anyhow::Result;
use switchyard::cli::{load_and_init, parse_tool_args, RelayArgs};
use switchyard::devices::{run_harness_with, HarnessConfig};
use switchyard::transports::inproc::Context;
use tracing::{error, info, warn};

fn run() -> Result<bool> {
    let args: RelayArgs = parse_tool_args();
    let (config, _guard) = load_and_init(&args)?;

    let harness = HarnessConfig::from(&config);
    let ctx = Context::with_config(harness.transport.clone())?;
    let report = run_harness_with(&ctx, &harness, |message| {
        println!("{}", String::from_utf8_lossy(message));
    })?;

    for outcome in report.failed_producers() {
        if let Err(e) = &outcome.result {
            warn!("Producer {} failed: {}", outcome.identity, e);
        }
    }
    info!(
        "Received {} of {} messages; relay forwarded {}",
        report.received.len(),
        harness.expected_messages(),
        report.relay.forwarded
    );
    Ok(report.failed_producers().count() == 0)
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{e:#}");
            eprintln!("relay_demo: {e:#}");
            process::exit(1);
        }
    }
}
