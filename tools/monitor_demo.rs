// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle event walkthrough.
//!
//! Prints the event name table, then a monitored request endpoint binds the
//! monitor addresses; a reply endpoint connects to each of them in reverse
//! order, disconnects and closes. Every lifecycle event the request endpoint reports is printed by
//! the event monitor thread. After monitoring is disabled a second reply
//! endpoint repeats the exercise, which produces no further output.

use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use switchyard::cli::{load_and_init, parse_tool_args, MonitorArgs};
use switchyard::devices::{event_name_table, transport_config, EventMonitor};
use switchyard::transports::inproc::{Context, InprocRep, InprocReq};
use switchyard::transports::prelude::*;
use tracing::{error, info};

fn run() -> Result<()> {
    let args: MonitorArgs = parse_tool_args();
    let (config, _guard) = load_and_init(&args)?;

    let addresses = &config.monitor.addresses;
    if addresses.is_empty() {
        bail!("No monitor addresses configured");
    }
    let step = Duration::from_millis(config.monitor.step_delay_ms);
    let transport = transport_config(&config);
    let ctx = Context::with_config(transport.clone())?;

    println!("{}", event_name_table());

    let mut req = InprocReq::with_config(&ctx, transport.clone())?;
    let stream = req.enable_monitor(EventMask::ALL)?;
    let monitor = EventMonitor::new(stream).spawn(|event| {
        println!("{} {}", event.description, event.event.address);
    })?;

    println!("bind req");
    for address in addresses {
        req.bind(address)?;
    }
    thread::sleep(step);

    println!("connect rep");
    let mut rep = InprocRep::with_config(&ctx, transport.clone())?;
    for address in addresses.iter().rev() {
        rep.connect(address)?;
        thread::sleep(step);
    }
    println!("disconnect rep");
    for address in addresses.iter().rev() {
        rep.disconnect(address)?;
        thread::sleep(step);
    }
    println!("close rep");
    rep.close()?;
    thread::sleep(step);

    println!("disabling event monitor");
    req.disable_monitor()?;
    let report = monitor
        .join()
        .map_err(|_| anyhow!("event monitor thread panicked"))??;
    info!("Monitor saw {} events ({:?})", report.events, report.exit);

    // Unmonitored from here on.
    let last = &addresses[addresses.len() - 1];
    println!("connect rep");
    let mut late = InprocRep::with_config(&ctx, transport)?;
    late.connect(last)?;
    thread::sleep(step);
    println!("disconnect rep");
    late.disconnect(last)?;
    println!("close rep");
    late.close()?;

    println!("close req");
    req.close()?;
    ctx.terminate();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{e:#}");
        eprintln!("monitor_demo: {e:#}");
        process::exit(1);
    }
}
