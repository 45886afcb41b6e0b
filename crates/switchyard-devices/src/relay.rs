// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Relay device
//!
//! Collects messages on a PULL endpoint and hands each one, unmodified, to a
//! PUSH endpoint. Both endpoints are bound before the relay is returned, so
//! producers and consumers can connect as soon as [`Relay::bind`] succeeds.

use switchyard_transports::inproc::{Context, InprocPull, InprocPush};
use switchyard_transports::{Delivery, Endpoint, Pull, Push, TransportConfig};
use tracing::{debug, error, info, warn};

use crate::error::DeviceResult;

/// Outcome of a relay run that ended on context termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayReport {
    pub forwarded: u64,
}

/// Forwarding device between an inbound collector and an outbound distributor
///
/// At most one message is in flight. A message that was fully received is
/// still forwarded when termination arrives during the hand-off, provided the
/// outbound pipe has room for it.
pub struct Relay<I: Pull, O: Push> {
    inbound: I,
    outbound: O,
    running: bool,
}

impl Relay<InprocPull, InprocPush> {
    /// Bind the collector and the distributor with the context's settings
    pub fn bind(ctx: &Context, inbound_addr: &str, outbound_addr: &str) -> DeviceResult<Self> {
        Self::bind_with_config(ctx, ctx.config().clone(), inbound_addr, outbound_addr)
    }

    pub fn bind_with_config(
        ctx: &Context,
        config: TransportConfig,
        inbound_addr: &str,
        outbound_addr: &str,
    ) -> DeviceResult<Self> {
        let mut inbound = InprocPull::with_config(ctx, config.clone())?;
        inbound.bind(inbound_addr)?;
        let mut outbound = InprocPush::with_config(ctx, config)?;
        outbound.bind(outbound_addr)?;
        info!("[RELAY] Bound {} -> {}", inbound_addr, outbound_addr);
        Ok(Self::new(inbound, outbound))
    }
}

impl<I: Pull, O: Push> Relay<I, O> {
    /// Wrap two endpoints that are already bound
    pub fn new(inbound: I, outbound: O) -> Self {
        Self {
            inbound,
            outbound,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Forward until the context is terminated
    ///
    /// Both endpoints are closed on every exit path. Termination is a clean
    /// stop; any other transport failure is returned. A message already
    /// received when termination arrives is forwarded if the outbound pipe
    /// has room for it, and otherwise dropped with a warning.
    pub fn run(&mut self) -> DeviceResult<RelayReport> {
        self.running = true;
        info!(
            "[RELAY] Running ({} -> {})",
            self.inbound.endpoint_type(),
            self.outbound.endpoint_type()
        );
        let result = self.forward_all();
        self.running = false;
        self.shutdown();

        match &result {
            Ok(report) => info!("[RELAY] Terminated after forwarding {} messages", report.forwarded),
            Err(e) => error!("[RELAY] Stopped on error: {}", e),
        }
        result
    }

    fn forward_all(&mut self) -> DeviceResult<RelayReport> {
        let mut report = RelayReport::default();
        loop {
            let message = match self.inbound.pull()? {
                Delivery::Delivered(message) => message,
                Delivery::Terminated => return Ok(report),
            };

            match self.outbound.push(&message)? {
                Delivery::Delivered(()) => {
                    report.forwarded += 1;
                    debug!("[RELAY] Forwarded {} bytes", message.len());
                }
                Delivery::Terminated => {
                    warn!(
                        "[RELAY] Outbound pipe full at termination; dropped {} bytes",
                        message.len()
                    );
                    return Ok(report);
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.inbound.close() {
            warn!("[RELAY] Failed to close inbound endpoint: {}", e);
        }
        if let Err(e) = self.outbound.close() {
            warn!("[RELAY] Failed to close outbound endpoint: {}", e);
        }
    }
}
