// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Paced message producer

use std::time::Duration;

use chrono::Utc;
use switchyard_transports::inproc::{Context, InprocPush};
use switchyard_transports::{Delivery, Endpoint, Push, TransportConfig};
use tracing::{debug, info, warn};

use crate::error::{DeviceError, DeviceResult};

/// What a producer sends and how fast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    pub identity: String,
    pub messages: usize,
    pub interval: Duration,
}

impl ProducerConfig {
    pub fn new(identity: impl Into<String>, messages: usize) -> Self {
        Self {
            identity: identity.into(),
            messages,
            interval: Duration::from_secs(1),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// How far a producer got
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub identity: String,
    pub sent: usize,
    /// False when the context was terminated before all messages went out
    pub completed: bool,
}

/// Sends `messages` labeled payloads of the form `"{identity}: {unix secs}"`
pub struct Producer<P: Push> {
    ctx: Context,
    endpoint: P,
    config: ProducerConfig,
}

impl Producer<InprocPush> {
    /// Connect a PUSH endpoint to `address`
    pub fn connect(
        ctx: &Context,
        transport: TransportConfig,
        address: &str,
        config: ProducerConfig,
    ) -> DeviceResult<Self> {
        let mut endpoint = InprocPush::with_config(ctx, transport)?;
        endpoint.connect(address)?;
        Ok(Self::new(ctx, endpoint, config))
    }
}

impl<P: Push> Producer<P> {
    /// `ctx` paces the producer; its termination cuts a pause short
    pub fn new(ctx: &Context, endpoint: P, config: ProducerConfig) -> Self {
        Self {
            ctx: ctx.clone(),
            endpoint,
            config,
        }
    }

    /// Send every message, then close the endpoint
    ///
    /// A send failure ends this producer only; it is reported as
    /// [`DeviceError::ProducerFailed`].
    pub fn run(mut self) -> DeviceResult<ProducerReport> {
        info!("[PRODUCER] Producing {}", self.config.identity);
        let result = self.produce();
        if let Err(e) = self.endpoint.close() {
            warn!("[PRODUCER] {} failed to close: {}", self.config.identity, e);
        }

        let report = result.map_err(|e| DeviceError::ProducerFailed {
            identity: self.config.identity.clone(),
            reason: e.to_string(),
        })?;
        if report.completed {
            info!("[PRODUCER] Producer {} done", report.identity);
        } else {
            info!(
                "[PRODUCER] Producer {} stopped after {} of {} messages",
                report.identity, report.sent, self.config.messages
            );
        }
        Ok(report)
    }

    fn produce(&self) -> DeviceResult<ProducerReport> {
        let mut report = ProducerReport {
            identity: self.config.identity.clone(),
            sent: 0,
            completed: false,
        };

        for i in 0..self.config.messages {
            if i > 0 && self.ctx.sleep(self.config.interval).is_terminated() {
                return Ok(report);
            }

            let message = format!("{}: {}", self.config.identity, Utc::now().timestamp());
            match self.endpoint.push(message.as_bytes())? {
                Delivery::Delivered(()) => {
                    report.sent += 1;
                    debug!("[PRODUCER] sent {:?}", message);
                }
                Delivery::Terminated => return Ok(report),
            }
        }

        report.completed = true;
        Ok(report)
    }
}
