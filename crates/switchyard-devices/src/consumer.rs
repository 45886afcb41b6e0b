// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Counting consumer

use std::time::{Duration, Instant};

use switchyard_transports::inproc::{Context, InprocPull};
use switchyard_transports::{Delivery, Endpoint, Pull, TransportConfig, TransportError};
use tracing::{info, warn};

use crate::error::{DeviceError, DeviceResult};

/// Messages a consumer collected before completing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub received: Vec<Vec<u8>>,
}

/// Receives exactly `expected` messages, then closes its endpoint
///
/// Without a deadline the consumer waits as long as it takes; if producers
/// never deliver the full count it only returns on context termination.
pub struct Consumer<P: Pull> {
    endpoint: P,
    expected: usize,
    deadline: Option<Duration>,
}

impl Consumer<InprocPull> {
    /// Connect a PULL endpoint to `address`
    pub fn connect(
        ctx: &Context,
        transport: TransportConfig,
        address: &str,
        expected: usize,
    ) -> DeviceResult<Self> {
        let mut endpoint = InprocPull::with_config(ctx, transport)?;
        endpoint.connect(address)?;
        Ok(Self::new(endpoint, expected))
    }
}

impl<P: Pull> Consumer<P> {
    pub fn new(endpoint: P, expected: usize) -> Self {
        Self {
            endpoint,
            expected,
            deadline: None,
        }
    }

    /// Give up with [`DeviceError::IncompleteDelivery`] after `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn run(self) -> DeviceResult<ConsumerReport> {
        self.run_with(|message| info!("{}", String::from_utf8_lossy(message)))
    }

    /// Receive every expected message, handing each to `on_message`
    pub fn run_with<F: FnMut(&[u8])>(mut self, mut on_message: F) -> DeviceResult<ConsumerReport> {
        info!("[CONSUMER] Consuming {} messages", self.expected);
        let result = self.consume(&mut on_message);
        if let Err(e) = self.endpoint.close() {
            warn!("[CONSUMER] Failed to close: {}", e);
        }
        if result.is_ok() {
            info!("[CONSUMER] Consumer done");
        }
        result
    }

    fn consume(&self, on_message: &mut dyn FnMut(&[u8])) -> DeviceResult<ConsumerReport> {
        let started = Instant::now();
        let mut received = Vec::with_capacity(self.expected);

        while received.len() < self.expected {
            let delivery = match self.deadline {
                None => self.endpoint.pull()?,
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(started.elapsed());
                    match self.endpoint.pull_timeout(remaining) {
                        Err(TransportError::Timeout) => Delivery::Terminated,
                        other => other?,
                    }
                }
            };

            match delivery {
                Delivery::Delivered(message) => {
                    on_message(&message);
                    received.push(message);
                }
                Delivery::Terminated => {
                    warn!(
                        "[CONSUMER] Gave up after {} of {} messages",
                        received.len(),
                        self.expected
                    );
                    return Err(DeviceError::IncompleteDelivery {
                        received: received.len(),
                        expected: self.expected,
                    });
                }
            }
        }

        Ok(ConsumerReport { received })
    }
}
