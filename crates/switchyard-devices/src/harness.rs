// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Producer / relay / consumer harness
//!
//! Startup order is fixed: the relay binds both addresses, then the consumer
//! and the producers connect, then every unit gets its own thread. The
//! harness waits for the consumer, terminates the context to stop the relay
//! and any producer still pacing, and joins everything.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use switchyard_config::SwitchyardConfig;
use switchyard_transports::inproc::Context;
use switchyard_transports::TransportConfig;
use tracing::{error, info, warn};

use crate::consumer::{Consumer, ConsumerReport};
use crate::error::{DeviceError, DeviceResult};
use crate::producer::{Producer, ProducerConfig, ProducerReport};
use crate::relay::{Relay, RelayReport};

/// Everything needed to run one fan-in session
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub inbound_address: String,
    pub outbound_address: String,
    pub producers: usize,
    pub messages_per_producer: usize,
    pub send_interval: Duration,
    pub consumer_deadline: Option<Duration>,
    pub transport: TransportConfig,
}

impl HarnessConfig {
    pub fn expected_messages(&self) -> usize {
        self.producers * self.messages_per_producer
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::from(&SwitchyardConfig::default())
    }
}

impl From<&SwitchyardConfig> for HarnessConfig {
    fn from(config: &SwitchyardConfig) -> Self {
        Self {
            inbound_address: config.relay.inbound_address.clone(),
            outbound_address: config.relay.outbound_address.clone(),
            producers: config.harness.producers,
            messages_per_producer: config.harness.messages_per_producer,
            send_interval: Duration::from_millis(config.harness.send_interval_ms),
            consumer_deadline: config.harness.consumer_deadline_ms.map(Duration::from_millis),
            transport: crate::transport_config(config),
        }
    }
}

/// How one producer ended
#[derive(Debug)]
pub struct ProducerOutcome {
    pub identity: String,
    pub result: DeviceResult<ProducerReport>,
}

/// Result of a completed session
#[derive(Debug)]
pub struct HarnessReport {
    /// Messages in the order the consumer received them
    pub received: Vec<Vec<u8>>,
    pub relay: RelayReport,
    pub producers: Vec<ProducerOutcome>,
}

impl HarnessReport {
    pub fn failed_producers(&self) -> impl Iterator<Item = &ProducerOutcome> {
        self.producers.iter().filter(|p| p.result.is_err())
    }
}

fn spawn_named<T, F>(name: String, f: F) -> DeviceResult<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|e| DeviceError::WorkerPanicked(format!("{} (spawn failed: {})", name, e)))
}

fn join_named<T>(name: &str, handle: JoinHandle<DeviceResult<T>>) -> DeviceResult<T> {
    handle
        .join()
        .map_err(|_| DeviceError::WorkerPanicked(name.to_string()))?
}

/// Run a session, logging every consumed message
pub fn run_harness(ctx: &Context, config: &HarnessConfig) -> DeviceResult<HarnessReport> {
    run_harness_with(ctx, config, |message| {
        info!("{}", String::from_utf8_lossy(message))
    })
}

/// Run a session, handing every consumed message to `on_message`
///
/// The context is terminated before this returns, whatever the outcome.
/// A consumer failure is returned; producer failures are only reported.
pub fn run_harness_with<F>(
    ctx: &Context,
    config: &HarnessConfig,
    on_message: F,
) -> DeviceResult<HarnessReport>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    let result = start_and_wait(ctx, config, on_message);
    // Unblocks anything left over on a setup failure.
    ctx.terminate();
    result
}

fn start_and_wait<F>(ctx: &Context, config: &HarnessConfig, on_message: F) -> DeviceResult<HarnessReport>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    let transport = config.transport.clone();

    // Bind before anything connects.
    let mut relay = Relay::bind_with_config(
        ctx,
        transport.clone(),
        &config.inbound_address,
        &config.outbound_address,
    )?;

    let consumer = Consumer::connect(
        ctx,
        transport.clone(),
        &config.outbound_address,
        config.expected_messages(),
    )?
    .with_deadline(config.consumer_deadline);

    let mut producers = Vec::with_capacity(config.producers);
    for i in 0..config.producers {
        let producer_config = ProducerConfig::new(i.to_string(), config.messages_per_producer)
            .with_interval(config.send_interval);
        producers.push(Producer::connect(
            ctx,
            transport.clone(),
            &config.inbound_address,
            producer_config,
        )?);
    }

    info!(
        "[HARNESS] {} producers x {} messages through {} -> {}",
        config.producers, config.messages_per_producer, config.inbound_address, config.outbound_address
    );

    let consumer_handle = spawn_named("consumer".to_string(), move || consumer.run_with(on_message))?;
    let relay_handle = spawn_named("relay".to_string(), move || relay.run())?;
    let mut producer_handles = Vec::with_capacity(producers.len());
    for (i, producer) in producers.into_iter().enumerate() {
        let handle = spawn_named(format!("producer-{}", i), move || producer.run())?;
        producer_handles.push((i.to_string(), handle));
    }

    let consumed: DeviceResult<ConsumerReport> = join_named("consumer", consumer_handle);
    if let Err(e) = &consumed {
        error!("[HARNESS] Consumer failed: {}", e);
    }

    // Consumer is done either way; stop the relay and any producer still pacing.
    ctx.terminate();

    let relay_result = join_named("relay", relay_handle);
    let producers: Vec<ProducerOutcome> = producer_handles
        .into_iter()
        .map(|(identity, handle)| {
            let result = join_named(&format!("producer-{}", identity), handle);
            if let Err(e) = &result {
                warn!("[HARNESS] {}", e);
            }
            ProducerOutcome { identity, result }
        })
        .collect();

    let received = consumed?.received;
    let relay = relay_result?;
    info!(
        "[HARNESS] Consumer received {} messages, relay forwarded {}",
        received.len(),
        relay.forwarded
    );

    Ok(HarnessReport {
        received,
        relay,
        producers,
    })
}
