// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Liveness client
//!
//! Probes a request/reply peer with sequenced `"ping {n}"` messages after a
//! random pause, measuring each round trip. The peer must echo the probe bit
//! for bit; anything else is a correlation failure and ends the client.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use switchyard_config::SwitchyardConfig;
use switchyard_transports::inproc::{Context, InprocReq};
use switchyard_transports::{Delivery, Endpoint, RequestReplyClient, TransportConfig};
use tracing::{info, warn};

use crate::error::{DeviceError, DeviceResult};

/// Pacing and bounds of a liveness run
#[derive(Debug, Clone, PartialEq)]
pub struct LivenessConfig {
    pub address: String,
    /// Lower bound of the random pause before each round
    pub pause_min: Duration,
    /// Exclusive upper bound of the random pause
    pub pause_max: Duration,
    pub probes_per_round: usize,
    /// Wait after connecting before the first round
    pub connect_settle: Duration,
    /// Stop after this many rounds; `None` runs until terminated
    pub max_rounds: Option<u64>,
    /// Seed for the pause generator; `None` seeds from entropy
    pub seed: Option<u64>,
    pub transport: TransportConfig,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self::from(&SwitchyardConfig::default())
    }
}

impl From<&SwitchyardConfig> for LivenessConfig {
    fn from(config: &SwitchyardConfig) -> Self {
        let liveness = &config.liveness;
        Self {
            address: liveness.address.clone(),
            pause_min: Duration::from_millis(liveness.pause_min_ms),
            pause_max: Duration::from_millis(liveness.pause_max_ms),
            probes_per_round: liveness.probes_per_round,
            connect_settle: Duration::from_millis(liveness.connect_settle_ms),
            max_rounds: liveness.max_rounds,
            seed: None,
            transport: crate::transport_config(config),
        }
    }
}

/// One completed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    pub sequence: u64,
    pub message: String,
    pub latency: Duration,
}

/// Round-trip statistics of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessReport {
    pub rounds: u64,
    pub probes: u64,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
    total: Duration,
}

impl LivenessReport {
    fn record(&mut self, latency: Duration) {
        self.probes += 1;
        self.total += latency;
        self.min = Some(self.min.map_or(latency, |m| m.min(latency)));
        self.max = Some(self.max.map_or(latency, |m| m.max(latency)));
    }

    pub fn mean(&self) -> Option<Duration> {
        u32::try_from(self.probes)
            .ok()
            .filter(|&n| n > 0)
            .map(|n| self.total / n)
    }
}

/// Sequenced request/reply prober
pub struct LivenessClient<C: RequestReplyClient> {
    ctx: Context,
    endpoint: C,
    config: LivenessConfig,
    rng: StdRng,
    sequence: u64,
}

impl LivenessClient<InprocReq> {
    /// Connect a REQUEST endpoint to `config.address`
    pub fn connect(ctx: &Context, config: LivenessConfig) -> DeviceResult<Self> {
        let mut endpoint = InprocReq::with_config(ctx, config.transport.clone())?;
        endpoint.connect(&config.address)?;
        Ok(Self::new(ctx, endpoint, config))
    }
}

impl<C: RequestReplyClient> LivenessClient<C> {
    pub fn new(ctx: &Context, endpoint: C, config: LivenessConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ctx: ctx.clone(),
            endpoint,
            config,
            rng,
            sequence: 0,
        }
    }

    /// Sequence number of the most recent probe
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn next_pause(&mut self) -> Duration {
        let (min, max) = (self.config.pause_min, self.config.pause_max);
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Send the next probe and wait for its echo
    pub fn probe(&mut self) -> DeviceResult<Delivery<ProbeRecord>> {
        self.sequence += 1;
        let message = format!("ping {}", self.sequence);

        let started = Instant::now();
        let reply = match self.endpoint.request(message.as_bytes())? {
            Delivery::Delivered(reply) => reply,
            Delivery::Terminated => return Ok(Delivery::Terminated),
        };
        let latency = started.elapsed();

        info!("{}: {:.2} ms", message, latency.as_secs_f64() * 1000.0);
        if reply != message.as_bytes() {
            return Err(DeviceError::CorrelationMismatch {
                sent: message,
                received: String::from_utf8_lossy(&reply).into_owned(),
            });
        }

        Ok(Delivery::Delivered(ProbeRecord {
            sequence: self.sequence,
            message,
            latency,
        }))
    }

    pub fn run(self) -> DeviceResult<LivenessReport> {
        self.run_with(|_| {})
    }

    /// Probe until terminated or `max_rounds` is reached, then close
    pub fn run_with<F: FnMut(&ProbeRecord)>(mut self, mut on_probe: F) -> DeviceResult<LivenessReport> {
        let result = self.probe_rounds(&mut on_probe);
        if let Err(e) = self.endpoint.close() {
            warn!("[LIVENESS] Failed to close: {}", e);
        }
        match &result {
            Ok(report) => info!(
                "[LIVENESS] Stopped after {} rounds, {} probes (mean {:?})",
                report.rounds,
                report.probes,
                report.mean()
            ),
            Err(e) => warn!("[LIVENESS] {}", e),
        }
        result
    }

    fn probe_rounds(&mut self, on_probe: &mut dyn FnMut(&ProbeRecord)) -> DeviceResult<LivenessReport> {
        let mut report = LivenessReport::default();

        if self.ctx.sleep(self.config.connect_settle).is_terminated() {
            return Ok(report);
        }

        while self.config.max_rounds.map_or(true, |max| report.rounds < max) {
            let pause = self.next_pause();
            if self.ctx.sleep(pause).is_terminated() {
                return Ok(report);
            }

            for _ in 0..self.config.probes_per_round {
                match self.probe()? {
                    Delivery::Delivered(record) => {
                        report.record(record.latency);
                        on_probe(&record);
                    }
                    Delivery::Terminated => return Ok(report),
                }
            }
            report.rounds += 1;
        }

        Ok(report)
    }
}
