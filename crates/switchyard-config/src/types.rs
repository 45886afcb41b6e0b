// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `switchyard.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    pub relay: RelayConfig,
    pub harness: HarnessSettings,
    pub liveness: LivenessSettings,
    pub monitor: MonitorSettings,
    pub transport: TransportSettings,
    pub logging: LoggingConfig,
}

impl SwitchyardConfig {
    /// Every configured endpoint address with the key it was read from
    pub fn all_addresses(&self) -> Vec<(String, &str)> {
        let mut addresses = vec![
            ("relay.inbound_address".to_string(), self.relay.inbound_address.as_str()),
            ("relay.outbound_address".to_string(), self.relay.outbound_address.as_str()),
            ("liveness.address".to_string(), self.liveness.address.as_str()),
        ];
        for (i, address) in self.monitor.addresses.iter().enumerate() {
            addresses.push((format!("monitor.addresses[{}]", i), address.as_str()));
        }
        addresses
    }
}

/// Relay device addresses
///
/// The relay binds both; producers connect to the inbound address and the
/// consumer connects to the outbound one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub inbound_address: String,
    pub outbound_address: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            inbound_address: "tcp://127.0.0.1:5555".to_string(),
            outbound_address: "tcp://127.0.0.1:5556".to_string(),
        }
    }
}

/// Producer/consumer harness settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarnessSettings {
    pub producers: usize,
    pub messages_per_producer: usize,
    pub send_interval_ms: u64,
    /// Overall consumer deadline; absent means wait forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_deadline_ms: Option<u64>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            producers: 2,
            messages_per_producer: 10,
            send_interval_ms: 1000,
            consumer_deadline_ms: None,
        }
    }
}

/// Liveness client (and echo server) settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LivenessSettings {
    pub address: String,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    pub probes_per_round: usize,
    pub connect_settle_ms: u64,
    /// Stop after this many rounds; absent means run until terminated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u64>,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            address: "tcp://127.0.0.1:10111".to_string(),
            pause_min_ms: 0,
            pause_max_ms: 1000,
            probes_per_round: 4,
            connect_settle_ms: 1000,
            max_rounds: None,
        }
    }
}

/// Monitor walkthrough settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Addresses the monitored endpoint binds
    pub addresses: Vec<String>,
    /// Pause between walkthrough steps
    pub step_delay_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            addresses: vec![
                "tcp://127.0.0.1:6666".to_string(),
                "tcp://127.0.0.1:6667".to_string(),
            ],
            step_delay_ms: 200,
        }
    }
}

/// Endpoint settings shared by every endpoint a program creates
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Messages queued per pipe before a send blocks
    pub send_hwm: usize,
    /// Largest accepted payload in bytes; 0 disables the check
    pub max_message_size: usize,
    /// Peers accepted per bound address; 0 means unlimited
    pub max_connections: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            send_hwm: 1000,
            max_message_size: 10 * 1024 * 1024,
            max_connections: 0,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_logging: bool,
    pub log_dir: PathBuf,
    /// Run folders kept in `log_dir`
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_runs: 10,
        }
    }
}
