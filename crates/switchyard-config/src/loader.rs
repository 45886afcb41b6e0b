// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SwitchyardConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "switchyard.toml";

/// Find the switchyard configuration file
///
/// Search order:
/// 1. `SWITCHYARD_CONFIG_PATH` environment variable
/// 2. Current working directory: `./switchyard.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SWITCHYARD_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SWITCHYARD_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet SWITCHYARD_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SwitchyardConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let config: SwitchyardConfig = toml::from_str(&content)?;
    Ok(with_overrides(config, cli_args))
}

/// Like [`load_config`], but falls back to the built-in defaults when no
/// file is found by searching
///
/// An explicit `config_path` that does not exist is still an error.
pub fn load_config_or_default(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SwitchyardConfig> {
    match load_config(config_path, cli_args) {
        Err(ConfigError::FileNotFound(_)) if config_path.is_none() => {
            Ok(with_overrides(SwitchyardConfig::default(), cli_args))
        }
        other => other,
    }
}

fn with_overrides(
    mut config: SwitchyardConfig,
    cli_args: Option<&HashMap<String, String>>,
) -> SwitchyardConfig {
    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }
    config
}

/// Parse `value` into `target`, leaving it untouched when parsing fails
fn set_parsed<T: FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SWITCHYARD_RELAY_INBOUND` -> `relay.inbound_address`
/// - `SWITCHYARD_RELAY_OUTBOUND` -> `relay.outbound_address`
/// - `SWITCHYARD_PRODUCERS` -> `harness.producers`
/// - `SWITCHYARD_MESSAGES_PER_PRODUCER` -> `harness.messages_per_producer`
/// - `SWITCHYARD_SEND_INTERVAL_MS` -> `harness.send_interval_ms`
/// - `SWITCHYARD_CONSUMER_DEADLINE_MS` -> `harness.consumer_deadline_ms`
/// - `SWITCHYARD_LIVENESS_ADDRESS` -> `liveness.address`
/// - `SWITCHYARD_MAX_ROUNDS` -> `liveness.max_rounds`
/// - `SWITCHYARD_MONITOR_ADDRESSES` -> `monitor.addresses` (comma separated)
/// - `SWITCHYARD_SEND_HWM` -> `transport.send_hwm`
/// - `SWITCHYARD_LOG_LEVEL` -> `logging.level`
/// - `SWITCHYARD_LOG_DIR` -> `logging.log_dir` (also enables file logging)
pub fn apply_environment_overrides(config: &mut SwitchyardConfig) {
    // Relay
    if let Ok(value) = env::var("SWITCHYARD_RELAY_INBOUND") {
        config.relay.inbound_address = value;
    }
    if let Ok(value) = env::var("SWITCHYARD_RELAY_OUTBOUND") {
        config.relay.outbound_address = value;
    }

    // Harness
    if let Ok(value) = env::var("SWITCHYARD_PRODUCERS") {
        set_parsed(&mut config.harness.producers, &value);
    }
    if let Ok(value) = env::var("SWITCHYARD_MESSAGES_PER_PRODUCER") {
        set_parsed(&mut config.harness.messages_per_producer, &value);
    }
    if let Ok(value) = env::var("SWITCHYARD_SEND_INTERVAL_MS") {
        set_parsed(&mut config.harness.send_interval_ms, &value);
    }
    if let Ok(value) = env::var("SWITCHYARD_CONSUMER_DEADLINE_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.harness.consumer_deadline_ms = Some(ms);
        }
    }

    // Liveness
    if let Ok(value) = env::var("SWITCHYARD_LIVENESS_ADDRESS") {
        config.liveness.address = value;
    }
    if let Ok(value) = env::var("SWITCHYARD_MAX_ROUNDS") {
        if let Ok(rounds) = value.parse::<u64>() {
            config.liveness.max_rounds = Some(rounds);
        }
    }

    // Monitor
    if let Ok(value) = env::var("SWITCHYARD_MONITOR_ADDRESSES") {
        config.monitor.addresses = parse_list(&value);
    }

    // Transport
    if let Ok(value) = env::var("SWITCHYARD_SEND_HWM") {
        set_parsed(&mut config.transport.send_hwm, &value);
    }

    // Logging
    if let Ok(value) = env::var("SWITCHYARD_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("SWITCHYARD_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(value);
        config.logging.file_logging = true;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"producers": "3", "interval_ms": "10"}`)
pub fn apply_cli_overrides(config: &mut SwitchyardConfig, cli_args: &HashMap<String, String>) {
    // Relay
    if let Some(value) = cli_args.get("inbound") {
        config.relay.inbound_address = value.clone();
    }
    if let Some(value) = cli_args.get("outbound") {
        config.relay.outbound_address = value.clone();
    }

    // Harness
    if let Some(value) = cli_args.get("producers") {
        set_parsed(&mut config.harness.producers, value);
    }
    if let Some(value) = cli_args.get("messages") {
        set_parsed(&mut config.harness.messages_per_producer, value);
    }
    if let Some(value) = cli_args.get("interval_ms") {
        set_parsed(&mut config.harness.send_interval_ms, value);
    }
    if let Some(value) = cli_args.get("deadline_ms") {
        if let Ok(ms) = value.parse::<u64>() {
            config.harness.consumer_deadline_ms = Some(ms);
        }
    }

    // Liveness
    if let Some(value) = cli_args.get("address") {
        config.liveness.address = value.clone();
    }
    if let Some(value) = cli_args.get("pause_min_ms") {
        set_parsed(&mut config.liveness.pause_min_ms, value);
    }
    if let Some(value) = cli_args.get("pause_max_ms") {
        set_parsed(&mut config.liveness.pause_max_ms, value);
    }
    if let Some(value) = cli_args.get("probes") {
        set_parsed(&mut config.liveness.probes_per_round, value);
    }
    if let Some(value) = cli_args.get("settle_ms") {
        set_parsed(&mut config.liveness.connect_settle_ms, value);
    }
    if let Some(value) = cli_args.get("rounds") {
        if let Ok(rounds) = value.parse::<u64>() {
            config.liveness.max_rounds = Some(rounds);
        }
    }

    // Monitor
    if let Some(value) = cli_args.get("monitor_addresses") {
        config.monitor.addresses = parse_list(value);
    }
    if let Some(value) = cli_args.get("step_delay_ms") {
        set_parsed(&mut config.monitor.step_delay_ms, value);
    }

    // Transport
    if let Some(value) = cli_args.get("send_hwm") {
        set_parsed(&mut config.transport.send_hwm, value);
    }
    if let Some(value) = cli_args.get("max_connections") {
        set_parsed(&mut config.transport.max_connections, value);
    }

    // Logging
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = PathBuf::from(value);
        config.logging.file_logging = true;
    }
    if let Some(value) = cli_args.get("file_logging") {
        config.logging.file_logging = parse_flag(value);
    }
}
