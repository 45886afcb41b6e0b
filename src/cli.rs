// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command lines of the demo binaries
//!
//! Each binary has a `clap` argument struct sharing [`CommonArgs`]. Parsed
//! values are turned into the override map that
//! [`apply_cli_overrides`](switchyard_config::apply_cli_overrides) applies on
//! top of the configuration file. The per-crate `--debug-*` flags are read by
//! [`parse_debug_flags`] and removed before `clap` sees the arguments.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser};
use switchyard_config::{load_config_or_default, validate_config, SwitchyardConfig};
use switchyard_observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingGuard};
use tracing::info;

/// Options every demo binary accepts
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonArgs {
    /// Path to the configuration file (default: search for switchyard.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pipe high water mark in messages
    #[arg(long)]
    pub send_hwm: Option<usize>,

    /// Peers allowed per bound address (0 = unlimited)
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Default log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write JSON log files to a run folder in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Write JSON log files to the configured log directory
    #[arg(long, default_value_t = false)]
    pub file_logging: bool,
}

/// Fan-in relay session
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "relay_demo", version, about, after_help = debug_flags_help())]
pub struct RelayArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Address the relay collects on
    #[arg(long)]
    pub inbound: Option<String>,

    /// Address the relay distributes on
    #[arg(long)]
    pub outbound: Option<String>,

    /// Number of producers
    #[arg(long)]
    pub producers: Option<usize>,

    /// Messages sent by each producer
    #[arg(long)]
    pub messages: Option<usize>,

    /// Pause between two sends of one producer, in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Give up when the consumer is still short after this many milliseconds
    #[arg(long)]
    pub deadline_ms: Option<u64>,
}

/// Liveness probing against an in-process echo server
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "ping", version, about, after_help = debug_flags_help())]
pub struct PingArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Address of the echo server
    #[arg(long)]
    pub address: Option<String>,

    /// Stop after this many rounds (default: run until killed)
    #[arg(long)]
    pub rounds: Option<u64>,

    /// Probes per round
    #[arg(long)]
    pub probes: Option<usize>,

    /// Lower bound of the random pause before a round, in milliseconds
    #[arg(long)]
    pub pause_min_ms: Option<u64>,

    /// Exclusive upper bound of the random pause, in milliseconds
    #[arg(long)]
    pub pause_max_ms: Option<u64>,

    /// Wait after connecting before the first round, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,
}

/// Lifecycle event walkthrough
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "monitor_demo", version, about, after_help = debug_flags_help())]
pub struct MonitorArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Addresses the monitored endpoint binds (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub monitor_addresses: Vec<String>,

    /// Pause between walkthrough steps, in milliseconds
    #[arg(long)]
    pub step_delay_ms: Option<u64>,
}

/// A demo command line that can be layered over the configuration file
pub trait ToolCommand {
    fn common(&self) -> &CommonArgs;

    /// Overrides for the options specific to this binary
    fn tool_overrides(&self, overrides: &mut HashMap<String, String>);

    /// Every given option, keyed as `apply_cli_overrides` expects
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let common = self.common();
        put(&mut overrides, "send_hwm", common.send_hwm);
        put(&mut overrides, "max_connections", common.max_connections);
        put(&mut overrides, "log_level", common.log_level.as_ref());
        put(
            &mut overrides,
            "log_dir",
            common.log_dir.as_ref().map(|dir| dir.display()),
        );
        if common.file_logging {
            put(&mut overrides, "file_logging", Some(true));
        }
        self.tool_overrides(&mut overrides);
        overrides
    }
}

fn put<T: ToString>(overrides: &mut HashMap<String, String>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        overrides.insert(key.to_string(), value.to_string());
    }
}

impl ToolCommand for RelayArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn tool_overrides(&self, overrides: &mut HashMap<String, String>) {
        put(overrides, "inbound", self.inbound.as_ref());
        put(overrides, "outbound", self.outbound.as_ref());
        put(overrides, "producers", self.producers);
        put(overrides, "messages", self.messages);
        put(overrides, "interval_ms", self.interval_ms);
        put(overrides, "deadline_ms", self.deadline_ms);
    }
}

impl ToolCommand for PingArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn tool_overrides(&self, overrides: &mut HashMap<String, String>) {
        put(overrides, "address", self.address.as_ref());
        put(overrides, "rounds", self.rounds);
        put(overrides, "probes", self.probes);
        put(overrides, "pause_min_ms", self.pause_min_ms);
        put(overrides, "pause_max_ms", self.pause_max_ms);
        put(overrides, "settle_ms", self.settle_ms);
    }
}

impl ToolCommand for MonitorArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn tool_overrides(&self, overrides: &mut HashMap<String, String>) {
        if !self.monitor_addresses.is_empty() {
            put(overrides, "monitor_addresses", Some(self.monitor_addresses.join(",")));
        }
        put(overrides, "step_delay_ms", self.step_delay_ms);
    }
}

/// Drop `--debug-*` flags, which belong to [`parse_debug_flags`]
pub fn without_debug_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .filter(|arg| !arg.starts_with("--debug-"))
        .collect()
}

/// Parse the process arguments; exits with usage on error or `--help`
pub fn parse_tool_args<T: Parser>() -> T {
    T::parse_from(without_debug_flags(env::args()))
}

/// Load and validate the configuration, then start logging
///
/// Keep the returned guard alive for the lifetime of the program.
pub fn load_and_init<T: ToolCommand>(args: &T) -> Result<(SwitchyardConfig, LoggingGuard)> {
    let overrides = args.overrides();
    let config = load_config_or_default(args.common().config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let guard = init_logging(&parse_debug_flags(), &crate::logging_options(&config.logging))?;
    if let Some(dir) = guard.log_dir() {
        info!("Logging to {}", dir.display());
    }
    Ok((config, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relay_overrides_and_config_path() {
        let parsed = RelayArgs::try_parse_from([
            "relay_demo",
            "--config",
            "demo.toml",
            "--producers",
            "3",
            "--interval-ms",
            "10",
            "--send-hwm",
            "64",
        ])
        .unwrap();
        assert_eq!(parsed.common.config, Some(PathBuf::from("demo.toml")));

        let overrides = parsed.overrides();
        assert_eq!(overrides.len(), 3);
        assert_eq!(overrides["producers"], "3");
        assert_eq!(overrides["interval_ms"], "10");
        assert_eq!(overrides["send_hwm"], "64");
    }

    #[test]
    fn test_overrides_reach_the_config() {
        let parsed =
            PingArgs::try_parse_from(["ping", "--rounds", "2", "--address", "inproc://echo"])
                .unwrap();
        let mut config = SwitchyardConfig::default();
        switchyard_config::apply_cli_overrides(&mut config, &parsed.overrides());
        assert_eq!(config.liveness.max_rounds, Some(2));
        assert_eq!(config.liveness.address, "inproc://echo");
        assert_eq!(config.liveness.probes_per_round, 4);
    }

    #[test]
    fn test_monitor_addresses_are_a_list() {
        let parsed = MonitorArgs::try_parse_from([
            "monitor_demo",
            "--monitor-addresses",
            "inproc://a,inproc://b",
            "--file-logging",
        ])
        .unwrap();
        assert_eq!(parsed.monitor_addresses, vec!["inproc://a", "inproc://b"]);

        let overrides = parsed.overrides();
        assert_eq!(overrides["monitor_addresses"], "inproc://a,inproc://b");
        assert_eq!(overrides["file_logging"], "true");
    }

    #[test]
    fn test_debug_flags_are_left_to_observability() {
        let filtered = without_debug_flags(args(&[
            "relay_demo",
            "--debug-switchyard-devices",
            "--messages",
            "5",
            "--debug-all",
        ]));
        assert_eq!(filtered, args(&["relay_demo", "--messages", "5"]));
        let parsed = RelayArgs::try_parse_from(filtered).unwrap();
        assert_eq!(parsed.messages, Some(5));
    }

    #[test]
    fn test_malformed_arguments_rejected() {
        assert!(RelayArgs::try_parse_from(["relay_demo", "producers"]).is_err());
        assert!(RelayArgs::try_parse_from(["relay_demo", "--producers"]).is_err());
        assert!(RelayArgs::try_parse_from(["relay_demo", "--producers", "many"]).is_err());
        let help = PingArgs::try_parse_from(["ping", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
    }
}
