// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Switchyard - message-queue devices
//!
//! Small long-running actors wired together with push/pull and
//! request/reply endpoints:
//!
//! - a fan-in **relay** that forwards everything a group of producers sends
//!   to a consumer
//! - a **liveness** client that probes an echo server with sequenced
//!   requests and reports round-trip latency
//! - a lifecycle **event monitor** that decodes what an endpoint's
//!   management stream reports (listening, accepted, disconnected, ...)
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! switchyard = "0.1"
//! ```
//!
//! ```rust
//! use std::time::Duration;
//! use switchyard::prelude::*;
//!
//! let ctx = Context::new();
//! let config = HarnessConfig {
//!     inbound_address: "inproc://quickstart-in".to_string(),
//!     outbound_address: "inproc://quickstart-out".to_string(),
//!     send_interval: Duration::from_millis(1),
//!     ..HarnessConfig::default()
//! };
//! let report = run_harness(&ctx, &config)?;
//! assert_eq!(report.received.len(), config.expected_messages());
//! # Ok::<(), switchyard::devices::DeviceError>(())
//! ```
//!
//! ## Crates
//!
//! - [`transports`]: endpoints, patterns and lifecycle events
//! - [`devices`]: relay, harness, liveness client, echo server, event monitor
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`observability`]: logging setup with per-crate debug flags

pub mod cli;

pub use switchyard_config as config;
pub use switchyard_devices as devices;
pub use switchyard_observability as observability;
pub use switchyard_transports as transports;

use switchyard_config::LoggingConfig;
use switchyard_observability::LoggingOptions;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logging options for the `[logging]` section of a configuration file
pub fn logging_options(config: &LoggingConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.level.clone(),
        file_logging: config.file_logging,
        log_dir: config.log_dir.clone(),
        retention_runs: config.retention_runs,
        ..LoggingOptions::default()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use switchyard_config::{load_config_or_default, SwitchyardConfig};
    pub use switchyard_devices::{
        run_harness, run_harness_with, DescribedEvent, DeviceError, DeviceResult, EchoServer,
        EventMonitor, HarnessConfig, LivenessClient, LivenessConfig, MonitorExit, Relay,
    };
    pub use switchyard_transports::inproc::{
        Context, InprocPull, InprocPush, InprocRep, InprocReq,
    };
    pub use switchyard_transports::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_logging_options_follow_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            file_logging: true,
            log_dir: PathBuf::from("/tmp/switchyard-logs"),
            retention_runs: 3,
        };
        let options = logging_options(&config);
        assert_eq!(options.level, "debug");
        assert!(options.file_logging);
        assert_eq!(options.log_dir, PathBuf::from("/tmp/switchyard-logs"));
        assert_eq!(options.retention_runs, 3);
        assert_eq!(options.retention_days, LoggingOptions::default().retention_days);
    }
}
