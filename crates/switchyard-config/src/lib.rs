// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # switchyard configuration
//!
//! Type-safe configuration for the relay, harness, liveness and monitor
//! programs with support for:
//! - TOML file parsing
//! - Environment variable overrides (`SWITCHYARD_*`)
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use switchyard_config::{load_config, validate_config};
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! println!("Relay inbound: {}", config.relay.inbound_address);
//! println!("Producers: {}", config.harness.producers);
//! # Ok::<(), switchyard_config::ConfigError>(())
//! ```
//!
//! Every section has defaults, so a missing file section (or an empty file)
//! yields the stock setup: a relay on ports 5555/5556 fed by two producers of
//! ten messages each, a liveness echo on 10111 and a monitor walkthrough on
//! 6666/6667.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    load_config_or_default, CONFIG_FILE_NAME,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Address conflict: {0} and {1} both use {2}")]
    AddressConflict(String, String, String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_error_maps_to_parse_error() {
        let err = toml::from_str::<SwitchyardConfig>("[relay").unwrap_err();
        let config_err: ConfigError = err.into();
        assert!(matches!(config_err, ConfigError::ParseError(_)));
        assert!(config_err.to_string().starts_with("Invalid TOML syntax"));
    }
}
