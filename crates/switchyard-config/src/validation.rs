// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module provides validation logic to ensure configuration values are
//! consistent, within valid ranges, and don't conflict with each other.

use std::collections::HashMap;

use crate::{ConfigError, ConfigResult, SwitchyardConfig};

const SCHEMES: [&str; 3] = ["inproc://", "tcp://", "ipc://"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    UnsupportedAddress { field: String, address: String },
    AddressConflict { field1: String, field2: String, address: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::UnsupportedAddress { field, address } => {
                write!(
                    f,
                    "{} = '{}' must start with inproc://, tcp:// or ipc://",
                    field, address
                )
            }
            Self::AddressConflict {
                field1,
                field2,
                address,
            } => {
                write!(
                    f,
                    "Address conflict: {} and {} both use {}",
                    field1, field2, address
                )
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Empty or unsupported addresses
/// - Addresses used by two endpoints
/// - Zero counts and an inverted pause range
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &SwitchyardConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every problem found in `config`, in a stable order
pub fn collect_errors(config: &SwitchyardConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_addresses(config, &mut errors);
    validate_address_conflicts(config, &mut errors);
    validate_value_ranges(config, &mut errors);
    errors
}

fn validate_addresses(config: &SwitchyardConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.monitor.addresses.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "monitor.addresses".to_string(),
        });
    }

    for (field, address) in config.all_addresses() {
        if address.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired { field });
        } else if !SCHEMES.iter().any(|scheme| address.starts_with(scheme)) {
            errors.push(ConfigValidationError::UnsupportedAddress {
                field,
                address: address.to_string(),
            });
        }
    }
}

/// Relay, liveness and monitor endpoints live in one process, so no two of
/// them may claim the same address
fn validate_address_conflicts(config: &SwitchyardConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen: HashMap<&str, String> = HashMap::new();
    for (field, address) in config.all_addresses() {
        if address.is_empty() {
            continue;
        }
        match seen.get(address) {
            Some(first) => errors.push(ConfigValidationError::AddressConflict {
                field1: first.clone(),
                field2: field,
                address: address.to_string(),
            }),
            None => {
                seen.insert(address, field);
            }
        }
    }
}

fn validate_value_ranges(config: &SwitchyardConfig, errors: &mut Vec<ConfigValidationError>) {
    let positive = [
        ("harness.producers", config.harness.producers),
        ("harness.messages_per_producer", config.harness.messages_per_producer),
        ("liveness.probes_per_round", config.liveness.probes_per_round),
        ("transport.send_hwm", config.transport.send_hwm),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
    }

    if config.liveness.pause_min_ms >= config.liveness.pause_max_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "liveness.pause_min_ms".to_string(),
            reason: format!(
                "must be below liveness.pause_max_ms ({})",
                config.liveness.pause_max_ms
            ),
        });
    }

    if config.harness.consumer_deadline_ms == Some(0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "harness.consumer_deadline_ms".to_string(),
            reason: "must be positive when set".to_string(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: "must be one of trace, debug, info, warn, error".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SwitchyardConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_address() {
        let mut config = SwitchyardConfig::default();
        config.relay.outbound_address = String::new();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("relay.outbound_address"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_unsupported_scheme() {
        let mut config = SwitchyardConfig::default();
        config.liveness.address = "udp://127.0.0.1:10111".to_string();

        assert_eq!(
            collect_errors(&config),
            vec![ConfigValidationError::UnsupportedAddress {
                field: "liveness.address".to_string(),
                address: "udp://127.0.0.1:10111".to_string(),
            }]
        );
    }

    #[test]
    fn test_address_conflict() {
        let mut config = SwitchyardConfig::default();
        config.relay.outbound_address = config.relay.inbound_address.clone();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("Address conflict"));
            assert!(msg.contains("5555"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut config = SwitchyardConfig::default();
        config.harness.producers = 0;
        config.transport.send_hwm = 0;

        let fields: Vec<String> = collect_errors(&config)
            .into_iter()
            .filter_map(|e| match e {
                ConfigValidationError::InvalidValue { field, .. } => Some(field),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["harness.producers", "transport.send_hwm"]);
    }

    #[test]
    fn test_inverted_pause_range() {
        let mut config = SwitchyardConfig::default();
        config.liveness.pause_min_ms = 500;
        config.liveness.pause_max_ms = 100;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("liveness.pause_min_ms"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_unknown_log_level() {
        let mut config = SwitchyardConfig::default();
        config.logging.level = "WARNING".to_string();
        assert!(validate_config(&config).is_err());
    }
}
