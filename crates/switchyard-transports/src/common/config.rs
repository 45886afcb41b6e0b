// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common configuration types for transports

use serde::{Deserialize, Serialize};

/// Endpoint-level transport configuration
///
/// Queue depth of an in-process pipe is fixed by the side that binds the
/// address; a connecting endpoint's `send_hwm` is not consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// High water mark for the bound pipe (0 = unlimited)
    pub send_hwm: usize,

    /// Maximum message size (None = unlimited)
    pub max_message_size: Option<usize>,

    /// Maximum number of peers a bound address accepts (0 = unlimited)
    pub max_connections: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_hwm: 1000,
            max_message_size: Some(10 * 1024 * 1024), // 10 MB default
            max_connections: 0,
        }
    }
}

impl TransportConfig {
    /// Set send high water mark
    pub fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Allow messages of any size
    pub fn with_unlimited_message_size(mut self) -> Self {
        self.max_message_size = None;
        self
    }

    /// Set the peer limit for bound addresses
    pub fn with_max_connections(mut self, limit: usize) -> Self {
        self.max_connections = limit;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max_size) = self.max_message_size {
            if max_size == 0 {
                return Err("Maximum message size must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Reject payloads above `max_message_size`
    pub fn check_size(&self, size: usize) -> crate::TransportResult<()> {
        match self.max_message_size {
            Some(max_size) if size > max_size => {
                Err(crate::TransportError::MessageTooLarge { size, max_size })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_message_size_rejected() {
        let mut config = TransportConfig::default();
        config.max_message_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_size() {
        let config = TransportConfig::default().with_max_message_size(4);
        assert!(config.check_size(4).is_ok());
        assert!(matches!(
            config.check_size(5),
            Err(crate::TransportError::MessageTooLarge { size: 5, max_size: 4 })
        ));
        assert!(config.with_unlimited_message_size().check_size(usize::MAX).is_ok());
    }
}
