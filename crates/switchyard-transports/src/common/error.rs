// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common error types for all transports

use std::fmt;

use crate::common::EndpointKind;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-agnostic error type
///
/// Context termination is *not* an error on the data path: blocking calls
/// report it as [`Delivery::Terminated`](crate::common::Delivery). The
/// `ContextTerminated` variant only covers setup calls (bind, connect) made
/// against a context that is already gone.
#[derive(Debug)]
pub enum TransportError {
    /// Address could not be parsed or is not usable for this operation
    InvalidAddress(String),

    /// Another endpoint is already bound to the address
    AddressInUse(String),

    /// Nothing is bound at the address
    Unreachable(String),

    /// Endpoint kinds cannot talk to each other
    IncompatiblePeer {
        address: String,
        local: EndpointKind,
        remote: EndpointKind,
    },

    /// The bound peer refused the connection because it is at capacity
    ConnectionLimit { address: String, limit: usize },

    /// Endpoint is not bound to the address
    NotBound(String),

    /// Endpoint is not connected to the address
    NotConnected(String),

    /// Endpoint has neither binds nor connects, so there is nobody to talk to
    NotAttached,

    /// Failed to send message
    SendFailed(String),

    /// Failed to receive message
    ReceiveFailed(String),

    /// Timeout occurred
    Timeout,

    /// Endpoint is closed
    NotRunning,

    /// Context was terminated before the operation started
    ContextTerminated,

    /// A monitor stream is already attached to the endpoint
    MonitorAlreadyEnabled,

    /// Invalid configuration
    InvalidConfig(String),

    /// Message too large
    MessageTooLarge { size: usize, max_size: usize },

    /// Invalid message format
    InvalidMessage(String),

    /// Other error
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            Self::AddressInUse(addr) => write!(f, "Address already in use: {}", addr),
            Self::Unreachable(addr) => write!(f, "Nothing is bound at {}", addr),
            Self::IncompatiblePeer {
                address,
                local,
                remote,
            } => write!(
                f,
                "Incompatible peer at {}: {} cannot talk to {}",
                address, local, remote
            ),
            Self::ConnectionLimit { address, limit } => {
                write!(f, "Connection limit of {} reached at {}", limit, address)
            }
            Self::NotBound(addr) => write!(f, "Endpoint is not bound to {}", addr),
            Self::NotConnected(addr) => write!(f, "Endpoint is not connected to {}", addr),
            Self::NotAttached => write!(f, "Endpoint has no binds or connects"),
            Self::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            Self::ReceiveFailed(msg) => write!(f, "Receive failed: {}", msg),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::NotRunning => write!(f, "Endpoint is closed"),
            Self::ContextTerminated => write!(f, "Context has been terminated"),
            Self::MonitorAlreadyEnabled => write!(f, "Monitoring is already enabled"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::MessageTooLarge { size, max_size } => {
                write!(f, "Message too large: {} bytes (max: {})", size, max_size)
            }
            Self::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
            Self::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<String> for TransportError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for TransportError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}
