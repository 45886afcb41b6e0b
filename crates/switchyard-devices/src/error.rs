// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Device error types

use switchyard_transports::TransportError;
use thiserror::Error;

/// Errors raised by the devices
///
/// Context termination is not an error; it arrives as
/// `Delivery::Terminated` and ends a device cleanly.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Reply does not match request: sent {sent:?}, received {received:?}")]
    CorrelationMismatch { sent: String, received: String },

    #[error("Consumer received {received} of {expected} messages")]
    IncompleteDelivery { received: usize, expected: usize },

    #[error("Producer {identity} failed: {reason}")]
    ProducerFailed { identity: String, reason: String },

    #[error("Worker thread {0} panicked")]
    WorkerPanicked(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;
