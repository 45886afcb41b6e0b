// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common types and utilities for all transports

pub mod address;
pub mod config;
pub mod error;
pub mod message;

pub use address::{AttachmentRole, EndpointAddress, EndpointKind, Scheme};
pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use message::{Delivery, MultipartMessage, ReplyHandle};
