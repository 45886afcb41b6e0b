// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! These traits are the contract the devices rely on. An endpoint is owned by
//! exactly one unit of execution, so the traits only require `Send`.

use std::time::Duration;

use crate::common::{Delivery, EndpointKind, ReplyHandle, TransportResult};
use crate::events::{EventMask, LifecycleStream};

/// Base endpoint trait - implemented by all endpoints
pub trait Endpoint: Send {
    /// Listen on an address
    fn bind(&mut self, address: &str) -> TransportResult<()>;

    /// Attach to an address some other endpoint is bound to
    fn connect(&mut self, address: &str) -> TransportResult<()>;

    /// Drop one connection made with [`Endpoint::connect`]
    fn disconnect(&mut self, address: &str) -> TransportResult<()>;

    /// Stop listening on one address made with [`Endpoint::bind`]
    fn unbind(&mut self, address: &str) -> TransportResult<()>;

    /// Close the endpoint; idempotent
    fn close(&mut self) -> TransportResult<()>;

    /// Check if the endpoint is still open
    fn is_open(&self) -> bool;

    /// Socket kind
    fn kind(&self) -> EndpointKind;

    /// Get endpoint name/type
    fn endpoint_type(&self) -> &str;
}

/// Management interface of an endpoint
///
/// Enabling and disabling monitoring are explicit state transitions; the
/// monitor only learns about them through the stream itself.
pub trait Monitored {
    type Stream: LifecycleStream;

    /// Start publishing lifecycle events matching `mask`
    fn enable_monitor(&mut self, mask: EventMask) -> TransportResult<Self::Stream>;

    /// Publish `MONITOR_STOPPED` and close the stream.
    ///
    /// Returns `false` when monitoring was not enabled.
    fn disable_monitor(&mut self) -> TransportResult<bool>;
}

/// Push-Pull pattern (Push side)
pub trait Push: Endpoint {
    /// Push a message, blocking at the high water mark
    fn push(&self, data: &[u8]) -> TransportResult<Delivery<()>>;

    /// Push with timeout
    fn push_timeout(&self, data: &[u8], timeout: Duration) -> TransportResult<Delivery<()>>;
}

/// Push-Pull pattern (Pull side)
pub trait Pull: Endpoint {
    /// Pull the next message
    fn pull(&self) -> TransportResult<Delivery<Vec<u8>>>;

    /// Pull with timeout
    fn pull_timeout(&self, timeout: Duration) -> TransportResult<Delivery<Vec<u8>>>;
}

/// Request-Reply pattern (Client side)
///
/// One request, one reply: a request call does not return until its reply
/// arrived, so requests on one endpoint are never pipelined.
pub trait RequestReplyClient: Endpoint {
    /// Send a request and wait for reply
    fn request(&self, data: &[u8]) -> TransportResult<Delivery<Vec<u8>>>;

    /// Send a request with timeout
    fn request_timeout(&self, data: &[u8], timeout: Duration)
        -> TransportResult<Delivery<Vec<u8>>>;
}

/// Request-Reply pattern (Server side)
pub trait RequestReplyServer: Endpoint {
    /// Receive a request and get a reply handle
    fn receive(&self) -> TransportResult<Delivery<(Vec<u8>, Box<dyn ReplyHandle>)>>;

    /// Receive with timeout
    fn receive_timeout(
        &self,
        timeout: Duration,
    ) -> TransportResult<Delivery<(Vec<u8>, Box<dyn ReplyHandle>)>>;
}
