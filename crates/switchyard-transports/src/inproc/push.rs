// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process PUSH endpoint
//!
//! Messages are handed to attached pipes round-robin. A push blocks once the
//! pipe holds `send_hwm` messages.

use std::time::Duration;

use super::context::Context;
use super::delegate_endpoint;
use super::endpoint::EndpointCore;
use crate::common::{Delivery, EndpointKind, TransportConfig, TransportResult};
use crate::traits::Push;

/// In-process PUSH endpoint (sender)
pub struct InprocPush {
    core: EndpointCore<Vec<u8>>,
}

impl InprocPush {
    /// Create a PUSH endpoint with the context's settings
    pub fn new(ctx: &Context) -> TransportResult<Self> {
        Self::with_config(ctx, ctx.config().clone())
    }

    pub fn with_config(ctx: &Context, config: TransportConfig) -> TransportResult<Self> {
        Ok(Self {
            core: EndpointCore::new(ctx, EndpointKind::Push, config)?,
        })
    }

    /// Peers connected to addresses this endpoint bound
    pub fn peer_count(&self) -> usize {
        self.core.peer_count()
    }
}

delegate_endpoint!(InprocPush);

impl Push for InprocPush {
    fn push(&self, data: &[u8]) -> TransportResult<Delivery<()>> {
        self.core.send_frame(data.to_vec(), None)
    }

    fn push_timeout(&self, data: &[u8], timeout: Duration) -> TransportResult<Delivery<()>> {
        self.core.send_frame(data.to_vec(), Some(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TransportError;
    use crate::traits::Endpoint;

    #[test]
    fn test_push_creation() {
        let ctx = Context::new();
        let push = InprocPush::new(&ctx).unwrap();
        assert!(push.is_open());
        assert_eq!(push.kind(), EndpointKind::Push);
        assert_eq!(push.endpoint_type(), "inproc-push");
    }

    #[test]
    fn test_push_without_attachment_fails() {
        let ctx = Context::new();
        let push = InprocPush::new(&ctx).unwrap();
        assert!(matches!(push.push(b"x"), Err(TransportError::NotAttached)));
    }

    #[test]
    fn test_push_rejects_oversized_message() {
        let ctx = Context::new();
        let config = TransportConfig::default().with_max_message_size(4);
        let mut push = InprocPush::with_config(&ctx, config).unwrap();
        push.bind("inproc://oversize").unwrap();
        assert!(matches!(
            push.push(b"too long"),
            Err(TransportError::MessageTooLarge { size: 8, max_size: 4 })
        ));
    }

    #[test]
    fn test_push_times_out_at_high_water_mark() {
        let ctx = Context::new();
        let config = TransportConfig::default().with_send_hwm(1);
        let mut push = InprocPush::with_config(&ctx, config).unwrap();
        push.bind("inproc://hwm").unwrap();

        assert_eq!(push.push(b"one").unwrap(), Delivery::Delivered(()));
        assert!(matches!(
            push.push_timeout(b"two", Duration::from_millis(10)),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_blocked_push_ends_on_termination() {
        let ctx = Context::new();
        let config = TransportConfig::default().with_send_hwm(1);
        let mut push = InprocPush::with_config(&ctx, config).unwrap();
        push.bind("inproc://blocked").unwrap();
        push.push(b"fills the pipe").unwrap();

        let terminator = ctx.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            terminator.terminate();
        });
        assert_eq!(push.push(b"waits").unwrap(), Delivery::Terminated);
        handle.join().unwrap();
    }

    #[test]
    fn test_closed_push_is_not_running() {
        let ctx = Context::new();
        let mut push = InprocPush::new(&ctx).unwrap();
        push.close().unwrap();
        push.close().unwrap();
        assert!(!push.is_open());
        assert!(matches!(push.bind("inproc://late"), Err(TransportError::NotRunning)));
    }
}
