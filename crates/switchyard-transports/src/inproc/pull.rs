// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process PULL endpoint
//!
//! A PULL endpoint fair-queues messages from every pipe it is attached to.

use std::time::Duration;

use super::context::Context;
use super::delegate_endpoint;
use super::endpoint::EndpointCore;
use crate::common::{Delivery, EndpointKind, TransportConfig, TransportResult};
use crate::traits::Pull;

/// In-process PULL endpoint (receiver)
pub struct InprocPull {
    core: EndpointCore<Vec<u8>>,
}

impl InprocPull {
    pub fn new(ctx: &Context) -> TransportResult<Self> {
        Self::with_config(ctx, ctx.config().clone())
    }

    pub fn with_config(ctx: &Context, config: TransportConfig) -> TransportResult<Self> {
        Ok(Self {
            core: EndpointCore::new(ctx, EndpointKind::Pull, config)?,
        })
    }

    /// Peers connected to addresses this endpoint bound
    pub fn peer_count(&self) -> usize {
        self.core.peer_count()
    }
}

delegate_endpoint!(InprocPull);

impl Pull for InprocPull {
    fn pull(&self) -> TransportResult<Delivery<Vec<u8>>> {
        self.core.recv_frame(None)
    }

    fn pull_timeout(&self, timeout: Duration) -> TransportResult<Delivery<Vec<u8>>> {
        self.core.recv_frame(Some(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TransportError;
    use crate::inproc::InprocPush;
    use crate::traits::{Endpoint, Push};

    #[test]
    fn test_push_pull_over_bound_pull() {
        let ctx = Context::new();
        let mut pull = InprocPull::new(&ctx).unwrap();
        pull.bind("inproc://pp").unwrap();
        let mut push = InprocPush::new(&ctx).unwrap();
        push.connect("inproc://pp").unwrap();

        push.push(b"hello").unwrap();
        assert_eq!(pull.pull().unwrap(), Delivery::Delivered(b"hello".to_vec()));
        assert_eq!(pull.peer_count(), 1);
    }

    #[test]
    fn test_pull_timeout() {
        let ctx = Context::new();
        let mut pull = InprocPull::new(&ctx).unwrap();
        pull.bind("inproc://quiet").unwrap();
        assert!(matches!(
            pull.pull_timeout(Duration::from_millis(10)),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_pull_after_termination() {
        let ctx = Context::new();
        let mut pull = InprocPull::new(&ctx).unwrap();
        pull.bind("inproc://gone").unwrap();
        ctx.terminate();
        assert_eq!(pull.pull().unwrap(), Delivery::Terminated);
    }

    #[test]
    fn test_fair_queue_over_two_binds() {
        let ctx = Context::new();
        let mut pull = InprocPull::new(&ctx).unwrap();
        pull.bind("inproc://left").unwrap();
        pull.bind("inproc://right").unwrap();

        let mut left = InprocPush::new(&ctx).unwrap();
        left.connect("inproc://left").unwrap();
        let mut right = InprocPush::new(&ctx).unwrap();
        right.connect("inproc://right").unwrap();

        left.push(b"l").unwrap();
        right.push(b"r").unwrap();

        let mut seen = vec![
            pull.pull().unwrap().delivered().unwrap(),
            pull.pull().unwrap().delivered().unwrap(),
        ];
        seen.sort();
        assert_eq!(seen, vec![b"l".to_vec(), b"r".to_vec()]);
    }
}
