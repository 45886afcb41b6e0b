// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process REQUEST endpoint
//!
//! Strict lockstep: each request waits for its own reply before the next one
//! can be sent. A reply that arrives after its request timed out is dropped
//! instead of being handed to the following request.

use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use super::binding::RequestFrame;
use super::context::Context;
use super::delegate_endpoint;
use super::endpoint::EndpointCore;
use crate::common::{Delivery, EndpointKind, TransportConfig, TransportError, TransportResult};
use crate::traits::RequestReplyClient;

type ReplyChannel = (Sender<Vec<u8>>, Receiver<Vec<u8>>);

enum Wait {
    Reply(Option<Vec<u8>>),
    Terminated,
    TimedOut,
}

/// In-process REQUEST endpoint (client)
pub struct InprocReq {
    core: EndpointCore<RequestFrame>,
    reply: Mutex<ReplyChannel>,
}

impl InprocReq {
    pub fn new(ctx: &Context) -> TransportResult<Self> {
        Self::with_config(ctx, ctx.config().clone())
    }

    pub fn with_config(ctx: &Context, config: TransportConfig) -> TransportResult<Self> {
        Ok(Self {
            core: EndpointCore::new(ctx, EndpointKind::Request, config)?,
            reply: Mutex::new(channel::bounded(1)),
        })
    }

    fn exchange(
        &self,
        data: &[u8],
        timeout: Option<Duration>,
    ) -> TransportResult<Delivery<Vec<u8>>> {
        let mut reply = self.reply.lock();
        let deadline = timeout.map(|t| Instant::now() + t);

        let frame = RequestFrame {
            payload: data.to_vec(),
            reply_to: reply.0.clone(),
        };
        if self.core.send_frame(frame, timeout)?.is_terminated() {
            return Ok(Delivery::Terminated);
        }

        let termination = self.core.context().termination();
        let outcome = match deadline {
            Some(deadline) => channel::select! {
                recv(reply.1) -> msg => Wait::Reply(msg.ok()),
                recv(termination) -> _ => Wait::Terminated,
                default(deadline.saturating_duration_since(Instant::now())) => Wait::TimedOut,
            },
            None => channel::select! {
                recv(reply.1) -> msg => Wait::Reply(msg.ok()),
                recv(termination) -> _ => Wait::Terminated,
            },
        };

        match outcome {
            Wait::Reply(Some(data)) => Ok(Delivery::Delivered(data)),
            Wait::Reply(None) => Err(TransportError::ReceiveFailed(
                "reply channel closed".to_string(),
            )),
            Wait::Terminated => Ok(Delivery::Terminated),
            Wait::TimedOut => {
                // Any late reply goes to the abandoned channel.
                *reply = channel::bounded(1);
                debug!("[INPROC] {} request timed out", self.core.label());
                Err(TransportError::Timeout)
            }
        }
    }
}

delegate_endpoint!(InprocReq);

impl RequestReplyClient for InprocReq {
    fn request(&self, data: &[u8]) -> TransportResult<Delivery<Vec<u8>>> {
        self.exchange(data, None)
    }

    fn request_timeout(
        &self,
        data: &[u8],
        timeout: Duration,
    ) -> TransportResult<Delivery<Vec<u8>>> {
        self.exchange(data, Some(timeout))
    }
}
