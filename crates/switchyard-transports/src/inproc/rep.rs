// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process REPLY endpoint

use std::time::Duration;

use crossbeam::channel::{Sender, TrySendError};
use tracing::debug;

use super::binding::RequestFrame;
use super::context::Context;
use super::delegate_endpoint;
use super::endpoint::EndpointCore;
use crate::common::{Delivery, EndpointKind, ReplyHandle, TransportConfig, TransportResult};
use crate::traits::RequestReplyServer;

/// In-process REPLY endpoint (server)
pub struct InprocRep {
    core: EndpointCore<RequestFrame>,
}

impl InprocRep {
    pub fn new(ctx: &Context) -> TransportResult<Self> {
        Self::with_config(ctx, ctx.config().clone())
    }

    pub fn with_config(ctx: &Context, config: TransportConfig) -> TransportResult<Self> {
        Ok(Self {
            core: EndpointCore::new(ctx, EndpointKind::Reply, config)?,
        })
    }

    /// Peers connected to addresses this endpoint bound
    pub fn peer_count(&self) -> usize {
        self.core.peer_count()
    }

    fn next_request(
        &self,
        timeout: Option<Duration>,
    ) -> TransportResult<Delivery<(Vec<u8>, Box<dyn ReplyHandle>)>> {
        Ok(self.core.recv_frame(timeout)?.map(|frame| {
            let handle: Box<dyn ReplyHandle> = Box::new(InprocReplyHandle {
                reply_to: frame.reply_to,
            });
            (frame.payload, handle)
        }))
    }
}

delegate_endpoint!(InprocRep);

impl RequestReplyServer for InprocRep {
    fn receive(&self) -> TransportResult<Delivery<(Vec<u8>, Box<dyn ReplyHandle>)>> {
        self.next_request(None)
    }

    fn receive_timeout(
        &self,
        timeout: Duration,
    ) -> TransportResult<Delivery<(Vec<u8>, Box<dyn ReplyHandle>)>> {
        self.next_request(Some(timeout))
    }
}

/// Reply handle for one received request
pub struct InprocReplyHandle {
    reply_to: Sender<Vec<u8>>,
}

impl ReplyHandle for InprocReplyHandle {
    fn reply(self: Box<Self>, data: &[u8]) -> TransportResult<()> {
        match self.reply_to.try_send(data.to_vec()) {
            Ok(()) => {}
            // The requester gave up on this request; it already moved on.
            Err(TrySendError::Disconnected(_)) | Err(TrySendError::Full(_)) => {
                debug!("[INPROC] Dropping reply for abandoned request");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TransportError;
    use crate::inproc::InprocReq;
    use crate::traits::{Endpoint, RequestReplyClient};
    use std::thread;

    #[test]
    fn test_request_reply_roundtrip() {
        let ctx = Context::new();
        let mut rep = InprocRep::new(&ctx).unwrap();
        rep.bind("tcp://*:10111").unwrap();
        let mut req = InprocReq::new(&ctx).unwrap();
        req.connect("tcp://localhost:10111").unwrap();

        let server = thread::spawn(move || {
            let (payload, handle) = rep.receive().unwrap().delivered().unwrap();
            let mut answer = payload.clone();
            answer.extend_from_slice(b" ok");
            handle.reply(&answer).unwrap();
        });

        assert_eq!(
            req.request(b"ping 1").unwrap(),
            Delivery::Delivered(b"ping 1 ok".to_vec())
        );
        server.join().unwrap();
    }

    #[test]
    fn test_receive_timeout() {
        let ctx = Context::new();
        let mut rep = InprocRep::new(&ctx).unwrap();
        rep.bind("inproc://idle-rep").unwrap();
        assert!(matches!(
            rep.receive_timeout(Duration::from_millis(10)),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_reply_to_departed_requester_is_ok() {
        let ctx = Context::new();
        let mut rep = InprocRep::new(&ctx).unwrap();
        rep.bind("inproc://departed").unwrap();
        {
            let mut req = InprocReq::new(&ctx).unwrap();
            req.connect("inproc://departed").unwrap();
            let _ = req.request_timeout(b"bye", Duration::from_millis(5));
        }
        let (_, handle) = rep.receive().unwrap().delivered().unwrap();
        assert!(handle.reply(b"too late").is_ok());
    }
}
