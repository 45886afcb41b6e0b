// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Echo server, the peer a liveness client probes

use switchyard_transports::inproc::{Context, InprocRep};
use switchyard_transports::{Delivery, Endpoint, ReplyHandle, RequestReplyServer, TransportConfig};
use tracing::{debug, info, warn};

use crate::error::DeviceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EchoReport {
    pub echoed: u64,
}

/// Replies to every request with its own payload until terminated
pub struct EchoServer<S: RequestReplyServer> {
    endpoint: S,
}

impl EchoServer<InprocRep> {
    pub fn bind(ctx: &Context, transport: TransportConfig, address: &str) -> DeviceResult<Self> {
        let mut endpoint = InprocRep::with_config(ctx, transport)?;
        endpoint.bind(address)?;
        info!("[ECHO] Listening on {}", address);
        Ok(Self::new(endpoint))
    }
}

impl<S: RequestReplyServer> EchoServer<S> {
    pub fn new(endpoint: S) -> Self {
        Self { endpoint }
    }

    pub fn run(mut self) -> DeviceResult<EchoReport> {
        let result = self.serve();
        if let Err(e) = self.endpoint.close() {
            warn!("[ECHO] Failed to close: {}", e);
        }
        if let Ok(report) = &result {
            info!("[ECHO] Terminated after {} replies", report.echoed);
        }
        result
    }

    fn serve(&self) -> DeviceResult<EchoReport> {
        let mut report = EchoReport::default();
        while let Delivery::Delivered((request, handle)) = self.endpoint.receive()? {
            handle.reply(&request)?;
            report.echoed += 1;
            debug!("[ECHO] {} bytes", request.len());
        }
        Ok(report)
    }
}
