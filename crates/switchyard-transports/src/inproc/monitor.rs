// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle event publishing for in-process endpoints

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::context::Context;
use crate::common::{MultipartMessage, TransportError, TransportResult};
use crate::events::{EventKind, EventMask, LifecycleEvent, LifecycleStream, StreamPoll};

struct MonitorSink {
    tx: Sender<MultipartMessage>,
    mask: EventMask,
}

/// Management interface shared by an endpoint and the peers that need to
/// report transitions to it
///
/// Events are published while holding the sink lock, so events emitted from
/// different threads still reach the stream in one total order.
pub(crate) struct MonitorHub {
    endpoint_id: u64,
    sink: Mutex<Option<MonitorSink>>,
}

impl MonitorHub {
    pub fn new(endpoint_id: u64) -> Self {
        Self {
            endpoint_id,
            sink: Mutex::new(None),
        }
    }

    pub fn enable(&self, ctx: &Context, mask: EventMask) -> TransportResult<InprocMonitorStream> {
        let mut sink = self.sink.lock();
        if sink.is_some() {
            return Err(TransportError::MonitorAlreadyEnabled);
        }
        let (tx, rx) = channel::unbounded();
        *sink = Some(MonitorSink { tx, mask });
        debug!("[INPROC] Monitoring enabled on endpoint #{}", self.endpoint_id);
        Ok(InprocMonitorStream {
            rx: Some(rx),
            termination: ctx.termination().clone(),
        })
    }

    pub fn emit(&self, event: LifecycleEvent) {
        let sink = self.sink.lock();
        trace!(
            "[INPROC] endpoint #{} {} {}",
            self.endpoint_id,
            event.kind,
            event.address
        );
        if let Some(sink) = sink.as_ref() {
            if sink.mask.contains(event.kind) {
                // The stream may already be dropped by its reader.
                let _ = sink.tx.send(event.encode());
            }
        }
    }

    /// Publish `MONITOR_STOPPED` and drop the sink; false if not monitoring
    pub fn stop(&self) -> bool {
        let Some(sink) = self.sink.lock().take() else {
            return false;
        };
        let _ = sink
            .tx
            .send(LifecycleEvent::new(EventKind::MonitorStopped, "").encode());
        debug!("[INPROC] Monitoring disabled on endpoint #{}", self.endpoint_id);
        true
    }
}

/// Receiving end of an in-process endpoint's lifecycle events
pub struct InprocMonitorStream {
    rx: Option<Receiver<MultipartMessage>>,
    termination: Receiver<()>,
}

impl LifecycleStream for InprocMonitorStream {
    fn poll(&mut self, timeout: Option<Duration>) -> TransportResult<StreamPoll> {
        let Some(rx) = self.rx.as_ref() else {
            return Ok(StreamPoll::Closed);
        };

        // Queued events win over termination so nothing already published
        // is lost.
        match rx.try_recv() {
            Ok(frames) => return Ok(StreamPoll::Frames(frames)),
            Err(TryRecvError::Disconnected) => return Ok(StreamPoll::Closed),
            Err(TryRecvError::Empty) => {}
        }

        let outcome = match timeout {
            Some(timeout) => channel::select! {
                recv(rx) -> frames => Some(frames),
                recv(self.termination) -> _ => None,
                default(timeout) => return Ok(StreamPoll::Idle),
            },
            None => channel::select! {
                recv(rx) -> frames => Some(frames),
                recv(self.termination) -> _ => None,
            },
        };

        Ok(match outcome {
            Some(Ok(frames)) => StreamPoll::Frames(frames),
            Some(Err(_)) => StreamPoll::Closed,
            None => StreamPoll::Terminated,
        })
    }

    fn close(&mut self) {
        self.rx = None;
    }
}
