// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! State shared by every in-process endpoint kind
//!
//! Each attachment keeps both halves of its pipe. A pipe therefore never
//! disconnects while an endpoint still uses it: receivers wait for the next
//! peer and senders queue up to the high water mark, exactly as if the peer
//! were reconnecting. Only context termination ends a blocked call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Select, Sender, TrySendError};
use tracing::{debug, info, warn};

use super::binding::{Admission, Binding, Frame};
use super::context::Context;
use super::monitor::{InprocMonitorStream, MonitorHub};
use crate::common::{
    AttachmentRole, Delivery, EndpointAddress, EndpointKind, TransportConfig, TransportError,
    TransportResult,
};
use crate::events::{errno, EventKind, EventMask, LifecycleEvent};

struct Attachment<F> {
    address: EndpointAddress,
    role: AttachmentRole,
    binding: Arc<Binding>,
    tx: Sender<F>,
    rx: Receiver<F>,
}

pub(crate) struct EndpointCore<F: Frame> {
    ctx: Context,
    id: u64,
    kind: EndpointKind,
    label: String,
    config: TransportConfig,
    hub: Arc<MonitorHub>,
    attachments: Vec<Attachment<F>>,
    next_out: AtomicUsize,
    open: bool,
}

impl<F: Frame> EndpointCore<F> {
    pub fn new(ctx: &Context, kind: EndpointKind, config: TransportConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::InvalidConfig)?;
        let id = ctx.next_endpoint_id();
        Ok(Self {
            ctx: ctx.clone(),
            id,
            kind,
            label: format!("inproc-{}", kind),
            config,
            hub: Arc::new(MonitorHub::new(id)),
            attachments: Vec::new(),
            next_out: AtomicUsize::new(0),
            open: true,
        })
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> TransportResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(TransportError::NotRunning)
        }
    }

    fn emit(&self, kind: EventKind, address: &str) {
        self.hub.emit(LifecycleEvent::new(kind, address));
    }

    fn emit_failure(&self, kind: EventKind, address: &str, code: i32) {
        self.hub.emit(LifecycleEvent::failure(kind, address, code));
    }

    pub fn bind(&mut self, address: &str) -> TransportResult<()> {
        self.ensure_open()?;
        self.ctx.ensure_running()?;
        let parsed = EndpointAddress::parse(address)?;
        let key = parsed.route_key();

        let pipe = F::pipe(self.config.send_hwm);
        let binding = Arc::new(Binding::new(
            address.to_string(),
            self.kind,
            self.id,
            pipe,
            Arc::clone(&self.hub),
            self.config.max_connections,
        ));

        if let Err(existing) = self.ctx.register(key, Arc::clone(&binding)) {
            self.emit_failure(EventKind::BindFailed, address, errno::EADDRINUSE);
            warn!(
                "[INPROC] {} bind to {} failed: already bound by endpoint #{}",
                self.label, address, existing.owner
            );
            return Err(TransportError::AddressInUse(address.to_string()));
        }

        let (tx, rx) = F::halves(&binding.pipe).ok_or_else(|| {
            TransportError::Other(format!("pipe type mismatch binding {}", address))
        })?;
        self.attachments.push(Attachment {
            address: parsed,
            role: AttachmentRole::Bound,
            binding,
            tx,
            rx,
        });
        self.emit(EventKind::Listening, address);
        info!("[INPROC] {} #{} listening on {}", self.label, self.id, address);
        Ok(())
    }

    pub fn connect(&mut self, address: &str) -> TransportResult<()> {
        self.ensure_open()?;
        self.ctx.ensure_running()?;
        let parsed = EndpointAddress::parse_connect(address)?;

        let Some(binding) = self.ctx.lookup(&parsed.route_key()) else {
            self.emit_failure(EventKind::ConnectDelayed, address, errno::ECONNREFUSED);
            return Err(TransportError::Unreachable(address.to_string()));
        };

        if !self.kind.is_compatible_with(binding.kind) {
            binding.hub.emit(LifecycleEvent::failure(
                EventKind::HandshakeFailed,
                binding.address.as_str(),
                errno::EPROTO,
            ));
            self.emit_failure(EventKind::HandshakeFailed, address, errno::EPROTO);
            return Err(TransportError::IncompatiblePeer {
                address: address.to_string(),
                local: self.kind,
                remote: binding.kind,
            });
        }

        let (tx, rx) = F::halves(&binding.pipe).ok_or_else(|| TransportError::IncompatiblePeer {
            address: address.to_string(),
            local: self.kind,
            remote: binding.kind,
        })?;

        match binding.admit(self.id, Arc::clone(&self.hub)) {
            Admission::Admitted => {}
            Admission::Full(limit) => {
                binding.hub.emit(LifecycleEvent::failure(
                    EventKind::AcceptFailed,
                    binding.address.as_str(),
                    errno::EMFILE,
                ));
                self.emit_failure(EventKind::ConnectDelayed, address, errno::ECONNREFUSED);
                return Err(TransportError::ConnectionLimit {
                    address: address.to_string(),
                    limit,
                });
            }
            Admission::Gone => {
                self.emit_failure(EventKind::ConnectDelayed, address, errno::ECONNREFUSED);
                return Err(TransportError::Unreachable(address.to_string()));
            }
        }

        binding
            .hub
            .emit(LifecycleEvent::new(EventKind::Accepted, binding.address.as_str()));
        binding.hub.emit(LifecycleEvent::new(
            EventKind::HandshakeSucceeded,
            binding.address.as_str(),
        ));
        self.emit(EventKind::Connected, address);
        self.emit(EventKind::HandshakeSucceeded, address);

        self.attachments.push(Attachment {
            address: parsed,
            role: AttachmentRole::Connected,
            binding,
            tx,
            rx,
        });
        info!("[INPROC] {} #{} connected to {}", self.label, self.id, address);
        Ok(())
    }

    fn position(&self, address: &EndpointAddress, role: AttachmentRole) -> Option<usize> {
        let key = address.route_key();
        self.attachments
            .iter()
            .position(|a| a.role == role && a.address.route_key() == key)
    }

    pub fn disconnect(&mut self, address: &str) -> TransportResult<()> {
        self.ensure_open()?;
        let parsed = EndpointAddress::parse_connect(address)?;
        let index = self
            .position(&parsed, AttachmentRole::Connected)
            .ok_or_else(|| TransportError::NotConnected(address.to_string()))?;
        let attachment = self.attachments.remove(index);
        self.detach(&attachment);
        Ok(())
    }

    pub fn unbind(&mut self, address: &str) -> TransportResult<()> {
        self.ensure_open()?;
        let parsed = EndpointAddress::parse(address)?;
        let Some(index) = self.position(&parsed, AttachmentRole::Bound) else {
            self.emit_failure(EventKind::CloseFailed, address, errno::ENOENT);
            return Err(TransportError::NotBound(address.to_string()));
        };
        let attachment = self.attachments.remove(index);
        self.release(&attachment);
        Ok(())
    }

    /// Leave a binding we connected to
    fn detach(&self, attachment: &Attachment<F>) {
        let address = attachment.address.to_string();
        if attachment.binding.remove_peer(self.id) {
            attachment.binding.hub.emit(LifecycleEvent::new(
                EventKind::Disconnected,
                attachment.binding.address.as_str(),
            ));
        }
        self.emit(EventKind::Disconnected, &address);
        debug!("[INPROC] {} #{} disconnected from {}", self.label, self.id, address);
    }

    /// Give up an address we bound
    fn release(&self, attachment: &Attachment<F>) {
        let binding = &attachment.binding;
        self.ctx
            .unregister(&attachment.address.route_key(), binding);
        for peer in binding.release() {
            peer.emit(LifecycleEvent::new(EventKind::Disconnected, binding.address.as_str()));
            peer.emit(LifecycleEvent::new(
                EventKind::ConnectRetried,
                binding.address.as_str(),
            ));
            self.emit(EventKind::Disconnected, &binding.address);
        }
        self.emit(EventKind::Closed, &binding.address);
        debug!(
            "[INPROC] {} #{} stopped listening on {}",
            self.label, self.id, binding.address
        );
    }

    /// Close every attachment and stop monitoring; idempotent
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        for attachment in std::mem::take(&mut self.attachments) {
            match attachment.role {
                AttachmentRole::Bound => self.release(&attachment),
                AttachmentRole::Connected => self.detach(&attachment),
            }
        }
        self.hub.stop();
        debug!("[INPROC] {} #{} closed", self.label, self.id);
    }

    pub fn enable_monitor(&mut self, mask: EventMask) -> TransportResult<InprocMonitorStream> {
        self.ensure_open()?;
        self.hub.enable(&self.ctx, mask)
    }

    pub fn disable_monitor(&mut self) -> bool {
        self.hub.stop()
    }

    /// Number of peers connected to our bound addresses
    pub fn peer_count(&self) -> usize {
        self.attachments
            .iter()
            .filter(|a| a.role == AttachmentRole::Bound)
            .map(|a| a.binding.peer_count())
            .sum()
    }

    fn next_sender(&self) -> TransportResult<&Sender<F>> {
        if self.attachments.is_empty() {
            return Err(TransportError::NotAttached);
        }
        let index = self.next_out.fetch_add(1, Ordering::Relaxed) % self.attachments.len();
        Ok(&self.attachments[index].tx)
    }

    /// Queue a frame on the next attachment, round-robin
    ///
    /// A frame that fits in the pipe is always accepted, even after the
    /// context was terminated, so a device can finish forwarding what it
    /// already holds.
    pub fn send_frame(&self, frame: F, timeout: Option<Duration>) -> TransportResult<Delivery<()>> {
        self.ensure_open()?;
        self.config.check_size(frame.payload_len())?;
        let tx = self.next_sender()?;

        let frame = match tx.try_send(frame) {
            Ok(()) => return Ok(Delivery::Delivered(())),
            Err(TrySendError::Full(frame)) => frame,
            Err(TrySendError::Disconnected(_)) => {
                return Err(TransportError::SendFailed("pipe disconnected".to_string()))
            }
        };
        if self.ctx.is_terminated() {
            return Ok(Delivery::Terminated);
        }

        let termination = self.ctx.termination();
        let sent = match timeout {
            Some(timeout) => channel::select! {
                send(tx, frame) -> res => res.map_err(|_| ()),
                recv(termination) -> _ => return Ok(Delivery::Terminated),
                default(timeout) => return Err(TransportError::Timeout),
            },
            None => channel::select! {
                send(tx, frame) -> res => res.map_err(|_| ()),
                recv(termination) -> _ => return Ok(Delivery::Terminated),
            },
        };
        sent.map(Delivery::Delivered)
            .map_err(|_| TransportError::SendFailed("pipe disconnected".to_string()))
    }

    /// Wait for a frame from any attachment
    pub fn recv_frame(&self, timeout: Option<Duration>) -> TransportResult<Delivery<F>> {
        self.ensure_open()?;
        if self.ctx.is_terminated() {
            return Ok(Delivery::Terminated);
        }
        if self.attachments.is_empty() {
            return Err(TransportError::NotAttached);
        }

        let termination = self.ctx.termination();
        let mut select = Select::new();
        let terminate_index = select.recv(termination);
        for attachment in &self.attachments {
            select.recv(&attachment.rx);
        }

        let operation = match timeout {
            Some(timeout) => select
                .select_timeout(timeout)
                .map_err(|_| TransportError::Timeout)?,
            None => select.select(),
        };

        let index = operation.index();
        if index == terminate_index {
            let _ = operation.recv(termination);
            return Ok(Delivery::Terminated);
        }
        operation
            .recv(&self.attachments[index - 1].rx)
            .map(Delivery::Delivered)
            .map_err(|_| TransportError::ReceiveFailed("pipe disconnected".to_string()))
    }
}

impl<F: Frame> Drop for EndpointCore<F> {
    fn drop(&mut self) {
        self.close();
    }
}
