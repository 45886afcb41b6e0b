// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bound addresses and the pipes behind them

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use super::monitor::MonitorHub;
use crate::common::EndpointKind;

/// A request travelling from a request endpoint to a reply endpoint
pub(crate) struct RequestFrame {
    pub payload: Vec<u8>,
    pub reply_to: Sender<Vec<u8>>,
}

/// The queue behind one bound address
pub(crate) enum Pipe {
    Data(Sender<Vec<u8>>, Receiver<Vec<u8>>),
    Request(Sender<RequestFrame>, Receiver<RequestFrame>),
}

/// Payload type an endpoint moves through its pipes
pub(crate) trait Frame: Send + Sized + 'static {
    fn payload_len(&self) -> usize;

    fn pipe(capacity: usize) -> Pipe;

    fn halves(pipe: &Pipe) -> Option<(Sender<Self>, Receiver<Self>)>;
}

fn queue<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    if capacity == 0 {
        channel::unbounded()
    } else {
        channel::bounded(capacity)
    }
}

impl Frame for Vec<u8> {
    fn payload_len(&self) -> usize {
        self.len()
    }

    fn pipe(capacity: usize) -> Pipe {
        let (tx, rx) = queue(capacity);
        Pipe::Data(tx, rx)
    }

    fn halves(pipe: &Pipe) -> Option<(Sender<Self>, Receiver<Self>)> {
        match pipe {
            Pipe::Data(tx, rx) => Some((tx.clone(), rx.clone())),
            Pipe::Request(..) => None,
        }
    }
}

impl Frame for RequestFrame {
    fn payload_len(&self) -> usize {
        self.payload.len()
    }

    fn pipe(capacity: usize) -> Pipe {
        let (tx, rx) = queue(capacity);
        Pipe::Request(tx, rx)
    }

    fn halves(pipe: &Pipe) -> Option<(Sender<Self>, Receiver<Self>)> {
        match pipe {
            Pipe::Request(tx, rx) => Some((tx.clone(), rx.clone())),
            Pipe::Data(..) => None,
        }
    }
}

/// Outcome of a peer asking to join a binding
pub(crate) enum Admission {
    Admitted,
    Full(usize),
    Gone,
}

/// Registry entry for one bound address
pub(crate) struct Binding {
    pub address: String,
    pub kind: EndpointKind,
    pub owner: u64,
    pub pipe: Pipe,
    /// Management interface of the binding endpoint
    pub hub: Arc<MonitorHub>,
    max_connections: usize,
    /// Connected peers by endpoint id; `None` once the binding is released
    peers: Mutex<Option<HashMap<u64, Arc<MonitorHub>>>>,
}

impl Binding {
    pub fn new(
        address: String,
        kind: EndpointKind,
        owner: u64,
        pipe: Pipe,
        hub: Arc<MonitorHub>,
        max_connections: usize,
    ) -> Self {
        Self {
            address,
            kind,
            owner,
            pipe,
            hub,
            max_connections,
            peers: Mutex::new(Some(HashMap::new())),
        }
    }

    pub fn admit(&self, peer_id: u64, peer_hub: Arc<MonitorHub>) -> Admission {
        let mut peers = self.peers.lock();
        let Some(peers) = peers.as_mut() else {
            return Admission::Gone;
        };
        if self.max_connections > 0 && peers.len() >= self.max_connections {
            return Admission::Full(self.max_connections);
        }
        peers.insert(peer_id, peer_hub);
        Admission::Admitted
    }

    /// Forget a peer; true if the binding was still live and knew it
    pub fn remove_peer(&self, peer_id: u64) -> bool {
        self.peers
            .lock()
            .as_mut()
            .is_some_and(|peers| peers.remove(&peer_id).is_some())
    }

    /// Mark the binding released and hand back the peers it still had
    pub fn release(&self) -> Vec<Arc<MonitorHub>> {
        self.peers
            .lock()
            .take()
            .map(|peers| peers.into_values().collect())
            .unwrap_or_default()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().as_ref().map_or(0, HashMap::len)
    }
}
