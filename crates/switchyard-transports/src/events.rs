// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Endpoint lifecycle events
//!
//! Management-plane notifications about an endpoint's connection state. They
//! travel to the monitor as two frames, the same layout classic socket
//! monitors use:
//!
//! | Frame | Content |
//! |-------|---------|
//! | 0 | `u16` event id + `u32` value, little endian (6 bytes) |
//! | 1 | UTF-8 address the event refers to |
//!
//! The value carries the errno of failure events and is zero otherwise.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::common::{MultipartMessage, TransportError, TransportResult};

/// OS error codes attached to failure events (Linux numbering)
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const EMFILE: i32 = 24;
    pub const EPROTO: i32 = 71;
    pub const EADDRINUSE: i32 = 98;
    pub const ECONNREFUSED: i32 = 111;
}

/// Lifecycle event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum EventKind {
    Connected = 0x0001,
    ConnectDelayed = 0x0002,
    ConnectRetried = 0x0004,
    Listening = 0x0008,
    BindFailed = 0x0010,
    Accepted = 0x0020,
    AcceptFailed = 0x0040,
    Closed = 0x0080,
    CloseFailed = 0x0100,
    Disconnected = 0x0200,
    MonitorStopped = 0x0400,
    HandshakeFailed = 0x0800,
    HandshakeSucceeded = 0x1000,
}

impl EventKind {
    /// Every event kind, in id order
    pub const ALL: [EventKind; 13] = [
        Self::Connected,
        Self::ConnectDelayed,
        Self::ConnectRetried,
        Self::Listening,
        Self::BindFailed,
        Self::Accepted,
        Self::AcceptFailed,
        Self::Closed,
        Self::CloseFailed,
        Self::Disconnected,
        Self::MonitorStopped,
        Self::HandshakeFailed,
        Self::HandshakeSucceeded,
    ];

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.id() == id)
    }

    /// Constant-style name, e.g. `EVENT_CONNECTED`
    pub fn name(self) -> &'static str {
        match self {
            Self::Connected => "EVENT_CONNECTED",
            Self::ConnectDelayed => "EVENT_CONNECT_DELAYED",
            Self::ConnectRetried => "EVENT_CONNECT_RETRIED",
            Self::Listening => "EVENT_LISTENING",
            Self::BindFailed => "EVENT_BIND_FAILED",
            Self::Accepted => "EVENT_ACCEPTED",
            Self::AcceptFailed => "EVENT_ACCEPT_FAILED",
            Self::Closed => "EVENT_CLOSED",
            Self::CloseFailed => "EVENT_CLOSE_FAILED",
            Self::Disconnected => "EVENT_DISCONNECTED",
            Self::MonitorStopped => "EVENT_MONITOR_STOPPED",
            Self::HandshakeFailed => "EVENT_HANDSHAKE_FAILED",
            Self::HandshakeSucceeded => "EVENT_HANDSHAKE_SUCCEEDED",
        }
    }

    /// Failure kinds carry an errno
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ConnectDelayed
                | Self::BindFailed
                | Self::AcceptFailed
                | Self::CloseFailed
                | Self::HandshakeFailed
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static EVENT_NAMES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    EventKind::ALL
        .iter()
        .map(|kind| (kind.id(), kind.name()))
        .collect()
});

/// Human-readable name for a raw event id
pub fn event_name(id: u16) -> Option<&'static str> {
    EVENT_NAMES.get(&id).copied()
}

/// Set of event kinds a monitor wants to see
///
/// `MONITOR_STOPPED` is delivered whatever the mask says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u16);

impl EventMask {
    pub const ALL: EventMask = EventMask(0xFFFF);

    pub fn only(kinds: &[EventKind]) -> Self {
        Self(kinds.iter().fold(0, |mask, kind| mask | kind.id()))
    }

    pub fn with(self, kind: EventKind) -> Self {
        Self(self.0 | kind.id())
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        kind == EventKind::MonitorStopped || self.0 & kind.id() != 0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Decoded lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
            errno: None,
        }
    }

    pub fn failure(kind: EventKind, address: impl Into<String>, errno: i32) -> Self {
        Self {
            kind,
            address: address.into(),
            errno: Some(errno),
        }
    }

    /// Encode into the two-frame monitor layout
    pub fn encode(&self) -> MultipartMessage {
        let value = self.errno.unwrap_or(0) as u32;
        let mut header = Vec::with_capacity(6);
        header.extend_from_slice(&self.kind.id().to_le_bytes());
        header.extend_from_slice(&value.to_le_bytes());
        MultipartMessage::new()
            .add_part(header)
            .add_part(self.address.as_bytes().to_vec())
    }

    /// Decode the two-frame monitor layout
    pub fn decode(frames: &MultipartMessage) -> TransportResult<Self> {
        let [header, address] = frames.parts.as_slice() else {
            return Err(TransportError::InvalidMessage(format!(
                "monitor event must have 2 frames, got {}",
                frames.len()
            )));
        };
        if header.len() != 6 {
            return Err(TransportError::InvalidMessage(format!(
                "monitor event header must be 6 bytes, got {}",
                header.len()
            )));
        }

        let id = u16::from_le_bytes([header[0], header[1]]);
        let value = u32::from_le_bytes([header[2], header[3], header[4], header[5]]);
        let kind = EventKind::from_id(id)
            .ok_or_else(|| TransportError::InvalidMessage(format!("unknown event id {:#06x}", id)))?;
        let address = String::from_utf8(address.clone())
            .map_err(|e| TransportError::InvalidMessage(format!("event address: {}", e)))?;

        Ok(Self {
            kind,
            address,
            errno: kind.is_failure().then_some(value as i32),
        })
    }
}

/// Result of polling a lifecycle stream
#[derive(Debug)]
pub enum StreamPoll {
    /// One encoded event
    Frames(MultipartMessage),
    /// Timeout elapsed with nothing to report
    Idle,
    /// The producing side went away or the stream was closed locally
    Closed,
    /// The owning context was terminated
    Terminated,
}

/// Receiving side of an endpoint's lifecycle event channel
pub trait LifecycleStream: Send {
    /// Wait for the next encoded event (`None` = wait indefinitely)
    fn poll(&mut self, timeout: Option<Duration>) -> TransportResult<StreamPoll>;

    /// Release the stream; later polls report `Closed`
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_map_covers_every_kind() {
        for kind in EventKind::ALL {
            assert_eq!(event_name(kind.id()), Some(kind.name()));
        }
        assert_eq!(event_name(0x2000), None);
    }

    #[test]
    fn test_encode_layout() {
        let event = LifecycleEvent::failure(EventKind::BindFailed, "tcp://*:1", errno::EADDRINUSE);
        let frames = event.encode();
        assert_eq!(frames.parts[0], vec![0x10, 0x00, 98, 0, 0, 0]);
        assert_eq!(frames.parts[1], b"tcp://*:1".to_vec());
        assert_eq!(LifecycleEvent::decode(&frames).unwrap(), event);
    }

    #[test]
    fn test_non_failure_drops_value() {
        let frames = MultipartMessage::new()
            .add_part(vec![0x08, 0x00, 7, 0, 0, 0])
            .add_part(b"inproc://a".to_vec());
        let event = LifecycleEvent::decode(&frames).unwrap();
        assert_eq!(event.kind, EventKind::Listening);
        assert_eq!(event.errno, None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let one_frame = MultipartMessage::new().add_part(vec![0; 6]);
        assert!(LifecycleEvent::decode(&one_frame).is_err());

        let unknown = MultipartMessage::new()
            .add_part(vec![0x00, 0x20, 0, 0, 0, 0])
            .add_part(Vec::new());
        assert!(LifecycleEvent::decode(&unknown).is_err());

        let short = MultipartMessage::new().add_part(vec![1]).add_part(Vec::new());
        assert!(LifecycleEvent::decode(&short).is_err());
    }

    #[test]
    fn test_mask_always_keeps_monitor_stopped() {
        let mask = EventMask::only(&[EventKind::Accepted]);
        assert!(mask.contains(EventKind::Accepted));
        assert!(!mask.contains(EventKind::Listening));
        assert!(mask.contains(EventKind::MonitorStopped));
        assert!(mask.with(EventKind::Listening).contains(EventKind::Listening));
    }

    #[test]
    fn test_serializes_screaming_kind() {
        let event = LifecycleEvent::new(EventKind::HandshakeSucceeded, "inproc://m");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"HANDSHAKE_SUCCEEDED","address":"inproc://m"}"#);
    }
}
