// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # switchyard-transports
//!
//! Message-queue endpoints and their lifecycle events.
//!
//! ## Patterns
//!
//! - **Push / Pull**: one-way pipeline; pushes are round-robined across
//!   attached pipes and pulls fair-queue across them
//! - **Request / Reply**: strict lockstep, one reply per request
//!
//! Every endpoint belongs to an explicit [`inproc::Context`]. Terminating the
//! context makes every blocked call return [`Delivery::Terminated`], which is
//! how long-running loops are asked to stop.
//!
//! ## Lifecycle events
//!
//! Endpoints implementing [`traits::Monitored`] publish [`events::EventKind`]
//! transitions (listening, accepted, disconnected, ...) on a
//! [`events::LifecycleStream`]. Disabling the monitor publishes
//! `EVENT_MONITOR_STOPPED` and closes the stream.
//!
//! ## Feature Flags
//!
//! - `inproc` (default): the in-process transport
//!
//! ## Example: Push-Pull
//!
//! ```
//! use switchyard_transports::inproc::{Context, InprocPull, InprocPush};
//! use switchyard_transports::prelude::*;
//!
//! let ctx = Context::new();
//! let mut pull = InprocPull::new(&ctx)?;
//! pull.bind("inproc://work")?;
//!
//! let mut push = InprocPush::new(&ctx)?;
//! push.connect("inproc://work")?;
//! push.push(b"job")?;
//!
//! assert_eq!(pull.pull()?, Delivery::Delivered(b"job".to_vec()));
//! # Ok::<(), switchyard_transports::TransportError>(())
//! ```
//!
//! ## Example: Request-Reply
//!
//! ```
//! use switchyard_transports::inproc::{Context, InprocRep, InprocReq};
//! use switchyard_transports::prelude::*;
//!
//! let ctx = Context::new();
//! let mut server = InprocRep::new(&ctx)?;
//! server.bind("tcp://*:5555")?;
//!
//! let worker = std::thread::spawn(move || -> TransportResult<()> {
//!     if let Delivery::Delivered((request, handle)) = server.receive()? {
//!         handle.reply(&request)?;
//!     }
//!     Ok(())
//! });
//!
//! let mut client = InprocReq::new(&ctx)?;
//! client.connect("tcp://localhost:5555")?;
//! assert_eq!(client.request(b"Hello!")?, Delivery::Delivered(b"Hello!".to_vec()));
//! worker.join().unwrap()?;
//! # Ok::<(), switchyard_transports::TransportError>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Common**: Shared types (addresses, errors, configs, messages)
//! 2. **Traits**: Transport-agnostic interfaces
//! 3. **Events**: Lifecycle event vocabulary and its wire encoding
//! 4. **Implementations**: the in-process transport

pub mod common;
pub mod events;
pub mod traits;

#[cfg(feature = "inproc")]
pub mod inproc;

// Re-export commonly used types
pub use common::{
    AttachmentRole, Delivery, EndpointAddress, EndpointKind, MultipartMessage, ReplyHandle,
    Scheme, TransportConfig, TransportError, TransportResult,
};

pub use events::{EventKind, EventMask, LifecycleEvent, LifecycleStream, StreamPoll};

pub use traits::{Endpoint, Monitored, Pull, Push, RequestReplyClient, RequestReplyServer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::events::{EventKind, EventMask, LifecycleEvent, LifecycleStream, StreamPoll};
    pub use crate::traits::*;
}
