// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process transport
//!
//! Endpoints created from the same [`Context`] find each other through its
//! address registry. `inproc://`, `tcp://` and `ipc://` addresses are all
//! accepted; a `tcp` address is routed by its port, so `tcp://*:5555` and
//! `tcp://localhost:5555` name the same route.

/// Implements [`Endpoint`](crate::traits::Endpoint) and
/// [`Monitored`](crate::traits::Monitored) by delegating to the `core` field
macro_rules! delegate_endpoint {
    ($ty:ty) => {
        impl $crate::traits::Endpoint for $ty {
            fn bind(&mut self, address: &str) -> $crate::TransportResult<()> {
                self.core.bind(address)
            }

            fn connect(&mut self, address: &str) -> $crate::TransportResult<()> {
                self.core.connect(address)
            }

            fn disconnect(&mut self, address: &str) -> $crate::TransportResult<()> {
                self.core.disconnect(address)
            }

            fn unbind(&mut self, address: &str) -> $crate::TransportResult<()> {
                self.core.unbind(address)
            }

            fn close(&mut self) -> $crate::TransportResult<()> {
                self.core.close();
                Ok(())
            }

            fn is_open(&self) -> bool {
                self.core.is_open()
            }

            fn kind(&self) -> $crate::EndpointKind {
                self.core.kind()
            }

            fn endpoint_type(&self) -> &str {
                self.core.label()
            }
        }

        impl $crate::traits::Monitored for $ty {
            type Stream = $crate::inproc::InprocMonitorStream;

            fn enable_monitor(
                &mut self,
                mask: $crate::events::EventMask,
            ) -> $crate::TransportResult<Self::Stream> {
                self.core.enable_monitor(mask)
            }

            fn disable_monitor(&mut self) -> $crate::TransportResult<bool> {
                Ok(self.core.disable_monitor())
            }
        }
    };
}

pub(crate) use delegate_endpoint;

mod binding;
mod context;
mod endpoint;
mod monitor;
mod pull;
mod push;
mod rep;
mod req;

pub use context::Context;
pub use monitor::InprocMonitorStream;
pub use pull::InprocPull;
pub use push::InprocPush;
pub use rep::{InprocRep, InprocReplyHandle};
pub use req::InprocReq;
