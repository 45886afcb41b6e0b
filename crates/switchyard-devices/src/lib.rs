// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # switchyard-devices
//!
//! Long-running message actors built on the switchyard transport traits.
//!
//! - [`Relay`]: fan-in device forwarding a PULL endpoint into a PUSH endpoint
//! - [`Producer`] / [`Consumer`] and [`run_harness`]: a paced fan-in session
//!   through a relay
//! - [`LivenessClient`] / [`EchoServer`]: sequenced request/reply probing
//! - [`EventMonitor`]: decodes an endpoint's lifecycle event stream
//!
//! Every actor owns its endpoints, runs on its own thread and closes its
//! endpoints on every exit path. Terminating the shared
//! [`Context`](switchyard_transports::inproc::Context) stops them all.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use switchyard_devices::{run_harness, HarnessConfig};
//! use switchyard_transports::inproc::Context;
//!
//! let config = HarnessConfig {
//!     inbound_address: "inproc://collector".to_string(),
//!     outbound_address: "inproc://distributor".to_string(),
//!     messages_per_producer: 3,
//!     send_interval: Duration::from_millis(1),
//!     ..HarnessConfig::default()
//! };
//! let report = run_harness(&Context::new(), &config)?;
//! assert_eq!(report.received.len(), 6);
//! # Ok::<(), switchyard_devices::DeviceError>(())
//! ```

pub mod consumer;
pub mod echo;
pub mod error;
pub mod harness;
pub mod liveness;
pub mod monitor;
pub mod producer;
pub mod relay;

pub use consumer::{Consumer, ConsumerReport};
pub use echo::{EchoReport, EchoServer};
pub use error::{DeviceError, DeviceResult};
pub use harness::{run_harness, run_harness_with, HarnessConfig, HarnessReport, ProducerOutcome};
pub use liveness::{LivenessClient, LivenessConfig, LivenessReport, ProbeRecord};
pub use monitor::{
    event_name_table, DescribedEvent, EventMonitor, MonitorExit, MonitorReport, MonitorState,
    MonitorStep,
};
pub use producer::{Producer, ProducerConfig, ProducerReport};
pub use relay::{Relay, RelayReport};

use switchyard_config::SwitchyardConfig;
use switchyard_transports::TransportConfig;

/// Endpoint settings for every endpoint built from `config`
pub fn transport_config(config: &SwitchyardConfig) -> TransportConfig {
    let settings = &config.transport;
    let base = TransportConfig::default()
        .with_send_hwm(settings.send_hwm)
        .with_max_connections(settings.max_connections);
    if settings.max_message_size == 0 {
        base.with_unlimited_message_size()
    } else {
        base.with_max_message_size(settings.max_message_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_from_settings() {
        let mut config = SwitchyardConfig::default();
        config.transport.send_hwm = 8;
        config.transport.max_message_size = 0;
        config.transport.max_connections = 3;

        let transport = transport_config(&config);
        assert_eq!(transport.send_hwm, 8);
        assert_eq!(transport.max_message_size, None);
        assert_eq!(transport.max_connections, 3);
    }
}
