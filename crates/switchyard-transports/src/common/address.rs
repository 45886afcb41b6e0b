// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Endpoint addresses and kinds

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{TransportError, TransportResult};

/// Address scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Inproc,
    Tcp,
    Ipc,
}

impl Scheme {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "inproc" => Some(Self::Inproc),
            "tcp" => Some(Self::Tcp),
            "ipc" => Some(Self::Ipc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inproc => "inproc",
            Self::Tcp => "tcp",
            Self::Ipc => "ipc",
        }
    }
}

/// A parsed `scheme://location` endpoint address
///
/// TCP addresses are routed by port, so `tcp://*:5555` (bind) and
/// `tcp://127.0.0.1:5555` (connect) refer to the same place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    scheme: Scheme,
    location: String,
    port: Option<u16>,
}

impl EndpointAddress {
    pub fn parse(address: &str) -> TransportResult<Self> {
        let (scheme, location) = address
            .split_once("://")
            .ok_or_else(|| TransportError::InvalidAddress(format!("missing scheme: {}", address)))?;
        let scheme = Scheme::parse(scheme).ok_or_else(|| {
            TransportError::InvalidAddress(format!("unsupported scheme '{}' in {}", scheme, address))
        })?;
        if location.is_empty() {
            return Err(TransportError::InvalidAddress(format!(
                "empty location in {}",
                address
            )));
        }

        let port = match scheme {
            Scheme::Tcp => {
                let (host, port) = location.rsplit_once(':').ok_or_else(|| {
                    TransportError::InvalidAddress(format!("missing port in {}", address))
                })?;
                if host.is_empty() {
                    return Err(TransportError::InvalidAddress(format!(
                        "missing host in {}",
                        address
                    )));
                }
                let port = port.parse::<u16>().map_err(|_| {
                    TransportError::InvalidAddress(format!("invalid port in {}", address))
                })?;
                Some(port)
            }
            _ => None,
        };

        Ok(Self {
            scheme,
            location: location.to_string(),
            port,
        })
    }

    /// Parse an address that is about to be connected to (no wildcards)
    pub fn parse_connect(address: &str) -> TransportResult<Self> {
        let parsed = Self::parse(address)?;
        if parsed.is_wildcard() {
            return Err(TransportError::InvalidAddress(format!(
                "cannot connect to wildcard address {}",
                address
            )));
        }
        Ok(parsed)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn is_wildcard(&self) -> bool {
        self.scheme == Scheme::Tcp && self.location.starts_with("*:")
    }

    /// Key under which the address is registered in a context
    pub fn route_key(&self) -> String {
        match self.port {
            Some(port) => format!("tcp:{}", port),
            None => format!("{}:{}", self.scheme.as_str(), self.location),
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.location)
    }
}

/// Endpoint socket kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Sends messages, fans out round-robin
    Push,
    /// Receives messages, fair-queued from all peers
    Pull,
    /// Sends one request and waits for its reply
    Request,
    /// Receives requests and answers each one
    Reply,
}

impl EndpointKind {
    /// Whether two kinds can form a connection
    pub fn is_compatible_with(&self, other: EndpointKind) -> bool {
        matches!(
            (self, other),
            (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
                | (Self::Request, Self::Reply)
                | (Self::Reply, Self::Request)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Request => "request",
            Self::Reply => "reply",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an endpoint is attached to an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentRole {
    Bound,
    Connected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_wildcard_and_host_share_route() {
        let bind = EndpointAddress::parse("tcp://*:5555").unwrap();
        let connect = EndpointAddress::parse_connect("tcp://127.0.0.1:5555").unwrap();
        assert_eq!(bind.route_key(), connect.route_key());
        assert!(bind.is_wildcard());
    }

    #[test]
    fn test_cannot_connect_to_wildcard() {
        assert!(matches!(
            EndpointAddress::parse_connect("tcp://*:5555"),
            Err(TransportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in ["", "localhost:5555", "udp://x", "tcp://127.0.0.1", "tcp://:1", "inproc://"] {
            assert!(EndpointAddress::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_display_round_trips_text() {
        let addr = EndpointAddress::parse("inproc://relay-in").unwrap();
        assert_eq!(addr.to_string(), "inproc://relay-in");
        assert_eq!(addr.route_key(), "inproc:relay-in");
    }

    #[test]
    fn test_kind_compatibility() {
        assert!(EndpointKind::Push.is_compatible_with(EndpointKind::Pull));
        assert!(EndpointKind::Reply.is_compatible_with(EndpointKind::Request));
        assert!(!EndpointKind::Push.is_compatible_with(EndpointKind::Push));
        assert!(!EndpointKind::Pull.is_compatible_with(EndpointKind::Request));
    }
}
