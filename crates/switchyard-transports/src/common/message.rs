// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common message types for transports

use crate::common::error::TransportResult;

/// Outcome of a blocking transport call
///
/// Blocking sends, receives and sleeps end either with their result or
/// because the owning context was terminated. Termination is the clean
/// shutdown signal, so it lives here rather than in [`TransportError`].
///
/// [`TransportError`]: crate::common::error::TransportError
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Delivery<T> {
    /// The operation completed
    Delivered(T),
    /// The context was terminated while (or before) blocking
    Terminated,
}

impl<T> Delivery<T> {
    /// True if the context was terminated
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Convert into an `Option`, mapping termination to `None`
    pub fn delivered(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            Self::Terminated => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Delivery<U> {
        match self {
            Self::Delivered(value) => Delivery::Delivered(f(value)),
            Self::Terminated => Delivery::Terminated,
        }
    }
}

/// Reply handle for request-reply patterns
///
/// A handle answers exactly one request; replying consumes it.
pub trait ReplyHandle: Send {
    /// Send reply
    fn reply(self: Box<Self>, data: &[u8]) -> TransportResult<()>;
}

/// Multipart message (management-plane frames)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartMessage {
    /// Message parts
    pub parts: Vec<Vec<u8>>,
}

impl MultipartMessage {
    /// Create a new multipart message
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Add a part
    pub fn add_part(mut self, part: Vec<u8>) -> Self {
        self.parts.push(part);
        self
    }

    /// Get number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Default for MultipartMessage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_helpers() {
        let delivered = Delivery::Delivered(3);
        assert!(!delivered.is_terminated());
        assert_eq!(delivered.clone().map(|v| v * 2), Delivery::Delivered(6));
        assert_eq!(delivered.delivered(), Some(3));

        let terminated: Delivery<u8> = Delivery::Terminated;
        assert!(terminated.is_terminated());
        assert_eq!(terminated.delivered(), None);
    }

    #[test]
    fn test_multipart_builder() {
        let msg = MultipartMessage::new().add_part(vec![1]).add_part(vec![2, 3]);
        assert_eq!(msg.len(), 2);
        assert!(!msg.is_empty());
    }
}
