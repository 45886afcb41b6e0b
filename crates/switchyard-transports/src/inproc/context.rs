// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Explicit transport context
//!
//! A context owns the address registry and the termination signal. It is
//! created by the application, handed to every endpoint that should share it,
//! and torn down by calling [`Context::terminate`]. There is no global
//! instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::info;

use super::binding::Binding;
use crate::common::{Delivery, TransportConfig, TransportError, TransportResult};

struct ContextInner {
    config: TransportConfig,
    next_endpoint_id: AtomicU64,
    registry: Mutex<HashMap<String, Arc<Binding>>>,
    // Dropping the only sender disconnects every clone of the receiver,
    // which wakes all selects waiting on it at once.
    terminate_tx: Mutex<Option<Sender<()>>>,
    terminate_rx: Receiver<()>,
    terminated: AtomicBool,
}

/// Shared handle to an in-process transport context
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create a context with default endpoint settings
    pub fn new() -> Self {
        Self::build(TransportConfig::default())
    }

    /// Create a context whose endpoints use `config` unless told otherwise
    pub fn with_config(config: TransportConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    fn build(config: TransportConfig) -> Self {
        let (terminate_tx, terminate_rx) = channel::bounded(0);
        Self {
            inner: Arc::new(ContextInner {
                config,
                next_endpoint_id: AtomicU64::new(1),
                registry: Mutex::new(HashMap::new()),
                terminate_tx: Mutex::new(Some(terminate_tx)),
                terminate_rx,
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Terminate the context
    ///
    /// Every blocked send, receive, request and sleep on endpoints of this
    /// context returns [`Delivery::Terminated`]. Calling it twice is a no-op.
    pub fn terminate(&self) {
        let sender = self.inner.terminate_tx.lock().take();
        if let Some(sender) = sender {
            self.inner.terminated.store(true, Ordering::SeqCst);
            drop(sender);
            info!("[INPROC] Context terminated");
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    /// Sleep that ends early when the context is terminated
    pub fn sleep(&self, duration: Duration) -> Delivery<()> {
        if self.is_terminated() {
            return Delivery::Terminated;
        }
        match self.inner.terminate_rx.recv_timeout(duration) {
            Err(channel::RecvTimeoutError::Timeout) => Delivery::Delivered(()),
            _ => Delivery::Terminated,
        }
    }

    /// Number of addresses currently bound in this context
    pub fn bound_addresses(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub(crate) fn termination(&self) -> &Receiver<()> {
        &self.inner.terminate_rx
    }

    pub(crate) fn next_endpoint_id(&self) -> u64 {
        self.inner.next_endpoint_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn ensure_running(&self) -> TransportResult<()> {
        if self.is_terminated() {
            Err(TransportError::ContextTerminated)
        } else {
            Ok(())
        }
    }

    /// Register a binding; fails if the route is taken
    pub(crate) fn register(&self, key: String, binding: Arc<Binding>) -> Result<(), Arc<Binding>> {
        let mut registry = self.inner.registry.lock();
        if let Some(existing) = registry.get(&key) {
            return Err(Arc::clone(existing));
        }
        registry.insert(key, binding);
        Ok(())
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<Arc<Binding>> {
        self.inner.registry.lock().get(key).cloned()
    }

    /// Remove a binding, but only if it is still the one registered
    pub(crate) fn unregister(&self, key: &str, binding: &Arc<Binding>) {
        let mut registry = self.inner.registry.lock();
        if registry
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, binding))
        {
            registry.remove(key);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("terminated", &self.is_terminated())
            .field("bound_addresses", &self.bound_addresses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_sleep_completes_without_termination() {
        let ctx = Context::new();
        assert_eq!(ctx.sleep(Duration::from_millis(5)), Delivery::Delivered(()));
    }

    #[test]
    fn test_terminate_wakes_sleepers() {
        let ctx = Context::new();
        let sleeper = ctx.clone();
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let outcome = sleeper.sleep(Duration::from_secs(30));
            (outcome, started.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        ctx.terminate();
        let (outcome, elapsed) = handle.join().unwrap();
        assert_eq!(outcome, Delivery::Terminated);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let ctx = Context::new();
        ctx.terminate();
        ctx.terminate();
        assert!(ctx.is_terminated());
        assert!(matches!(ctx.ensure_running(), Err(TransportError::ContextTerminated)));
        assert_eq!(ctx.sleep(Duration::from_secs(1)), Delivery::Terminated);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TransportConfig {
            max_message_size: Some(0),
            ..TransportConfig::default()
        };
        assert!(matches!(
            Context::with_config(config),
            Err(TransportError::InvalidConfig(_))
        ));
    }
}
