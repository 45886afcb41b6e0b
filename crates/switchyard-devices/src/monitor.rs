// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle event monitor
//!
//! Reads an endpoint's management stream on its own thread, decodes each
//! event and attaches its symbolic name. The monitor never sees business
//! messages. It stops when it reads `EVENT_MONITOR_STOPPED`; a stream that
//! closes without that event, or a terminated context, also ends it but is
//! reported as a different [`MonitorExit`].

use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use switchyard_transports::events::event_name;
use switchyard_transports::{
    EventKind, LifecycleEvent, LifecycleStream, StreamPoll, TransportResult,
};
use tracing::{info, warn};

/// A decoded event with its symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribedEvent {
    #[serde(flatten)]
    pub event: LifecycleEvent,
    pub description: &'static str,
}

impl DescribedEvent {
    pub fn new(event: LifecycleEvent) -> Self {
        let description = event_name(event.kind.id()).unwrap_or("EVENT_UNKNOWN");
        Self { event, description }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Watching,
    Stopped,
}

/// Why the monitor loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// `EVENT_MONITOR_STOPPED` was read
    Stopped,
    /// The stream ended without `EVENT_MONITOR_STOPPED`
    StreamClosed,
    /// The context was terminated while waiting
    ContextTerminated,
}

/// Result of a monitor run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReport {
    pub exit: MonitorExit,
    pub events: usize,
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorStep {
    Event(DescribedEvent),
    Idle,
    Exit(MonitorExit),
}

pub struct EventMonitor<S: LifecycleStream> {
    stream: S,
    state: MonitorState,
    poll_timeout: Option<Duration>,
    events: usize,
}

impl<S: LifecycleStream> EventMonitor<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: MonitorState::Watching,
            poll_timeout: None,
            events: 0,
        }
    }

    /// Bound each poll; an empty poll yields [`MonitorStep::Idle`]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Events seen so far
    pub fn events(&self) -> usize {
        self.events
    }

    fn finish(&mut self) {
        self.state = MonitorState::Stopped;
        self.stream.close();
    }

    /// Poll the stream once
    ///
    /// Reading `EVENT_MONITOR_STOPPED` returns that event and leaves the
    /// monitor in [`MonitorState::Stopped`] with its stream closed.
    pub fn step(&mut self) -> TransportResult<MonitorStep> {
        if self.state == MonitorState::Stopped {
            return Ok(MonitorStep::Exit(MonitorExit::Stopped));
        }

        match self.stream.poll(self.poll_timeout)? {
            StreamPoll::Frames(frames) => {
                let described = DescribedEvent::new(LifecycleEvent::decode(&frames)?);
                self.events += 1;
                match serde_json::to_string(&described) {
                    Ok(json) => info!("Event: {}", json),
                    Err(_) => info!("Event: {:?}", described),
                }
                if described.kind() == EventKind::MonitorStopped {
                    self.finish();
                }
                Ok(MonitorStep::Event(described))
            }
            StreamPoll::Idle => Ok(MonitorStep::Idle),
            StreamPoll::Closed => {
                warn!("[MONITOR] Stream closed without EVENT_MONITOR_STOPPED");
                self.finish();
                Ok(MonitorStep::Exit(MonitorExit::StreamClosed))
            }
            StreamPoll::Terminated => {
                warn!("[MONITOR] Context terminated while watching");
                self.finish();
                Ok(MonitorStep::Exit(MonitorExit::ContextTerminated))
            }
        }
    }

    pub fn run(self) -> TransportResult<MonitorReport> {
        self.run_with(|_| {})
    }

    /// Watch until the monitor exits, handing every event to `on_event`
    pub fn run_with<F: FnMut(&DescribedEvent)>(mut self, mut on_event: F) -> TransportResult<MonitorReport> {
        loop {
            match self.step()? {
                MonitorStep::Event(event) => {
                    on_event(&event);
                    if self.state == MonitorState::Stopped {
                        return Ok(self.report(MonitorExit::Stopped));
                    }
                }
                MonitorStep::Idle => {}
                MonitorStep::Exit(exit) => return Ok(self.report(exit)),
            }
        }
    }

    fn report(&self, exit: MonitorExit) -> MonitorReport {
        if exit == MonitorExit::Stopped {
            info!("[MONITOR] Event monitor thread done");
        }
        MonitorReport {
            exit,
            events: self.events,
        }
    }
}

impl<S: LifecycleStream + 'static> EventMonitor<S> {
    /// Run on a dedicated `event-monitor` thread
    pub fn spawn<F>(self, on_event: F) -> std::io::Result<JoinHandle<TransportResult<MonitorReport>>>
    where
        F: FnMut(&DescribedEvent) + Send + 'static,
    {
        thread::Builder::new()
            .name("event-monitor".to_string())
            .spawn(move || self.run_with(on_event))
    }
}

/// Every event name with its id, one per line, in id order
pub fn event_name_table() -> String {
    let mut table = String::from("Event names:");
    for kind in EventKind::ALL {
        table.push_str(&format!("\n{:21} : {:4}", kind.name(), kind.id()));
    }
    table
}
