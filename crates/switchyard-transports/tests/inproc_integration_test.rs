// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for in-process endpoint pairs and their lifecycle events

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use switchyard_transports::events::errno;
use switchyard_transports::inproc::{Context, InprocMonitorStream, InprocPull, InprocPush, InprocRep, InprocReq};
use switchyard_transports::prelude::*;

/// Drain every queued event without waiting
fn drain(stream: &mut InprocMonitorStream) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    while let StreamPoll::Frames(frames) = stream.poll(Some(Duration::ZERO)).unwrap() {
        events.push(LifecycleEvent::decode(&frames).unwrap());
    }
    events
}

fn kinds(events: &[LifecycleEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

/// Test PUSH-PULL pipeline across threads
#[test]
fn test_push_pull_pipeline() {
    let ctx = Context::new();
    let barrier = Arc::new(Barrier::new(2));
    let barrier_server = Arc::clone(&barrier);

    let server_ctx = ctx.clone();
    let server_handle = thread::spawn(move || {
        let mut pull = InprocPull::new(&server_ctx).unwrap();
        pull.bind("tcp://*:31002").unwrap();

        // Signal ready
        barrier_server.wait();

        let mut received = Vec::new();
        for _ in 0..10 {
            let msg = pull.pull_timeout(Duration::from_secs(5)).unwrap();
            received.push(msg.delivered().unwrap());
        }
        received
    });

    barrier.wait();
    let mut push = InprocPush::new(&ctx).unwrap();
    push.connect("tcp://127.0.0.1:31002").unwrap();
    for i in 0..10 {
        let msg = format!("msg-{}", i);
        assert_eq!(push.push(msg.as_bytes()).unwrap(), Delivery::Delivered(()));
    }

    let received = server_handle.join().unwrap();
    let expected: Vec<Vec<u8>> = (0..10).map(|i| format!("msg-{}", i).into_bytes()).collect();
    assert_eq!(received, expected);
}

/// Test that a bound PUSH round-robins across connected PULLs
#[test]
fn test_push_round_robin_to_connected_pulls() {
    let ctx = Context::new();
    let mut push = InprocPush::new(&ctx).unwrap();
    push.bind("inproc://fanout-a").unwrap();
    push.bind("inproc://fanout-b").unwrap();

    let mut a = InprocPull::new(&ctx).unwrap();
    a.connect("inproc://fanout-a").unwrap();
    let mut b = InprocPull::new(&ctx).unwrap();
    b.connect("inproc://fanout-b").unwrap();

    for i in 0..4 {
        push.push(format!("{}", i).as_bytes()).unwrap();
    }

    let timeout = Duration::from_secs(1);
    let from_a = [
        a.pull_timeout(timeout).unwrap().delivered().unwrap(),
        a.pull_timeout(timeout).unwrap().delivered().unwrap(),
    ];
    let from_b = [
        b.pull_timeout(timeout).unwrap().delivered().unwrap(),
        b.pull_timeout(timeout).unwrap().delivered().unwrap(),
    ];
    assert_eq!(from_a, [b"0".to_vec(), b"2".to_vec()]);
    assert_eq!(from_b, [b"1".to_vec(), b"3".to_vec()]);
}

/// Test REQ-REP with several sequential requests
#[test]
fn test_req_rep_lockstep() {
    let ctx = Context::new();
    let mut rep = InprocRep::new(&ctx).unwrap();
    rep.bind("inproc://lockstep").unwrap();

    let server_handle = thread::spawn(move || {
        for _ in 0..3 {
            let (request, handle) = rep
                .receive_timeout(Duration::from_secs(5))
                .unwrap()
                .delivered()
                .unwrap();
            handle.reply(&request).unwrap();
        }
    });

    let mut req = InprocReq::new(&ctx).unwrap();
    req.connect("inproc://lockstep").unwrap();
    for n in 1..=3 {
        let body = format!("ping {}", n);
        let reply = req.request_timeout(body.as_bytes(), Duration::from_secs(5)).unwrap();
        assert_eq!(reply, Delivery::Delivered(body.into_bytes()));
    }
    server_handle.join().unwrap();
}

#[test]
fn test_bind_and_connect_events() {
    let ctx = Context::new();
    let mut rep = InprocRep::new(&ctx).unwrap();
    let mut server_events = rep.enable_monitor(EventMask::ALL).unwrap();
    rep.bind("tcp://*:6666").unwrap();

    let mut req = InprocReq::new(&ctx).unwrap();
    let mut client_events = req.enable_monitor(EventMask::ALL).unwrap();
    req.connect("tcp://localhost:6666").unwrap();

    assert_eq!(
        kinds(&drain(&mut server_events)),
        vec![EventKind::Listening, EventKind::Accepted, EventKind::HandshakeSucceeded]
    );
    let client = drain(&mut client_events);
    assert_eq!(
        kinds(&client),
        vec![EventKind::Connected, EventKind::HandshakeSucceeded]
    );
    assert_eq!(client[0].address, "tcp://localhost:6666");

    req.disconnect("tcp://localhost:6666").unwrap();
    assert_eq!(kinds(&drain(&mut server_events)), vec![EventKind::Disconnected]);
    assert_eq!(kinds(&drain(&mut client_events)), vec![EventKind::Disconnected]);
}

#[test]
fn test_failure_events_carry_errno() {
    let ctx = Context::new();
    let mut first = InprocPull::new(&ctx).unwrap();
    first.bind("inproc://taken").unwrap();

    let mut second = InprocPull::new(&ctx).unwrap();
    let mut events = second.enable_monitor(EventMask::ALL).unwrap();

    assert!(matches!(
        second.bind("inproc://taken"),
        Err(TransportError::AddressInUse(_))
    ));
    assert!(matches!(
        second.unbind("inproc://never-bound"),
        Err(TransportError::NotBound(_))
    ));

    let mut push = InprocPush::new(&ctx).unwrap();
    let mut push_events = push.enable_monitor(EventMask::ALL).unwrap();
    assert!(matches!(
        push.connect("inproc://nobody-home"),
        Err(TransportError::Unreachable(_))
    ));

    let failures = drain(&mut events);
    assert_eq!(kinds(&failures), vec![EventKind::BindFailed, EventKind::CloseFailed]);
    assert_eq!(failures[0].errno, Some(errno::EADDRINUSE));
    assert_eq!(failures[1].errno, Some(errno::ENOENT));

    let delayed = drain(&mut push_events);
    assert_eq!(kinds(&delayed), vec![EventKind::ConnectDelayed]);
    assert_eq!(delayed[0].errno, Some(errno::ECONNREFUSED));
}

#[test]
fn test_incompatible_peer_fails_handshake_on_both_sides() {
    let ctx = Context::new();
    let mut push = InprocPush::new(&ctx).unwrap();
    let mut push_events = push.enable_monitor(EventMask::ALL).unwrap();
    push.bind("inproc://mismatch").unwrap();

    let mut other = InprocPush::new(&ctx).unwrap();
    let mut other_events = other.enable_monitor(EventMask::ALL).unwrap();
    assert!(matches!(
        other.connect("inproc://mismatch"),
        Err(TransportError::IncompatiblePeer { .. })
    ));

    assert_eq!(
        kinds(&drain(&mut push_events)),
        vec![EventKind::Listening, EventKind::HandshakeFailed]
    );
    let failed = drain(&mut other_events);
    assert_eq!(kinds(&failed), vec![EventKind::HandshakeFailed]);
    assert_eq!(failed[0].errno, Some(errno::EPROTO));
}

#[test]
fn test_connection_limit() {
    let ctx = Context::new();
    let config = TransportConfig::default().with_max_connections(1);
    let mut pull = InprocPull::with_config(&ctx, config).unwrap();
    let mut events = pull.enable_monitor(EventMask::only(&[EventKind::AcceptFailed])).unwrap();
    pull.bind("inproc://narrow").unwrap();

    let mut first = InprocPush::new(&ctx).unwrap();
    first.connect("inproc://narrow").unwrap();
    let mut second = InprocPush::new(&ctx).unwrap();
    assert!(matches!(
        second.connect("inproc://narrow"),
        Err(TransportError::ConnectionLimit { limit: 1, .. })
    ));

    let rejected = drain(&mut events);
    assert_eq!(kinds(&rejected), vec![EventKind::AcceptFailed]);
    assert_eq!(rejected[0].errno, Some(errno::EMFILE));
    assert_eq!(pull.peer_count(), 1);
}

#[test]
fn test_close_releases_peers_and_stops_monitor() {
    let ctx = Context::new();
    let mut pull = InprocPull::new(&ctx).unwrap();
    let mut owner_events = pull.enable_monitor(EventMask::ALL).unwrap();
    pull.bind("inproc://closing").unwrap();

    let mut push = InprocPush::new(&ctx).unwrap();
    let mut peer_events = push.enable_monitor(EventMask::ALL).unwrap();
    push.connect("inproc://closing").unwrap();
    drain(&mut owner_events);
    drain(&mut peer_events);

    pull.close().unwrap();
    assert_eq!(ctx.bound_addresses(), 0);
    assert_eq!(
        kinds(&drain(&mut owner_events)),
        vec![EventKind::Disconnected, EventKind::Closed, EventKind::MonitorStopped]
    );
    assert!(matches!(owner_events.poll(None).unwrap(), StreamPoll::Closed));
    assert_eq!(
        kinds(&drain(&mut peer_events)),
        vec![EventKind::Disconnected, EventKind::ConnectRetried]
    );

    // The address is free again.
    let mut again = InprocPull::new(&ctx).unwrap();
    again.bind("inproc://closing").unwrap();
}

#[test]
fn test_disable_monitor_emits_monitor_stopped() {
    let ctx = Context::new();
    let mut rep = InprocRep::new(&ctx).unwrap();
    let mut events = rep.enable_monitor(EventMask::ALL).unwrap();
    assert!(rep.disable_monitor().unwrap());
    assert!(!rep.disable_monitor().unwrap());

    assert_eq!(kinds(&drain(&mut events)), vec![EventKind::MonitorStopped]);
    assert!(matches!(events.poll(None).unwrap(), StreamPoll::Closed));

    // Monitoring can be enabled again once stopped.
    assert!(rep.enable_monitor(EventMask::ALL).is_ok());
}
