// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fan-in sessions through the relay

use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use switchyard_devices::{run_harness, run_harness_with, DeviceError, HarnessConfig, Relay};
use switchyard_transports::inproc::{Context, InprocPull, InprocPush};
use switchyard_transports::{Endpoint, Pull, Push};

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn fast_config(tag: &str, producers: usize, messages: usize) -> HarnessConfig {
    HarnessConfig {
        inbound_address: format!("inproc://{}-in", tag),
        outbound_address: format!("inproc://{}-out", tag),
        producers,
        messages_per_producer: messages,
        send_interval: Duration::from_millis(2),
        ..HarnessConfig::default()
    }
}

/// Group received payloads by the producer identity before `": "`
fn by_producer(received: &[Vec<u8>]) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for message in received {
        let text = String::from_utf8(message.clone()).unwrap();
        let (identity, _) = text.split_once(": ").unwrap();
        grouped.entry(identity.to_string()).or_default().push(text.clone());
    }
    grouped
}

#[test]
fn test_two_producers_ten_messages_each() {
    init_test_logging();
    let ctx = Context::new();
    let report = run_harness(&ctx, &fast_config("stock", 2, 10)).unwrap();

    assert_eq!(report.received.len(), 20);
    assert_eq!(report.relay.forwarded, 20);
    assert!(ctx.is_terminated());
    assert_eq!(ctx.bound_addresses(), 0);

    let grouped = by_producer(&report.received);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["0"].len(), 10);
    assert_eq!(grouped["1"].len(), 10);

    for outcome in &report.producers {
        let producer = outcome.result.as_ref().unwrap();
        assert_eq!(producer.sent, 10);
        assert!(producer.completed);
    }
    assert_eq!(report.failed_producers().count(), 0);
}

#[test]
fn test_callback_sees_what_the_report_holds() {
    let ctx = Context::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let report = run_harness_with(&ctx, &fast_config("callback", 3, 5), move |message| {
        sink.lock().unwrap().push(message.to_vec());
    })
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), report.received);
    for messages in by_producer(&report.received).values() {
        assert_eq!(messages.len(), 5);
        for message in messages {
            let stamp: i64 = message.split_once(": ").unwrap().1.parse().unwrap();
            assert!(stamp > 1_600_000_000);
        }
    }
}

#[test]
fn test_relay_keeps_each_sender_in_order() {
    const SENDERS: usize = 3;
    const PER_SENDER: usize = 200;

    let ctx = Context::new();
    let mut relay = Relay::bind(&ctx, "inproc://fifo-in", "inproc://fifo-out").unwrap();
    let mut sink = InprocPull::new(&ctx).unwrap();
    sink.connect("inproc://fifo-out").unwrap();
    let relay_handle = thread::spawn(move || relay.run());

    let start = Arc::new(Barrier::new(SENDERS));
    let senders: Vec<_> = (0..SENDERS)
        .map(|id| {
            let mut push = InprocPush::new(&ctx).unwrap();
            push.connect("inproc://fifo-in").unwrap();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for seq in 0..PER_SENDER {
                    let _ = push.push(format!("{}:{}", id, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();

    let mut received = Vec::with_capacity(SENDERS * PER_SENDER);
    for _ in 0..SENDERS * PER_SENDER {
        received.push(sink.pull().unwrap().delivered().unwrap());
    }
    for sender in senders {
        sender.join().unwrap();
    }
    ctx.terminate();
    let report = relay_handle.join().unwrap().unwrap();
    assert_eq!(report.forwarded, (SENDERS * PER_SENDER) as u64);

    let mut per_sender: Vec<Vec<Vec<u8>>> = vec![Vec::new(); SENDERS];
    for message in received {
        let text = std::str::from_utf8(&message).unwrap();
        let id: usize = text.split_once(':').unwrap().0.parse().unwrap();
        per_sender[id].push(message);
    }
    for (id, messages) in per_sender.iter().enumerate() {
        let expected: Vec<Vec<u8>> = (0..PER_SENDER)
            .map(|seq| format!("{}:{}", id, seq).into_bytes())
            .collect();
        assert_eq!(*messages, expected, "sender {}", id);
    }
}

#[test]
fn test_consumer_deadline_reports_incomplete_delivery() {
    let ctx = Context::new();
    let config = HarnessConfig {
        send_interval: Duration::from_secs(30),
        consumer_deadline: Some(Duration::from_millis(100)),
        ..fast_config("deadline", 2, 3)
    };

    // Each producer gets at most its first message out, then sits in a long pause.
    match run_harness(&ctx, &config) {
        Err(DeviceError::IncompleteDelivery { received, expected }) => {
            assert!(received <= 2);
            assert_eq!(expected, 6);
        }
        other => panic!("expected incomplete delivery, got {:?}", other),
    }
    assert!(ctx.is_terminated());
}

#[test]
fn test_occupied_address_fails_before_any_thread_starts() {
    let ctx = Context::new();
    let _squatter = switchyard_devices::EchoServer::bind(
        &ctx,
        Default::default(),
        "inproc://busy-out",
    )
    .unwrap();

    assert!(matches!(
        run_harness(&ctx, &fast_config("busy", 1, 1)),
        Err(DeviceError::Transport(_))
    ));
}
