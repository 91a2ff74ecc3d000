//! Command correlation and event fan-out benchmarks.
//!
//! Both run over the in-memory transport, so they measure the dispatch loop
//! and correlator rather than any socket.
//!
//! Run with: cargo bench --bench correlation
//! Results saved to: target/criterion/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bidi_webdriver::protocol::{Command, RawCommand};
use bidi_webdriver::{ChannelTransport, EventRouter, RemoteEnd, Session, SessionOptions};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures_util::future::join_all;
use serde_json::json;
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1, 16, 256];
const SUBSCRIBER_COUNTS: &[usize] = &[1, 8, 64];

// ============================================================================
// Helpers
// ============================================================================

/// Answers every command with its own params.
async fn echo(mut remote: RemoteEnd) {
    while let Some((id, _method, params)) = remote.recv_command().await {
        if remote.respond_success(id, params).is_err() {
            break;
        }
    }
}

fn open_session(rt: &Runtime) -> Session {
    rt.block_on(async {
        let (transport, remote) = ChannelTransport::pair();
        tokio::spawn(echo(remote));
        Session::with_transport(transport, SessionOptions::default())
    })
}

// ============================================================================
// Benchmark: Concurrent Round Trips
// ============================================================================

fn bench_round_trips(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let session = open_session(&rt);

    let mut group = c.benchmark_group("round_trip");
    for &batch in BATCH_SIZES {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("concurrent", batch), &batch, |b, &batch| {
            b.to_async(&rt).iter(|| {
                let session = session.clone();
                async move {
                    let calls = (0..batch).map(|n| {
                        session.send(Command::Raw(RawCommand::new("bench.echo", json!({ "n": n }))))
                    });
                    for result in join_all(calls).await {
                        result.expect("echo");
                    }
                }
            });
        });
    }
    group.finish();

    rt.block_on(session.dispose());
}

// ============================================================================
// Benchmark: Event Fan-out
// ============================================================================

fn bench_event_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("event_dispatch");
    for &subscribers in SUBSCRIBER_COUNTS {
        let router = EventRouter::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        rt.block_on(async {
            for _ in 0..subscribers {
                let delivered = Arc::clone(&delivered);
                router.subscribe_fn("log.entryAdded", None, move |_| {
                    let delivered = Arc::clone(&delivered);
                    async move {
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        let event: bidi_webdriver::Event = serde_json::from_value(json!({
            "method": "log.entryAdded",
            "params": { "level": "info", "text": "bench" }
        }))
        .expect("event");

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| router.dispatch(event.clone()));
            },
        );

        router.clear();
    }
    group.finish();
}

criterion_group!(benches, bench_round_trips, bench_event_dispatch);
criterion_main!(benches);
