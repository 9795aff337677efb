//! Benchmarks for the per-request hot path.
//!
//! Every webhook pays for one signature check and one decode; dispatch cost
//! is dominated by the reply transport and is measured with an in-memory
//! recorder to isolate routing overhead.

use std::{hint::black_box, sync::Arc, time::Duration};

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use linehook_api::default_routes;
use linehook_core::{decode, Dispatcher, SignatureVerifier};
use linehook_testing::{
    sign_body, EventBuilder, RecordingTransport, WebhookBodyBuilder, TEST_CHANNEL_SECRET,
};
use tokio::runtime::Runtime;

fn body_with_events(count: usize) -> Bytes {
    (0..count)
        .fold(WebhookBodyBuilder::new(), |body, i| {
            let token = format!("R{i}");
            match i % 3 {
                0 => body.event(EventBuilder::text(&token, "hello there")),
                1 => body.event(
                    EventBuilder::postback(&token, "action=reserve")
                        .param("datetime", "2026-10-20T10:00"),
                ),
                _ => body.event(EventBuilder::sticker(&token, "446", "1988")),
            }
        })
        .build()
}

/// Benchmarks HMAC verification across body sizes.
fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    group.measurement_time(Duration::from_secs(5));

    let verifier = SignatureVerifier::new(TEST_CHANNEL_SECRET).unwrap();

    for size in [256usize, 4 * 1024, 64 * 1024, 1024 * 1024] {
        let body = vec![b'a'; size];
        let signature = sign_body(&body, TEST_CHANNEL_SECRET).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("verify", size), &body, |b, body| {
            b.iter(|| verifier.verify(black_box(body), black_box(&signature)));
        });
    }

    group.finish();
}

/// Benchmarks decoding batches of mixed events.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for events in [1usize, 10, 100] {
        let body = body_with_events(events);

        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(BenchmarkId::new("events", events), &body, |b, body| {
            b.iter(|| decode(black_box(body)));
        });
    }

    group.finish();
}

/// Benchmarks routing a decoded batch through the default handlers.
fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch");

    for events in [1usize, 10, 100] {
        let batch = decode(&body_with_events(events)).unwrap();
        let dispatcher = Dispatcher::new(default_routes(), Arc::new(RecordingTransport::new()));

        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(BenchmarkId::new("events", events), &batch, |b, batch| {
            b.iter_batched(
                || batch.clone(),
                |batch| rt.block_on(dispatcher.dispatch(batch)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_signature, bench_decode, bench_dispatch);
criterion_main!(benches);
