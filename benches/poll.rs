//! Per-frame cost of polling the task bridge
//!
//! The render loop polls every panel each frame, so the consumer side has to
//! stay cheap whether the producer is idle, busy or far ahead.

use std::hint::black_box;
use std::sync::mpsc;
use std::time::Duration;

use cloudpane::task::{AsyncCollector, AsyncStream};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn wait_idle(stream: &AsyncStream<u64, String>) {
    while stream.is_working() {
        std::thread::sleep(Duration::from_micros(50));
    }
}

fn filled_stream(items: u64) -> AsyncStream<u64, String> {
    let mut stream = AsyncStream::new("bench-stream");
    stream.run(move |sink| {
        for i in 0..items {
            sink.add(i);
        }
    });
    wait_idle(&stream);
    stream
}

/// Status queries on a task with nothing to deliver
fn bench_idle_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_poll");

    let mut collector = AsyncCollector::<u64, String>::new("bench-idle");
    group.bench_function("get_items", |b| {
        b.iter(|| black_box(collector.get_items().len()));
    });

    let mut stream = AsyncStream::<u64, String>::new("bench-idle");
    group.bench_function("pull_item", |b| {
        b.iter(|| black_box(stream.pull_item()));
    });

    group.bench_function("status", |b| {
        b.iter(|| black_box(stream.is_working() || stream.has_error()));
    });

    group.finish();
}

/// Polling while the producer is blocked in a slow request
fn bench_busy_poll(c: &mut Criterion) {
    let (release, gate) = mpsc::channel::<()>();
    let mut collector = AsyncCollector::<u64, String>::new("bench-busy");
    collector.run(move |_| {
        let _ = gate.recv();
    });

    c.bench_function("busy_get_items", |b| {
        b.iter(|| black_box(collector.get_items().len()));
    });

    let _ = release.send(());
}

/// Draining a backlog the producer built up ahead of the consumer
fn bench_drain_backlog(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_backlog");

    for items in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(items));
        group.bench_with_input(BenchmarkId::new("pull_item", items), &items, |b, &items| {
            b.iter_batched(
                || filled_stream(items),
                |mut stream| {
                    let mut drained = 0;
                    while stream.pending() > 0 {
                        if stream.pull_item().is_some() {
                            drained += 1;
                        }
                    }
                    assert_eq!(drained, items);
                    stream
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_idle_poll, bench_busy_poll, bench_drain_backlog);
criterion_main!(benches);
