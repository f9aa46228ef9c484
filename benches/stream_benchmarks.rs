//! Throughput benchmarks for output stream writers

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::io::Write;
use std::time::Duration;
use upgrade_hub::stream::{
    BufferedStreams, DiscardStreams, OutputStreams, RecordingSender, RemoteStreams,
};

/// Build a payload of `lines` lines, each roughly the size of a log line
fn create_payload(lines: usize) -> Vec<u8> {
    let mut payload = Vec::new();
    for i in 0..lines {
        payload.extend_from_slice(format!("step output line {} with some text\n", i).as_bytes());
    }
    payload
}

fn bench_stream_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_writes");
    group
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5));

    for lines in [1usize, 16, 256] {
        let payload = create_payload(lines);
        group.throughput(Throughput::Bytes(payload.len() as u64));

        group.bench_with_input(BenchmarkId::new("discard", lines), &payload, |b, payload| {
            let mut writer = DiscardStreams.stdout();
            b.iter(|| writer.write_all(black_box(payload)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("buffered", lines), &payload, |b, payload| {
            b.iter_batched(
                BufferedStreams::new,
                |streams| streams.stdout().write_all(black_box(payload)).unwrap(),
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("remote_live", lines), &payload, |b, payload| {
            b.iter_batched(
                || RemoteStreams::new(RecordingSender::new()),
                |streams| streams.stdout().write_all(black_box(payload)).unwrap(),
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("remote_dead", lines), &payload, |b, payload| {
            let streams = RemoteStreams::new(RecordingSender::failing("gone"));
            let mut writer = streams.stdout();
            b.iter(|| writer.write_all(black_box(payload)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stream_writes);
criterion_main!(benches);
