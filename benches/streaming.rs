//! Criterion benchmarks for the streaming engines: chunked compression with
//! periodic sync flushes, and capped decompression through `Decompressor`.
//!
//! Run with:
//!   cargo bench --bench streaming

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine, Decompressor};
use zlibr::oneshot::compress_with_backend;
use zlibr::types::Flush;

mod corpus {
    include!("corpus.rs");
}

const TOTAL: usize = 1 << 20;

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn bench_chunked_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_compress");
    let data = corpus::synthetic_data(TOTAL);
    group.throughput(Throughput::Bytes(TOTAL as u64));

    for backend in backends() {
        for &chunk_size in &[4_096usize, 65_536] {
            group.bench_with_input(BenchmarkId::new(backend.name(), chunk_size), &data, |b, data| {
                b.iter(|| {
                    let mut engine =
                        CompressionEngine::with_backend(backend, &CompressOptions::default().wbits(31)).unwrap();
                    let mut written = 0;
                    for chunk in data.chunks(chunk_size) {
                        written += engine.compress(chunk).unwrap().len();
                        written += engine.flush(Flush::Sync).unwrap().len();
                    }
                    written + engine.finish().unwrap().len()
                })
            });
        }
    }
    group.finish();
}

fn bench_capped_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_decompress");
    let data = corpus::synthetic_data(TOTAL);
    group.throughput(Throughput::Bytes(TOTAL as u64));

    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 31).unwrap();
        for &cap in &[16_384usize, 262_144] {
            group.bench_with_input(BenchmarkId::new(backend.name(), cap), &packed, |b, packed| {
                b.iter(|| {
                    let mut d = Decompressor::with_backend(backend, 47, None).unwrap();
                    let mut produced = 0;
                    for chunk in packed.chunks(32_768) {
                        produced += d.decompress(chunk, Some(cap)).unwrap().len();
                    }
                    while !d.eof() {
                        produced += d.decompress(&[], Some(cap)).unwrap().len();
                    }
                    produced
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_chunked_compress, bench_capped_decompress);
criterion_main!(benches);
