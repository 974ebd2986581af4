//! Mode of operation benchmarks.
//!
//! Run with: cargo bench -p modekit-crypto

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modekit_crypto::aes::AesTransform;
use modekit_crypto::modes::ctr::Ctr;
use modekit_crypto::modes::gctr::Gctr;
use modekit_crypto::modes::wrap::{key_unwrap, key_wrap};
use modekit_crypto::modes::wrap_pad::key_wrap_pad;
use modekit_crypto::provider::ModeEngine;
use modekit_crypto::staging::{ByteStaging, ExactStaging, GrowableStaging};
use modekit_crypto::Direction;

fn bench_gctr(c: &mut Criterion) {
    let key = [0x42u8; 16];
    let mut group = c.benchmark_group("gctr");

    for size in [1024usize, 16384] {
        let input = vec![0xABu8; size];
        let mut output = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        // Far from rollover: bulk path.
        let mut engine = Gctr::new(AesTransform::new()).unwrap();
        engine
            .init(Direction::Encrypt, &key, Some(&[0u8; 16]))
            .unwrap();
        group.bench_with_input(BenchmarkId::new("bulk", size), &size, |b, _| {
            b.iter(|| engine.encrypt_final(&input, &mut output).unwrap());
        });

        // Counter field two blocks short of wrapping: block-by-block path.
        let mut icb = [0u8; 16];
        icb[12..].copy_from_slice(&(u32::MAX - 1).to_be_bytes());
        let mut engine = Gctr::new(AesTransform::new()).unwrap();
        engine.init(Direction::Encrypt, &key, Some(&icb)).unwrap();
        group.bench_with_input(BenchmarkId::new("rollover", size), &size, |b, _| {
            b.iter(|| engine.encrypt_final(&input, &mut output).unwrap());
        });
    }

    group.finish();
}

fn bench_ctr(c: &mut Criterion) {
    let key = [0x42u8; 32];
    let mut group = c.benchmark_group("ctr");

    for size in [64usize, 1024, 16384] {
        let input = vec![0xABu8; size];
        let mut output = vec![0u8; size];
        let mut engine = Ctr::new(AesTransform::new()).unwrap();
        engine
            .init(Direction::Encrypt, &key, Some(&[0u8; 16]))
            .unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("aes256", size), &size, |b, _| {
            b.iter(|| engine.encrypt(&input, &mut output).unwrap());
        });
    }

    group.finish();
}

fn bench_key_wrap(c: &mut Criterion) {
    let kek = [0x11u8; 16];
    let mut group = c.benchmark_group("key-wrap");

    for key_len in [16usize, 32, 64] {
        let key = vec![0x5Au8; key_len];
        let wrapped = key_wrap(&kek, &key).unwrap();
        group.bench_with_input(BenchmarkId::new("wrap", key_len), &key_len, |b, _| {
            b.iter(|| key_wrap(&kek, &key).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("unwrap", key_len), &key_len, |b, _| {
            b.iter(|| key_unwrap(&kek, &wrapped).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("wrap-pad", key_len), &key_len, |b, _| {
            b.iter(|| key_wrap_pad(&kek, &key).unwrap());
        });
    }

    group.finish();
}

fn bench_staging(c: &mut Criterion) {
    let chunk = [0x33u8; 13];
    let mut group = c.benchmark_group("staging");

    for writes in [8usize, 256] {
        group.bench_with_input(BenchmarkId::new("growable", writes), &writes, |b, &n| {
            b.iter(|| {
                let mut s = GrowableStaging::new();
                for _ in 0..n {
                    s.write(&chunk);
                }
                s.take()
            });
        });
        group.bench_with_input(BenchmarkId::new("exact", writes), &writes, |b, &n| {
            b.iter(|| {
                let mut s = ExactStaging::new();
                for _ in 0..n {
                    s.write(&chunk);
                }
                s.take()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gctr, bench_ctr, bench_key_wrap, bench_staging);
criterion_main!(benches);
