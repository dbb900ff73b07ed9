// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for archive enumeration.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tar::{Builder, EntryType, Header};

fn package(files: usize, file_size: usize) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    let body = vec![0x42u8; file_size];
    for i in 0..files {
        let mut header = Header::new_gnu();
        header.set_size(file_size as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder
            .append_data(&mut header, format!("models/part-{i:04}.bin"), &body[..])
            .unwrap();
    }
    builder.into_inner().unwrap()
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_entries");
    for &(files, size) in &[(16usize, 64 * 1024usize), (512, 1024)] {
        let buf = package(files, size);
        group.throughput(Throughput::Bytes(buf.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{files}x{size}")),
            &buf,
            |b, buf| b.iter(|| archive_reader::index_entries(buf).unwrap()),
        );
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let buf = package(16, 64 * 1024);
    let mut group = c.benchmark_group("read_entries");
    group.throughput(Throughput::Bytes(buf.len() as u64));
    group.bench_function("16x65536", |b| {
        b.iter(|| archive_reader::read_entries(&buf).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_index, bench_read);
criterion_main!(benches);
