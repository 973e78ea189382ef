// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout Computation Benchmark
//!
//! Measures descriptor construction (which computes and caches the native
//! layout) for flat, nested and derived composite types.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use objrt::types::NumericSubtype;
use objrt::TypeDescriptorBuilder;

fn flat(fields: usize) -> TypeDescriptorBuilder {
    let mut builder = TypeDescriptorBuilder::new("BENCH", format!("FLAT{fields}"));
    for i in 0..fields {
        builder = match i % 4 {
            0 => builder.numeric(format!("F{i}"), NumericSubtype::Short),
            1 => builder.numeric(format!("F{i}"), NumericSubtype::Double),
            2 => builder.text(format!("F{i}")),
            _ => builder.number(format!("F{i}")),
        };
    }
    builder
}

fn bench_flat_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_flat");
    for fields in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(fields), &fields, |b, &n| {
            b.iter(|| {
                let desc = flat(n).build().unwrap();
                black_box(desc.size())
            });
        });
    }
    group.finish();
}

fn bench_nested_layout(c: &mut Criterion) {
    let inner = flat(8).build().unwrap();
    c.bench_function("layout_nested", |b| {
        b.iter(|| {
            let desc = TypeDescriptorBuilder::new("BENCH", "OUTER")
                .boolean("FLAG")
                .object("A", &inner)
                .object("B", &inner)
                .build()
                .unwrap();
            black_box((desc.size(), desc.indicator_len()))
        });
    });
}

fn bench_subtype_layout(c: &mut Criterion) {
    let parent = flat(16).not_final().build().unwrap();
    c.bench_function("layout_subtype", |b| {
        b.iter(|| {
            let desc = TypeDescriptorBuilder::new("BENCH", "CHILD")
                .extends(&parent)
                .numeric("EXTRA", NumericSubtype::Int)
                .build()
                .unwrap();
            black_box(desc.size())
        });
    });
}

criterion_group!(
    benches,
    bench_flat_layout,
    bench_nested_layout,
    bench_subtype_layout
);
criterion_main!(benches);
