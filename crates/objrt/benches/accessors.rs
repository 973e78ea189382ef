// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Attribute Accessor Benchmark
//!
//! Measures typed get/set round trips, text payload replacement, nested
//! views and text rendering on a single instance.

#![allow(clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use objrt::memory::{Allocator, MemoryAccounting};
use objrt::types::NumericSubtype;
use objrt::{OwnedObject, TypeDescriptorBuilder};
use std::sync::Arc;

fn fixture() -> OwnedObject {
    let point = TypeDescriptorBuilder::new("BENCH", "POINT_T")
        .numeric("X", NumericSubtype::Double)
        .numeric("Y", NumericSubtype::Double)
        .build()
        .unwrap();
    let desc = TypeDescriptorBuilder::new("BENCH", "RECORD_T")
        .numeric("ID", NumericSubtype::Int)
        .number("AMOUNT")
        .text("NAME")
        .object("AT", &point)
        .build()
        .unwrap();
    let allocator = Allocator::new(Arc::new(MemoryAccounting::new()));
    OwnedObject::new(&desc, &allocator).unwrap()
}

fn bench_numeric(c: &mut Criterion) {
    let mut obj = fixture();
    let mut i = 0i32;
    c.bench_function("accessor_int_set_get", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            obj.set_int("ID", i).unwrap();
            black_box(obj.get_int("ID").unwrap())
        });
    });

    c.bench_function("accessor_number_set_get", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            obj.set_bigint("AMOUNT", i64::from(i) * 1_000_003).unwrap();
            black_box(obj.get_double("AMOUNT").unwrap())
        });
    });
}

fn bench_text(c: &mut Criterion) {
    let mut obj = fixture();
    c.bench_function("accessor_string_replace", |b| {
        b.iter(|| {
            obj.set_string("NAME", black_box("benchmark payload")).unwrap();
            black_box(obj.get_string("NAME").unwrap())
        });
    });
}

fn bench_nested(c: &mut Criterion) {
    let mut obj = fixture();
    c.bench_function("accessor_nested_view", |b| {
        b.iter(|| {
            obj.object_mut("AT").unwrap().set_double("X", 1.25).unwrap();
            black_box(obj.get_object("AT").unwrap().map(|at| at.get_double("X")))
        });
    });
}

fn bench_to_text(c: &mut Criterion) {
    let mut obj = fixture();
    obj.set_int("ID", 7).unwrap();
    obj.set_string("NAME", "x").unwrap();
    obj.object_mut("AT").unwrap().set_double("Y", -3.5).unwrap();
    c.bench_function("accessor_to_text", |b| {
        b.iter(|| black_box(obj.to_text().unwrap()));
    });
}

criterion_group!(benches, bench_numeric, bench_text, bench_nested, bench_to_text);
criterion_main!(benches);
