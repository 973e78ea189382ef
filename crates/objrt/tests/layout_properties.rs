// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Layout invariants over randomly generated type descriptors.
//
// Every generated type must place each field at an offset aligned to the
// field's own alignment, never overlap two fields, and round its size up
// to its alignment. Subtypes must keep their parent's layout as a prefix.

#![allow(clippy::cast_possible_truncation)]

use objrt::types::{field_footprint, DataKind, LobKind, NumericSubtype, TypeDescriptor};
use objrt::TypeDescriptorBuilder;
use std::sync::Arc;

const ITERATIONS: usize = 500;

fn random_scalar(rng: &mut fastrand::Rng) -> DataKind {
    match rng.usize(0..10) {
        0 => DataKind::Boolean,
        1 => DataKind::Numeric(NumericSubtype::Short),
        2 => DataKind::Numeric(NumericSubtype::UInt),
        3 => DataKind::Numeric(NumericSubtype::Double),
        4 => DataKind::Numeric(NumericSubtype::Number),
        5 => DataKind::DateTime,
        6 => DataKind::Text,
        7 => DataKind::Raw,
        8 => DataKind::Lob(LobKind::Blob),
        _ => DataKind::Collection,
    }
}

fn random_type(rng: &mut fastrand::Rng, name: &str, depth: usize) -> Arc<TypeDescriptor> {
    let mut builder = TypeDescriptorBuilder::new("PROP", name);
    for i in 0..rng.usize(1..8) {
        let field = format!("F{i}");
        if depth > 0 && rng.usize(0..5) == 0 {
            let nested = random_type(rng, &format!("{name}_N{i}"), depth - 1);
            builder = builder.object(field, &nested);
        } else {
            builder = builder.field(field, random_scalar(rng));
        }
    }
    builder.build().unwrap()
}

fn check_layout(desc: &TypeDescriptor) {
    let layout = desc.layout();
    let mut end = 0usize;
    for (field, &offset) in desc.fields().iter().zip(layout.offsets()) {
        let (width, align) = field_footprint(field.kind());
        assert_eq!(offset % align, 0, "{}: {} misaligned", desc, field.name());
        assert!(offset >= end, "{}: {} overlaps", desc, field.name());
        assert!(align <= layout.align());
        end = offset + width;
    }
    assert!(layout.size() >= end);
    assert_eq!(layout.size() % layout.align(), 0);
}

#[test]
fn random_layouts_are_aligned_and_disjoint() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for n in 0..ITERATIONS {
        let desc = random_type(&mut rng, &format!("T{n}"), 2);
        check_layout(&desc);
    }
}

#[test]
fn random_subtypes_keep_parent_prefix() {
    let mut rng = fastrand::Rng::with_seed(42);
    for n in 0..ITERATIONS {
        let parent = {
            let mut builder = TypeDescriptorBuilder::new("PROP", format!("BASE{n}")).not_final();
            for i in 0..rng.usize(1..5) {
                builder = builder.field(format!("P{i}"), random_scalar(&mut rng));
            }
            builder.build().unwrap()
        };

        let mut builder = TypeDescriptorBuilder::new("PROP", format!("SUB{n}")).extends(&parent);
        let own = rng.usize(0..4);
        for i in 0..own {
            builder = builder.field(format!("S{i}"), random_scalar(&mut rng));
        }
        let child = builder.build().unwrap();
        check_layout(&child);

        let inherited = parent.field_count();
        assert_eq!(
            &child.layout().offsets()[..inherited],
            parent.layout().offsets()
        );
        if own == 0 {
            assert_eq!(child.layout(), parent.layout());
        } else {
            assert!(child.layout().offsets()[inherited] >= parent.size());
            assert!(child.size() >= parent.size());
        }
        assert!(child.is_subtype_of(&parent));
    }
}

#[test]
fn indicator_windows_cover_nested_types() {
    let mut rng = fastrand::Rng::with_seed(7);
    for n in 0..ITERATIONS {
        let desc = random_type(&mut rng, &format!("IND{n}"), 2);
        let mut expected = 1usize;
        for (i, field) in desc.fields().iter().enumerate() {
            assert_eq!(desc.indicator_offset(i), Some(expected));
            expected += match field.kind() {
                DataKind::Object(nested) => nested.indicator_len(),
                _ => 1,
            };
        }
        assert_eq!(desc.indicator_len(), expected);
    }
}

#[test]
fn layout_is_deterministic() {
    for seed in 0..50u64 {
        let a = random_type(&mut fastrand::Rng::with_seed(seed), "SAME", 2);
        let b = random_type(&mut fastrand::Rng::with_seed(seed), "SAME", 2);
        assert_eq!(a.layout(), b.layout());
        assert_eq!(a.layout(), a.layout());
    }
}
