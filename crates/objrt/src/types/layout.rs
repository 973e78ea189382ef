// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native struct layout of composite instances.
//!
//! Offsets follow a look-ahead rule: when field `i` is placed, the running
//! size is advanced by field `i`'s width and rounded up to the alignment of
//! field `i + 1`, so every field starts aligned without a separate padding
//! pass. The final size is rounded up to the widest alignment seen.
//!
//! A subtype starts from its parent's finished layout: the inherited prefix
//! keeps the parent's offsets and the first own field starts at the parent's
//! size rounded up to that field's alignment.

use super::{scalar_footprint, DataKind, TypeDescriptor};

/// Size, alignment, field offsets and indicator addressing of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    size: usize,
    align: usize,
    offsets: Vec<usize>,
    indicator_offsets: Vec<usize>,
    indicator_slots: usize,
}

impl Layout {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn align(&self) -> usize {
        self.align
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Per-field indicator slot, relative to the instance's own slot 0.
    pub fn indicator_offsets(&self) -> &[usize] {
        &self.indicator_offsets
    }

    /// Indicator slots consumed by all fields (own slot excluded).
    pub fn indicator_slots(&self) -> usize {
        self.indicator_slots
    }
}

/// Round `value` up to a multiple of `align` (no-op for 0 and 1).
pub fn round_up(value: usize, align: usize) -> usize {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Native (size, alignment) of a field of kind `kind`. Nested objects
/// contribute their own padded size and alignment.
pub fn field_footprint(kind: &DataKind) -> (usize, usize) {
    match kind {
        DataKind::Object(nested) => {
            let layout = nested.layout();
            (layout.size, layout.align)
        }
        other => scalar_footprint(other).unwrap_or((0, 1)),
    }
}

pub(super) fn compute_layout(desc: &TypeDescriptor) -> Layout {
    let fields = desc.fields();
    let count = fields.len();
    let mut offsets = vec![0usize; count];

    let mut type_align = 1usize;
    let mut size = 0usize;
    let mut align = 1usize;
    let mut next_size = 0usize;
    let mut i = 0usize;

    if let Some(parent) = desc.parent() {
        let base = parent.layout();
        let inherited = parent.field_count();
        offsets[..inherited].copy_from_slice(&base.offsets);

        if inherited == count {
            return finish(desc, offsets, base.size, base.align);
        }

        size = base.size;
        align = base.align;
        type_align = base.align;

        let (width, next_align) = fields[inherited].footprint();
        next_size = width;
        type_align = type_align.max(next_align);
        size = round_up(size, next_align);
        i = inherited;
    }

    while i < count {
        let width = if i > 0 {
            offsets[i] = size;
            next_size
        } else {
            let (width, first_align) = fields[0].footprint();
            align = first_align;
            type_align = type_align.max(first_align);
            width
        };

        if let Some(next) = fields.get(i + 1) {
            let (w, a) = next.footprint();
            next_size = w;
            align = a;
            type_align = type_align.max(a);
        } else {
            next_size = 0;
        }

        size = round_up(size + width, align);
        i += 1;
    }

    let size = round_up(size + next_size, type_align);
    finish(desc, offsets, size, type_align)
}

fn finish(desc: &TypeDescriptor, offsets: Vec<usize>, size: usize, align: usize) -> Layout {
    let mut indicator_offsets = Vec::with_capacity(offsets.len());
    let mut slots = 0usize;
    for field in desc.fields() {
        indicator_offsets.push(1 + slots);
        slots += match field.kind() {
            DataKind::Object(nested) => 1 + nested.layout().indicator_slots,
            _ => 1,
        };
    }

    log::debug!(
        "[layout] {} size={} align={} fields={} indicators={}",
        desc.qualified_name(),
        size,
        align,
        offsets.len(),
        slots
    );

    Layout {
        size,
        align,
        offsets,
        indicator_offsets,
        indicator_slots: slots,
    }
}
