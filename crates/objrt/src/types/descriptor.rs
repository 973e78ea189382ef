// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type and field descriptors.

use super::layout::{compute_layout, field_footprint, Layout};
use super::{DataKind, KindTag, TypeHandle};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// One named attribute of a composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: DataKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DataKind {
        &self.kind
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    /// Native (size, alignment) of this field's cell.
    pub fn footprint(&self) -> (usize, usize) {
        field_footprint(&self.kind)
    }
}

/// Immutable shape of a composite type.
///
/// `fields` starts with the parent's fields (same order), so an instance of
/// a subtype can be read through its parent's layout. The layout is
/// computed on first use and cached for the life of the descriptor.
pub struct TypeDescriptor {
    pub(super) handle: TypeHandle,
    pub(super) schema: String,
    pub(super) name: String,
    pub(super) fields: Vec<FieldDescriptor>,
    pub(super) parent: Option<Arc<TypeDescriptor>>,
    pub(super) is_final: bool,
    pub(super) layout: OnceLock<Layout>,
}

impl TypeDescriptor {
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `SCHEMA.NAME`, or just the name when no schema is set.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }

    /// Number of leading fields inherited from the parent.
    pub fn inherited_count(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.field_count())
    }

    /// Final types cannot be subtyped, so their instances never need
    /// runtime type resolution.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn same_type(&self, other: &TypeDescriptor) -> bool {
        self.handle == other.handle
    }

    /// True if `self` is `ancestor` or derives from it.
    pub fn is_subtype_of(&self, ancestor: &TypeDescriptor) -> bool {
        let mut current = Some(self);
        while let Some(desc) = current {
            if desc.same_type(ancestor) {
                return true;
            }
            current = desc.parent.as_deref();
        }
        false
    }

    pub fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| compute_layout(self))
    }

    /// Native struct size (padded to the type's alignment).
    pub fn size(&self) -> usize {
        self.layout().size()
    }

    pub fn align(&self) -> usize {
        self.layout().align()
    }

    /// Index of the first field named `name` (case-insensitive), optionally
    /// restricted to one kind.
    pub fn find_field(&self, name: &str, kind: Option<KindTag>) -> Option<usize> {
        self.fields.iter().position(|f| {
            f.name.eq_ignore_ascii_case(name) && kind.map_or(true, |k| f.tag() == k)
        })
    }

    /// Indicator slots consumed by fields `0..through`, excluding this
    /// instance's own leading slot.
    pub fn indicator_slot_count(&self, through: usize) -> usize {
        let layout = self.layout();
        if through >= self.fields.len() {
            layout.indicator_slots()
        } else {
            layout.indicator_offsets()[through] - 1
        }
    }

    /// Slot of field `index` relative to this instance's indicator window.
    pub fn indicator_offset(&self, index: usize) -> Option<usize> {
        self.layout().indicator_offsets().get(index).copied()
    }

    /// Slots in a root instance's indicator array (own slot included).
    pub fn indicator_len(&self) -> usize {
        1 + self.layout().indicator_slots()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("handle", &self.handle)
            .field("name", &self.qualified_name())
            .field("fields", &self.fields.len())
            .field("parent", &self.parent.as_ref().map(|p| p.qualified_name()))
            .field("is_final", &self.is_final)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
