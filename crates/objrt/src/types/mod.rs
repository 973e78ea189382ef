// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composite type metadata.
//!
//! A [`TypeDescriptor`] is the immutable shape of a composite type: its
//! fields in declaration order (inherited fields first), its parent, and a
//! memoized [`Layout`] giving the native size, alignment, field offsets and
//! null-indicator addressing of an instance.
//!
//! Descriptors come from a [`Catalog`](crate::catalog::Catalog) or from
//! [`TypeDescriptorBuilder`], and are shared process-wide through the
//! [`TypeRegistry`].

mod builder;
mod descriptor;
mod layout;
mod registry;


pub use builder::TypeDescriptorBuilder;
pub use descriptor::{FieldDescriptor, TypeDescriptor};
pub use layout::{field_footprint, round_up, Layout};
pub use registry::{LookupStats, TypeRegistry};

use crate::config::{BOOLEAN_SIZE, DATE_ALIGN, DATE_SIZE, NUMBER_SIZE, POINTER_SIZE};
use std::fmt;
use std::sync::Arc;

/// Identity of a composite type (the catalog's type object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub u64);

impl TypeHandle {
    /// FNV-1a over the upper-cased qualified name.
    pub fn from_name(qualified_name: &str) -> Self {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let hash = qualified_name.bytes().fold(FNV_OFFSET, |h, b| {
            (h ^ u64::from(b.to_ascii_uppercase())).wrapping_mul(FNV_PRIME)
        });
        Self(hash)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Native representation of a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericSubtype {
    Short,
    UShort,
    Int,
    UInt,
    /// Single precision on the wire, stored in a double cell.
    Float,
    Double,
    /// Library-native 22-byte number.
    Number,
}

impl NumericSubtype {
    /// (size, alignment) of the cell.
    pub fn footprint(&self) -> (usize, usize) {
        match self {
            Self::Short | Self::UShort => (2, 2),
            Self::Int | Self::UInt => (4, 4),
            Self::Float | Self::Double => (8, std::mem::align_of::<f64>()),
            Self::Number => (NUMBER_SIZE, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobKind {
    Clob,
    NClob,
    Blob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Bfile,
    Cfile,
}

/// Declared kind of a field.
#[derive(Debug, Clone)]
pub enum DataKind {
    Boolean,
    Numeric(NumericSubtype),
    DateTime,
    Timestamp,
    Interval,
    Lob(LobKind),
    File(FileKind),
    Ref,
    /// Nested composite stored inline.
    Object(Arc<TypeDescriptor>),
    Collection,
    Raw,
    Text,
}

impl DataKind {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Boolean => KindTag::Boolean,
            Self::Numeric(_) => KindTag::Numeric,
            Self::DateTime => KindTag::DateTime,
            Self::Timestamp => KindTag::Timestamp,
            Self::Interval => KindTag::Interval,
            Self::Lob(_) => KindTag::Lob,
            Self::File(_) => KindTag::File,
            Self::Ref => KindTag::Ref,
            Self::Object(_) => KindTag::Object,
            Self::Collection => KindTag::Collection,
            Self::Raw => KindTag::Raw,
            Self::Text => KindTag::Text,
        }
    }

    /// Nested descriptor of an `Object` field.
    pub fn nested(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Object(desc) => Some(desc),
            _ => None,
        }
    }
}

impl PartialEq for DataKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a == b,
            (Self::Lob(a), Self::Lob(b)) => a == b,
            (Self::File(a), Self::File(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.handle() == b.handle(),
            (a, b) => a.tag() == b.tag() && a.tag() != KindTag::Object,
        }
    }
}

/// Payload-free kind, used to filter name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Boolean,
    Numeric,
    DateTime,
    Timestamp,
    Interval,
    Lob,
    File,
    Ref,
    Object,
    Collection,
    Raw,
    Text,
}

impl KindTag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::DateTime => "date",
            Self::Timestamp => "timestamp",
            Self::Interval => "interval",
            Self::Lob => "lob",
            Self::File => "file",
            Self::Ref => "ref",
            Self::Object => "object",
            Self::Collection => "collection",
            Self::Raw => "raw",
            Self::Text => "text",
        }
    }

    /// Kinds stored as a pointer-sized cell.
    pub fn is_pointer_sized(&self) -> bool {
        !matches!(
            self,
            Self::Boolean | Self::Numeric | Self::DateTime | Self::Object
        )
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// (size, alignment) of scalar kinds; `None` for nested objects.
pub(crate) fn scalar_footprint(kind: &DataKind) -> Option<(usize, usize)> {
    match kind {
        DataKind::Boolean => Some((BOOLEAN_SIZE, BOOLEAN_SIZE)),
        DataKind::Numeric(sub) => Some(sub.footprint()),
        DataKind::DateTime => Some((DATE_SIZE, DATE_ALIGN)),
        DataKind::Object(_) => None,
        _ => Some((POINTER_SIZE, POINTER_SIZE)),
    }
}
