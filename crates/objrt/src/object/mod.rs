// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composite instances and typed attribute access.
//!
//! An instance is a native value buffer laid out by its type's
//! [`Layout`](crate::types::Layout), plus an array of 16-bit null
//! indicators and a heap for text and raw payloads. The root instance owns
//! all three ([`OwnedObject`]); nested composite fields are accessed through
//! views ([`FieldView`], [`FieldViewMut`]) that borrow the root's storage at
//! an offset and never free anything.
//!
//! # Indicator addressing
//!
//! Each instance sees a window of the indicator array. Slot 0 of the window
//! is the instance's own nullability; field `i` is at
//! `TypeDescriptor::indicator_offset(i)`. A nested field's slot is the
//! nested view's slot 0.
//!
//! # Example
//!
//! ```
//! use objrt::memory::Allocator;
//! use objrt::object::OwnedObject;
//! use objrt::types::{NumericSubtype, TypeDescriptorBuilder};
//!
//! let point = TypeDescriptorBuilder::new("GEO", "POINT_T")
//!     .numeric("X", NumericSubtype::Double)
//!     .numeric("Y", NumericSubtype::Double)
//!     .text("LABEL")
//!     .build()
//!     .unwrap();
//!
//! let mut obj = OwnedObject::new(&point, &Allocator::global()).unwrap();
//! obj.set_double("x", 1.5).unwrap();
//! obj.set_string("label", "origin").unwrap();
//!
//! assert_eq!(obj.get_double("X").unwrap(), Some(1.5));
//! assert_eq!(obj.get_double("Y").unwrap(), None);
//! assert_eq!(obj.to_text().unwrap(), "POINT_T(1.5, NULL, 'origin')");
//! ```

mod accessors;
mod cell;
mod date;
mod handles;
mod image;
mod number;
mod numeric;
mod storage;
mod text;


pub use handles::{
    CollHandle, ExternalHandle, FileLocator, IntervalHandle, LobLocator, OpaqueHandle, RefHandle,
    TimestampHandle,
};
pub use image::{FetchedObject, ObjectImage};
pub use number::Number;
pub use numeric::{translate, Numeric, NumericRepr, NumericValue};
pub use storage::{HandleState, HeapCell, ObjectLifetime, ObjectStorage};

use crate::catalog::InstanceHandle;
use crate::config::{IND_NOTNULL, IND_NULL};
use crate::error::{Error, Result};
use crate::memory::Allocator;
use crate::types::{FieldDescriptor, KindTag, TypeDescriptor};
use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::sync::Arc;

/// Composite instance over some storage.
pub struct Object<S> {
    desc: Arc<TypeDescriptor>,
    storage: S,
    data_base: usize,
    ind_base: usize,
}

/// Root instance owning its buffers.
pub type OwnedObject = Object<ObjectStorage>;

/// Read-only view of a nested composite field.
pub type FieldView<'a> = Object<&'a ObjectStorage>;

/// Writable view of a nested composite field.
pub type FieldViewMut<'a> = Object<&'a mut ObjectStorage>;

/// Location of one attribute inside the root's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrAddress {
    /// Byte offset of the value cell in the root value buffer.
    pub offset: usize,
    /// Width of the value cell.
    pub size: usize,
    /// Slot in the root indicator array.
    pub indicator: usize,
}

impl OwnedObject {
    /// New local instance of `desc`: zeroed buffer, instance non-null, every
    /// attribute null.
    pub fn new(desc: &Arc<TypeDescriptor>, allocator: &Allocator) -> Result<Self> {
        let mut storage = ObjectStorage::allocate(desc, allocator)?;
        storage.set_indicator(0, IND_NOTNULL)?;
        Ok(Self::root(Arc::clone(desc), storage))
    }

    pub(crate) fn root(desc: Arc<TypeDescriptor>, storage: ObjectStorage) -> Self {
        Self {
            desc,
            storage,
            data_base: 0,
            ind_base: 0,
        }
    }

    /// Format used when date attributes are read as text.
    pub fn with_date_format(mut self, format: impl Into<Arc<str>>) -> Self {
        self.storage.date_format = format.into();
        self
    }

    pub fn into_storage(self) -> ObjectStorage {
        self.storage
    }
}

impl<S: Borrow<ObjectStorage>> Object<S> {
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.desc
    }

    pub fn type_name(&self) -> String {
        self.desc.qualified_name()
    }

    pub fn storage(&self) -> &ObjectStorage {
        self.storage.borrow()
    }

    /// Data-source handle of the root instance (`None` for local ones).
    pub fn handle(&self) -> Option<InstanceHandle> {
        self.storage().handle
    }

    pub fn state(&self) -> HandleState {
        self.storage().state
    }

    /// Lifetime of this instance. Field views are always values.
    pub fn lifetime(&self) -> ObjectLifetime {
        if self.is_root() {
            self.storage().lifetime
        } else {
            ObjectLifetime::Value
        }
    }

    /// True for root instances, false for field views.
    pub fn is_root(&self) -> bool {
        self.ind_base == 0
    }

    /// Borrow this instance as a read-only view.
    pub fn view(&self) -> FieldView<'_> {
        Object {
            desc: Arc::clone(&self.desc),
            storage: self.storage.borrow(),
            data_base: self.data_base,
            ind_base: self.ind_base,
        }
    }

    /// Index of the attribute `name` (case-insensitive), optionally
    /// restricted to `kind`. With `must_exist`, a miss is an error.
    pub fn resolve_index(
        &self,
        name: &str,
        kind: Option<KindTag>,
        must_exist: bool,
    ) -> Result<Option<usize>> {
        match self.desc.find_field(name, kind) {
            Some(index) => Ok(Some(index)),
            None if must_exist => Err(Error::AttributeNotFound(self.qualify(name))),
            None => Ok(None),
        }
    }

    /// Value and indicator location of attribute `index`.
    pub fn attribute_address(&self, index: usize) -> Result<AttrAddress> {
        let field = self.field(index)?;
        let layout = self.desc.layout();
        let offset = layout
            .offset(index)
            .ok_or_else(|| self.bad_index(index))?;
        let indicator = self
            .desc
            .indicator_offset(index)
            .ok_or_else(|| self.bad_index(index))?;
        Ok(AttrAddress {
            offset: self.data_base + offset,
            size: field.footprint().0,
            indicator: self.ind_base + indicator,
        })
    }

    pub fn is_null(&self, name: &str) -> Result<bool> {
        let index = self.require(name)?;
        self.null_at(index)
    }

    /// Whether the instance itself (not one of its attributes) is null.
    pub fn is_atomically_null(&self) -> Result<bool> {
        Ok(self.storage().indicator(self.ind_base)? == IND_NULL)
    }

    fn field(&self, index: usize) -> Result<&FieldDescriptor> {
        self.desc.field(index).ok_or_else(|| self.bad_index(index))
    }

    fn bad_index(&self, index: usize) -> Error {
        Error::InvalidArgument(format!(
            "attribute index {index} out of range for {}",
            self.desc.qualified_name()
        ))
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.desc.qualified_name(), name)
    }

    /// Index of `name` under any kind.
    fn require(&self, name: &str) -> Result<usize> {
        self.resolve_index(name, None, true)?
            .ok_or_else(|| Error::AttributeNotFound(self.qualify(name)))
    }

    /// Index of `name` declared as `tag`; a same-named attribute of another
    /// kind is a type mismatch.
    fn locate(&self, name: &str, tag: KindTag) -> Result<usize> {
        if let Some(index) = self.desc.find_field(name, Some(tag)) {
            return Ok(index);
        }
        let index = self.require(name)?;
        Err(Error::mismatch(
            format!("attribute {}", self.qualify(name)),
            tag,
            self.field(index)?.tag(),
        ))
    }

    fn null_at(&self, index: usize) -> Result<bool> {
        let addr = self.attribute_address(index)?;
        Ok(self.storage().indicator(addr.indicator)? == IND_NULL)
    }

    fn nested_view(&self, index: usize) -> Result<FieldView<'_>> {
        let field = self.field(index)?;
        let nested = field
            .kind()
            .nested()
            .ok_or_else(|| Error::mismatch(field.name(), KindTag::Object, field.tag()))?;
        let addr = self.attribute_address(index)?;
        Ok(Object {
            desc: Arc::clone(nested),
            storage: self.storage.borrow(),
            data_base: addr.offset,
            ind_base: addr.indicator,
        })
    }
}

impl<S: BorrowMut<ObjectStorage>> Object<S> {
    /// Borrow this instance as a writable view.
    pub fn view_mut(&mut self) -> FieldViewMut<'_> {
        Object {
            desc: Arc::clone(&self.desc),
            storage: self.storage.borrow_mut(),
            data_base: self.data_base,
            ind_base: self.ind_base,
        }
    }

    /// Mark attribute `name` null. The stored cell is left as is.
    pub fn set_null(&mut self, name: &str) -> Result<()> {
        let index = self.require(name)?;
        self.mark(index, IND_NULL)
    }

    fn storage_mut(&mut self) -> &mut ObjectStorage {
        self.storage.borrow_mut()
    }

    fn mark(&mut self, index: usize, value: i16) -> Result<()> {
        let addr = self.attribute_address(index)?;
        let storage = self.storage_mut();
        storage.set_indicator(addr.indicator, value)?;
        storage.touch();
        Ok(())
    }

    fn nested_view_mut(&mut self, index: usize) -> Result<FieldViewMut<'_>> {
        let field = self.field(index)?;
        let nested = field
            .kind()
            .nested()
            .cloned()
            .ok_or_else(|| Error::mismatch(field.name(), KindTag::Object, field.tag()))?;
        let addr = self.attribute_address(index)?;
        Ok(Object {
            desc: nested,
            storage: self.storage.borrow_mut(),
            data_base: addr.offset,
            ind_base: addr.indicator,
        })
    }
}

impl<S: Borrow<ObjectStorage>> fmt::Display for Object<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<{}: {}>", self.desc.qualified_name(), err),
        }
    }
}

impl<S: Borrow<ObjectStorage>> fmt::Debug for Object<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.desc.qualified_name())
            .field("data_base", &self.data_base)
            .field("ind_base", &self.ind_base)
            .field("storage", self.storage())
            .finish()
    }
}
