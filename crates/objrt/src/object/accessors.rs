// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed getters and setters.
//!
//! Getters return `Ok(None)` for null attributes. Setters take
//! `impl Into<Option<T>>`; `None` marks the attribute null. Every setter
//! converts and validates before touching the instance, so a failed call
//! leaves it unchanged.

use super::cell::CellsMut;
use super::date;
use super::handles::{
    CollHandle, ExternalHandle, FileLocator, IntervalHandle, LobLocator, OpaqueHandle, RefHandle,
    TimestampHandle,
};
use super::number::Number;
use super::numeric::{parse_numeric, to_cell, translate, Numeric, NumericCell, NumericValue};
use super::storage::{Heap, HeapCell, ObjectStorage};
use super::{FieldView, FieldViewMut, Object};
use crate::config::{DATE_SIZE, IND_NOTNULL, IND_NULL, NUMBER_SIZE};
use crate::error::{Error, Result};
use crate::types::{DataKind, KindTag, NumericSubtype, TypeDescriptor};
use chrono::NaiveDateTime;
use std::borrow::{Borrow, BorrowMut};
use std::sync::Arc;

/// Where a numeric accessor reads from or writes to.
#[derive(Debug, Clone, Copy)]
enum NumericSource {
    Cell(usize, NumericSubtype),
    /// Text attribute holding the number's decimal form.
    Text(usize),
}

impl NumericSource {
    fn index(self) -> usize {
        match self {
            NumericSource::Cell(index, _) | NumericSource::Text(index) => index,
        }
    }
}

/// Offsets (relative to the instance) and kinds of every heap-backed cell
/// of `desc`, nested objects included.
pub(super) fn heap_cells(desc: &TypeDescriptor, base: usize, out: &mut Vec<(usize, KindTag)>) {
    let layout = desc.layout();
    for (field, &offset) in desc.fields().iter().zip(layout.offsets()) {
        match field.kind() {
            DataKind::Text => out.push((base + offset, KindTag::Text)),
            DataKind::Raw => out.push((base + offset, KindTag::Raw)),
            DataKind::Object(nested) => heap_cells(nested, base + offset, out),
            _ => {}
        }
    }
}

macro_rules! numeric_getters {
    ($($(#[$meta:meta])* $name:ident => $type:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, name: &str) -> Result<Option<$type>> {
                self.get_number::<$type>(name)
            }
        )*
    };
}

macro_rules! numeric_setters {
    ($($(#[$meta:meta])* $name:ident => $type:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, name: &str, value: impl Into<Option<$type>>) -> Result<()> {
                self.set_number::<$type>(name, value)
            }
        )*
    };
}

macro_rules! opaque_getters {
    ($($name:ident => $type:ty),* $(,)?) => {
        $(
            pub fn $name(&self, name: &str) -> Result<Option<$type>> {
                self.get_opaque::<$type>(name)
            }
        )*
    };
}

macro_rules! opaque_setters {
    ($($name:ident => $type:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, name: &str, value: impl Into<Option<$type>>) -> Result<()> {
                self.set_opaque::<$type>(name, value.into())
            }
        )*
    };
}

impl<S: Borrow<ObjectStorage>> Object<S> {
    numeric_getters!(
        get_short => i16,
        get_ushort => u16,
        get_int => i32,
        get_uint => u32,
        get_bigint => i64,
        get_biguint => u64,
        get_float => f32,
        get_double => f64,
    );

    opaque_getters!(
        get_lob => LobLocator,
        get_file => FileLocator,
        get_ref => RefHandle,
        get_collection => CollHandle,
        get_timestamp => TimestampHandle,
        get_interval => IntervalHandle,
    );

    /// Read a numeric attribute as `T`. Text attributes are parsed.
    pub fn get_number<T: Numeric>(&self, name: &str) -> Result<Option<T>> {
        match self.numeric_source(name)? {
            NumericSource::Cell(index, subtype) => {
                if self.null_at(index)? {
                    return Ok(None);
                }
                let value = self.read_numeric(index, subtype)?;
                Ok(Some(T::from_value(translate(value, T::REPR)?)))
            }
            NumericSource::Text(index) => match self.heap_cell(index)? {
                Some(HeapCell::Text(text)) => Ok(Some(T::from_value(parse_numeric(text, T::REPR)?))),
                _ => Ok(None),
            },
        }
    }

    /// Read a numeric attribute as a library-native [`Number`].
    pub fn get_decimal(&self, name: &str) -> Result<Option<Number>> {
        match self.numeric_source(name)? {
            NumericSource::Cell(index, subtype) => {
                if self.null_at(index)? {
                    return Ok(None);
                }
                if subtype == NumericSubtype::Number {
                    let offset = self.attribute_address(index)?.offset;
                    let bytes = self.storage().cells().bytes(offset, NUMBER_SIZE)?;
                    return Number::from_slice(bytes).map(Some);
                }
                Number::from_value(self.read_numeric(index, subtype)?).map(Some)
            }
            NumericSource::Text(index) => match self.heap_cell(index)? {
                Some(HeapCell::Text(text)) => text.parse::<Number>().map(Some),
                _ => Ok(None),
            },
        }
    }

    pub fn get_boolean(&self, name: &str) -> Result<Option<bool>> {
        let index = self.locate(name, KindTag::Boolean)?;
        if self.null_at(index)? {
            return Ok(None);
        }
        let offset = self.attribute_address(index)?.offset;
        Ok(Some(self.storage().cells().read_i32(offset)? != 0))
    }

    /// Read any non-opaque attribute as text (numbers, dates, raw bytes in
    /// hexadecimal, nested objects in their text form).
    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        let index = self.require(name)?;
        if self.null_at(index)? {
            return Ok(None);
        }
        self.field_text(index)
    }

    pub fn get_raw(&self, name: &str) -> Result<Option<&[u8]>> {
        let index = self.locate(name, KindTag::Raw)?;
        match self.heap_cell(index)? {
            Some(HeapCell::Raw(bytes)) => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }

    /// Copy a raw attribute into `buf`; returns the number of bytes copied.
    pub fn get_raw_into(&self, name: &str, buf: &mut [u8]) -> Result<Option<usize>> {
        Ok(self.get_raw(name)?.map(|bytes| {
            let n = bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            n
        }))
    }

    pub fn raw_size(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.get_raw(name)?.map(<[u8]>::len))
    }

    pub fn get_date(&self, name: &str) -> Result<Option<NaiveDateTime>> {
        let index = self.locate(name, KindTag::DateTime)?;
        if self.null_at(index)? {
            return Ok(None);
        }
        let offset = self.attribute_address(index)?.offset;
        date::decode(self.storage().cells().bytes(offset, DATE_SIZE)?).map(Some)
    }

    /// Borrow a nested composite attribute.
    pub fn get_object(&self, name: &str) -> Result<Option<FieldView<'_>>> {
        let index = self.locate(name, KindTag::Object)?;
        if self.null_at(index)? {
            return Ok(None);
        }
        self.nested_view(index).map(Some)
    }

    fn get_opaque<H: OpaqueHandle>(&self, name: &str) -> Result<Option<H>> {
        let index = self.locate(name, H::TAG)?;
        if self.null_at(index)? {
            return Ok(None);
        }
        let offset = self.attribute_address(index)?.offset;
        let raw = self.storage().cells().read_usize(offset)?;
        Ok(ExternalHandle::new(raw).map(H::from_external))
    }

    fn numeric_source(&self, name: &str) -> Result<NumericSource> {
        if let Some(index) = self.desc.find_field(name, Some(KindTag::Numeric)) {
            if let DataKind::Numeric(subtype) = self.field(index)?.kind() {
                return Ok(NumericSource::Cell(index, *subtype));
            }
        }
        if let Some(index) = self.desc.find_field(name, Some(KindTag::Text)) {
            return Ok(NumericSource::Text(index));
        }
        self.locate(name, KindTag::Numeric)
            .map(|index| NumericSource::Cell(index, NumericSubtype::Number))
    }

    pub(super) fn read_numeric(&self, index: usize, subtype: NumericSubtype) -> Result<NumericValue> {
        let offset = self.attribute_address(index)?.offset;
        let cells = self.storage().cells();
        Ok(match subtype {
            NumericSubtype::Short => NumericValue::Signed(cells.read_i16(offset)?.into()),
            NumericSubtype::UShort => NumericValue::Unsigned(cells.read_u16(offset)?.into()),
            NumericSubtype::Int => NumericValue::Signed(cells.read_i32(offset)?.into()),
            NumericSubtype::UInt => NumericValue::Unsigned(cells.read_u32(offset)?.into()),
            NumericSubtype::Float | NumericSubtype::Double => {
                NumericValue::Real(cells.read_f64(offset)?)
            }
            NumericSubtype::Number => {
                Number::from_slice(cells.bytes(offset, NUMBER_SIZE)?)?.to_value()?
            }
        })
    }

    /// Payload of a text or raw attribute; `None` when null or unset.
    pub(super) fn heap_cell(&self, index: usize) -> Result<Option<&HeapCell>> {
        if self.null_at(index)? {
            return Ok(None);
        }
        let offset = self.attribute_address(index)?.offset;
        let storage = self.storage();
        let key = storage.cells().read_usize(offset)?;
        storage.heap.get(key)
    }
}

impl<S: BorrowMut<ObjectStorage>> Object<S> {
    numeric_setters!(
        set_short => i16,
        set_ushort => u16,
        set_int => i32,
        set_uint => u32,
        set_bigint => i64,
        set_biguint => u64,
        set_float => f32,
        set_double => f64,
    );

    opaque_setters!(
        set_lob => LobLocator,
        set_file => FileLocator,
        set_ref => RefHandle,
        set_collection => CollHandle,
        set_timestamp => TimestampHandle,
        set_interval => IntervalHandle,
    );

    /// Store `value` into a numeric attribute (range-checked against the
    /// cell's subtype), or its decimal form into a text attribute.
    pub fn set_number<T: Numeric>(&mut self, name: &str, value: impl Into<Option<T>>) -> Result<()> {
        let source = self.numeric_source(name)?;
        let Some(value) = value.into() else {
            return self.mark(source.index(), IND_NULL);
        };
        match source {
            NumericSource::Cell(index, subtype) => {
                let cell = to_cell(subtype, value.to_value())?;
                self.write_numeric(index, cell)
            }
            NumericSource::Text(index) => {
                self.store_heap(index, HeapCell::Text(value.to_value().to_string()))
            }
        }
    }

    pub fn set_decimal(&mut self, name: &str, value: impl Into<Option<Number>>) -> Result<()> {
        let source = self.numeric_source(name)?;
        let Some(value) = value.into() else {
            return self.mark(source.index(), IND_NULL);
        };
        match source {
            NumericSource::Cell(index, NumericSubtype::Number) => {
                self.write_numeric(index, NumericCell::Number(value))
            }
            NumericSource::Cell(index, subtype) => {
                let cell = to_cell(subtype, value.to_value()?)?;
                self.write_numeric(index, cell)
            }
            NumericSource::Text(index) => self.store_heap(index, HeapCell::Text(value.to_string())),
        }
    }

    pub fn set_boolean(&mut self, name: &str, value: impl Into<Option<bool>>) -> Result<()> {
        let index = self.locate(name, KindTag::Boolean)?;
        match value.into() {
            None => self.mark(index, IND_NULL),
            Some(flag) => self.write_scalar(index, |cells, offset| {
                cells.write_i32(offset, i32::from(flag))
            }),
        }
    }

    pub fn set_string<'v>(&mut self, name: &str, value: impl Into<Option<&'v str>>) -> Result<()> {
        let index = self.locate(name, KindTag::Text)?;
        match value.into() {
            None => self.mark(index, IND_NULL),
            Some(text) => self.store_heap(index, HeapCell::Text(text.to_string())),
        }
    }

    pub fn set_raw<'v>(&mut self, name: &str, value: impl Into<Option<&'v [u8]>>) -> Result<()> {
        let index = self.locate(name, KindTag::Raw)?;
        match value.into() {
            None => self.mark(index, IND_NULL),
            Some(bytes) => self.store_heap(index, HeapCell::Raw(bytes.to_vec())),
        }
    }

    pub fn set_date(&mut self, name: &str, value: impl Into<Option<NaiveDateTime>>) -> Result<()> {
        let index = self.locate(name, KindTag::DateTime)?;
        match value.into() {
            None => self.mark(index, IND_NULL),
            Some(when) => {
                let cell = date::encode(&when)?;
                self.write_scalar(index, |cells, offset| cells.write_bytes(offset, &cell))
            }
        }
    }

    /// Writable view of a nested composite attribute. The nested value
    /// becomes non-null.
    pub fn object_mut(&mut self, name: &str) -> Result<FieldViewMut<'_>> {
        let index = self.locate(name, KindTag::Object)?;
        self.mark(index, IND_NOTNULL)?;
        self.nested_view_mut(index)
    }

    /// Deep-copy `value` into a nested composite attribute.
    pub fn set_object<T: Borrow<ObjectStorage>>(
        &mut self,
        name: &str,
        value: Option<&Object<T>>,
    ) -> Result<()> {
        let index = self.locate(name, KindTag::Object)?;
        let Some(source) = value else {
            return self.mark(index, IND_NULL);
        };

        let field = self.field(index)?;
        let declared = field
            .kind()
            .nested()
            .ok_or_else(|| Error::mismatch(field.name(), KindTag::Object, field.tag()))?;
        if !source.desc.same_type(declared) {
            return Err(Error::mismatch(
                format!("attribute {}", self.qualify(name)),
                declared.qualified_name(),
                source.desc.qualified_name(),
            ));
        }

        let addr = self.attribute_address(index)?;
        self.copy_from(addr.offset, addr.indicator, source)
    }

    /// Replace this instance's value with a deep copy of `source`, which
    /// must be of the same type.
    pub fn assign<T: Borrow<ObjectStorage>>(&mut self, source: &Object<T>) -> Result<()> {
        if !source.desc.same_type(&self.desc) {
            return Err(Error::mismatch(
                "assignment",
                self.desc.qualified_name(),
                source.desc.qualified_name(),
            ));
        }
        let (data_base, ind_base) = (self.data_base, self.ind_base);
        self.copy_from(data_base, ind_base, source)
    }

    fn set_opaque<H: OpaqueHandle>(&mut self, name: &str, value: Option<H>) -> Result<()> {
        let index = self.locate(name, H::TAG)?;
        match value {
            None => self.mark(index, IND_NULL),
            Some(handle) => self.write_scalar(index, |cells, offset| {
                cells.write_usize(offset, handle.external().get())
            }),
        }
    }

    fn write_numeric(&mut self, index: usize, cell: NumericCell) -> Result<()> {
        self.write_scalar(index, |cells, offset| match cell {
            NumericCell::I16(v) => cells.write_i16(offset, v),
            NumericCell::U16(v) => cells.write_u16(offset, v),
            NumericCell::I32(v) => cells.write_i32(offset, v),
            NumericCell::U32(v) => cells.write_u32(offset, v),
            NumericCell::F64(v) => cells.write_f64(offset, v),
            NumericCell::Number(n) => cells.write_bytes(offset, n.as_bytes()),
        })
    }

    /// Write a fixed-width cell and mark the attribute non-null.
    fn write_scalar<F>(&mut self, index: usize, write: F) -> Result<()>
    where
        F: FnOnce(&mut CellsMut<'_>, usize) -> Result<()>,
    {
        let addr = self.attribute_address(index)?;
        let storage = self.storage_mut();
        storage.indicator(addr.indicator)?;
        write(&mut storage.cells_mut(), addr.offset)?;
        storage.set_indicator(addr.indicator, IND_NOTNULL)?;
        storage.touch();
        Ok(())
    }

    /// Replace the payload of a text or raw attribute.
    fn store_heap(&mut self, index: usize, cell: HeapCell) -> Result<()> {
        let addr = self.attribute_address(index)?;
        let storage = self.storage_mut();
        storage.indicator(addr.indicator)?;
        let old = storage.cells().read_usize(addr.offset)?;
        storage.heap.reserve(1)?;
        let staged = Heap::stage(&storage.allocator, cell)?;

        storage.heap.remove(old);
        let key = storage.heap.insert(staged);
        storage.cells_mut().write_usize(addr.offset, key)?;
        storage.set_indicator(addr.indicator, IND_NOTNULL)?;
        storage.touch();
        Ok(())
    }

    /// Copy `source`'s whole window (value bytes, indicators, heap payloads)
    /// to `data_off` / `ind_off` of this storage. All fallible work happens
    /// before the first write.
    fn copy_from<T: Borrow<ObjectStorage>>(
        &mut self,
        data_off: usize,
        ind_off: usize,
        source: &Object<T>,
    ) -> Result<()> {
        let desc = Arc::clone(&source.desc);
        let slots = desc.indicator_len();
        let mut payloads = Vec::new();
        heap_cells(&desc, 0, &mut payloads);

        let from = source.storage();
        let bytes = from.cells().bytes(source.data_base, desc.size())?;
        let indicators = (0..slots)
            .map(|slot| from.indicator(source.ind_base + slot))
            .collect::<Result<Vec<_>>>()?;

        let dest = self.storage_mut();
        dest.cells().bytes(data_off, desc.size())?;
        if ind_off + slots > dest.indicator_count() {
            return Err(Error::InvalidArgument(format!(
                "indicator window {}..{} exceeds {} slots",
                ind_off,
                ind_off + slots,
                dest.indicator_count()
            )));
        }

        dest.heap.reserve(payloads.len())?;
        let mut staged = Vec::with_capacity(payloads.len());
        let mut replaced = Vec::with_capacity(payloads.len());
        for &(rel, _) in &payloads {
            let key = from.cells().read_usize(source.data_base + rel)?;
            staged.push(match from.heap.get(key)? {
                Some(cell) => Some(Heap::stage(&dest.allocator, cell.clone())?),
                None => None,
            });
            replaced.push(dest.cells().read_usize(data_off + rel)?);
        }

        for key in replaced {
            dest.heap.remove(key);
        }
        dest.cells_mut().write_bytes(data_off, bytes)?;
        for (slot, value) in indicators.into_iter().enumerate() {
            dest.set_indicator(ind_off + slot, value)?;
        }
        for (&(rel, _), cell) in payloads.iter().zip(staged) {
            let key = cell.map_or(0, |c| dest.heap.insert(c));
            dest.cells_mut().write_usize(data_off + rel, key)?;
        }
        dest.touch();
        Ok(())
    }
}
