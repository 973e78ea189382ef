// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Case-insensitive chained hash table with multi-value entries.
//!
//! A table holds values of exactly one [`ValueKind`], fixed at creation.
//! Keys hash with `h = 31 * h + upper(c)` over their characters, reduced
//! modulo the bucket count; collisions chain in insertion order and each
//! entry keeps its values in insertion order.
//!
//! All memory (bucket array, entries, values) is charged to
//! [`Category::Internal`] through the table's [`Allocator`].

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use crate::memory::{Allocator, Category, Charge};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Kind of the values a table stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Pointer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Pointer => "pointer",
        })
    }
}

/// Shared opaque payload stored by pointer tables.
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// One stored value.
#[derive(Clone)]
pub enum HashValue {
    Text(String),
    Integer(i32),
    Pointer(Opaque),
}

impl HashValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            HashValue::Text(_) => ValueKind::Text,
            HashValue::Integer(_) => ValueKind::Integer,
            HashValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HashValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            HashValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Opaque> {
        match self {
            HashValue::Pointer(p) => Some(p),
            _ => None,
        }
    }

    fn footprint(&self) -> usize {
        let extra = match self {
            HashValue::Text(s) => s.len(),
            _ => 0,
        };
        std::mem::size_of::<StoredValue>() + extra
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            HashValue::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            HashValue::Pointer(p) => write!(f, "Pointer({:p})", Arc::as_ptr(p)),
        }
    }
}

struct StoredValue {
    value: HashValue,
    _charge: Charge,
}

/// A key and the values added under it.
pub struct HashEntry {
    key: String,
    values: Vec<StoredValue>,
    _charge: Charge,
}

impl HashEntry {
    /// Key as first created (original case preserved).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn values(&self) -> impl Iterator<Item = &HashValue> {
        self.values.iter().map(|v| &v.value)
    }

    pub fn first_value(&self) -> Option<&HashValue> {
        self.values.first().map(|v| &v.value)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for HashEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashEntry")
            .field("key", &self.key)
            .field("values", &self.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Hash a key for a table of `bucket_count` buckets.
pub fn hash_key(key: &str, bucket_count: usize) -> usize {
    let h = key.chars().fold(0u32, |h, c| {
        h.wrapping_mul(31)
            .wrapping_add(c.to_ascii_uppercase() as u32)
    });
    h as usize % bucket_count.max(1)
}

/// Chained, case-insensitive, single-kind hash table.
pub struct HashTable {
    kind: ValueKind,
    buckets: Vec<Vec<HashEntry>>,
    entries: usize,
    allocator: Allocator,
    _buckets_charge: Charge,
}

impl HashTable {
    pub fn new(bucket_count: usize, kind: ValueKind, allocator: &Allocator) -> Result<Self> {
        if bucket_count == 0 {
            return Err(Error::InvalidArgument(
                "hash table needs at least one bucket".into(),
            ));
        }

        let bytes = bucket_count
            .checked_mul(std::mem::size_of::<Vec<HashEntry>>())
            .ok_or(Error::OutOfMemory {
                category: Category::Internal,
                size: usize::MAX,
            })?;
        let charge = allocator.charge(Category::Internal, bytes)?;

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(bucket_count)
            .map_err(|_| Error::OutOfMemory {
                category: Category::Internal,
                size: bytes,
            })?;
        buckets.resize_with(bucket_count, Vec::new);

        log::debug!("[hash] created {} table with {} buckets", kind, bucket_count);
        Ok(Self {
            kind,
            buckets,
            entries: 0,
            allocator: allocator.clone(),
            _buckets_charge: charge,
        })
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of distinct keys.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn hash(&self, key: &str) -> usize {
        hash_key(key, self.buckets.len())
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, key: &str) -> Option<&HashEntry> {
        self.buckets[self.hash(key)]
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
    }

    /// Find `key`, appending a new empty entry at the end of its chain
    /// when absent and `create` is set.
    pub fn lookup_or_create(&mut self, key: &str, create: bool) -> Result<Option<&mut HashEntry>> {
        let bucket = self.hash(key);
        let found = self.buckets[bucket]
            .iter()
            .position(|e| e.key.eq_ignore_ascii_case(key));

        if let Some(pos) = found {
            return Ok(Some(&mut self.buckets[bucket][pos]));
        }
        if !create {
            return Ok(None);
        }

        let size = std::mem::size_of::<HashEntry>() + key.len();
        let charge = self.allocator.charge(Category::Internal, size)?;
        let chain = &mut self.buckets[bucket];
        chain.try_reserve(1).map_err(|_| Error::OutOfMemory {
            category: Category::Internal,
            size,
        })?;
        chain.push(HashEntry {
            key: key.to_string(),
            values: Vec::new(),
            _charge: charge,
        });
        self.entries += 1;
        Ok(chain.last_mut())
    }

    /// Append `value` under `key` (creating the entry if needed).
    pub fn add_value(&mut self, key: &str, value: HashValue) -> Result<()> {
        self.check_kind(value.kind())?;

        let size = value.footprint();
        let charge = self.allocator.charge(Category::Internal, size)?;
        let Some(entry) = self.lookup_or_create(key, true)? else {
            return Err(Error::InvalidArgument(format!("cannot create key '{key}'")));
        };
        entry.values.try_reserve(1).map_err(|_| Error::OutOfMemory {
            category: Category::Internal,
            size,
        })?;
        entry.values.push(StoredValue {
            value,
            _charge: charge,
        });
        Ok(())
    }

    pub fn add_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.add_value(key, HashValue::Text(value.to_string()))
    }

    pub fn add_int(&mut self, key: &str, value: i32) -> Result<()> {
        self.add_value(key, HashValue::Integer(value))
    }

    pub fn add_pointer(&mut self, key: &str, value: Opaque) -> Result<()> {
        self.add_value(key, HashValue::Pointer(value))
    }

    /// First value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<&HashValue> {
        self.lookup(key).and_then(HashEntry::first_value)
    }

    pub fn get_string(&self, key: &str) -> Result<Option<&str>> {
        self.check_kind(ValueKind::Text)?;
        Ok(self.get_value(key).and_then(HashValue::as_str))
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i32>> {
        self.check_kind(ValueKind::Integer)?;
        Ok(self.get_value(key).and_then(HashValue::as_int))
    }

    pub fn get_pointer(&self, key: &str) -> Result<Option<Opaque>> {
        self.check_kind(ValueKind::Pointer)?;
        Ok(self.get_value(key).and_then(HashValue::as_pointer).cloned())
    }

    /// [`get_pointer`](Self::get_pointer) downcast to a concrete payload.
    pub fn get_pointer_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        match self.get_pointer(key)? {
            None => Ok(None),
            Some(p) => p.downcast::<T>().map(Some).map_err(|_| {
                Error::mismatch(
                    format!("hash key '{key}'"),
                    std::any::type_name::<T>(),
                    "another pointer payload",
                )
            }),
        }
    }

    /// Chain stored in bucket `index`, in insertion order.
    pub fn bucket(&self, index: usize) -> Result<&[HashEntry]> {
        self.buckets.get(index).map(Vec::as_slice).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "bucket {index} out of range (table has {})",
                self.buckets.len()
            ))
        })
    }

    /// All entries, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &HashEntry> {
        self.buckets.iter().flatten()
    }

    /// Release every entry, value and the bucket array.
    pub fn destroy(self) {
        log::debug!("[hash] destroying table with {} entries", self.entries);
    }

    fn check_kind(&self, requested: ValueKind) -> Result<()> {
        if requested == self.kind {
            Ok(())
        } else {
            Err(Error::mismatch("hash table", self.kind, requested))
        }
    }
}

impl fmt::Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("kind", &self.kind)
            .field("buckets", &self.buckets.len())
            .field("entries", &self.entries)
            .finish()
    }
}
