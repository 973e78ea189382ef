// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary to the data source's type catalog.
//!
//! The engine never talks to a server itself. Whatever owns the connection
//! implements [`Catalog`] so the registry can ask for an instance's runtime
//! type, describe a type handle, and fetch a descriptor by qualified name.
//! [`MemoryCatalog`] is an in-process implementation.

use crate::config::MAX_NAME_LEN;
use crate::error::{Error, Result};
use crate::types::{TypeDescriptor, TypeHandle};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Handle of a fetched instance, as known by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Failure reported by a catalog implementation.
#[derive(Debug, Clone, Error)]
#[error("{operation}: {message}")]
pub struct CatalogError {
    pub operation: &'static str,
    pub message: String,
}

impl CatalogError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Schema and name of a type, as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub schema: String,
    pub name: String,
}

impl TypeName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// `SCHEMA.NAME`; each part is limited to [`MAX_NAME_LEN`].
    pub fn qualified(&self) -> Result<String> {
        for part in [&self.schema, &self.name] {
            if part.len() > MAX_NAME_LEN {
                return Err(Error::InvalidArgument(format!(
                    "name part '{part}' exceeds {MAX_NAME_LEN} characters"
                )));
            }
        }
        if self.name.is_empty() {
            return Err(Error::InvalidArgument("type name is empty".into()));
        }
        Ok(if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        })
    }
}

/// Type metadata provider backing dynamic type resolution.
pub trait Catalog: Send + Sync {
    /// Runtime (most-derived) type of a fetched instance.
    fn runtime_type(&self, instance: InstanceHandle) -> CatalogResult<TypeHandle>;

    /// Schema and name of a type handle.
    fn describe(&self, handle: TypeHandle) -> CatalogResult<TypeName>;

    /// Fetch the descriptor of a qualified type name.
    fn lookup(&self, qualified_name: &str) -> CatalogResult<Arc<TypeDescriptor>>;
}

/// In-process catalog with call counters.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    by_name: DashMap<String, Arc<TypeDescriptor>>,
    by_handle: DashMap<TypeHandle, Arc<TypeDescriptor>>,
    instances: DashMap<InstanceHandle, TypeHandle>,
    runtime_calls: AtomicUsize,
    describe_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `desc` (and, transitively, its parent and nested types) known.
    pub fn define(&self, desc: &Arc<TypeDescriptor>) {
        if let Some(parent) = desc.parent() {
            self.define(parent);
        }
        for field in desc.fields() {
            if let Some(nested) = field.kind().nested() {
                self.define(nested);
            }
        }
        self.by_name
            .insert(desc.qualified_name().to_ascii_uppercase(), Arc::clone(desc));
        self.by_handle.insert(desc.handle(), Arc::clone(desc));
    }

    /// Record the runtime type of an instance.
    pub fn bind(&self, instance: InstanceHandle, handle: TypeHandle) {
        self.instances.insert(instance, handle);
    }

    pub fn runtime_calls(&self) -> usize {
        self.runtime_calls.load(Ordering::Relaxed)
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::Relaxed)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::Relaxed)
    }
}

impl Catalog for MemoryCatalog {
    fn runtime_type(&self, instance: InstanceHandle) -> CatalogResult<TypeHandle> {
        self.runtime_calls.fetch_add(1, Ordering::Relaxed);
        self.instances
            .get(&instance)
            .map(|h| *h.value())
            .ok_or_else(|| CatalogError::new("runtime_type", format!("unknown {instance}")))
    }

    fn describe(&self, handle: TypeHandle) -> CatalogResult<TypeName> {
        self.describe_calls.fetch_add(1, Ordering::Relaxed);
        self.by_handle
            .get(&handle)
            .map(|d| TypeName::new(d.schema(), d.name()))
            .ok_or_else(|| CatalogError::new("describe", format!("unknown type {handle}")))
    }

    fn lookup(&self, qualified_name: &str) -> CatalogResult<Arc<TypeDescriptor>> {
        self.lookup_calls.fetch_add(1, Ordering::Relaxed);
        self.by_name
            .get(&qualified_name.to_ascii_uppercase())
            .map(|d| d.value().clone())
            .ok_or_else(|| CatalogError::new("lookup", format!("unknown type '{qualified_name}'")))
    }
}
