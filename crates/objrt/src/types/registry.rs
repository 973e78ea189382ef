// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide cache of type descriptors.
//!
//! Descriptors are indexed twice: by type handle (`dashmap`, lock-free
//! reads) and by qualified name (a case-insensitive [`HashTable`] behind a
//! `parking_lot::RwLock`). Misses are serialized by a fetch lock and
//! re-checked under it, so concurrent resolvers of the same type trigger a
//! single catalog fetch.

use super::{TypeDescriptor, TypeHandle};
use crate::catalog::{Catalog, CatalogError, InstanceHandle};
use crate::config::TypeFallback;
use crate::error::{Error, Result};
use crate::hash::{HashTable, ValueKind};
use crate::memory::Allocator;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    /// Descriptors fetched from a catalog.
    pub fetches: u64,
}

pub struct TypeRegistry {
    by_handle: DashMap<TypeHandle, Arc<TypeDescriptor>>,
    by_name: RwLock<HashTable>,
    fetch_lock: Mutex<()>,
    stats: RwLock<LookupStats>,
}

impl TypeRegistry {
    pub fn new(buckets: usize, allocator: &Allocator) -> Result<Self> {
        Ok(Self {
            by_handle: DashMap::new(),
            by_name: RwLock::new(HashTable::new(buckets, ValueKind::Pointer, allocator)?),
            fetch_lock: Mutex::new(()),
            stats: RwLock::new(LookupStats::default()),
        })
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    /// Make `desc` resolvable by handle and by qualified name. The first
    /// descriptor registered under a name keeps it.
    pub fn register(&self, desc: Arc<TypeDescriptor>) -> Result<()> {
        let name = desc.qualified_name();
        {
            let mut table = self.by_name.write();
            if table.lookup(&name).is_none() {
                table.add_pointer(&name, desc.clone())?;
            }
        }
        self.by_handle.insert(desc.handle(), desc);
        Ok(())
    }

    pub fn get(&self, handle: TypeHandle) -> Option<Arc<TypeDescriptor>> {
        self.by_handle.get(&handle).map(|d| d.value().clone())
    }

    /// Case-insensitive lookup by qualified name.
    ///
    /// A name entry that does not hold a descriptor is reported as
    /// [`Error::TypeMismatch`] rather than a miss.
    pub fn get_by_name(&self, qualified_name: &str) -> Result<Option<Arc<TypeDescriptor>>> {
        self.by_name
            .read()
            .get_pointer_as::<TypeDescriptor>(qualified_name)
    }

    /// Registered descriptor for `qualified_name`, fetching it from
    /// `catalog` exactly once on a miss.
    pub fn get_or_fetch(
        &self,
        qualified_name: &str,
        catalog: &dyn Catalog,
    ) -> Result<Arc<TypeDescriptor>> {
        if let Some(hit) = self.get_by_name(qualified_name)? {
            self.record_hit();
            return Ok(hit);
        }

        let _guard = self.fetch_lock.lock();
        if let Some(hit) = self.get_by_name(qualified_name)? {
            self.record_hit();
            return Ok(hit);
        }

        self.record_miss();
        let desc = catalog.lookup(qualified_name)?;
        self.record_fetch();
        log::debug!("[registry] fetched {} ({})", qualified_name, desc.handle());
        self.register(desc.clone())?;
        Ok(desc)
    }

    /// Most-derived type of a fetched instance whose declared type is
    /// `declared`.
    ///
    /// Final types are returned as-is without consulting the catalog. On
    /// failure, [`TypeFallback::Declared`] logs and returns `declared`;
    /// [`TypeFallback::Strict`] propagates the error.
    pub fn resolve_real_type(
        &self,
        declared: &Arc<TypeDescriptor>,
        instance: InstanceHandle,
        catalog: &dyn Catalog,
        fallback: TypeFallback,
    ) -> Result<Arc<TypeDescriptor>> {
        if declared.is_final() {
            return Ok(declared.clone());
        }

        match self.resolve_runtime(declared, instance, catalog) {
            Ok(real) => Ok(real),
            Err(err) if fallback == TypeFallback::Declared => {
                log::warn!(
                    "[registry] cannot resolve runtime type of {} ({}), using declared {}",
                    instance,
                    err,
                    declared.qualified_name()
                );
                Ok(declared.clone())
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_runtime(
        &self,
        declared: &Arc<TypeDescriptor>,
        instance: InstanceHandle,
        catalog: &dyn Catalog,
    ) -> Result<Arc<TypeDescriptor>> {
        let runtime = catalog.runtime_type(instance)?;
        if runtime == declared.handle() {
            return Ok(declared.clone());
        }

        if let Some(hit) = self.get(runtime) {
            self.record_hit();
            return Ok(hit);
        }

        let _guard = self.fetch_lock.lock();
        if let Some(hit) = self.get(runtime) {
            self.record_hit();
            return Ok(hit);
        }

        self.record_miss();
        let name = catalog.describe(runtime)?.qualified()?;
        let real = catalog.lookup(&name)?;
        self.record_fetch();

        if real.handle() != runtime {
            return Err(Error::Backend(CatalogError::new(
                "lookup",
                format!(
                    "'{}' resolved to {} but the instance reports {}",
                    name,
                    real.handle(),
                    runtime
                ),
            )));
        }
        if !real.is_subtype_of(declared) {
            log::warn!(
                "[registry] runtime type {} of {} does not derive from {}",
                name,
                instance,
                declared.qualified_name()
            );
        }

        log::debug!("[registry] {} resolved to {}", instance, name);
        self.register(real.clone())?;
        Ok(real)
    }

    fn record_hit(&self) {
        self.stats.write().hits += 1;
    }

    fn record_miss(&self) {
        self.stats.write().misses += 1;
    }

    fn record_fetch(&self) {
        self.stats.write().fetches += 1;
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.by_handle.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::memory::MemoryAccounting;

    #[test]
    fn test_foreign_name_entry_is_an_error() {
        let registry =
            TypeRegistry::new(8, &Allocator::new(Arc::new(MemoryAccounting::new()))).unwrap();
        registry
            .by_name
            .write()
            .add_pointer("APP.BAD_T", Arc::new(7u32))
            .unwrap();

        assert!(matches!(
            registry.get_by_name("app.bad_t"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(registry.get_by_name("APP.OTHER_T").unwrap().is_none());

        let catalog = MemoryCatalog::new();
        assert!(matches!(
            registry.get_or_fetch("APP.BAD_T", &catalog),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(catalog.lookup_calls(), 0);
        assert_eq!(registry.stats().fetches, 0);
    }
}
