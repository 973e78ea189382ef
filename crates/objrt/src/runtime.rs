// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine entry point tying configuration, memory accounting, the type
//! registry and a catalog together.

use crate::catalog::{Catalog, InstanceHandle};
use crate::config::{EngineConfig, TypeFallback};
use crate::error::Result;
use crate::memory::{Allocator, MemoryAccounting};
use crate::object::{FetchedObject, OwnedObject};
use crate::types::{TypeDescriptor, TypeRegistry};
use std::fmt;
use std::sync::Arc;

/// Object runtime.
///
/// Each runtime owns its own accounting context, so limits configured in
/// [`EngineConfig::limits`] apply to everything it allocates.
///
/// # Example
///
/// ```
/// use objrt::catalog::MemoryCatalog;
/// use objrt::config::EngineConfig;
/// use objrt::runtime::Runtime;
/// use objrt::types::TypeDescriptorBuilder;
/// use std::sync::Arc;
///
/// let person = TypeDescriptorBuilder::new("HR", "PERSON_T").text("NAME").build().unwrap();
/// let catalog = Arc::new(MemoryCatalog::new());
/// catalog.define(&person);
///
/// let runtime = Runtime::new(EngineConfig::default(), catalog).unwrap();
/// let desc = runtime.type_info("hr.person_t").unwrap();
/// let mut obj = runtime.create_object(&desc).unwrap();
/// obj.set_string("NAME", "Ada").unwrap();
/// assert_eq!(obj.to_string(), "PERSON_T('Ada')");
/// ```
pub struct Runtime {
    config: EngineConfig,
    allocator: Allocator,
    registry: TypeRegistry,
    catalog: Arc<dyn Catalog>,
    date_format: Arc<str>,
}

impl Runtime {
    pub fn new(config: EngineConfig, catalog: Arc<dyn Catalog>) -> Result<Self> {
        let accounting = Arc::new(MemoryAccounting::with_limits(config.limits));
        let allocator = Allocator::new(accounting);
        let registry = TypeRegistry::new(config.registry_buckets, &allocator)?;
        log::info!(
            "[runtime] started (buckets={}, fallback={:?})",
            config.registry_buckets,
            config.type_fallback
        );
        Ok(Self {
            date_format: Arc::from(config.date_format.as_str()),
            config,
            allocator,
            registry,
            catalog,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn accounting(&self) -> &Arc<MemoryAccounting> {
        self.allocator.accounting()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Descriptor of `qualified_name`, from the registry or the catalog.
    pub fn type_info(&self, qualified_name: &str) -> Result<Arc<TypeDescriptor>> {
        self.registry.get_or_fetch(qualified_name, &*self.catalog)
    }

    /// Make a locally built descriptor known to the registry.
    pub fn register_type(&self, desc: &Arc<TypeDescriptor>) -> Result<()> {
        self.registry.register(Arc::clone(desc))
    }

    /// New local instance of `desc`.
    pub fn create_object(&self, desc: &Arc<TypeDescriptor>) -> Result<OwnedObject> {
        Ok(OwnedObject::new(desc, &self.allocator)?.with_date_format(Arc::clone(&self.date_format)))
    }

    /// Runtime type of `instance`, whose declared type is `declared`, under
    /// the configured fallback policy.
    pub fn resolve_real_type(
        &self,
        declared: &Arc<TypeDescriptor>,
        instance: InstanceHandle,
    ) -> Result<Arc<TypeDescriptor>> {
        self.registry.resolve_real_type(
            declared,
            instance,
            &*self.catalog,
            self.config.type_fallback,
        )
    }

    /// Materialize a fetched instance as its runtime type.
    pub fn materialize(
        &self,
        fetched: FetchedObject,
        declared: &Arc<TypeDescriptor>,
    ) -> Result<OwnedObject> {
        self.materialize_with(fetched, declared, self.config.type_fallback)
    }

    pub fn materialize_with(
        &self,
        fetched: FetchedObject,
        declared: &Arc<TypeDescriptor>,
        fallback: TypeFallback,
    ) -> Result<OwnedObject> {
        let real =
            self.registry
                .resolve_real_type(declared, fetched.handle, &*self.catalog, fallback)?;
        Ok(OwnedObject::from_fetched(&real, fetched, &self.allocator)?
            .with_date_format(Arc::clone(&self.date_format)))
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("memory", &self.accounting().stats())
            .finish()
    }
}
