// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # objrt - Composite object runtime
//!
//! Client-side engine for user-defined composite types fetched from (or
//! created for) a relational data source: type descriptors, native layout
//! computation, per-attribute null indicators, dynamic runtime-type
//! resolution and typed attribute accessors over an accounted allocator.
//!
//! ## Quick Start
//!
//! ```rust
//! use objrt::memory::Allocator;
//! use objrt::object::OwnedObject;
//! use objrt::types::{NumericSubtype, TypeDescriptorBuilder};
//!
//! # fn main() -> objrt::Result<()> {
//! let address = TypeDescriptorBuilder::new("HR", "ADDRESS_T")
//!     .text("CITY")
//!     .numeric("ZIP", NumericSubtype::Int)
//!     .build()?;
//! let person = TypeDescriptorBuilder::new("HR", "PERSON_T")
//!     .text("NAME")
//!     .object("HOME", &address)
//!     .build()?;
//!
//! let mut obj = OwnedObject::new(&person, &Allocator::global())?;
//! obj.set_string("NAME", "Ada")?;
//! obj.object_mut("HOME")?.set_int("ZIP", 75001)?;
//!
//! assert_eq!(obj.to_text()?, "PERSON_T('Ada', ADDRESS_T(NULL, 75001))");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  Runtime (config, registry, catalog, allocator)               |
//! +---------------------------------------------------------------+
//! |  object: OwnedObject / FieldView / FieldViewMut, accessors    |
//! +---------------------------------------------------------------+
//! |  types: descriptors, layout, indicators, TypeRegistry         |
//! +---------------------------------------------------------------+
//! |  hash: case-insensitive chained table                         |
//! +---------------------------------------------------------------+
//! |  memory: categorized, accounted allocation                    |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`memory`] - allocator with external/internal accounting
//! - [`hash`] - generic string-keyed hash table
//! - [`types`] - type descriptors, layout and the type registry
//! - [`object`] - instances and typed accessors
//! - [`catalog`] - boundary to the data source's type catalog
//! - [`runtime`] - facade tying it together

/// Boundary to the data source's type catalog.
pub mod catalog;
/// Constants and runtime configuration.
pub mod config;
/// Crate-wide error type.
pub mod error;
/// Generic case-insensitive hash table.
pub mod hash;
/// Categorized memory accounting and allocation.
pub mod memory;
/// Composite instances and attribute accessors.
pub mod object;
/// Runtime facade.
pub mod runtime;
/// Type descriptors, native layout and type registry.
pub mod types;

pub use catalog::{Catalog, InstanceHandle, MemoryCatalog};
pub use config::{EngineConfig, TypeFallback};
pub use error::{Error, Result};
pub use memory::{Allocator, Category, MemoryAccounting};
pub use object::{FieldView, FieldViewMut, Number, Object, ObjectLifetime, OwnedObject};
pub use runtime::Runtime;
pub use types::{DataKind, NumericSubtype, TypeDescriptor, TypeDescriptorBuilder, TypeHandle};
