// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! objrt Global Configuration - Single Source of Truth
//!
//! Cell widths, indicator values and name limits live here.
//! **NEVER hardcode them elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (native cell sizes,
//!   indicator encoding, catalog name limits)
//! - **Level 2 (Dynamic)**: [`EngineConfig`] for per-runtime settings
//!   (registry sizing, type fallback policy, memory caps, date rendering)
//!
//! # Example
//!
//! ```
//! use objrt::config::{EngineConfig, TypeFallback, NUMBER_SIZE};
//!
//! assert_eq!(NUMBER_SIZE, 22);
//!
//! let config = EngineConfig::default()
//!     .with_registry_buckets(64)
//!     .with_type_fallback(TypeFallback::Declared);
//! assert_eq!(config.registry_buckets, 64);
//! ```

use crate::memory::MemoryLimits;

// =======================================================================
// Indicator encoding
// =======================================================================

/// Indicator slot value: attribute holds a value.
pub const IND_NOTNULL: i16 = 0;

/// Indicator slot value: attribute is null.
pub const IND_NULL: i16 = -1;

/// Width of one indicator slot in bytes.
pub const INDICATOR_SIZE: usize = std::mem::size_of::<i16>();

// =======================================================================
// Native cell footprints
// =======================================================================

/// Boolean cells are native 4-byte integers.
pub const BOOLEAN_SIZE: usize = 4;

/// Library-native number cell (length byte, exponent byte, 20 mantissa bytes).
pub const NUMBER_SIZE: usize = 22;

/// Maximum number of base-100 mantissa digits in a number cell.
pub const NUMBER_MAX_MANTISSA: usize = 20;

/// Date cell: i16 year + month, day, hour, minute, second + one pad byte.
pub const DATE_SIZE: usize = 8;

/// Date cells align on their leading year field.
pub const DATE_ALIGN: usize = 2;

/// Text, raw, LOB, file, reference, collection, timestamp and interval
/// attributes are stored as a pointer-sized cell.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

// =======================================================================
// Catalog naming
// =======================================================================

/// Maximum length of a schema or type name (each part of `SCHEMA.NAME`).
pub const MAX_NAME_LEN: usize = 128;

/// Default bucket count for hash tables created without an explicit size.
pub const DEFAULT_HASH_SIZE: usize = 256;

/// Default chrono format used when date cells are rendered as text.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =======================================================================
// Runtime configuration
// =======================================================================

/// What to do when the runtime (most-derived) type of a fetched instance
/// cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeFallback {
    /// Propagate the failure.
    #[default]
    Strict,
    /// Log a warning and proceed with the declared type.
    Declared,
}

/// Per-runtime settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Bucket count of the type registry's name index.
    pub registry_buckets: usize,
    /// Default policy for dynamic-type resolution failures.
    pub type_fallback: TypeFallback,
    /// Optional hard caps per memory category.
    pub limits: MemoryLimits,
    /// Format applied when a date attribute is read as text.
    pub date_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_buckets: DEFAULT_HASH_SIZE,
            type_fallback: TypeFallback::Strict,
            limits: MemoryLimits::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_registry_buckets(mut self, buckets: usize) -> Self {
        self.registry_buckets = buckets;
        self
    }

    pub fn with_type_fallback(mut self, fallback: TypeFallback) -> Self {
        self.type_fallback = fallback;
        self
    }

    pub fn with_limits(mut self, limits: MemoryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.registry_buckets, DEFAULT_HASH_SIZE);
        assert_eq!(config.type_fallback, TypeFallback::Strict);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert!(config.limits.external.is_none());
        assert!(config.limits.internal.is_none());
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::default()
            .with_registry_buckets(7)
            .with_type_fallback(TypeFallback::Declared)
            .with_limits(MemoryLimits::default().with_external(4096))
            .with_date_format("%d/%m/%Y");
        assert_eq!(config.registry_buckets, 7);
        assert_eq!(config.type_fallback, TypeFallback::Declared);
        assert_eq!(config.limits.external, Some(4096));
        assert_eq!(config.date_format, "%d/%m/%Y");
    }

    #[test]
    fn test_cell_constants() {
        assert_eq!(INDICATOR_SIZE, 2);
        assert_eq!(POINTER_SIZE, std::mem::size_of::<*const u8>());
        assert!(DATE_SIZE % DATE_ALIGN == 0);
    }
}
