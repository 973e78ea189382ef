// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.

use crate::catalog::CatalogError;
use crate::memory::Category;
use thiserror::Error;

/// Errors raised by the allocator, hash table, layout and accessor engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("out of memory: {category} allocation of {size} bytes failed")]
    OutOfMemory { category: Category, size: usize },

    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("type mismatch on {what}: expected {expected}, found {found}")]
    TypeMismatch {
        what: String,
        expected: String,
        found: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("catalog error: {0}")]
    Backend(#[from] CatalogError),
}

impl Error {
    pub(crate) fn mismatch(
        what: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
