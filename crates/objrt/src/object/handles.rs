// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Opaque handles stored in pointer-sized cells.
//!
//! LOB locators, file locators, references, collections, timestamps and
//! intervals are owned by the transport layer; the engine only stores and
//! returns their non-zero handle values.

use crate::types::KindTag;
use std::fmt;
use std::num::NonZeroUsize;

/// Non-zero handle issued by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalHandle(NonZeroUsize);

impl ExternalHandle {
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for ExternalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Typed wrapper over [`ExternalHandle`] for one attribute kind.
pub trait OpaqueHandle: Copy + private::Sealed {
    const TAG: KindTag;

    fn from_external(handle: ExternalHandle) -> Self;
    fn external(&self) -> ExternalHandle;
}

mod private {
    pub trait Sealed {}
}

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident, $tag:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub ExternalHandle);

        impl private::Sealed for $name {}

        impl OpaqueHandle for $name {
            const TAG: KindTag = $tag;

            fn from_external(handle: ExternalHandle) -> Self {
                Self(handle)
            }

            fn external(&self) -> ExternalHandle {
                self.0
            }
        }

        impl From<ExternalHandle> for $name {
            fn from(handle: ExternalHandle) -> Self {
                Self(handle)
            }
        }
    };
}

opaque_handle!(
    /// CLOB, NCLOB or BLOB locator.
    LobLocator,
    KindTag::Lob
);
opaque_handle!(
    /// BFILE or CFILE locator.
    FileLocator,
    KindTag::File
);
opaque_handle!(RefHandle, KindTag::Ref);
opaque_handle!(CollHandle, KindTag::Collection);
opaque_handle!(TimestampHandle, KindTag::Timestamp);
opaque_handle!(IntervalHandle, KindTag::Interval);
