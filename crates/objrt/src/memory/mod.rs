// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Accounted memory.
//!
//! Every byte the engine holds is charged to one of two categories:
//!
//! - [`Category::External`]: memory backing values exchanged with the data
//!   source (instance buffers, indicator arrays).
//! - [`Category::Internal`]: library bookkeeping (hash tables, text and raw
//!   heap cells).
//!
//! Counters live in a [`MemoryAccounting`] context. Contexts are injectable
//! (tests build a fresh one each) and a process-wide instance is available
//! through [`MemoryAccounting::global`].
//!
//! Counter updates hold a `parking_lot::Mutex` only around the arithmetic;
//! memory itself is always obtained with the lock released.

mod block;


pub use block::{Allocator, Block, BlockHeader, Charge, HandleToken, BLOCK_HEADER_SIZE};

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Accounting category of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    External,
    Internal,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::External => "external",
            Category::Internal => "internal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional hard caps per category (bytes, header included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryLimits {
    pub external: Option<usize>,
    pub internal: Option<usize>,
}

impl MemoryLimits {
    pub fn with_external(mut self, bytes: usize) -> Self {
        self.external = Some(bytes);
        self
    }

    pub fn with_internal(mut self, bytes: usize) -> Self {
        self.internal = Some(bytes);
        self
    }

    fn limit(&self, category: Category) -> Option<usize> {
        match category {
            Category::External => self.external,
            Category::Internal => self.internal,
        }
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    pub external_bytes: usize,
    pub internal_bytes: usize,
    pub live_handles: usize,
}

impl MemoryStats {
    pub fn total_bytes(&self) -> usize {
        self.external_bytes + self.internal_bytes
    }
}

#[derive(Debug, Default)]
struct Counters {
    external: usize,
    internal: usize,
    handles: usize,
}

impl Counters {
    fn slot(&mut self, category: Category) -> &mut usize {
        match category {
            Category::External => &mut self.external,
            Category::Internal => &mut self.internal,
        }
    }
}

/// Byte counters per category plus the live instance-handle count.
#[derive(Debug, Default)]
pub struct MemoryAccounting {
    counters: Mutex<Counters>,
    limits: MemoryLimits,
}

static GLOBAL: OnceLock<Arc<MemoryAccounting>> = OnceLock::new();

impl MemoryAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: MemoryLimits) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            limits,
        }
    }

    /// Process-wide accounting context (no limits).
    pub fn global() -> &'static Arc<MemoryAccounting> {
        GLOBAL.get_or_init(|| Arc::new(MemoryAccounting::new()))
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// Bytes currently charged to `category`.
    pub fn bytes(&self, category: Category) -> usize {
        let mut counters = self.counters.lock();
        *counters.slot(category)
    }

    pub fn live_handles(&self) -> usize {
        self.counters.lock().handles
    }

    pub fn stats(&self) -> MemoryStats {
        let counters = self.counters.lock();
        MemoryStats {
            external_bytes: counters.external,
            internal_bytes: counters.internal,
            live_handles: counters.handles,
        }
    }

    /// Charge `bytes` to `category`, failing if the cap would be exceeded.
    pub(crate) fn reserve(&self, category: Category, bytes: usize) -> Result<()> {
        let granted = {
            let mut counters = self.counters.lock();
            let slot = counters.slot(category);
            match slot.checked_add(bytes) {
                Some(next) if self.limits.limit(category).map_or(true, |cap| next <= cap) => {
                    *slot = next;
                    true
                }
                _ => false,
            }
        };

        if granted {
            Ok(())
        } else {
            log::error!("[memory] {} cap reached, {} bytes refused", category, bytes);
            Err(Error::OutOfMemory {
                category,
                size: bytes,
            })
        }
    }

    pub(crate) fn release(&self, category: Category, bytes: usize) {
        let mut counters = self.counters.lock();
        let slot = counters.slot(category);
        debug_assert!(*slot >= bytes, "{} counter underflow", category);
        *slot = slot.saturating_sub(bytes);
    }

    pub(crate) fn open_handle(&self) {
        self.counters.lock().handles += 1;
    }

    pub(crate) fn close_handle(&self) {
        let mut counters = self.counters.lock();
        debug_assert!(counters.handles > 0, "handle counter underflow");
        counters.handles = counters.handles.saturating_sub(1);
    }
}
