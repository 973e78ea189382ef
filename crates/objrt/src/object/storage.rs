// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backing store of a root instance: value buffer, indicator array and the
//! heap holding text and raw payloads.

use super::cell::{Cells, CellsMut};
use crate::catalog::InstanceHandle;
use crate::config::{DEFAULT_DATE_FORMAT, INDICATOR_SIZE, IND_NULL};
use crate::error::{Error, Result};
use crate::memory::{Allocator, Block, Category, Charge, HandleToken};
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// Where an instance came from and whether it changed since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Created locally.
    Allocated,
    /// Materialized from the data source, unmodified.
    FetchedClean,
    /// Materialized from the data source, then modified.
    FetchedDirty,
}

/// Lifetime of an instance on the data-source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLifetime {
    /// Stored in a table; has an identity of its own.
    Persistent,
    /// Lives for the session only (locally created instances).
    Transient,
    /// Embedded value without identity (column values, nested attributes).
    Value,
}

/// Variable-length payload referenced from a pointer-sized cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapCell {
    Text(String),
    Raw(Vec<u8>),
}

impl HeapCell {
    fn len(&self) -> usize {
        match self {
            HeapCell::Text(s) => s.len(),
            HeapCell::Raw(b) => b.len(),
        }
    }
}

struct HeapSlot {
    cell: HeapCell,
    _charge: Charge,
}

/// Charged cell waiting to be inserted.
pub(crate) struct StagedCell {
    cell: HeapCell,
    charge: Charge,
}

/// Slot arena. Cells store `slot + 1`; 0 means "no payload".
#[derive(Default)]
pub(crate) struct Heap {
    slots: Vec<Option<HeapSlot>>,
    free: Vec<usize>,
}

impl Heap {
    pub fn get(&self, key: usize) -> Result<Option<&HeapCell>> {
        if key == 0 {
            return Ok(None);
        }
        match self.slots.get(key - 1) {
            Some(Some(slot)) => Ok(Some(&slot.cell)),
            _ => Err(Error::InvalidArgument(format!("dangling heap key {key}"))),
        }
    }

    /// Make room for `additional` inserts so that inserting cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free.len());
        self.slots.try_reserve(needed).map_err(|_| Error::OutOfMemory {
            category: Category::Internal,
            size: needed * std::mem::size_of::<Option<HeapSlot>>(),
        })
    }

    pub fn stage(allocator: &Allocator, cell: HeapCell) -> Result<StagedCell> {
        let charge = allocator.charge(
            Category::Internal,
            std::mem::size_of::<HeapSlot>() + cell.len(),
        )?;
        Ok(StagedCell { cell, charge })
    }

    pub fn insert(&mut self, staged: StagedCell) -> usize {
        let slot = HeapSlot {
            cell: staged.cell,
            _charge: staged.charge,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index + 1
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len()
            }
        }
    }

    pub fn remove(&mut self, key: usize) {
        if key == 0 {
            return;
        }
        if let Some(entry) = self.slots.get_mut(key - 1) {
            if entry.take().is_some() {
                self.free.push(key - 1);
            }
        }
    }

    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Storage owned by a root instance and borrowed by its field views.
pub struct ObjectStorage {
    pub(crate) data: Block,
    pub(crate) indicators: Block,
    pub(crate) heap: Heap,
    pub(crate) allocator: Allocator,
    pub(crate) handle: Option<InstanceHandle>,
    pub(crate) state: HandleState,
    pub(crate) lifetime: ObjectLifetime,
    pub(crate) date_format: Arc<str>,
    _token: HandleToken,
}

impl ObjectStorage {
    /// Zeroed value buffer and an all-null indicator array sized for `desc`.
    pub(crate) fn allocate(desc: &TypeDescriptor, allocator: &Allocator) -> Result<Self> {
        Self::sized(allocator, desc.size(), desc.indicator_len())
    }

    pub(crate) fn sized(allocator: &Allocator, data_len: usize, slots: usize) -> Result<Self> {
        let data = allocator.allocate(Category::External, 1, data_len)?;
        let mut indicators = allocator.allocate(Category::External, INDICATOR_SIZE, slots)?;
        {
            let mut cells = CellsMut::new(indicators.as_mut_slice());
            for slot in 0..slots {
                cells.write_i16(slot * INDICATOR_SIZE, IND_NULL)?;
            }
        }

        Ok(Self {
            data,
            indicators,
            heap: Heap::default(),
            allocator: allocator.clone(),
            handle: None,
            state: HandleState::Allocated,
            lifetime: ObjectLifetime::Transient,
            date_format: Arc::from(DEFAULT_DATE_FORMAT),
            _token: allocator.open_handle(),
        })
    }

    pub fn handle(&self) -> Option<InstanceHandle> {
        self.handle
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn lifetime(&self) -> ObjectLifetime {
        self.lifetime
    }

    /// Number of text/raw payloads currently held.
    pub fn heap_cells(&self) -> usize {
        self.heap.live()
    }

    pub(crate) fn indicator_count(&self) -> usize {
        self.indicators.len() / INDICATOR_SIZE
    }

    pub(crate) fn indicator(&self, slot: usize) -> Result<i16> {
        Cells::new(self.indicators.as_slice()).read_i16(slot * INDICATOR_SIZE)
    }

    pub(crate) fn set_indicator(&mut self, slot: usize, value: i16) -> Result<()> {
        CellsMut::new(self.indicators.as_mut_slice()).write_i16(slot * INDICATOR_SIZE, value)
    }

    pub(crate) fn cells(&self) -> Cells<'_> {
        Cells::new(self.data.as_slice())
    }

    pub(crate) fn cells_mut(&mut self) -> CellsMut<'_> {
        CellsMut::new(self.data.as_mut_slice())
    }

    /// Mark a fetched instance as modified.
    pub(crate) fn touch(&mut self) {
        if self.state == HandleState::FetchedClean {
            self.state = HandleState::FetchedDirty;
        }
    }
}

impl fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("data", &self.data)
            .field("indicators", &self.indicator_count())
            .field("heap_cells", &self.heap.live())
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
