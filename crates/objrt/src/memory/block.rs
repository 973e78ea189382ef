// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Header-tagged byte blocks and the allocator that hands them out.

use super::{Category, MemoryAccounting};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Header recorded with every block. `size` includes the header itself and
/// is the amount charged to `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub category: Category,
    pub size: usize,
}

/// Bytes charged per block on top of its payload.
pub const BLOCK_HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

/// Owned, accounted byte buffer. Returns its recorded size on drop.
pub struct Block {
    header: BlockHeader,
    data: Vec<u8>,
    accounting: Arc<MemoryAccounting>,
}

impl Block {
    pub fn header(&self) -> BlockHeader {
        self.header
    }

    pub fn category(&self) -> Category {
        self.header.category
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Deep copy charged to the same category.
    pub fn try_clone(&self) -> Result<Block> {
        let allocator = Allocator::new(Arc::clone(&self.accounting));
        let mut copy = allocator.allocate(self.header.category, 1, self.data.len())?;
        copy.data.copy_from_slice(&self.data);
        Ok(copy)
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        self.accounting
            .release(self.header.category, self.header.size);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("header", &self.header)
            .field("len", &self.data.len())
            .finish()
    }
}

/// RAII byte reservation for structures that are not one flat buffer.
pub struct Charge {
    category: Category,
    bytes: usize,
    accounting: Arc<MemoryAccounting>,
}

impl Charge {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Charge {
    fn drop(&mut self) {
        self.accounting.release(self.category, self.bytes);
    }
}

impl fmt::Debug for Charge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charge({} {} bytes)", self.category, self.bytes)
    }
}

/// Counts one live instance handle for as long as it exists.
pub struct HandleToken {
    accounting: Arc<MemoryAccounting>,
}

impl Drop for HandleToken {
    fn drop(&mut self) {
        self.accounting.close_handle();
    }
}

impl fmt::Debug for HandleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandleToken")
    }
}

/// Allocator bound to an accounting context. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Allocator {
    accounting: Arc<MemoryAccounting>,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::global()
    }
}

impl Allocator {
    pub fn new(accounting: Arc<MemoryAccounting>) -> Self {
        Self { accounting }
    }

    /// Allocator charging the process-wide context.
    pub fn global() -> Self {
        Self::new(Arc::clone(MemoryAccounting::global()))
    }

    pub fn accounting(&self) -> &Arc<MemoryAccounting> {
        &self.accounting
    }

    /// Allocate `elem_size * count` zeroed bytes charged to `category`.
    pub fn allocate(&self, category: Category, elem_size: usize, count: usize) -> Result<Block> {
        let (payload, total) = Self::sizes(category, elem_size, count)?;

        self.accounting.reserve(category, total)?;
        let Some(data) = obtain(payload) else {
            self.accounting.release(category, total);
            log::error!(
                "[memory] {} allocation of {} bytes failed",
                category,
                total
            );
            return Err(Error::OutOfMemory {
                category,
                size: total,
            });
        };

        Ok(Block {
            header: BlockHeader {
                category,
                size: total,
            },
            data,
            accounting: Arc::clone(&self.accounting),
        })
    }

    /// Grow `block` to hold `elem_size * count` bytes.
    ///
    /// `None` allocates. A block whose recorded size already covers the
    /// request is returned untouched (only its category may change). Grown
    /// bytes are zeroed. On failure the old block is released.
    pub fn reallocate(
        &self,
        block: Option<Block>,
        category: Category,
        elem_size: usize,
        count: usize,
    ) -> Result<Block> {
        let Some(mut block) = block else {
            return self.allocate(category, elem_size, count);
        };
        let (payload, total) = Self::sizes(category, elem_size, count)?;
        let old = block.header;

        if old.size >= total {
            if old.category != category {
                self.accounting.reserve(category, old.size)?;
                self.accounting.release(old.category, old.size);
                block.header.category = category;
            }
            return Ok(block);
        }

        let charged = if old.category == category {
            total - old.size
        } else {
            total
        };
        self.accounting.reserve(category, charged)?;

        if block.data.try_reserve_exact(payload - block.data.len()).is_err() {
            self.accounting.release(category, charged);
            log::error!(
                "[memory] {} reallocation to {} bytes failed",
                category,
                total
            );
            drop(block);
            return Err(Error::OutOfMemory {
                category,
                size: total,
            });
        }
        block.data.resize(payload, 0);

        if old.category != category {
            self.accounting.release(old.category, old.size);
        }
        block.header = BlockHeader {
            category,
            size: total,
        };
        Ok(block)
    }

    /// Return a block's recorded size to its category.
    pub fn release(&self, block: Block) {
        drop(block);
    }

    /// Reserve `bytes` of `category` until the returned guard drops.
    pub fn charge(&self, category: Category, bytes: usize) -> Result<Charge> {
        self.accounting.reserve(category, bytes)?;
        Ok(Charge {
            category,
            bytes,
            accounting: Arc::clone(&self.accounting),
        })
    }

    pub(crate) fn open_handle(&self) -> HandleToken {
        self.accounting.open_handle();
        HandleToken {
            accounting: Arc::clone(&self.accounting),
        }
    }

    fn sizes(category: Category, elem_size: usize, count: usize) -> Result<(usize, usize)> {
        elem_size
            .checked_mul(count)
            .and_then(|payload| payload.checked_add(BLOCK_HEADER_SIZE).map(|t| (payload, t)))
            .ok_or(Error::OutOfMemory {
                category,
                size: usize::MAX,
            })
    }
}

fn obtain(payload: usize) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(payload).ok()?;
    data.resize(payload, 0);
    Some(data)
}
