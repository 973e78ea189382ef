// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native images exchanged with the transport layer.
//!
//! An image is the already-allocated representation of one instance: the
//! value buffer, the indicator window and the variable-length payloads the
//! pointer cells refer to. In an image a text/raw cell holds `k`, the
//! 1-based position of its payload in `cells` (0 = no payload).

use super::accessors::heap_cells;
use super::cell::{Cells, CellsMut};
use super::storage::{HandleState, Heap, HeapCell, ObjectLifetime, ObjectStorage};
use super::{Object, OwnedObject};
use crate::catalog::InstanceHandle;
use crate::error::{Error, Result};
use crate::memory::Allocator;
use crate::types::{KindTag, TypeDescriptor};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectImage {
    pub data: Vec<u8>,
    pub indicators: Vec<i16>,
    pub cells: Vec<HeapCell>,
}

/// Image of an instance read from the data source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedObject {
    pub handle: InstanceHandle,
    pub image: ObjectImage,
    pub lifetime: ObjectLifetime,
}

impl FetchedObject {
    /// Fetched column value ([`ObjectLifetime::Value`]).
    pub fn new(handle: InstanceHandle, image: ObjectImage) -> Self {
        Self {
            handle,
            image,
            lifetime: ObjectLifetime::Value,
        }
    }

    pub fn with_lifetime(mut self, lifetime: ObjectLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }
}

impl<S: Borrow<ObjectStorage>> Object<S> {
    /// Snapshot this instance (root or view) into a self-contained image.
    pub fn to_image(&self) -> Result<ObjectImage> {
        let storage = self.storage();
        let mut data = storage
            .cells()
            .bytes(self.data_base, self.desc.size())?
            .to_vec();
        let indicators = (0..self.desc.indicator_len())
            .map(|slot| storage.indicator(self.ind_base + slot))
            .collect::<Result<Vec<_>>>()?;

        let mut payloads = Vec::new();
        heap_cells(&self.desc, 0, &mut payloads);

        let mut cells = Vec::new();
        for (rel, _) in payloads {
            let key = storage.cells().read_usize(self.data_base + rel)?;
            let position = match storage.heap.get(key)? {
                Some(cell) => {
                    cells.push(cell.clone());
                    cells.len()
                }
                None => 0,
            };
            CellsMut::new(&mut data).write_usize(rel, position)?;
        }

        Ok(ObjectImage {
            data,
            indicators,
            cells,
        })
    }
}

impl OwnedObject {
    /// Build a local root instance from `image`, laid out as `desc`.
    pub fn from_image(
        desc: &Arc<TypeDescriptor>,
        image: ObjectImage,
        allocator: &Allocator,
    ) -> Result<Self> {
        let positions = validate(desc, &image)?;

        let mut storage = ObjectStorage::sized(allocator, image.data.len(), image.indicators.len())?;
        storage.cells_mut().write_bytes(0, &image.data)?;
        for (slot, value) in image.indicators.iter().enumerate() {
            storage.set_indicator(slot, *value)?;
        }

        storage.heap.reserve(image.cells.len())?;
        let staged = image
            .cells
            .into_iter()
            .map(|cell| Heap::stage(allocator, cell))
            .collect::<Result<Vec<_>>>()?;
        let keys: Vec<usize> = staged.into_iter().map(|s| storage.heap.insert(s)).collect();

        for (rel, position) in positions {
            let key = if position == 0 { 0 } else { keys[position - 1] };
            storage.cells_mut().write_usize(rel, key)?;
        }

        Ok(Self::root(Arc::clone(desc), storage))
    }

    /// Materialize a fetched image: like [`from_image`](Self::from_image),
    /// but the instance keeps its data-source handle and starts clean.
    pub fn from_fetched(
        desc: &Arc<TypeDescriptor>,
        fetched: FetchedObject,
        allocator: &Allocator,
    ) -> Result<Self> {
        let mut object = Self::from_image(desc, fetched.image, allocator)?;
        object.storage.handle = Some(fetched.handle);
        object.storage.state = HandleState::FetchedClean;
        object.storage.lifetime = fetched.lifetime;
        log::debug!(
            "[object] materialized {} as {}",
            fetched.handle,
            desc.qualified_name()
        );
        Ok(object)
    }
}

/// Check `image` against the layout of `desc`; returns the payload position
/// stored in each heap cell.
fn validate(desc: &TypeDescriptor, image: &ObjectImage) -> Result<Vec<(usize, usize)>> {
    let invalid = |what: String| {
        Error::InvalidArgument(format!("image of {}: {what}", desc.qualified_name()))
    };

    if image.data.len() < desc.size() {
        return Err(invalid(format!(
            "value buffer has {} bytes, layout needs {}",
            image.data.len(),
            desc.size()
        )));
    }
    if image.indicators.len() < desc.indicator_len() {
        return Err(invalid(format!(
            "{} indicators, layout needs {}",
            image.indicators.len(),
            desc.indicator_len()
        )));
    }
    let mut payloads = Vec::new();
    heap_cells(desc, 0, &mut payloads);

    let cells = Cells::new(&image.data);
    let mut seen = HashSet::new();
    let mut positions = Vec::with_capacity(payloads.len());
    for (rel, tag) in payloads {
        let position = cells.read_usize(rel)?;
        if position != 0 {
            let cell = image
                .cells
                .get(position - 1)
                .ok_or_else(|| invalid(format!("cell at {rel} refers to missing payload {position}")))?;
            if !seen.insert(position) {
                return Err(invalid(format!("payload {position} referenced twice")));
            }
            let matches = matches!(
                (tag, cell),
                (KindTag::Text, HeapCell::Text(_)) | (KindTag::Raw, HeapCell::Raw(_))
            );
            if !matches {
                return Err(invalid(format!("payload {position} is not {tag}")));
            }
        }
        positions.push((rel, position));
    }
    Ok(positions)
}
