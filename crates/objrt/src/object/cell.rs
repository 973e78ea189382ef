// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked native-endian cell access into instance buffers.

use crate::error::{Error, Result};

/// Generate read methods for native cells (eliminates code duplication)
///
/// Each generated method checks bounds, copies the cell bytes and decodes
/// them with `from_ne_bytes()`.
macro_rules! impl_read_ne {
    ($name:ident, $type:ty) => {
        pub fn $name(&self, offset: usize) -> Result<$type> {
            const SIZE: usize = std::mem::size_of::<$type>();
            let mut bytes = [0u8; SIZE];
            bytes.copy_from_slice(self.bytes(offset, SIZE)?);
            Ok(<$type>::from_ne_bytes(bytes))
        }
    };
}

/// Generate write methods for native cells (eliminates code duplication)
macro_rules! impl_write_ne {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, offset: usize, value: $type) -> Result<()> {
            self.write_bytes(offset, &value.to_ne_bytes())
        }
    };
}

fn overrun(offset: usize, len: usize, available: usize) -> Error {
    Error::InvalidArgument(format!(
        "cell {offset}..{} overruns buffer of {available} bytes",
        offset.saturating_add(len)
    ))
}

/// Read-only view over an instance buffer.
pub(crate) struct Cells<'a> {
    buffer: &'a [u8],
}

impl<'a> Cells<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.buffer.get(offset..end))
            .ok_or_else(|| overrun(offset, len, self.buffer.len()))
    }

    impl_read_ne!(read_i16, i16);
    impl_read_ne!(read_u16, u16);
    impl_read_ne!(read_i32, i32);
    impl_read_ne!(read_u32, u32);
    impl_read_ne!(read_f64, f64);
    impl_read_ne!(read_usize, usize);
}

/// Mutable view over an instance buffer.
pub(crate) struct CellsMut<'a> {
    buffer: &'a mut [u8],
}

impl<'a> CellsMut<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let available = self.buffer.len();
        offset
            .checked_add(data.len())
            .and_then(|end| self.buffer.get_mut(offset..end))
            .ok_or_else(|| overrun(offset, data.len(), available))?
            .copy_from_slice(data);
        Ok(())
    }

    impl_write_ne!(write_i16, i16);
    impl_write_ne!(write_u16, u16);
    impl_write_ne!(write_i32, i32);
    impl_write_ne!(write_u32, u32);
    impl_write_ne!(write_f64, f64);
    impl_write_ne!(write_usize, usize);
}
