//! Bounds-checked little-endian field access.

use crate::error::{Result, VersionInfoError};

/// Rounds `x` up to the next multiple of four.
pub const fn align_up4(x: usize) -> usize {
    (x + 3) & !3
}

/// Read-only view over a byte buffer with checked field reads.
///
/// Every read either returns the requested field or an
/// [`VersionInfoError::OutOfBounds`] describing the failed access.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(VersionInfoError::OutOfBounds {
                offset,
                len,
                size: self.data.len(),
            })
    }

    /// Returns everything from `offset` to the end of the buffer.
    pub fn tail(&self, offset: usize) -> Result<ByteReader<'a>> {
        let rest = self.data.get(offset..).ok_or(VersionInfoError::OutOfBounds {
            offset,
            len: 0,
            size: self.data.len(),
        })?;
        Ok(ByteReader::new(rest))
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let b = self.bytes(offset, 2)?;
        Ok(u16::from(b[0]) | (u16::from(b[1]) << 8))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let b = self.bytes(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Adds a 32-bit file field to a base offset, reporting overflow as out of bounds.
pub fn offset_add(base: usize, add: u32, size: usize) -> Result<usize> {
    usize::try_from(add)
        .ok()
        .and_then(|add| base.checked_add(add))
        .ok_or(VersionInfoError::OutOfBounds {
            offset: base,
            len: add as usize,
            size,
        })
}
