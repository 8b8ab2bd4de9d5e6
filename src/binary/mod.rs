//! PE binary format walking.
//!
//! This module locates the `.rsrc` section of a 32-bit PE image and follows
//! its resource directory down to the `RT_VERSION` data blob.

pub mod pe;
pub mod reader;
pub mod resource;

use crate::error::{Result, VersionInfoError};
use reader::offset_add;

pub use pe::PeImage;
pub use reader::{align_up4, ByteReader};

/// Information about a section in the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    /// Section name with trailing zero padding removed.
    pub name: Vec<u8>,
    pub virtual_address: u32,
    pub file_offset: u32,
}

impl SectionInfo {
    /// Converts a relative virtual address inside this section to a file offset.
    pub fn rva_to_offset(&self, rva: u32, size: usize) -> Result<usize> {
        let delta = rva
            .checked_sub(self.virtual_address)
            .ok_or(VersionInfoError::UnsupportedFormat(
                "RVA lies before the start of its section",
            ))?;
        offset_add(self.file_offset as usize, delta, size)
    }
}
