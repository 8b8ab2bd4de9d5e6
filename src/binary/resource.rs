//! Resource directory traversal.
//!
//! The resource tree has three fixed levels: type, name and language. Only
//! the `RT_VERSION` type is followed, and at the name and language levels the
//! first entry is taken without looking at its identifier.

use super::pe::PeImage;
use super::reader::ByteReader;
use crate::error::{Result, VersionInfoError};
use object::pe::{IMAGE_RESOURCE_DATA_IS_DIRECTORY, RT_VERSION};
use tracing::debug;

const DIRECTORY_HEADER_SIZE: usize = 16;
const DIRECTORY_ENTRY_SIZE: usize = 8;

/// An `IMAGE_RESOURCE_DIRECTORY` header.
#[derive(Debug, Clone, Copy)]
struct Directory {
    offset: usize,
    named_entries: u16,
    id_entries: u16,
}

/// An `IMAGE_RESOURCE_DIRECTORY_ENTRY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirectoryEntry {
    id: u32,
    data: u32,
}

impl Directory {
    fn read(reader: &ByteReader<'_>, offset: usize) -> Result<Self> {
        Ok(Self {
            offset,
            named_entries: reader.u16_at(offset + 12)?,
            id_entries: reader.u16_at(offset + 14)?,
        })
    }

    fn entry_count(&self) -> usize {
        usize::from(self.named_entries) + usize::from(self.id_entries)
    }

    fn entry(&self, reader: &ByteReader<'_>, index: usize) -> Result<DirectoryEntry> {
        let entry = self.offset + DIRECTORY_HEADER_SIZE + DIRECTORY_ENTRY_SIZE * index;
        Ok(DirectoryEntry {
            id: reader.u32_at(entry)?,
            data: reader.u32_at(entry + 4)?,
        })
    }

    /// First entry of a name or language level.
    fn first_entry(&self, reader: &ByteReader<'_>) -> Result<DirectoryEntry> {
        if self.entry_count() == 0 {
            debug!("empty resource directory at {:#X}", self.offset);
            return Err(VersionInfoError::UnsupportedFormat(
                "empty resource directory",
            ));
        }
        self.entry(reader, 0)
    }
}

impl DirectoryEntry {
    fn is_directory(&self) -> bool {
        self.data & IMAGE_RESOURCE_DATA_IS_DIRECTORY != 0
    }

    /// Offset of the child, relative to the root resource directory.
    fn target(&self) -> u32 {
        self.data & !IMAGE_RESOURCE_DATA_IS_DIRECTORY
    }

    /// Follows this entry to a subdirectory.
    fn subdirectory(&self, pe: &PeImage<'_>) -> Result<Directory> {
        if !self.is_directory() {
            debug!("resource entry {:#X} points to data, expected a directory", self.id);
            return Err(VersionInfoError::UnsupportedFormat(
                "resource entry is not a directory",
            ));
        }
        Directory::read(&pe.reader(), pe.resource_offset(self.target())?)
    }
}

/// Finds the file offset of the `VS_VERSIONINFO` blob.
pub fn find_version_resource(pe: &PeImage<'_>) -> Result<usize> {
    let reader = pe.reader();
    let root = Directory::read(&reader, pe.resource_directory_offset()?)?;

    let mut version_entry = None;
    for index in 0..root.entry_count() {
        let entry = root.entry(&reader, index)?;
        if entry.id == u32::from(RT_VERSION) {
            version_entry = Some(entry);
            break;
        }
    }
    let version_entry = version_entry.ok_or_else(|| {
        debug!("no RT_VERSION among {} resource types", root.entry_count());
        VersionInfoError::UnsupportedFormat("no RT_VERSION resource")
    })?;

    let names = version_entry.subdirectory(pe)?;
    let languages = names.first_entry(&reader)?.subdirectory(pe)?;

    let leaf = languages.first_entry(&reader)?;
    if leaf.is_directory() {
        debug!("resource tree deeper than three levels");
        return Err(VersionInfoError::UnsupportedFormat(
            "resource language entry is a directory",
        ));
    }

    let data_entry = pe.resource_offset(leaf.target())?;
    let version_rva = reader.u32_at(data_entry)?;
    let version_size = reader.u32_at(data_entry + 4)?;
    let offset = pe.resource_rva_to_offset(version_rva)?;
    debug!(
        "version resource at RVA {:#X} (file offset {:#X}, {} bytes)",
        version_rva, offset, version_size
    );
    Ok(offset)
}
