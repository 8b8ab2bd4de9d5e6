//! PE (Portable Executable) header walk.

use super::reader::{offset_add, ByteReader};
use super::SectionInfo;
use crate::error::{Result, VersionInfoError};
use object::pe::{
    IMAGE_DIRECTORY_ENTRY_RESOURCE, IMAGE_DOS_SIGNATURE, IMAGE_NT_OPTIONAL_HDR32_MAGIC,
    IMAGE_NT_SIGNATURE, IMAGE_SIZEOF_SECTION_HEADER, IMAGE_SIZEOF_SHORT_NAME,
};
use tracing::debug;

/// Offset of `e_lfanew` in the DOS header.
const PE_HEADER_POINTER_OFFSET: usize = 0x3C;
/// Size of the PE signature preceding the COFF header.
const PE_SIGNATURE_SIZE: usize = 4;
/// Size of the COFF file header.
const COFF_HEADER_SIZE: usize = 20;
/// Offset of the data directory array within a PE32 optional header.
const DATA_DIRECTORY_OFFSET: usize = 96;
const DATA_DIRECTORY_ENTRY_SIZE: usize = 8;

/// Name of the section holding the resource tree.
pub const RESOURCE_SECTION_NAME: &[u8] = b".rsrc";

/// A validated 32-bit PE image with its resource section located.
#[derive(Debug, Clone)]
pub struct PeImage<'a> {
    reader: ByteReader<'a>,
    resource_rva: u32,
    resource_section: SectionInfo,
}

impl<'a> PeImage<'a> {
    /// Walks the DOS, COFF and optional headers and the section table.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let reader = ByteReader::new(data);

        if reader.u16_at(0)? != IMAGE_DOS_SIGNATURE {
            debug!("missing MZ signature");
            return Err(VersionInfoError::NotAPeFile("missing MZ signature"));
        }

        let pe_header = reader.u32_at(PE_HEADER_POINTER_OFFSET)? as usize;
        if u32::from(reader.u16_at(pe_header)?) != IMAGE_NT_SIGNATURE {
            debug!("missing PE signature at {:#X}", pe_header);
            return Err(VersionInfoError::NotAPeFile("missing PE signature"));
        }

        let coff = pe_header + PE_SIGNATURE_SIZE;
        let section_count = reader.u16_at(coff + 2)?;
        let optional_header_size = reader.u16_at(coff + 16)?;
        if section_count == 0 || optional_header_size == 0 {
            debug!(
                "section count {} / optional header size {}",
                section_count, optional_header_size
            );
            return Err(VersionInfoError::UnsupportedFormat(
                "no sections or no optional header",
            ));
        }

        let optional_header = coff + COFF_HEADER_SIZE;
        let magic = reader.u16_at(optional_header)?;
        if magic != IMAGE_NT_OPTIONAL_HDR32_MAGIC {
            debug!("optional header magic {:#06X} is not PE32", magic);
            return Err(VersionInfoError::UnsupportedFormat(
                "optional header is not PE32",
            ));
        }

        let resource_directory = optional_header
            + DATA_DIRECTORY_OFFSET
            + DATA_DIRECTORY_ENTRY_SIZE * IMAGE_DIRECTORY_ENTRY_RESOURCE;
        let resource_rva = reader.u32_at(resource_directory)?;

        let section_table = optional_header + usize::from(optional_header_size);
        let resource_section = Self::find_section(
            &reader,
            section_table,
            section_count,
            RESOURCE_SECTION_NAME,
        )?
        .ok_or_else(|| {
            debug!("no .rsrc among {} sections", section_count);
            VersionInfoError::UnsupportedFormat("no .rsrc section")
        })?;

        Ok(Self {
            reader,
            resource_rva,
            resource_section,
        })
    }

    /// Scans the section table for an entry whose zero-trimmed name equals `wanted`.
    fn find_section(
        reader: &ByteReader<'a>,
        section_table: usize,
        section_count: u16,
        wanted: &[u8],
    ) -> Result<Option<SectionInfo>> {
        for index in 0..usize::from(section_count) {
            let header = section_table + IMAGE_SIZEOF_SECTION_HEADER * index;
            let raw_name = reader.bytes(header, IMAGE_SIZEOF_SHORT_NAME)?;
            let name_len = raw_name
                .iter()
                .rposition(|&b| b != 0)
                .map_or(0, |last| last + 1);
            let name = &raw_name[..name_len];

            if name != wanted {
                debug!("skipping section {:?}", String::from_utf8_lossy(name));
                continue;
            }

            return Ok(Some(SectionInfo {
                name: name.to_vec(),
                virtual_address: reader.u32_at(header + 12)?,
                file_offset: reader.u32_at(header + 20)?,
            }));
        }
        Ok(None)
    }

    /// The whole image.
    pub fn reader(&self) -> ByteReader<'a> {
        self.reader
    }

    pub fn resource_section(&self) -> &SectionInfo {
        &self.resource_section
    }

    /// File offset of the root resource directory.
    pub fn resource_directory_offset(&self) -> Result<usize> {
        self.resource_section
            .rva_to_offset(self.resource_rva, self.reader.len())
    }

    /// Converts an RVA inside the resource section to a file offset.
    pub fn resource_rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.resource_section.rva_to_offset(rva, self.reader.len())
    }

    /// Resolves an offset relative to the root resource directory.
    pub fn resource_offset(&self, relative: u32) -> Result<usize> {
        offset_add(self.resource_directory_offset()?, relative, self.reader.len())
    }
}
