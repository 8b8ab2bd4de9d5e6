//! `VS_VERSIONINFO` block decoding.
//!
//! A version resource is a tree of blocks. Each block starts on a 4-byte
//! boundary (relative to the start of the resource) and is laid out as:
//!
//! ```text
//! u16 length        total block size in bytes, children included
//! u16 value_length  code units for text values, bytes for binary values
//! u16 type          0 = binary, otherwise text
//! u16 key[]         zero-terminated UTF-16
//! padding to 4
//! value
//! padding to 4
//! children...
//! ```
//!
//! Every text leaf found anywhere in the tree becomes one entry of a flat
//! mapping. Text blocks that carry children (`StringFileInfo`, the string
//! tables) are containers and add no entry of their own, so their empty
//! values never show up as keys. The root's binary `VS_FIXEDFILEINFO` value contributes the
//! `FileVersion` and `ProductVersion` entries.

use crate::binary::{align_up4, ByteReader};
use crate::error::{Result, VersionInfoError};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{trace, warn};

/// Key of the root block.
pub const VS_VERSION_INFO_KEY: &str = "VS_VERSION_INFO";
pub const FILE_VERSION_KEY: &str = "FileVersion";
pub const PRODUCT_VERSION_KEY: &str = "ProductVersion";

/// Longest key read before giving up on finding its terminator.
pub const MAX_NAME_UNITS: usize = 200;
/// Deepest block nesting accepted.
const MAX_DEPTH: usize = 32;

const BLOCK_HEADER_SIZE: usize = 6;
const FIXED_FILE_VERSION_OFFSET: usize = 8;
const FIXED_PRODUCT_VERSION_OFFSET: usize = 16;

/// A four-part version number from `VS_FIXEDFILEINFO`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionQuad {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl VersionQuad {
    /// Builds a version from its most and least significant dwords.
    pub fn from_parts(ms: u32, ls: u32) -> Self {
        Self {
            major: (ms >> 16) as u16,
            minor: ms as u16,
            build: (ls >> 16) as u16,
            revision: ls as u16,
        }
    }

    /// Reads a version stored as two little-endian dwords at `offset`.
    ///
    /// The high half-word of each dword comes first in the dotted form, so
    /// the fields are read at +2, +0, +6, +4.
    fn read(reader: &ByteReader<'_>, offset: usize) -> Result<Self> {
        Ok(Self {
            major: reader.u16_at(offset + 2)?,
            minor: reader.u16_at(offset)?,
            build: reader.u16_at(offset + 6)?,
            revision: reader.u16_at(offset + 4)?,
        })
    }
}

impl fmt::Display for VersionQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Version metadata decoded from a PE image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    entries: BTreeMap<String, String>,
    fixed_file_version: Option<VersionQuad>,
    fixed_product_version: Option<VersionQuad>,
    truncated_names: Vec<String>,
}

impl VersionInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `FileVersion` entry: the string table's value if present,
    /// the fixed version otherwise.
    pub fn file_version(&self) -> Option<&str> {
        self.get(FILE_VERSION_KEY)
    }

    pub fn product_version(&self) -> Option<&str> {
        self.get(PRODUCT_VERSION_KEY)
    }

    pub fn fixed_file_version(&self) -> Option<VersionQuad> {
        self.fixed_file_version
    }

    pub fn fixed_product_version(&self) -> Option<VersionQuad> {
        self.fixed_product_version
    }

    /// Keys that hit [`MAX_NAME_UNITS`] before their terminator.
    pub fn truncated_names(&self) -> &[String] {
        &self.truncated_names
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }

    fn insert(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    fn set_fixed(&mut self, file: VersionQuad, product: VersionQuad) {
        self.fixed_file_version = Some(file);
        self.fixed_product_version = Some(product);
        self.insert(FILE_VERSION_KEY.to_owned(), file.to_string());
        self.insert(PRODUCT_VERSION_KEY.to_owned(), product.to_string());
    }
}

/// Decodes a version resource that starts at the beginning of `blob`.
pub fn decode(blob: ByteReader<'_>) -> Result<VersionInfo> {
    let mut info = VersionInfo::default();
    BlockDecoder {
        reader: blob,
        info: &mut info,
    }
    .decode_block(0, 0)?;
    Ok(info)
}

struct BlockDecoder<'a, 'i> {
    reader: ByteReader<'a>,
    info: &'i mut VersionInfo,
}

impl BlockDecoder<'_, '_> {
    /// Decodes the block at `offset` and its children, returning the
    /// aligned offset just past it.
    fn decode_block(&mut self, offset: usize, depth: usize) -> Result<usize> {
        if depth > MAX_DEPTH {
            return Err(VersionInfoError::UnsupportedFormat(
                "version blocks nested too deeply",
            ));
        }

        let start = align_up4(offset);
        let total_length = usize::from(self.reader.u16_at(start)?);
        let value_length = usize::from(self.reader.u16_at(start + 2)?);
        let is_text = self.reader.u16_at(start + 4)? != 0;
        let end = start + total_length;

        let (name, after_name) = self.read_name(start + BLOCK_HEADER_SIZE)?;
        let mut cursor = align_up4(after_name);
        trace!(
            "block {:?} at {:#X}: length {}, value length {}, text {}",
            name,
            start,
            total_length,
            value_length,
            is_text
        );

        let mut text_value = None;
        if is_text {
            let units = self.read_units(cursor, value_length)?;
            cursor += value_length * 2;
            text_value = Some(decode_utf16(&units));
        } else {
            if name == VS_VERSION_INFO_KEY {
                let file = VersionQuad::read(&self.reader, cursor + FIXED_FILE_VERSION_OFFSET)?;
                let product =
                    VersionQuad::read(&self.reader, cursor + FIXED_PRODUCT_VERSION_OFFSET)?;
                self.info.set_fixed(file, product);
            }
            self.reader.bytes(cursor, value_length)?;
            cursor += value_length;
        }

        // Text blocks with children are containers, not entries.
        if let Some(value) = text_value {
            if align_up4(cursor) >= end {
                self.info.insert(name, value);
            }
        }

        while align_up4(cursor) < end {
            cursor = self.decode_block(cursor, depth + 1)?;
        }

        Ok(align_up4(cursor))
    }

    /// Reads a zero-terminated key of at most [`MAX_NAME_UNITS`] code units.
    fn read_name(&mut self, mut offset: usize) -> Result<(String, usize)> {
        let mut units = Vec::new();
        let mut terminated = false;
        while units.len() < MAX_NAME_UNITS {
            let unit = self.reader.u16_at(offset)?;
            offset += 2;
            if unit == 0 {
                terminated = true;
                break;
            }
            units.push(unit);
        }

        let name = decode_utf16(&units);
        if !terminated {
            warn!("version block key truncated at {} code units", MAX_NAME_UNITS);
            self.info.truncated_names.push(name.clone());
        }
        Ok((name, offset))
    }

    fn read_units(&self, offset: usize, count: usize) -> Result<Vec<u16>> {
        let bytes = self.reader.bytes(offset, count * 2)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}

fn decode_utf16(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
        .trim_end_matches('\0')
        .to_owned()
}
