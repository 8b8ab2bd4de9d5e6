//! Version extraction from files on disk.

use crate::binary::PeImage;
use crate::version::VersionInfo;
use crate::VersionInfoError;
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;

/// Reads version information from a memory-mapped PE file.
pub struct Extractor {
    mmap: Mmap,
}

impl Extractor {
    /// Maps the given file and checks that it carries a PE32 resource section.
    pub fn new(file: File) -> Result<Self> {
        let mmap = unsafe { Mmap::map(&file)? };
        PeImage::parse(&mmap).context("Failed to parse PE headers")?;

        Ok(Self { mmap })
    }

    /// The mapped file contents.
    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Decodes the version resource.
    pub fn version_info(&self) -> Result<VersionInfo, VersionInfoError> {
        crate::extract_version_info(&self.mmap)
    }
}
