//! Windows PE version information reader.
//!
//! This library extracts the `VS_VERSIONINFO` resource of a 32-bit PE image by
//! walking its headers and resource directory by hand, and flattens the
//! version block tree into a key/value mapping.

pub mod binary;
pub mod error;
pub mod extractor;
pub mod version;

use binary::{resource, PeImage};
use tracing::debug;

pub use error::VersionInfoError;
pub use extractor::Extractor;
pub use version::{VersionInfo, VersionQuad};

/// Extracts version information from a whole PE file image.
///
/// Returns [`None`] for anything that is not a 32-bit PE image with a
/// readable version resource. Use [`extract_version_info`] to learn why.
pub fn find_version_info(data: &[u8]) -> Option<VersionInfo> {
    match extract_version_info(data) {
        Ok(info) => Some(info),
        Err(err) => {
            debug!("Failed to extract version info: {}", err);
            None
        }
    }
}

/// Extracts version information, reporting the check that failed.
pub fn extract_version_info(data: &[u8]) -> Result<VersionInfo, VersionInfoError> {
    let pe = PeImage::parse(data)?;
    let offset = resource::find_version_resource(&pe)?;
    version::decode(pe.reader().tail(offset)?)
}
