//! Reasons an image yields no version information.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VersionInfoError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionInfoError {
    /// DOS or PE signature mismatch.
    #[error("Not a PE file: {0}")]
    NotAPeFile(&'static str),

    /// The image is a PE file, but not one whose version resource can be located.
    #[error("Unsupported PE layout: {0}")]
    UnsupportedFormat(&'static str),

    #[error("Read of {len} bytes at offset {offset:#X} exceeds buffer of {size} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
}
