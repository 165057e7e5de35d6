//! Error types for SNDH header reading and ICE! depacking.
//!
//! These only surface from the lower-level entry points ([`crate::ice_depack`],
//! [`crate::SndhReader::read_header`]). Tag parsing itself never fails: a
//! malformed tag ends the header early and whatever was collected is kept.

use thiserror::Error;

/// Result type for SNDH operations.
pub type Result<T> = std::result::Result<T, SndhError>;

/// Errors that can occur before the tag loop runs.
#[derive(Debug, Error)]
pub enum SndhError {
    /// Reading from the backing source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data too short for the expected structure.
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size required
        expected: usize,
        /// Actual size available
        actual: usize,
    },

    /// No `SNDH` magic at offset 12.
    #[error("missing SNDH magic at offset 12")]
    BadMagic,

    /// Data does not start with an `ICE!`/`Ice!` header.
    #[error("no ICE! header found")]
    NotIcePacked,

    /// ICE! support was compiled out but the file is packed.
    #[error("file is ICE! packed but ICE! support is disabled")]
    IceUnsupported,

    /// The declared depacked size is zero or above the configured limit.
    #[error("invalid ICE! depacked size: {size}")]
    IceSizeOutOfRange {
        /// Declared depacked size
        size: u32,
    },

    /// Declared packed size and actual file size differ by more than the margin.
    #[error("file size ({file_size}) and ICE! packed size ({packed_size}) do not match")]
    IceSizeMismatch {
        /// Actual size of the packed input
        file_size: u64,
        /// Packed size declared in the ICE! header
        packed_size: u32,
    },

    /// The ICE! bitstream could not be decoded.
    #[error("ICE! decompression failed: {0}")]
    IceDepack(String),
}
