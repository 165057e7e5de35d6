//! Cheap SNDH detection from the first bytes of a file.
//!
//! Packed files are not depacked here. Instead the start of the bitstream is
//! searched for tag fragments that ICE! usually leaves uncompressed, so some
//! packed SNDH files will not be recognised.

use crate::parser::{MAGIC_OFFSET, SNDH_MAGIC, TAG_START};

/// Default number of bytes looked at.
pub const DETECT_LEN: usize = 512;

/// Fragments that survive ICE! packing often enough to be worth a search.
#[cfg(feature = "ice")]
const PACKED_FRAGMENTS: [&[u8]; 5] = [b"NDH", b"TITL", b"CONV", b"RIPP", b"HDNS"];

/// How an SNDH file was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Detected {
    /// `SNDH` magic at offset 12.
    Plain,
    /// ICE! packed, with SNDH tag fragments near the start.
    IcePacked,
}

/// Detect an SNDH file from its first bytes, looking at up to [`DETECT_LEN`].
pub fn detect(data: &[u8]) -> Option<Detected> {
    detect_within(data, DETECT_LEN)
}

/// Detect an SNDH file from its first `limit` bytes.
pub fn detect_within(data: &[u8], limit: usize) -> Option<Detected> {
    let data = &data[..data.len().min(limit)];
    if data.len() < TAG_START {
        return None;
    }
    if &data[MAGIC_OFFSET..TAG_START] == SNDH_MAGIC {
        return Some(Detected::Plain);
    }
    detect_packed(data)
}

#[cfg(feature = "ice")]
fn detect_packed(data: &[u8]) -> Option<Detected> {
    if !crate::ice::has_ice_magic(data) {
        return None;
    }
    let body = &data[MAGIC_OFFSET..];
    PACKED_FRAGMENTS
        .iter()
        .any(|frag| body.windows(frag.len()).any(|w| w == *frag))
        .then_some(Detected::IcePacked)
}

#[cfg(not(feature = "ice"))]
fn detect_packed(_data: &[u8]) -> Option<Detected> {
    None
}

/// Whether the data looks like an SNDH file.
pub fn is_sndh_data(data: &[u8]) -> bool {
    detect(data).is_some()
}
