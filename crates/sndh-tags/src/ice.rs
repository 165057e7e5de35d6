//! ICE! 2.4 depacker.
//!
//! ICE! was a popular data packer on the Atari ST and many SNDH files are
//! distributed packed with it. A packed file starts with a 12-byte header:
//!
//! - Bytes 0-3: `ICE!` (or `Ice!`)
//! - Bytes 4-7: packed size, header included (big-endian)
//! - Bytes 8-11: depacked size (big-endian)
//!
//! The bitstream is read backwards from the end of the packed data and the
//! output is produced backwards from its end.
//!
//! Header probing is always available so packed files can be recognised;
//! the decoder itself needs the `ice` feature.
//!
//! Based on the public domain C implementation by Hans Wessels (2007).

use crate::error::{Result, SndhError};

/// ICE! header magic.
pub const ICE_MAGIC: [u8; 4] = *b"ICE!";
/// Lowercase variant of the ICE! magic written by some packer versions.
pub const ICE_MAGIC_ALT: [u8; 4] = *b"Ice!";

/// Size of the ICE! header.
pub const ICE_HEADER_LEN: usize = 12;

/// Largest depacked size accepted by default (16 MiB).
pub const DEFAULT_MAX_DEPACKED_SIZE: usize = 16 * 1024 * 1024;

/// Sizes declared in an ICE! header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IceSizes {
    /// Packed size including the 12-byte header.
    pub packed: u32,
    /// Size of the data once depacked.
    pub depacked: u32,
}

/// Whether `data` starts with an ICE! magic.
///
/// Only the first four bytes are looked at.
pub fn has_ice_magic(data: &[u8]) -> bool {
    matches!(data.get(..4), Some(m) if m == ICE_MAGIC || m == ICE_MAGIC_ALT)
}

/// Whether `data` holds a complete ICE! header.
pub fn is_ice_packed(data: &[u8]) -> bool {
    data.len() >= ICE_HEADER_LEN && has_ice_magic(data)
}

/// Read the declared sizes from an ICE! header.
///
/// Returns `None` if `data` is not ICE! packed.
pub fn ice_depacked_size(data: &[u8]) -> Option<IceSizes> {
    if !is_ice_packed(data) {
        return None;
    }
    Some(IceSizes {
        packed: be_u32(data, 4),
        depacked: be_u32(data, 8),
    })
}

/// Depack ICE! 2.4 data with the default 16 MiB output limit.
#[cfg(feature = "ice")]
pub fn ice_depack(src: &[u8]) -> Result<Vec<u8>> {
    ice_depack_with_limit(src, DEFAULT_MAX_DEPACKED_SIZE)
}

/// Depack ICE! 2.4 data, refusing outputs larger than `max_depacked`.
///
/// `src` must contain at least the declared packed size.
#[cfg(feature = "ice")]
pub fn ice_depack_with_limit(src: &[u8], max_depacked: usize) -> Result<Vec<u8>> {
    let sizes = ice_depacked_size(src).ok_or(SndhError::NotIcePacked)?;
    let packed = sizes.packed as usize;
    let depacked = sizes.depacked as usize;

    if packed < ICE_HEADER_LEN || src.len() < packed {
        return Err(SndhError::TooShort {
            expected: packed.max(ICE_HEADER_LEN),
            actual: src.len(),
        });
    }
    if depacked == 0 || depacked > max_depacked {
        return Err(SndhError::IceSizeOutOfRange {
            size: sizes.depacked,
        });
    }

    let mut depacker = Depacker {
        src: &src[..packed],
        src_pos: packed,
        dst: vec![0u8; depacked],
        dst_pos: depacked,
        bits: 0,
        mask: 0,
    };
    depacker.run()?;
    Ok(depacker.dst)
}

fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Backwards bit reader plus output window.
#[cfg(feature = "ice")]
struct Depacker<'a> {
    src: &'a [u8],
    /// Next source byte is `src[src_pos - 1]`.
    src_pos: usize,
    dst: Vec<u8>,
    /// Next output byte is `dst[dst_pos - 1]`.
    dst_pos: usize,
    /// Current bit buffer byte.
    bits: u8,
    mask: u8,
}

#[cfg(feature = "ice")]
impl Depacker<'_> {
    fn run(&mut self) -> Result<()> {
        // Prime the bit buffer, then skip up to and including the sentinel
        // bit that marks where the stream starts in the last byte.
        self.read_bits(1)?;
        if self.bits == 0 {
            return Err(SndhError::IceDepack("missing bitstream sentinel".to_string()));
        }
        self.mask = 0x80;
        while self.bits & 1 == 0 {
            self.bits >>= 1;
            self.mask >>= 1;
        }
        self.bits >>= 1;

        loop {
            if self.read_bits(1)? != 0 {
                let len = self.literal_len()?;
                self.copy_literal(len);
                if self.dst_pos == 0 {
                    return Ok(());
                }
            }

            let (len, distance) = self.match_params()?;
            self.copy_match(len, distance);
            if self.dst_pos == 0 {
                return Ok(());
            }
        }
    }

    fn read_bits(&mut self, count: u32) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            value <<= 1;
            self.mask >>= 1;
            if self.mask == 0 {
                if self.src_pos == 0 {
                    return Err(SndhError::IceDepack(
                        "unexpected end of packed data".to_string(),
                    ));
                }
                self.src_pos -= 1;
                self.bits = self.src[self.src_pos];
                self.mask = 0x80;
            }
            if self.bits & self.mask != 0 {
                value |= 1;
            }
        }
        Ok(value)
    }

    /// Length of a literal run (variable-length code).
    fn literal_len(&mut self) -> Result<usize> {
        const WIDTH: [u32; 6] = [1, 2, 2, 3, 8, 15];
        const ESCAPE: [u32; 6] = [1, 3, 3, 7, 255, 32768];
        const BASE: [usize; 6] = [1, 2, 5, 8, 15, 270];

        let mut step = 0;
        let mut raw;
        loop {
            raw = self.read_bits(WIDTH[step])?;
            if raw != ESCAPE[step] || step == WIDTH.len() - 1 {
                break;
            }
            step += 1;
        }

        Ok((raw as usize + BASE[step]).min(self.dst_pos))
    }

    fn copy_literal(&mut self, len: usize) {
        for _ in 0..len {
            if self.src_pos == 0 || self.dst_pos == 0 {
                break;
            }
            self.src_pos -= 1;
            self.dst_pos -= 1;
            self.dst[self.dst_pos] = self.src[self.src_pos];
        }
    }

    /// Length and distance of a back-reference into the output.
    fn match_params(&mut self) -> Result<(usize, usize)> {
        const LEN_EXTRA: [u32; 5] = [0, 0, 1, 2, 10];
        const LEN_BASE: [usize; 5] = [0, 1, 2, 4, 8];

        let mut step = 0;
        while step < 4 && self.read_bits(1)? != 0 {
            step += 1;
        }
        let mut len = LEN_BASE[step] + self.read_bits(LEN_EXTRA[step])? as usize;

        let distance = if len != 0 {
            const DIST_EXTRA: [u32; 3] = [8, 5, 12];
            const DIST_BASE: [usize; 3] = [32, 0, 288];

            let mut step = 0;
            while step < 2 && self.read_bits(1)? != 0 {
                step += 1;
            }
            let distance = DIST_BASE[step] + self.read_bits(DIST_EXTRA[step])? as usize;
            if distance != 0 {
                distance + len
            } else {
                distance
            }
        } else if self.read_bits(1)? != 0 {
            64 + self.read_bits(9)? as usize
        } else {
            self.read_bits(6)? as usize
        };

        len += 2;
        Ok((len.min(self.dst_pos), distance))
    }

    fn copy_match(&mut self, len: usize, distance: usize) {
        let mut from = self.dst_pos + distance + 1;
        for _ in 0..len {
            if self.dst_pos == 0 {
                break;
            }
            from -= 1;
            self.dst_pos -= 1;
            if from < self.dst.len() {
                self.dst[self.dst_pos] = self.dst[from];
            }
        }
    }
}
