//! Bounds-checked read cursor over an SNDH header buffer.
//!
//! The cursor never reads outside its slice. Peeks return `None` when the
//! requested bytes are not available, and the position is clamped to the end
//! of the buffer so "jump to end" is how a handler abandons the header.

use crate::atari_st;

/// Best-effort value of an ASCII number that was not cleanly NUL-terminated.
///
/// `value` holds whatever digits were scanned before the bad terminator, so
/// callers can salvage e.g. `1995` out of `"1995/2013"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedNumber {
    /// Magnitude parsed before the scan stopped.
    pub value: u32,
}

/// Forward-only read cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor at `pos` (clamped to the end of `data`).
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// One past the last readable byte.
    #[inline]
    pub fn end(&self) -> usize {
        self.data.len()
    }

    /// Whether the cursor has reached the end of the buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Number of bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move to an absolute position, clamped to the end.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Skip `n` bytes, clamped to the end.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.set_pos(self.pos.saturating_add(n));
    }

    /// Jump to the end of the buffer.
    #[inline]
    pub fn finish(&mut self) {
        self.pos = self.data.len();
    }

    /// Byte at `offset` past the current position.
    #[inline]
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos.checked_add(offset)?).copied()
    }

    /// Big-endian u16 at `offset` past the current position.
    pub fn u16_be_at(&self, offset: usize) -> Option<u16> {
        let start = self.pos.checked_add(offset)?;
        let bytes = self.data.get(start..start.checked_add(2)?)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Big-endian u32 at `offset` past the current position.
    pub fn u32_be_at(&self, offset: usize) -> Option<u32> {
        let start = self.pos.checked_add(offset)?;
        let bytes = self.data.get(start..start.checked_add(4)?)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Big-endian u16 at the current position, without advancing.
    #[inline]
    pub fn peek_u16_be(&self) -> Option<u16> {
        self.u16_be_at(0)
    }

    /// Big-endian u32 at the current position, without advancing.
    #[inline]
    pub fn peek_u32_be(&self) -> Option<u32> {
        self.u32_be_at(0)
    }

    /// Absolute index of the next NUL byte at or after the current position.
    pub fn find_nul(&self) -> Option<usize> {
        self.data
            .get(self.pos..)?
            .iter()
            .position(|&b| b == 0)
            .map(|i| self.pos + i)
    }

    /// Read a NUL-terminated Atari ST string and move past its terminator.
    ///
    /// Returns `None` (cursor untouched) if the cursor is at the end or no
    /// terminator exists before the end of the buffer.
    pub fn read_cstring(&mut self) -> Option<String> {
        if self.is_at_end() {
            return None;
        }
        let nul = self.find_nul()?;
        let s = if nul > self.pos {
            atari_st::to_utf8(&self.data[self.pos..nul])
        } else {
            String::new()
        };
        self.pos = nul + 1;
        Some(s)
    }

    /// Read a NUL-terminated unsigned ASCII decimal number.
    ///
    /// Scans like C `strtoul(.., 10)`: optional leading whitespace and sign,
    /// then as many digits as are present. The number must be followed
    /// directly by a NUL inside the buffer; otherwise the cursor is left
    /// where it was and the scanned magnitude is returned as the error.
    pub fn read_ascii_uint(&mut self) -> Result<u32, MalformedNumber> {
        let start = self.pos;
        if start >= self.data.len() {
            return Err(MalformedNumber { value: 0 });
        }
        let bytes = &self.data[start..];

        let mut i = 0;
        while i < bytes.len() && is_c_space(bytes[i]) {
            i += 1;
        }
        let negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };

        let digits_start = i;
        let mut value = 0u32;
        let mut overflow = false;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            let digit = u32::from(bytes[i] - b'0');
            match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(v) => value = v,
                None => overflow = true,
            }
            i += 1;
        }

        let value = if overflow {
            u32::MAX
        } else if negative {
            value.wrapping_neg()
        } else {
            value
        };

        // No digits: the scan "ends" where it started.
        let terminator = if i == digits_start { start } else { start + i };
        match self.data.get(terminator) {
            Some(0) => {
                self.pos = terminator + 1;
                Ok(value)
            }
            _ => Err(MalformedNumber { value }),
        }
    }
}

#[inline]
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}
