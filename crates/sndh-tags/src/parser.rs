//! SNDH header tag parser.
//!
//! ## Header Format
//!
//! - Bytes 0-11: 68000 branch instructions (init/exit/play entry points)
//! - Bytes 12-15: "SNDH" magic
//! - Following: tags in any order until "HDNS"
//!
//! Tags are either four characters (`TITL`, `COMM`, `YEAR`, ...) or two
//! characters (`##`, `!V`, `TA`..`TD`, `!#`). Nothing in the stream says which
//! kind comes next, so the parser tries the four-character table first and
//! falls back to the two-character one.
//!
//! Real-world files break the format in many small ways. Each handler either
//! recovers locally or stops the walk, keeping everything collected so far.

use tracing::{debug, trace};

use crate::cursor::{ByteCursor, MalformedNumber};

/// Offset of the first tag, right after the "SNDH" magic.
pub const TAG_START: usize = 16;

/// Offset of the "SNDH" magic inside the header.
pub const MAGIC_OFFSET: usize = 12;

/// SNDH magic bytes.
pub const SNDH_MAGIC: &[u8; 4] = b"SNDH";

const fn tag32(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

const fn tag16(code: &[u8; 2]) -> u16 {
    u16::from_be_bytes(*code)
}

const TAG_TITL: u32 = tag32(b"TITL");
const TAG_COMM: u32 = tag32(b"COMM");
const TAG_RIPP: u32 = tag32(b"RIPP");
// Header corruption seen in the wild (Marcer/Bellanotte_Chip.sndh).
const TAG_RIPP_LOWER: u32 = tag32(b"ripp");
const TAG_CONV: u32 = tag32(b"CONV");
const TAG_YEAR: u32 = tag32(b"YEAR");
const TAG_SUBTUNE_NAMES: u32 = tag32(b"!#SN");
const TAG_SUBTUNE_NAMES_ALT: u32 = tag32(b"!#ST");
const TAG_TIME: u32 = tag32(b"TIME");
const TAG_FLAG: u32 = tag32(b"FLAG");
const TAG_HDNS: u32 = tag32(b"HDNS");

const TAG_SUBTUNE_COUNT: u16 = tag16(b"##");
const TAG_VBLANK: u16 = tag16(b"!V");
const TAG_TIMER_A: u16 = tag16(b"TA");
const TAG_TIMER_B: u16 = tag16(b"TB");
const TAG_TIMER_C: u16 = tag16(b"TC");
const TAG_TIMER_D: u16 = tag16(b"TD");
const TAG_DEFAULT_SUBTUNE: u16 = tag16(b"!#");

/// Tags parsed from an SNDH header.
///
/// Every field keeps its default until the matching tag is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TagData {
    /// The tag walk ran to completion.
    ///
    /// This is set even if a malformed tag cut the walk short; check the
    /// individual fields to see what was actually found.
    pub tags_read: bool,

    /// Song title (`TITL`)
    pub title: String,
    /// Composer name (`COMM`)
    pub composer: String,
    /// Ripper name (`RIPP`)
    pub ripper: String,
    /// Converter name (`CONV`)
    pub converter: String,

    /// Subtune count (`##`).
    ///
    /// 0 means the tag is missing (SNDHv1, one song); 1 is an explicit single
    /// subtune.
    pub subtunes: u32,
    /// VBlank frequency in Hz (`!V`)
    pub vblank_freq: u32,
    /// Timer A..D frequencies in Hz (`TA`..`TD`), 0 if not specified
    pub timer_freq: [u32; 4],
    /// Year of release (`YEAR`)
    pub year: u32,
    /// Default subtune, 1-based (`!#`)
    pub def_subtune: u32,

    /// Subtune names (`!#SN`)
    pub subtune_names: Vec<String>,
    /// Subtune lengths in seconds (`TIME`)
    pub subtune_lengths: Vec<u32>,
}

impl TagData {
    /// Number of subtunes, treating a missing `##` tag as one song.
    pub fn effective_subtunes(&self) -> u32 {
        self.subtunes.max(1)
    }
}

/// Outcome of a single tag handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The handler consumed its tag; look for the next one.
    Continue,
    /// Stop walking; the rest of the header is ignored.
    Stop,
}

/// Walks the tags of a (depacked) SNDH header.
pub struct TagParser<'a> {
    cur: ByteCursor<'a>,
    tags: TagData,
}

impl<'a> TagParser<'a> {
    /// Create a parser over a header buffer that starts with the 16-byte
    /// preamble. The caller is expected to have checked the magic.
    pub fn new(header: &'a [u8]) -> Self {
        Self {
            cur: ByteCursor::at(header, TAG_START),
            tags: TagData::default(),
        }
    }

    /// Parse all tags of `header`.
    pub fn parse(header: &'a [u8]) -> TagData {
        Self::new(header).run()
    }

    /// Walk the tags until the end of the header.
    pub fn run(mut self) -> TagData {
        while !self.cur.is_at_end() {
            let step = match self.long_tag() {
                Some(step) => step,
                None => self.short_tag(),
            };
            if step == Step::Stop {
                self.cur.finish();
            }
        }

        self.tags.tags_read = true;
        self.tags
    }

    /// Dispatch a four-character tag. `None` if the bytes are not one.
    fn long_tag(&mut self) -> Option<Step> {
        let code = self.cur.peek_u32_be()?;
        let step = match code {
            TAG_TITL => self.string_tag(code, |tags, s| tags.title = s),
            TAG_COMM => self.string_tag(code, |tags, s| tags.composer = s),
            TAG_RIPP | TAG_RIPP_LOWER => self.string_tag(code, |tags, s| tags.ripper = s),
            TAG_CONV => self.string_tag(code, |tags, s| tags.converter = s),
            TAG_YEAR => self.year(),
            TAG_SUBTUNE_NAMES | TAG_SUBTUNE_NAMES_ALT => self.subtune_names(code),
            TAG_TIME => self.subtune_lengths(),
            TAG_FLAG => self.flag(),
            TAG_HDNS => {
                trace!(offset = self.cur.pos(), "end of header");
                Step::Stop
            }
            _ => return None,
        };
        trace!(tag = %tag_name(&code.to_be_bytes()), ?step, "long tag");
        Some(step)
    }

    /// Dispatch a two-character tag, or handle padding / garbage.
    fn short_tag(&mut self) -> Step {
        match self.cur.peek_u16_be() {
            Some(TAG_SUBTUNE_COUNT) => self.subtune_count(),
            Some(TAG_VBLANK) => self.number_tag(|tags, n| tags.vblank_freq = n),
            Some(code @ (TAG_TIMER_A | TAG_TIMER_B | TAG_TIMER_C | TAG_TIMER_D)) => {
                self.timer(code)
            }
            Some(TAG_DEFAULT_SUBTUNE) => self.number_tag(|tags, n| tags.def_subtune = n),
            _ => self.padding(),
        }
    }

    fn abort(&self, tag: &[u8], reason: &str) -> Step {
        debug!(
            tag = %tag_name(tag),
            offset = self.cur.pos(),
            "{reason}; ignoring the rest of the header"
        );
        Step::Stop
    }

    /// `TITL`, `COMM`, `RIPP`, `CONV`: a NUL-terminated string.
    fn string_tag(&mut self, code: u32, store: impl FnOnce(&mut TagData, String)) -> Step {
        self.cur.advance(4);
        match self.cur.read_cstring() {
            Some(s) => {
                store(&mut self.tags, s);
                Step::Continue
            }
            None => self.abort(&code.to_be_bytes(), "unterminated string"),
        }
    }

    /// `!V`, `!#`: a NUL-terminated ASCII number.
    fn number_tag(&mut self, store: impl FnOnce(&mut TagData, u32)) -> Step {
        let code = [self.cur.byte_at(0).unwrap_or(0), self.cur.byte_at(1).unwrap_or(0)];
        self.cur.advance(2);
        match self.cur.read_ascii_uint() {
            Ok(n) => {
                store(&mut self.tags, n);
                Step::Continue
            }
            Err(_) => self.abort(&code, "malformed number"),
        }
    }

    /// `YEAR`: ASCII number, tolerating junk after the digits.
    ///
    /// Seen in the wild: "1995/2013" (Modmate/almoST_real_(ENtRACte).sndh)
    /// and "198x".
    fn year(&mut self) -> Step {
        self.cur.advance(4);
        match self.cur.read_ascii_uint() {
            Ok(year) => {
                self.tags.year = year;
                Step::Continue
            }
            Err(MalformedNumber { value }) => {
                self.tags.year = value;
                if value == 0 {
                    return self.abort(b"YEAR", "invalid year");
                }
                match self.cur.find_nul() {
                    Some(nul) => {
                        self.cur.set_pos(nul + 1);
                        Step::Continue
                    }
                    None => self.abort(b"YEAR", "unterminated year"),
                }
            }
        }
    }

    /// `!#SN` / `!#ST`: one word offset per subtune, each pointing at a
    /// NUL-terminated name. The next tag follows the furthest name.
    fn subtune_names(&mut self, code: u32) -> Step {
        let tag = code.to_be_bytes();
        if !self.tags.subtune_names.is_empty() {
            self.tags.subtune_names.clear();
            return self.abort(&tag, "duplicate subtune name table");
        }

        let count = self.tags.effective_subtunes() as usize;
        let tag_start = self.cur.pos();
        let Some(first) = self.cur.u16_be_at(4) else {
            return self.abort(&tag, "truncated subtune name table");
        };

        // Some files (Mr_Saigon/MSI_Sound_Demo.sndh, Povey_Rob/Quartet_1_0.sndh,
        // Edd_the_Duck/Sonixx.sndh) count offsets from the end of the table.
        let bias = if first == 0 { 4 + count * 2 } else { 0 };

        let mut names = Vec::with_capacity(count);
        let mut next = tag_start;
        for i in 0..count {
            let Some(offset) = self.cur.u16_be_at(4 + i * 2) else {
                return self.abort(&tag, "truncated subtune name table");
            };
            let mut name_cur = ByteCursor::at(self.cur.data(), tag_start + offset as usize + bias);
            let Some(name) = name_cur.read_cstring() else {
                return self.abort(&tag, "bad subtune name");
            };
            names.push(name);
            next = next.max(name_cur.pos());
        }

        self.tags.subtune_names = names;
        self.cur.set_pos(next);
        Step::Continue
    }

    /// `TIME`: one big-endian word (seconds) per subtune.
    ///
    /// Optional; Count_Zero/Decade_Demo_Quartet.sndh has `!#SN` but no `TIME`.
    fn subtune_lengths(&mut self) -> Step {
        let count = self.tags.effective_subtunes() as usize;
        let table_len = 4 + count * 2;
        if table_len > self.cur.remaining() {
            return self.abort(b"TIME", "subtune length table out of bounds");
        }

        let lengths: Option<Vec<u32>> = (0..count)
            .map(|i| self.cur.u16_be_at(4 + i * 2).map(u32::from))
            .collect();
        let Some(lengths) = lengths else {
            return self.abort(b"TIME", "subtune length table out of bounds");
        };

        self.tags.subtune_lengths = lengths;
        self.cur.advance(table_len);
        Step::Continue
    }

    /// `FLAG`: layout is not standardised, so it is only skipped.
    ///
    /// Observed after the tag: two or three bytes plus NUL, five bytes with
    /// or without NUL, or a per-subtune table ending in `00 00`.
    fn flag(&mut self) -> Step {
        let cur = &self.cur;
        let byte = |off: usize| cur.byte_at(off);
        let upper = |off: usize| cur.byte_at(off).is_some_and(|b| b.is_ascii_uppercase());

        let skip = if byte(4 + 2) == Some(0) && upper(4 + 2 + 1) {
            Some(4 + 2 + 1)
        } else if byte(4 + 3) == Some(0) && upper(4 + 3 + 1) {
            Some(4 + 3 + 1)
        } else if byte(4 + 5).is_some_and(|b| b != 0) && upper(4 + 5 + 1) {
            // Five bytes, no terminator.
            Some(4 + 5)
        } else if byte(4) == Some(b'~') && byte(4 + 6 + 2).is_some() && upper(4 + 5 + 2) {
            Some(4 + 5 + 1)
        } else {
            // Look for the `00 00` word ending the table.
            let data = cur.data();
            let end = cur.end();
            (cur.pos() + 4..end.saturating_sub(1))
                .step_by(2)
                .find(|&i| data[i] == 0 && data[i + 1] == 0)
                .map(|i| i + 2 - cur.pos())
        };

        match skip {
            Some(n) => {
                self.cur.advance(n);
                Step::Continue
            }
            None => self.abort(b"FLAG", "unrecognised FLAG layout"),
        }
    }

    /// `##`: two ASCII digits, not NUL-terminated.
    fn subtune_count(&mut self) -> Step {
        let digit = |off: usize| {
            self.cur
                .byte_at(off)
                .filter(u8::is_ascii_digit)
                .map(|b| u32::from(b - b'0'))
        };
        match (digit(2), digit(3)) {
            (Some(tens), Some(ones)) => {
                self.tags.subtunes = tens * 10 + ones;
                self.cur.advance(4);
                Step::Continue
            }
            _ => self.abort(b"##", "bad subtune count"),
        }
    }

    /// `TA`..`TD`: timer frequency.
    fn timer(&mut self, code: u16) -> Step {
        let tag = code.to_be_bytes();
        // A non-digit here usually means the header ended without an HDNS
        // tag and this is already code (Beast/Boring.sndh).
        if !self.cur.byte_at(2).is_some_and(|b| b.is_ascii_digit()) {
            debug!(offset = self.cur.pos(), "header ends without HDNS");
            return Step::Stop;
        }

        let idx = usize::from(tag[1] - b'A');
        self.cur.advance(2);
        match self.cur.read_ascii_uint() {
            Ok(freq) => {
                self.tags.timer_freq[idx] = freq;
                Step::Continue
            }
            Err(_) => self.abort(&tag, "malformed timer frequency"),
        }
    }

    /// Unknown bytes: NUL/space padding is skipped, anything else ends the walk.
    fn padding(&mut self) -> Step {
        let is_pad = |b: u8| b == 0 || b == b' ';
        match self.cur.byte_at(0) {
            Some(b) if is_pad(b) => {
                while self.cur.byte_at(0).is_some_and(is_pad) {
                    self.cur.advance(1);
                }
                Step::Continue
            }
            Some(b) => self.abort(&[b], "invalid tag"),
            None => Step::Stop,
        }
    }
}

fn tag_name(tag: &[u8]) -> String {
    tag.escape_ascii().to_string()
}
