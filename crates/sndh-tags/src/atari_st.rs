//! Atari ST character set to UTF-8 conversion.
//!
//! SNDH strings are stored in the Atari ST code page. It is ASCII-compatible
//! in the printable range but differs from Latin-1 and CP437 in the high half
//! (Hebrew letters, ligatures, Greek/maths symbols), in the control range
//! (arrows, seven-segment digits) and at 0x7F.

/// Unicode code points for bytes 0x00..=0x1F.
///
/// The ST font draws glyphs in the control range. The Atari logo halves
/// (0x0E, 0x0F) and the J.R. "Bob" Dobbs face (0x1C..=0x1F) have no Unicode
/// equivalent and keep their byte value.
const LOW_CONTROLS: [char; 32] = [
    // 0x00
    '\0', '⇧', '⇩', '⇨', '⇦', '\u{1FBBD}', '\u{1FBBE}', '\u{1FBBF}',
    // 0x08
    '✓', '\u{1F552}', '\u{1F514}', '♪', '␌', '␍', '\u{0E}', '\u{0F}',
    // 0x10: seven-segment digits 0-9
    '\u{1FBF0}', '\u{1FBF1}', '\u{1FBF2}', '\u{1FBF3}', '\u{1FBF4}',
    '\u{1FBF5}', '\u{1FBF6}', '\u{1FBF7}', '\u{1FBF8}', '\u{1FBF9}',
    // 0x1A
    'ə', '␛', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
];

/// Unicode code points for bytes 0x80..=0xFF.
const HIGH_HALF: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', 'ß', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    'ã', 'õ', 'Ø', 'ø', 'œ', 'Œ', 'À', 'Ã', 'Õ', '¨', '´', '†', '¶', '©', '®', '™',
    // 0xC0
    'ĳ', 'Ĳ', 'א', 'ב', 'ג', 'ד', 'ה', 'ו', 'ז', 'ח', 'ט', 'י', 'כ', 'ל', 'מ', 'נ',
    // 0xD0
    'ס', 'ע', 'פ', 'צ', 'ק', 'ר', 'ש', 'ת', 'ן', 'ך', 'ם', 'ף', 'ץ', '§', '∧', '∞',
    // 0xE0
    'α', 'β', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∮', 'ϕ', '∈', '∩',
    // 0xF0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '•', '·', '√', 'ⁿ', '²', '³', '¯',
];

/// Map a single Atari ST byte to its Unicode character.
///
/// Bytes with no Unicode counterpart map to the same code point.
#[inline]
pub fn decode_byte(b: u8) -> char {
    match b {
        0x00..=0x1F => LOW_CONTROLS[b as usize],
        0x20..=0x7E => b as char,
        0x7F => '⌂',
        _ => HIGH_HALF[(b - 0x80) as usize],
    }
}

/// Convert an Atari ST encoded byte string to UTF-8.
///
/// Conversion stops at the first NUL byte, if any.
pub fn to_utf8(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| decode_byte(b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(to_utf8(b"Mad Max - Buzz Me!"), "Mad Max - Buzz Me!");
        assert_eq!(to_utf8(b""), "");
    }

    #[test]
    fn test_high_half() {
        assert_eq!(to_utf8(&[0x84, 0x94, 0x81, 0x9E]), "äöüß");
        assert_eq!(to_utf8(&[0xC2, 0xD7]), "את");
        assert_eq!(to_utf8(&[0xBD, 0xBE, 0xBF]), "©®™");
        assert_eq!(decode_byte(0xE1), 'β');
        assert_eq!(decode_byte(0xFF), '¯');
    }

    #[test]
    fn test_control_range_glyphs() {
        assert_eq!(to_utf8(&[0x01, 0x02, 0x03, 0x04]), "⇧⇩⇨⇦");
        assert_eq!(decode_byte(0x08), '✓');
        assert_eq!(decode_byte(0x0B), '♪');
        assert_eq!(decode_byte(0x10), '\u{1FBF0}');
        assert_eq!(decode_byte(0x19), '\u{1FBF9}');
        assert_eq!(decode_byte(0x1A), 'ə');
        assert_eq!(decode_byte(0x1B), '␛');
        assert_eq!(to_utf8(b"Ch\x0Bp\0"), "Ch♪p");
    }

    #[test]
    fn test_unmapped_glyphs_keep_byte_value() {
        assert_eq!(decode_byte(0x0E), '\u{0E}');
        assert_eq!(decode_byte(0x1F), '\u{1F}');
    }

    #[test]
    fn test_del_is_house() {
        assert_eq!(decode_byte(0x7F), '⌂');
    }

    #[test]
    fn test_stops_at_nul() {
        assert_eq!(to_utf8(b"Lap\0garbage"), "Lap");
    }
}
