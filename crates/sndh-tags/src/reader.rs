//! Loading an SNDH header from a byte source.
//!
//! The reader probes the start of the source, depacks ICE! files, checks the
//! `SNDH` magic and hands the header bytes to [`TagParser`]. Every failure
//! before the tag walk is reported as [`SndhError`] by [`SndhReader::read_header`]
//! and collapsed to `None` by [`SndhReader::parse`].

use tracing::debug;

use crate::config::ReaderConfig;
use crate::detect::{detect_within, Detected};
use crate::error::{Result, SndhError};
use crate::parser::{TagData, TagParser, MAGIC_OFFSET, SNDH_MAGIC, TAG_START};
use crate::source::{ByteSource, SliceSource};

/// SNDH header reader.
#[derive(Debug, Clone, Default)]
pub struct SndhReader {
    config: ReaderConfig,
}

impl SndhReader {
    /// Reader with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader with custom limits.
    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Active limits.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read the header bytes of an SNDH file, depacking ICE! data if needed.
    ///
    /// The returned buffer holds at most `header_probe_len` bytes and is
    /// guaranteed to carry the `SNDH` magic at offset 12.
    pub fn read_header<S: ByteSource + ?Sized>(&self, src: &mut S) -> Result<Vec<u8>> {
        let mut header = vec![0u8; self.config.header_probe_len.max(TAG_START)];
        let n = src.seek_and_read(0, &mut header)?;
        header.truncate(n);
        if n < TAG_START {
            return Err(SndhError::TooShort {
                expected: TAG_START,
                actual: n,
            });
        }

        if crate::ice::has_ice_magic(&header) {
            header = self.depack_header(src)?;
        }

        if header.get(MAGIC_OFFSET..TAG_START) != Some(&SNDH_MAGIC[..]) {
            return Err(SndhError::BadMagic);
        }
        Ok(header)
    }

    #[cfg(feature = "ice")]
    fn depack_header<S: ByteSource + ?Sized>(&self, src: &mut S) -> Result<Vec<u8>> {
        use crate::ice::{ice_depack_with_limit, ice_depacked_size};

        let mut data = crate::source::read_all(src)?;
        if data.len() < TAG_START {
            return Err(SndhError::TooShort {
                expected: TAG_START,
                actual: data.len(),
            });
        }

        let sizes = ice_depacked_size(&data).ok_or(SndhError::NotIcePacked)?;
        if sizes.depacked == 0 || sizes.depacked as usize > self.config.max_depacked_size {
            return Err(SndhError::IceSizeOutOfRange {
                size: sizes.depacked,
            });
        }

        let file_size = data.len() as u64;
        if file_size.abs_diff(u64::from(sizes.packed)) > self.config.ice_margin {
            return Err(SndhError::IceSizeMismatch {
                file_size,
                packed_size: sizes.packed,
            });
        }
        // Packers sometimes drop a few trailing bytes; the bitstream expects them.
        let packed = sizes.packed as usize;
        if packed > data.len() {
            data.resize(packed, 0);
        }

        let mut depacked = ice_depack_with_limit(&data, self.config.max_depacked_size)?;
        depacked.truncate(self.config.header_probe_len);
        Ok(depacked)
    }

    #[cfg(not(feature = "ice"))]
    fn depack_header<S: ByteSource + ?Sized>(&self, _src: &mut S) -> Result<Vec<u8>> {
        Err(SndhError::IceUnsupported)
    }

    /// Quick SNDH check on the first `detect_len` bytes of `data`.
    ///
    /// Packed files are not depacked; see [`crate::detect`].
    pub fn detect(&self, data: &[u8]) -> Option<Detected> {
        detect_within(data, self.config.detect_len)
    }

    /// Parse the header tags of an SNDH source.
    ///
    /// Returns `None` if the source is not an SNDH file or could not be
    /// read. A malformed header still yields the tags found before the
    /// damage.
    pub fn parse<S: ByteSource + ?Sized>(&self, src: &mut S) -> Option<TagData> {
        match self.read_header(src) {
            Ok(header) => Some(TagParser::parse(&header)),
            Err(e) => {
                debug!("not reading SNDH tags: {e}");
                None
            }
        }
    }

    /// Parse the header tags of an in-memory SNDH file.
    pub fn parse_bytes(&self, data: &[u8]) -> Option<TagData> {
        self.parse(&mut SliceSource(data))
    }
}

/// Parse SNDH tags from a source with default limits.
///
/// # Example
///
/// ```
/// use sndh_tags::parse_sndh;
/// use std::io::Cursor;
///
/// let mut file = Vec::new();
/// file.extend_from_slice(&[0x60, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0]);
/// file.extend_from_slice(b"SNDHTITLBuzz Me\0HDNS");
///
/// let tags = parse_sndh(&mut Cursor::new(file)).unwrap();
/// assert_eq!(tags.title, "Buzz Me");
/// ```
pub fn parse_sndh<S: ByteSource + ?Sized>(src: &mut S) -> Option<TagData> {
    SndhReader::new().parse(src)
}

/// Parse SNDH tags from an in-memory file with default limits.
pub fn parse_sndh_bytes(data: &[u8]) -> Option<TagData> {
    SndhReader::new().parse_bytes(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sndh(tags: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 12];
        data.extend_from_slice(b"SNDH");
        data.extend_from_slice(tags);
        data
    }

    #[test]
    fn test_plain_file() {
        let tags = parse_sndh_bytes(&sndh(b"TITLTest Song\0HDNS")).unwrap();
        assert!(tags.tags_read);
        assert_eq!(tags.title, "Test Song");
    }

    #[test]
    fn test_too_short() {
        let err = SndhReader::new()
            .read_header(&mut SliceSource(b"SNDH"))
            .unwrap_err();
        assert!(matches!(err, SndhError::TooShort { expected: 16, actual: 4 }));
        assert_eq!(parse_sndh_bytes(&[0u8; 15]), None);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = sndh(b"HDNS");
        data[12..16].copy_from_slice(b"SNDX");
        let err = SndhReader::new()
            .read_header(&mut SliceSource(&data))
            .unwrap_err();
        assert!(matches!(err, SndhError::BadMagic));
    }

    #[test]
    fn test_header_is_capped() {
        let mut data = sndh(b"HDNS");
        data.resize(10_000, 0);
        let header = SndhReader::new()
            .read_header(&mut SliceSource(&data))
            .unwrap();
        assert_eq!(header.len(), 4096);
    }

    #[test]
    fn test_tags_past_probe_are_ignored() {
        let cfg = ReaderConfig {
            header_probe_len: 20,
            ..ReaderConfig::default()
        };
        let data = sndh(b"HDNSTITLlate\0");
        let tags = SndhReader::with_config(cfg).parse_bytes(&data).unwrap();
        assert!(tags.title.is_empty());
    }

    #[test]
    fn test_detect_uses_configured_length() {
        let data = sndh(b"HDNS");
        assert_eq!(SndhReader::new().detect(&data), Some(Detected::Plain));

        let short = SndhReader::with_config(ReaderConfig {
            detect_len: 15,
            ..ReaderConfig::default()
        });
        assert_eq!(short.detect(&data), None);
    }

    #[cfg(feature = "ice")]
    #[test]
    fn test_detect_packed_fragment_past_default_length() {
        let mut data = b"ICE!\x00\x00\x04\x00\x00\x00\x08\x00".to_vec();
        data.resize(600, 0x11);
        data.extend_from_slice(b"TITL");

        assert_eq!(SndhReader::new().detect(&data), None);
        let wide = SndhReader::with_config(ReaderConfig {
            detect_len: 1024,
            ..ReaderConfig::default()
        });
        assert_eq!(wide.detect(&data), Some(Detected::IcePacked));
    }

    #[cfg(feature = "ice")]
    mod ice {
        use super::*;
        use crate::ice::tests::pack_literal;

        #[test]
        fn test_packed_file() {
            let packed = pack_literal(&sndh(b"TITLPacked\0COMMSomeone\0HDNS"));
            let tags = parse_sndh_bytes(&packed).unwrap();
            assert_eq!(tags.title, "Packed");
            assert_eq!(tags.composer, "Someone");
        }

        #[test]
        fn test_trailing_slack_within_margin() {
            let payload = sndh(b"TITL1234567\0");
            let mut packed = pack_literal(&payload);
            packed.extend_from_slice(&[0u8; 16]);
            let header = SndhReader::new()
                .read_header(&mut SliceSource(&packed))
                .unwrap();
            assert_eq!(header, payload);
        }

        #[test]
        fn test_short_file_within_margin_is_padded() {
            // Declared packed size a few bytes above the file passes the
            // margin check; the padded stream then fails to decode here.
            let mut packed = pack_literal(&sndh(b"HDNS"));
            let declared = (packed.len() + 4) as u32;
            packed[4..8].copy_from_slice(&declared.to_be_bytes());
            let err = SndhReader::new()
                .read_header(&mut SliceSource(&packed))
                .unwrap_err();
            assert!(matches!(err, SndhError::IceDepack(_)));
        }

        #[test]
        fn test_size_mismatch() {
            let mut packed = pack_literal(&sndh(b"HDNS"));
            packed.extend_from_slice(&[0u8; 17]);
            let err = SndhReader::new()
                .read_header(&mut SliceSource(&packed))
                .unwrap_err();
            assert!(matches!(err, SndhError::IceSizeMismatch { .. }));
        }

        #[test]
        fn test_depacked_size_limit() {
            let packed = pack_literal(&sndh(b"HDNS"));
            let cfg = ReaderConfig {
                max_depacked_size: 8,
                ..ReaderConfig::default()
            };
            let err = SndhReader::with_config(cfg)
                .read_header(&mut SliceSource(&packed))
                .unwrap_err();
            assert!(matches!(err, SndhError::IceSizeOutOfRange { size: 20 }));
        }

        #[test]
        fn test_packed_non_sndh() {
            let packed = pack_literal(b"this is not a music file at all");
            assert_eq!(parse_sndh_bytes(&packed), None);
        }
    }
}
