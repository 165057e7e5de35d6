//! End-to-end header reading through the public API.

mod common;

use std::io::{Cursor, Write};

use common::{ice_literal, sndh_file};
use sndh_tags::{
    detect, fields, parse_sndh, parse_sndh_bytes, summary, Detected, FieldValue, ReaderConfig,
    SliceSource, SndhError, SndhReader,
};

#[test]
fn test_title_only() {
    let tags = parse_sndh_bytes(&sndh_file(b"TITLTest Song\0HDNS")).unwrap();
    assert!(tags.tags_read);
    assert_eq!(tags.title, "Test Song");
    assert!(tags.composer.is_empty());
    assert_eq!(tags.subtunes, 0);
    assert!(tags.subtune_names.is_empty());
    assert!(tags.subtune_lengths.is_empty());
}

#[test]
fn test_subtune_count_and_lengths() {
    let mut header = b"##05TIME".to_vec();
    for secs in [10u16, 20, 30, 40, 50] {
        header.extend_from_slice(&secs.to_be_bytes());
    }
    header.extend_from_slice(b"HDNS");

    let tags = parse_sndh_bytes(&sndh_file(&header)).unwrap();
    assert_eq!(tags.subtunes, 5);
    assert_eq!(tags.subtune_lengths, [10, 20, 30, 40, 50]);

    let FieldValue::List { headers, rows } = fields(&tags).pop().unwrap().value else {
        panic!("expected the subtune list");
    };
    assert_eq!(headers, ["#", "Duration"]);
    assert_eq!(rows[4], ["5", "0:50"]);
    assert_eq!(summary(&tags).duration_ms, Some(150_000));
}

#[test]
fn test_short_input_is_not_sndh() {
    assert_eq!(parse_sndh_bytes(b"SNDH"), None);
    assert_eq!(parse_sndh_bytes(&[]), None);
    assert_eq!(detect(&[0u8; 15]), None);
}

#[test]
fn test_reparsing_is_stable() {
    let file = sndh_file(b"COMMMad Max\0YEAR1995/2013\0!V50\0TC200\0##02!#SN\0\0\0\x02A\0B\0HDNS");
    let first = parse_sndh_bytes(&file).unwrap();
    let second = parse_sndh_bytes(&file).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.composer, "Mad Max");
    assert_eq!(first.year, 1995);
    assert_eq!(first.vblank_freq, 50);
    assert_eq!(first.timer_freq, [0, 0, 200, 0]);
    assert_eq!(first.subtune_names, ["A", "B"]);
}

#[test]
fn test_windows_line_padding() {
    let tags = parse_sndh_bytes(&sndh_file(b"TITLx\0\0\0  COMMy\0HDNS")).unwrap();
    assert_eq!(tags.title, "x");
    assert_eq!(tags.composer, "y");
}

#[test]
fn test_atari_st_characters() {
    let tags = parse_sndh_bytes(&sndh_file(b"COMMJ\x94rg\0HDNS")).unwrap();
    assert_eq!(tags.composer, "Jörg");
}

#[test]
fn test_file_source() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&sndh_file(b"TITLFrom Disk\0RIPPGrazey\0HDNS"))
        .unwrap();

    let tags = parse_sndh(&mut file).unwrap();
    assert_eq!(tags.title, "From Disk");
    assert_eq!(tags.ripper, "Grazey");
}

#[test]
fn test_cursor_source() {
    let mut cursor = Cursor::new(sndh_file(b"CONVsc68\0HDNS"));
    assert_eq!(parse_sndh(&mut cursor).unwrap().converter, "sc68");
}

#[test]
fn test_not_sndh_file() {
    let mut data = sndh_file(b"HDNS");
    data[12] = b'X';
    assert_eq!(parse_sndh_bytes(&data), None);
    assert!(matches!(
        SndhReader::new().read_header(&mut SliceSource(&data)),
        Err(SndhError::BadMagic)
    ));
}

#[test]
fn test_unread_tags_render_nothing() {
    let tags = sndh_tags::TagData::default();
    assert!(fields(&tags).is_empty());
}

#[cfg(feature = "ice")]
mod packed {
    use super::*;

    #[test]
    fn test_packed_file() {
        let plain = sndh_file(b"TITLPacked Tune\0COMMSomebody\0YEAR1991\0HDNS");
        let packed = ice_literal(&plain);

        assert_eq!(detect(&plain), Some(Detected::Plain));
        assert_eq!(detect(&packed), Some(Detected::IcePacked));

        let tags = parse_sndh_bytes(&packed).unwrap();
        assert_eq!(tags, parse_sndh_bytes(&plain).unwrap());
        assert_eq!(tags.year, 1991);
    }

    #[test]
    fn test_packed_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&ice_literal(&sndh_file(b"TITLOn Disk\0HDNS")))
            .unwrap();
        let mut handle = file.reopen().unwrap();
        assert_eq!(parse_sndh(&mut handle).unwrap().title, "On Disk");
    }

    #[test]
    fn test_margin_exceeded() {
        let mut packed = ice_literal(&sndh_file(b"TITLPacked Tune\0HDNS"));
        packed.extend_from_slice(&[0u8; 17]);
        assert_eq!(parse_sndh_bytes(&packed), None);
        assert!(matches!(
            SndhReader::new().read_header(&mut SliceSource(&packed)),
            Err(SndhError::IceSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_margin_is_configurable() {
        let mut packed = ice_literal(&sndh_file(b"TITLPacked Tune\0HDNS"));
        packed.extend_from_slice(&[0u8; 4]);
        let strict = SndhReader::with_config(ReaderConfig {
            ice_margin: 0,
            ..ReaderConfig::default()
        });
        assert_eq!(strict.parse_bytes(&packed), None);
        assert!(SndhReader::new().parse_bytes(&packed).is_some());
    }

    #[test]
    fn test_lowercase_magic() {
        let mut packed = ice_literal(&sndh_file(b"TITLlower\0HDNS"));
        packed[..4].copy_from_slice(b"Ice!");
        assert_eq!(parse_sndh_bytes(&packed).unwrap().title, "lower");
    }
}
