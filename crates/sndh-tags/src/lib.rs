//! # sndh-tags
//!
//! Header tag reader for SNDH files, the standard format for Atari ST
//! chiptune music.
//!
//! An SNDH file embeds the 68000 replay code together with the music data.
//! The first bytes of the file are a tagged header carrying the song title,
//! composer, subtune names and lengths, replay rates and so on. This crate
//! reads that header without running any of the code:
//!
//! - **Tag parser**: Walks the header and recovers from the many ways
//!   real-world files bend the format
//! - **ICE! depacker**: Decompresses ICE! 2.4 packed files (`ice` feature)
//! - **Detection**: Quick check on the first bytes of a file
//! - **Fields**: Labelled display values and summary properties
//!
//! ## Example
//!
//! ```rust,no_run
//! use sndh_tags::{fields, parse_sndh};
//! use std::fs::File;
//!
//! let mut file = File::open("music.sndh")?;
//! if let Some(tags) = parse_sndh(&mut file) {
//!     for field in fields(&tags) {
//!         println!("{}: {}", field.name, field.value);
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Header Format
//!
//! - Bytes 0-11: branch instructions to the init/exit/play routines
//! - Bytes 12-15: `SNDH`
//! - Bytes 16-: tags, up to `HDNS`
//!
//! Many SNDH files are ICE! packed, in which case the header is only
//! readable after depacking.

#![warn(missing_docs)]

pub mod atari_st;
mod config;
mod cursor;
mod detect;
mod error;
mod fields;
pub mod ice;
mod parser;
mod reader;
mod source;

pub use config::ReaderConfig;
pub use cursor::{ByteCursor, MalformedNumber};
pub use detect::{detect, detect_within, is_sndh_data, Detected, DETECT_LEN};
pub use error::{Result, SndhError};
pub use fields::{
    fields, format_duration, summary, Field, FieldValue, Properties, EXTENSIONS, MIME_TYPES,
    SYSTEM_NAMES,
};
#[cfg(feature = "ice")]
pub use ice::ice_depack;
pub use ice::is_ice_packed;
pub use parser::{TagData, TagParser, MAGIC_OFFSET, SNDH_MAGIC, TAG_START};
pub use reader::{parse_sndh, parse_sndh_bytes, SndhReader};
pub use source::{ByteSource, SliceSource};
