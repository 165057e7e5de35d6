//! Display fields and summary properties for parsed SNDH tags.
//!
//! [`fields`] turns a [`TagData`] into an ordered list of labelled values for
//! a properties view. [`summary`] extracts the handful of properties a media
//! indexer cares about.

use std::fmt;

use crate::parser::TagData;

/// Long, short and abbreviated names of the file type.
pub const SYSTEM_NAMES: [&str; 3] = ["Atari ST SNDH Audio", "SNDH", "SNDH"];

/// File extensions handled by this crate.
pub const EXTENSIONS: &[&str] = &[".sndh"];

/// MIME types handled by this crate.
pub const MIME_TYPES: &[&str] = &["audio/x-sndh"];

/// One labelled value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    /// Label shown next to the value.
    pub name: String,
    /// The value.
    pub value: FieldValue,
}

/// Value of a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum FieldValue {
    /// Free text.
    Text {
        /// The text.
        text: String,
    },
    /// Unsigned number.
    Number {
        /// The number.
        number: u32,
    },
    /// Table with a header row.
    List {
        /// Column headers.
        headers: Vec<String>,
        /// Rows, each with one cell per header.
        rows: Vec<Vec<String>>,
    },
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Number { number } => write!(f, "{number}"),
            Self::List { headers, rows } => {
                write!(f, "{}", headers.join(" | "))?;
                for row in rows {
                    write!(f, "\n{}", row.join(" | "))?;
                }
                Ok(())
            }
        }
    }
}

impl Field {
    fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text { text: text.into() },
        }
    }

    fn number(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Number { number },
        }
    }
}

/// Summary properties for indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Properties {
    /// Song title, trailing whitespace removed.
    pub title: Option<String>,
    /// Composer, trailing whitespace removed.
    pub composer: Option<String>,
    /// Year of release.
    pub release_year: Option<u32>,
    /// Total length of all subtunes in milliseconds.
    pub duration_ms: Option<u64>,
}

/// Format seconds as `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn hz(freq: u32) -> String {
    format!("{freq} Hz")
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim_end();
    (!s.is_empty()).then_some(s)
}

/// Render the display fields of a parsed header.
///
/// Returns nothing if the tags were never read.
pub fn fields(tags: &TagData) -> Vec<Field> {
    let mut out = Vec::new();
    if !tags.tags_read {
        return out;
    }

    let strings = [
        ("Song Title", &tags.title),
        ("Composer", &tags.composer),
        ("Ripper", &tags.ripper),
        ("Converter", &tags.converter),
    ];
    for (name, value) in strings {
        if let Some(value) = non_empty(value) {
            out.push(Field::text(name, value));
        }
    }

    if tags.year != 0 {
        out.push(Field::number("Year of Release", tags.year));
    }
    out.push(Field::number("# of Subtunes", tags.effective_subtunes()));

    // VBlank goes before the timers.
    if tags.vblank_freq != 0 {
        out.push(Field::text("VBlank Freq", hz(tags.vblank_freq)));
    }
    for (timer, &freq) in ('A'..='D').zip(tags.timer_freq.iter()) {
        if freq != 0 {
            out.push(Field::text(format!("Timer {timer} Freq"), hz(freq)));
        }
    }

    // Subtune numbers are 1-based.
    if tags.subtunes > 1 && tags.def_subtune > 0 {
        out.push(Field::number("Default Subtune", tags.def_subtune));
    }

    let names = &tags.subtune_names;
    let lengths = &tags.subtune_lengths;
    if !names.is_empty() || lengths.len() > 1 {
        if let Some(list) = subtune_list(names, lengths) {
            out.push(list);
        }
    } else if let [length] = lengths.as_slice() {
        // A lone length with no names is the length of the whole song.
        out.push(Field::text("Duration", format_duration(*length)));
    }

    out
}

fn subtune_list(names: &[String], lengths: &[u32]) -> Option<Field> {
    let has_names = !names.is_empty();
    let has_lengths = !lengths.is_empty();

    // Some rips carry all-zero durations; without names the table says nothing.
    if !has_names && lengths.iter().all(|&l| l == 0) {
        return None;
    }

    let mut headers = vec!["#".to_string()];
    if has_names {
        headers.push("Name".to_string());
    }
    if has_lengths {
        headers.push("Duration".to_string());
    }

    let count = names.len().max(lengths.len());
    let rows = (0..count)
        .map(|i| {
            let mut row = Vec::with_capacity(headers.len());
            row.push((i + 1).to_string());
            if has_names {
                row.push(names.get(i).cloned().unwrap_or_default());
            }
            if has_lengths {
                row.push(lengths.get(i).map(|&l| format_duration(l)).unwrap_or_default());
            }
            row
        })
        .collect();

    Some(Field {
        name: "Subtune List".to_string(),
        value: FieldValue::List { headers, rows },
    })
}

/// Extract the summary properties of a parsed header.
pub fn summary(tags: &TagData) -> Properties {
    if !tags.tags_read {
        return Properties::default();
    }
    let total: u64 = tags.subtune_lengths.iter().map(|&l| u64::from(l)).sum();
    Properties {
        title: non_empty(&tags.title).map(str::to_owned),
        composer: non_empty(&tags.composer).map(str::to_owned),
        release_year: (tags.year != 0).then_some(tags.year),
        duration_ms: (total != 0).then_some(total * 1000),
    }
}
