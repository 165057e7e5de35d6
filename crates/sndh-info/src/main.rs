//! Show the header tags of SNDH files.
//!
//! Accepts files and directories. Directories are scanned recursively for
//! `.sndh` files. The tags are printed as labelled fields, or written as a
//! JSON catalog with `--json`.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use sndh_tags::{
    fields, is_ice_packed, summary, ByteSource, Field, FieldValue, Properties, ReaderConfig,
    SndhReader, TagData, EXTENSIONS, MIME_TYPES, SYSTEM_NAMES,
};

#[derive(Parser)]
#[command(name = "sndh-info")]
#[command(about = "Show the header tags of SNDH chiptune files")]
struct Args {
    /// Files or directories to read
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write a JSON catalog instead of text
    #[arg(long)]
    json: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base path to strip from file paths in the output
    #[arg(short, long)]
    base: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Reader limits as a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Catalog {
    version: String,
    generated: String,
    tracks: Vec<TrackInfo>,
}

#[derive(Serialize)]
struct TrackInfo {
    path: String,
    format: &'static str,
    mime_type: &'static str,
    /// Whether the file is ICE! packed.
    packed: bool,
    #[serde(flatten)]
    properties: Properties,
    subtunes: u32,
    fields: Vec<Field>,
    tags: TagData,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ReaderConfig> {
    let Some(path) = path else {
        return Ok(ReaderConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn has_sndh_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            EXTENSIONS
                .iter()
                .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Expand directories into the `.sndh` files below them.
///
/// Files named explicitly are kept whatever their extension.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| has_sndh_extension(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn display_path(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Read one file. `Ok(None)` means it is not an SNDH file.
fn read_track(reader: &SndhReader, path: &Path, base: Option<&Path>) -> Result<Option<TrackInfo>> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut magic = [0u8; 12];
    let n = file
        .seek_and_read(0, &mut magic)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let packed = is_ice_packed(&magic[..n]);

    let Some(tags) = reader.parse(&mut file) else {
        debug!("{}: no SNDH tags", path.display());
        return Ok(None);
    };

    Ok(Some(TrackInfo {
        path: display_path(path, base),
        format: SYSTEM_NAMES[1],
        mime_type: MIME_TYPES[0],
        packed,
        properties: summary(&tags),
        subtunes: tags.effective_subtunes(),
        fields: fields(&tags),
        tags,
    }))
}

fn render_text(track: &TrackInfo) -> String {
    let mut out = String::new();
    let packed = if track.packed { " (ICE! packed)" } else { "" };
    out.push_str(&format!("{}{}\n", track.path, packed));
    out.push_str(&format!("  Format: {}\n", SYSTEM_NAMES[0]));
    for Field { name, value } in &track.fields {
        match value {
            FieldValue::List { headers, rows } => {
                out.push_str(&format!("  {name}:\n"));
                out.push_str(&format!("    {}\n", headers.join(" | ")));
                for row in rows {
                    out.push_str(&format!("    {}\n", row.join(" | ")));
                }
            }
            _ => out.push_str(&format!("  {name}: {value}\n")),
        }
    }
    out
}

fn render_json(tracks: Vec<TrackInfo>, pretty: bool) -> Result<String> {
    let catalog = Catalog {
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated: chrono::Utc::now().to_rfc3339(),
        tracks,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&catalog)?
    } else {
        serde_json::to_string(&catalog)?
    };
    Ok(json)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let reader = SndhReader::with_config(load_config(args.config.as_deref())?);
    let base = args.base.as_deref();
    let files = collect_files(&args.paths);
    debug!("{} files to read", files.len());

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<(&PathBuf, Result<Option<TrackInfo>>)> = files
        .par_iter()
        .map(|path| {
            let result = read_track(&reader, path, base);
            pb.inc(1);
            (path, result)
        })
        .collect();
    pb.finish_and_clear();

    let mut tracks = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (path, result) in results {
        match result {
            Ok(Some(track)) => tracks.push(track),
            Ok(None) => eprintln!("{}: not an SNDH file, skipped", path.display()),
            Err(e) => {
                eprintln!("error: {e:#}");
                failures += 1;
            }
        }
    }

    let output = if args.json {
        tracks.sort_by(|a, b| {
            let key = |t: &TrackInfo| {
                (
                    t.properties.composer.clone().unwrap_or_default().to_lowercase(),
                    t.properties.title.clone().unwrap_or_default().to_lowercase(),
                )
            };
            key(a).cmp(&key(b)).then_with(|| a.path.cmp(&b.path))
        });
        render_json(tracks, args.pretty)?
    } else {
        tracks.iter().map(render_text).collect::<Vec<_>>().join("\n")
    };

    match &args.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{output}"),
    }

    if failures > 0 {
        anyhow::bail!("{failures} file(s) could not be read");
    }
    Ok(())
}
