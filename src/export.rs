//! Structured export importer.
//!
//! An export directory holds `posts/*.json`, each file a JSON array of posts:
//!
//! ```json
//! [{
//!   "timestamp": 1578823200,
//!   "data": [{"post": "Dimanche 12 janvier\nArrivée à Lisbonne."}],
//!   "attachments": [{"data": [{"media": {
//!     "uri": "photos/1234.jpg",
//!     "description": "Le Tage",
//!     "media_metadata": {"photo_metadata": {"taken_timestamp": 1578820000}}
//!   }}]}]
//! }]
//! ```
//!
//! Media uris are relative to the export directory. Exports are written in
//! chronological order, so after dating the posts their order is checked and
//! a violation aborts the import.

use crate::dating::{self, DatingError};
use crate::diary::{self, DIARY_FILE, Diary, DiaryError};
use crate::grammar::{self, Locale};
use crate::index;
use crate::naming::{self, NamingError, RenameReport};
use crate::types::{MediaItem, MediaKind, Post};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid export file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Dating(#[from] DatingError),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Diary(#[from] DiaryError),
}

#[derive(Debug, Deserialize)]
struct ExportPost {
    timestamp: i64,
    #[serde(default)]
    data: Vec<ExportData>,
    #[serde(default)]
    attachments: Vec<Option<ExportAttachment>>,
}

#[derive(Debug, Deserialize)]
struct ExportData {
    post: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportAttachment {
    #[serde(default)]
    data: Vec<AttachmentData>,
}

#[derive(Debug, Deserialize)]
struct AttachmentData {
    media: Option<ExportMedia>,
}

#[derive(Debug, Deserialize)]
struct ExportMedia {
    uri: String,
    description: Option<String>,
    media_metadata: Option<MediaMetadata>,
}

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    photo_metadata: Option<PhotoMetadata>,
}

#[derive(Debug, Deserialize)]
struct PhotoMetadata {
    taken_timestamp: Option<i64>,
}

/// Undo UTF-8 text that was decoded as Latin-1 (`Ã©tÃ©` → `été`).
///
/// Text with any character above U+00FF, or whose bytes are not valid UTF-8,
/// is returned unchanged.
pub fn repair_mojibake(text: &str) -> String {
    let bytes: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
    bytes
        .and_then(|b| String::from_utf8(b).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Split post text into an optional date-bearing title and the body lines.
fn split_title(text: &str, locale: Locale) -> (Option<String>, Vec<String>) {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    match lines.first() {
        Some(first) if grammar::is_title(first, locale) => {
            let title = lines.remove(0);
            (Some(title), lines)
        }
        _ => (None, lines),
    }
}

fn convert(post: ExportPost, locale: Locale) -> Post {
    let raw_text = post
        .data
        .iter()
        .find_map(|d| d.post.as_deref())
        .map(repair_mojibake);
    let (title, text) = match &raw_text {
        Some(t) => split_title(t, locale),
        None => (None, Vec::new()),
    };

    let images = post
        .attachments
        .into_iter()
        .flatten()
        .flat_map(|a| a.data)
        .filter_map(|d| d.media)
        .map(|media| {
            let kind = match index::media_kind(Path::new(&media.uri)) {
                Some(MediaKind::Video) => MediaKind::Video,
                _ => MediaKind::Image,
            };
            let mut item = MediaItem::new(kind, media.uri);
            item.creation_timestamp = media
                .media_metadata
                .and_then(|m| m.photo_metadata)
                .and_then(|p| p.taken_timestamp);
            item.caption = media
                .description
                .map(|d| repair_mojibake(&d))
                .filter(|d| Some(d) != raw_text.as_ref());
            item
        })
        .collect();

    Post {
        raw_timestamp: Some(post.timestamp),
        title,
        text,
        images,
        ..Post::default()
    }
}

/// Read every post of an export directory, sorted by timestamp.
///
/// When two posts share a timestamp the one read last wins. Files are read
/// in name order.
pub fn read_export(dir: &Path, locale: Locale) -> Result<Vec<Post>, ExportError> {
    let posts_dir = dir.join("posts");
    if !posts_dir.is_dir() {
        return Err(ExportError::DirectoryNotFound(posts_dir));
    }
    let mut files: Vec<PathBuf> = fs::read_dir(&posts_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();

    let mut by_timestamp: BTreeMap<i64, Post> = BTreeMap::new();
    for file in files {
        let content = fs::read_to_string(&file)?;
        let entries: Vec<ExportPost> =
            serde_json::from_str(&content).map_err(|source| ExportError::Json {
                path: file.display().to_string(),
                source,
            })?;
        tracing::debug!(file = %file.display(), posts = entries.len(), "export file read");
        for entry in entries {
            by_timestamp.insert(entry.timestamp, convert(entry, locale));
        }
    }
    Ok(by_timestamp.into_values().collect())
}

/// Parameters of an import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub year: Option<i32>,
    pub rename: bool,
    pub locale: Locale,
}

/// Outcome of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub posts: usize,
    pub media: usize,
    /// Media listed in the export but absent from it.
    pub missing: Vec<String>,
    pub rename: Option<RenameReport>,
    /// Diary written, `None` when the export holds no post.
    pub diary: Option<PathBuf>,
}

fn file_name(uri: &str) -> String {
    Path::new(uri)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| uri.to_string())
}

/// Convert an export directory into a diary in `options.output`.
///
/// Media are copied next to the diary under their file name; with `rename`
/// they then take their sequential names.
pub fn import(options: &ImportOptions) -> Result<ImportReport, ExportError> {
    let posts = read_export(&options.input, options.locale)?;
    let mut report = ImportReport {
        posts: posts.len(),
        ..ImportReport::default()
    };
    if posts.is_empty() {
        tracing::warn!(input = %options.input.display(), "no posts found");
        return Ok(report);
    }

    let mut posts = dating::assign(posts, options.year, options.locale);
    dating::require_dates(&posts)?;
    dating::check_order(&posts)?;

    fs::create_dir_all(&options.output)?;
    for image in posts.iter_mut().flat_map(|p| p.images.iter_mut()) {
        let name = file_name(&image.uri);
        let from = options.input.join(&image.uri);
        match fs::copy(&from, options.output.join(&name)) {
            Ok(_) => report.media += 1,
            Err(e) => {
                tracing::warn!(media = %from.display(), error = %e, "unable to copy media");
                report.missing.push(image.uri.clone());
            }
        }
        image.uri = name;
    }

    if options.rename {
        let named = naming::assign_sequential_names(posts)?;
        let (renamed, rename_report) = naming::rename_media(named, &options.output);
        posts = renamed;
        report.rename = Some(rename_report);
    }

    let title = options
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let diary_path = options.output.join(DIARY_FILE);
    diary::write(&Diary { title, posts }, &diary_path)?;
    report.diary = Some(diary_path);
    Ok(report)
}
