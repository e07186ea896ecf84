//! Media discovery and grouping by date.
//!
//! ## Discovery
//!
//! A media file is recognised by its extension (case-insensitive). A
//! directory holding a `.nomedia` file contributes none of its own files; a
//! recursive walk still descends into its subdirectories. Listings are sorted
//! case-insensitively by file name.
//!
//! ## Indexing
//!
//! [`index_by_date`] keeps the files whose date is required, turns each into
//! a [`MediaItem`] (probing and thumbnailing happen in the caller's closure),
//! and groups them by date, sorted by time of day. A file that cannot be
//! turned into an item is logged and left out; the batch goes on.

use crate::probe;
use crate::types::{MediaItem, MediaKind, Post};
use chrono::{NaiveDate, NaiveTime};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Incorrect date format: {0:?} (expected diary, source or YYYYMMDD-YYYYMMDD)")]
    IncorrectDateFormat(String),
}

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif"];
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "mkv", "flv", "m4v", "avi", "wmv", "mts", "vob", "divx",
];

/// Marker file excluding a directory's own files from discovery.
pub const NOMEDIA: &str = ".nomedia";
const RECYCLE_BIN: &str = "$RECYCLE.BIN";

/// Kind of a media file, from its extension. `None` for anything else.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

pub fn is_media(path: &Path) -> bool {
    media_kind(path).is_some()
}

fn sort_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn has_nomedia(dir: &Path) -> bool {
    dir.join(NOMEDIA).is_file()
}

fn is_recycle_bin(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == RECYCLE_BIN)
}

/// Media files of `dir`, optionally with those of every subdirectory.
pub fn list_media(dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    if !recursive {
        if has_nomedia(dir) {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_media(p))
            .collect();
        files.sort_by_key(|p| sort_key(p));
        return Ok(files);
    }

    let mut excluded: HashMap<PathBuf, bool> = HashMap::new();
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_key(|e| e.file_name().to_string_lossy().to_lowercase())
        .into_iter()
        .filter_entry(|e| !is_recycle_bin(e.path()));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_media(entry.path()) {
            continue;
        }
        let parent = entry.path().parent().unwrap_or(dir).to_path_buf();
        let skip = *excluded
            .entry(parent)
            .or_insert_with_key(|p| has_nomedia(p));
        if !skip {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether `dir` or any directory below it contributes a media file.
pub fn contains_media(dir: &Path) -> bool {
    list_media(dir, true).is_ok_and(|files| !files.is_empty())
}

/// Media files of `dir` plus its subdirectories that contain media, in one
/// sorted listing.
pub fn list_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if has_nomedia(dir) {
        return Ok(Vec::new());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            if p.is_dir() {
                !is_recycle_bin(p) && contains_media(p)
            } else {
                is_media(p)
            }
        })
        .collect();
    entries.sort_by_key(|p| sort_key(p));
    Ok(entries)
}

/// Which media dates a page needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSelection {
    /// Dates of the diary posts.
    #[default]
    Diary,
    /// Every date found in the media directory.
    Source,
    /// Dates of the media directory within an inclusive range.
    Range(NaiveDate, NaiveDate),
}

impl FromStr for DateSelection {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IndexError::IncorrectDateFormat(s.to_string());
        match s {
            "diary" => Ok(DateSelection::Diary),
            "source" => Ok(DateSelection::Source),
            _ => {
                let (from, to) = s.split_once('-').ok_or_else(err)?;
                if from.len() != 8 || to.len() != 8 {
                    return Err(err());
                }
                let from = NaiveDate::parse_from_str(from, "%Y%m%d").map_err(|_| err())?;
                let to = NaiveDate::parse_from_str(to, "%Y%m%d").map_err(|_| err())?;
                Ok(DateSelection::Range(from, to))
            }
        }
    }
}

impl fmt::Display for DateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSelection::Diary => write!(f, "diary"),
            DateSelection::Source => write!(f, "source"),
            DateSelection::Range(from, to) => {
                write!(f, "{}-{}", from.format("%Y%m%d"), to.format("%Y%m%d"))
            }
        }
    }
}

/// A media file with its inferred date and time of day.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Infer date and time of every file. Unreadable files are logged and dropped.
pub fn date_media(files: &[PathBuf]) -> Vec<DatedFile> {
    files
        .par_iter()
        .filter_map(|path| match probe::date_time(path) {
            Ok((date, time)) => Some(DatedFile {
                path: path.clone(),
                date,
                time,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unable to date media, skipped");
                None
            }
        })
        .collect()
}

/// Dates a page must show media for.
pub fn required_dates(
    selection: DateSelection,
    posts: &[Post],
    dated: &[DatedFile],
) -> BTreeSet<NaiveDate> {
    match selection {
        DateSelection::Diary => posts.iter().filter_map(|p| p.date).collect(),
        DateSelection::Source => dated.iter().map(|f| f.date).collect(),
        DateSelection::Range(from, to) => dated
            .iter()
            .map(|f| f.date)
            .filter(|d| (from..=to).contains(d))
            .collect(),
    }
}

/// Group the files of the required dates by date, each group sorted by time.
///
/// `make_item` runs in parallel; an error drops that file with a warning.
pub fn index_by_date<F, E>(
    dated: Vec<DatedFile>,
    required: &BTreeSet<NaiveDate>,
    make_item: F,
) -> BTreeMap<NaiveDate, Vec<MediaItem>>
where
    F: Fn(&DatedFile) -> Result<MediaItem, E> + Sync,
    E: fmt::Display,
{
    let kept: Vec<DatedFile> = dated
        .into_iter()
        .filter(|f| required.contains(&f.date))
        .collect();

    let items: Vec<(NaiveDate, NaiveTime, MediaItem)> = kept
        .par_iter()
        .filter_map(|file| match make_item(file) {
            Ok(item) => Some((file.date, file.time, item)),
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "corrupt media, skipped");
                None
            }
        })
        .collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<(NaiveTime, MediaItem)>> = BTreeMap::new();
    for (date, time, item) in items {
        by_date.entry(date).or_default().push((time, item));
    }
    by_date
        .into_iter()
        .map(|(date, mut group)| {
            group.sort_by_key(|(time, _)| *time);
            (date, group.into_iter().map(|(_, item)| item).collect())
        })
        .collect()
}
