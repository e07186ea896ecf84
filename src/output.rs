//! CLI output formatting for every command.
//!
//! Output leads with what was produced (pages, posts, diaries) and shows
//! file paths as indented context lines. Warnings about single files go to
//! the log on stderr; stdout only carries results.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Lisbonne: 3 posts, 12 photos and videos
//!     Page: Lisbonne_Belem.htm
//!     Page: Lisbonne.htm
//!     Page: index.htm
//! Thumbnails: 10 cached, 4 created (14 total)
//! Purged 2 stale thumbnails
//! ```
//!
//! ## Import
//!
//! ```text
//! Imported 24 posts, 57 media
//!     Diary: /home/me/diary/index.md
//!     Missing: photos/123.jpg
//! Renamed 55, unchanged 0, failed 2
//!     Failed: 2020-01-12-3.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::export::ImportReport;
use crate::gallery::GalleryReport;
use crate::naming::RenameReport;
use std::path::Path;

/// Path shown relative to `base` when it lives below it.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// gallery
// ============================================================================

/// Format the result of a gallery build. Page paths are shown relative to
/// the destination directory.
pub fn format_gallery_report(report: &GalleryReport, dest: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {}, {} photos and videos",
        report.title,
        plural(report.posts, "post"),
        report.media
    )];
    for page in &report.pages {
        lines.push(format!("    Page: {}", display_path(page, dest)));
    }
    lines.push(format!("Thumbnails: {}", report.thumbnails));
    if !report.purged.is_empty() {
        lines.push(format!(
            "Purged {}",
            plural(report.purged.len(), "stale thumbnail")
        ));
    }
    lines
}

pub fn print_gallery_report(report: &GalleryReport, dest: &Path) {
    print_lines(format_gallery_report(report, dest));
}

// ============================================================================
// import
// ============================================================================

pub fn format_rename_report(report: &RenameReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Renamed {}, unchanged {}, failed {}",
        report.renamed,
        report.unchanged,
        report.failed.len()
    )];
    for name in &report.failed {
        lines.push(format!("    Failed: {}", name));
    }
    lines
}

pub fn print_rename_report(report: &RenameReport) {
    print_lines(format_rename_report(report));
}

pub fn format_import_report(report: &ImportReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Imported {}, {} media",
        plural(report.posts, "post"),
        report.media
    )];
    match &report.diary {
        Some(path) => lines.push(format!("    Diary: {}", path.display())),
        None => lines.push("    Nothing to write".to_string()),
    }
    for name in &report.missing {
        lines.push(format!("    Missing: {}", name));
    }
    if let Some(rename) = &report.rename {
        lines.extend(format_rename_report(rename));
    }
    lines
}

pub fn print_import_report(report: &ImportReport) {
    print_lines(format_import_report(report));
}

// ============================================================================
// create, idem
// ============================================================================

pub fn format_created_diary(path: &Path, records: usize) -> Vec<String> {
    vec![format!(
        "Created {} with {}",
        path.display(),
        plural(records, "record")
    )]
}

pub fn print_created_diary(path: &Path, records: usize) {
    print_lines(format_created_diary(path, records));
}

pub fn format_idem(path: &Path) -> Vec<String> {
    vec![format!("Diary printed to {}", path.display())]
}

pub fn print_idem(path: &Path) {
    print_lines(format_idem(path));
}

// ============================================================================
// Tests
// ============================================================================
