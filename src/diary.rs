//! Diary markdown format.
//!
//! A diary is a plain text file (`index.md`) written by hand or produced by
//! `create` / `import`:
//!
//! ```text
//! # Lisbonne 2020
//!
//! [2020/01/12]
//!
//! ###### Dimanche 12 janvier
//!
//! Arrivée en fin de matinée.
//! Déjeuner au bord du Tage.
//!
//! ![](2020-01-12-1.jpg)
//! Le Tage depuis Alfama
//! [](2020-01-12-2.mp4)
//! ______
//! ```
//!
//! - The `# title` header and its blank line are optional.
//! - Records are separated by a line made only of underscores (three or more).
//! - A record may start with a `[YYYY/MM/DD]` date marker, then a
//!   `###### title` line, then free text lines.
//! - `![](uri)` is an image, `[](uri)` a video. A non-blank line right after a
//!   media line is its caption.
//!
//! Printing a parsed diary and parsing it again yields the same posts: text
//! lines are kept verbatim (no wrapping), only leading and trailing blank
//! lines of a record's text are dropped.

use crate::types::{MediaItem, MediaKind, Post};
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("No date in post {index}: expected a [YYYY/MM/DD] line")]
    NoDateInPost { index: usize },
    #[error("Incorrect date format: {0}")]
    IncorrectDateFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A parsed diary file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diary {
    pub title: Option<String>,
    pub posts: Vec<Post>,
}

/// File name of the diary inside a gallery root.
pub const DIARY_FILE: &str = "index.md";

const TITLE_PREFIX: &str = "###### ";
const SEPARATOR: &str = "______";

static DATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([0-9/]+)\]$").expect("static pattern"));
static MEDIA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(!?)\[\]\((.+)\)$").expect("static pattern"));

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '_')
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn media_line(line: &str) -> Option<MediaItem> {
    let caps = MEDIA_LINE.captures(line.trim_end())?;
    let uri = caps[2].to_string();
    Some(if caps[1].is_empty() {
        MediaItem::video(uri)
    } else {
        MediaItem::image(uri)
    })
}

fn parse_marker(line: &str) -> Result<Option<NaiveDate>, DiaryError> {
    let Some(caps) = DATE_MARKER.captures(line.trim()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&caps[1], "%Y/%m/%d")
        .ok()
        .filter(|_| caps[1].len() == 10)
        .map(Some)
        .ok_or_else(|| DiaryError::IncorrectDateFormat(caps[1].to_string()))
}

fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| is_blank(l)) {
        lines.pop();
    }
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    lines.split_off(start)
}

fn parse_record(
    lines: &[&str],
    index: usize,
    require_dates: bool,
) -> Result<Post, DiaryError> {
    let mut rest = lines
        .iter()
        .skip_while(|l| is_blank(l))
        .copied()
        .peekable();

    let mut post = Post::default();

    if let Some(line) = rest.peek()
        && let Some(date) = parse_marker(line)?
    {
        post = post.with_date(date);
        rest.next();
    } else if require_dates {
        return Err(DiaryError::NoDateInPost { index });
    }

    while rest.peek().is_some_and(|l| is_blank(l)) {
        rest.next();
    }
    if let Some(title) = rest.peek().and_then(|l| l.strip_prefix(TITLE_PREFIX)) {
        post.title = Some(title.trim().to_string());
        rest.next();
    }

    let mut text: Vec<String> = Vec::new();
    while let Some(line) = rest.next() {
        let Some(mut media) = media_line(line) else {
            text.push(line.to_string());
            continue;
        };
        if let Some(caption) = rest.peek()
            && !is_blank(caption)
            && media_line(caption).is_none()
        {
            media.caption = Some(caption.trim().to_string());
            rest.next();
        }
        post.images.push(media);
    }
    post.text = trim_blank_edges(text);
    Ok(post)
}

/// Parse diary text.
///
/// With `require_dates`, every record must start with a date marker.
pub fn parse(content: &str, require_dates: bool) -> Result<Diary, DiaryError> {
    let mut lines: Vec<&str> = content.lines().collect();

    let mut title = None;
    if let Some(header) = lines.first().and_then(|l| l.strip_prefix("# ")) {
        title = Some(header.trim().to_string());
        let skip = if lines.get(1).is_some_and(|l| is_blank(l)) {
            2
        } else {
            1
        };
        lines.drain(..skip);
    }

    let mut posts = Vec::new();
    for record in lines.split(|l| is_separator(l)) {
        if record.iter().all(|l| is_blank(l)) {
            continue;
        }
        posts.push(parse_record(record, posts.len(), require_dates)?);
    }
    Ok(Diary { title, posts })
}

/// Read and parse a diary file.
pub fn read(path: &Path, require_dates: bool) -> Result<Diary, DiaryError> {
    if !path.is_file() {
        return Err(DiaryError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse(&content, require_dates)
}

fn print_media(lines: &mut Vec<String>, media: &MediaItem) {
    let line = match media.kind {
        MediaKind::Image => format!("![]({})", media.uri),
        MediaKind::Video => format!("[]({})", media.uri),
        // Subdirectory links only exist in generated pages.
        MediaKind::Subdir => return,
    };
    lines.push(line);
    if let Some(caption) = &media.caption {
        lines.push(caption.clone());
    }
}

/// Print a diary. Only narrative content is written: `dcim` media and
/// thumbnails are never part of the file.
pub fn print(diary: &Diary) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(title) = &diary.title {
        lines.push(format!("# {title}"));
        lines.push(String::new());
    }
    for post in &diary.posts {
        if let Some(date) = post.date {
            lines.push(format!("[{}]", date.format("%Y/%m/%d")));
            lines.push(String::new());
        }
        if let Some(title) = &post.title {
            lines.push(format!("{TITLE_PREFIX}{title}"));
            lines.push(String::new());
        }
        if !post.text.is_empty() {
            lines.extend(post.text.iter().cloned());
            lines.push(String::new());
        }
        for media in &post.images {
            print_media(&mut lines, media);
        }
        lines.push(SEPARATOR.to_string());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write `content` to `path` through a temporary sibling and a rename, so a
/// reader never sees a half-written file.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

/// Print a diary to a file.
pub fn write(diary: &Diary, path: &Path) -> Result<(), DiaryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_atomic(path, &print(diary))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = "\
# Lisbonne 2020

[2020/01/12]

###### Dimanche 12 janvier

Arrivée en fin de matinée.

Déjeuner au bord du Tage.

![](2020-01-12-1.jpg)
Le Tage depuis Alfama
[](2020-01-12-2.mp4)
______
[2020/01/13]

Pluie toute la journée.

______
";

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_header_title() {
        let diary = parse(SAMPLE, false).unwrap();
        assert_eq!(diary.title.as_deref(), Some("Lisbonne 2020"));
        assert_eq!(diary.posts.len(), 2);
    }

    #[test]
    fn parse_marker_title_and_text() {
        let diary = parse(SAMPLE, false).unwrap();
        let post = &diary.posts[0];
        assert_eq!(post.date, Some(ymd(2020, 1, 12)));
        assert_eq!(post.year, Some(2020));
        assert_eq!(post.title.as_deref(), Some("Dimanche 12 janvier"));
        assert_eq!(
            post.text,
            vec![
                "Arrivée en fin de matinée.",
                "",
                "Déjeuner au bord du Tage.",
            ]
        );
    }

    #[test]
    fn parse_media_and_captions() {
        let diary = parse(SAMPLE, false).unwrap();
        let images = &diary.posts[0].images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].kind, MediaKind::Image);
        assert_eq!(images[0].uri, "2020-01-12-1.jpg");
        assert_eq!(images[0].caption.as_deref(), Some("Le Tage depuis Alfama"));
        assert_eq!(images[1].kind, MediaKind::Video);
        assert_eq!(images[1].caption, None);
    }

    #[test]
    fn parse_without_header_or_marker() {
        let diary = parse("###### 3 mars\n\nDépart.\n______\n", false).unwrap();
        assert_eq!(diary.title, None);
        assert_eq!(diary.posts[0].date, None);
        assert_eq!(diary.posts[0].title.as_deref(), Some("3 mars"));
        assert_eq!(diary.posts[0].text, vec!["Départ."]);
    }

    #[test]
    fn parse_last_record_without_separator() {
        let diary = parse("premier\n______\nsecond\n", false).unwrap();
        assert_eq!(diary.posts.len(), 2);
        assert_eq!(diary.posts[1].text, vec!["second"]);
    }

    #[test]
    fn parse_empty_records_are_skipped() {
        let diary = parse("______\n\n______\ntexte\n______\n", false).unwrap();
        assert_eq!(diary.posts.len(), 1);
    }

    #[test]
    fn parse_require_dates_rejects_missing_marker() {
        let err = parse("[2020/01/12]\na\n______\nb\n______\n", true).unwrap_err();
        assert!(matches!(err, DiaryError::NoDateInPost { index: 1 }));
    }

    #[test]
    fn parse_rejects_bad_marker() {
        let err = parse("[2020/13/45]\na\n______\n", false).unwrap_err();
        assert!(matches!(err, DiaryError::IncorrectDateFormat(ref s) if s == "2020/13/45"));
        let err = parse("[2020/1/5]\na\n______\n", false).unwrap_err();
        assert!(matches!(err, DiaryError::IncorrectDateFormat(_)));
    }

    #[test]
    fn parse_caption_is_not_another_media_line() {
        let diary = parse("![](a.jpg)\n![](b.jpg)\n______\n", false).unwrap();
        let images = &diary.posts[0].images;
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.caption.is_none()));
    }

    // =========================================================================
    // Printing and round-trip
    // =========================================================================

    #[test]
    fn print_reproduces_canonical_file() {
        let diary = parse(SAMPLE, false).unwrap();
        assert_eq!(print(&diary), SAMPLE);
    }

    #[test]
    fn parse_print_parse_is_identity() {
        let messy = "\
[2020/05/01]
###### 1er mai
  indented line kept as is
![](a.jpg)
légende

![](b.jpg)
______
une note sans date
______
";
        let first = parse(messy, false).unwrap();
        let second = parse(&print(&first), false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn print_skips_subdir_links() {
        let mut post = Post::new(vec!["x".into()]);
        post.images = vec![MediaItem::new(MediaKind::Subdir, "day1.htm")];
        let out = print(&Diary {
            title: None,
            posts: vec![post],
        });
        assert!(!out.contains("day1.htm"));
    }

    #[test]
    fn print_ignores_dcim() {
        let mut post = Post::new(vec!["x".into()]).with_date(ymd(2020, 1, 1));
        post.dcim = vec![MediaItem::image("/media/IMG_1.jpg")];
        let out = print(&Diary {
            title: None,
            posts: vec![post],
        });
        assert!(!out.contains("IMG_1"));
    }

    // =========================================================================
    // Files
    // =========================================================================

    #[test]
    fn read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read(&tmp.path().join(DIARY_FILE), false).unwrap_err();
        assert!(matches!(err, DiaryError::FileNotFound(_)));
    }

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(DIARY_FILE);
        let diary = parse(SAMPLE, false).unwrap();
        write(&diary, &path).unwrap();
        assert_eq!(read(&path, true).unwrap(), diary);
        assert!(!tmp.path().join("nested").join(".index.md.tmp").exists());
    }
}
