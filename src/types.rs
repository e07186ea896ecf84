//! Shared types flowing through the dating, indexing and rendering stages.
//!
//! A [`Post`] is one diary entry. Its [`MediaItem`]s are owned by the post
//! that lists them and are never shared: `images` holds the narrative media
//! written in the diary, `dcim` holds media attached mechanically by date
//! matching in [`merge`](crate::merge).

use crate::probe::MediaInfo;
use chrono::{Datelike, NaiveDate};

/// What a media item points at.
///
/// The dating and caching core only needs `uri` and `thumb`; the renderer
/// matches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    /// Link to a nested gallery page built from a subdirectory.
    Subdir,
}

/// A thumbnail file in the gallery's thumbnail directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// File name inside the thumbnail directory, e.g. `dcim-2020_IMG_1.jpg.jpg`.
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// A photo, a video, or a link to a subdirectory gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub kind: MediaKind,
    /// Path as written in the diary (relative to the gallery root) or the
    /// absolute path of a file found in the media directory.
    pub uri: String,
    pub caption: Option<String>,
    /// Capture time in seconds since the epoch, used only for year inference.
    pub creation_timestamp: Option<i64>,
    /// Probe result, filled in before thumbnailing.
    pub info: Option<MediaInfo>,
    pub thumb: Option<Thumbnail>,
    pub description: Option<String>,
    pub sequential_name: Option<String>,
}

impl MediaItem {
    pub fn new(kind: MediaKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            caption: None,
            creation_timestamp: None,
            info: None,
            thumb: None,
            description: None,
            sequential_name: None,
        }
    }

    pub fn image(uri: impl Into<String>) -> Self {
        Self::new(MediaKind::Image, uri)
    }

    pub fn video(uri: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, uri)
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_creation(mut self, timestamp: i64) -> Self {
        self.creation_timestamp = Some(timestamp);
        self
    }

    /// Extension of the uri including the dot, or an empty string.
    pub fn extension(&self) -> &str {
        let file_name = self.uri.rsplit(['/', '\\']).next().unwrap_or(&self.uri);
        match file_name.rfind('.') {
            Some(pos) if pos > 0 => &file_name[pos..],
            _ => "",
        }
    }
}

/// One diary entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Post {
    /// Publication instant, only known for posts read from a structured export.
    pub raw_timestamp: Option<i64>,
    /// First body line when it reads like a date (`12 janvier`, `Monday 3 May`).
    pub title: Option<String>,
    pub text: Vec<String>,
    pub images: Vec<MediaItem>,
    pub dcim: Vec<MediaItem>,
    pub year: Option<i32>,
    /// Once set by [`dating`](crate::dating) this is never cleared.
    pub date: Option<NaiveDate>,
    /// 1-based rank among posts sharing the same date. 0 until ranked.
    pub date_rank: u32,
    /// Synthesized for a date that only exists in the media directory.
    pub extra: bool,
}

impl Post {
    pub fn new(text: Vec<String>) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_images(mut self, images: Vec<MediaItem>) -> Self {
        self.images = images;
        self
    }

    /// A post whose date is known up front (diary date marker, synthesized post).
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.year = Some(date.year());
        self.date = Some(date);
        self
    }

    /// All media of the post in display order: narrative first, then dated media.
    pub fn media(&self) -> impl Iterator<Item = &MediaItem> {
        self.images.iter().chain(self.dcim.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_keeps_dot() {
        assert_eq!(MediaItem::image("photos/IMG_1.JPG").extension(), ".JPG");
        assert_eq!(MediaItem::video("a.b/clip.mp4").extension(), ".mp4");
    }

    #[test]
    fn extension_empty_when_missing() {
        assert_eq!(MediaItem::image("photos.d/README").extension(), "");
        assert_eq!(MediaItem::image(".hidden").extension(), "");
    }

    #[test]
    fn with_date_sets_year() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 12).unwrap();
        let post = Post::new(vec![]).with_date(date);
        assert_eq!(post.year, Some(2020));
        assert_eq!(post.date, Some(date));
    }

    #[test]
    fn media_lists_images_before_dcim() {
        let mut post = Post::new(vec![]).with_images(vec![MediaItem::image("a.jpg")]);
        post.dcim = vec![MediaItem::image("/src/b.jpg")];
        let uris: Vec<&str> = post.media().map(|m| m.uri.as_str()).collect();
        assert_eq!(uris, vec!["a.jpg", "/src/b.jpg"]);
    }
}
