//! Parameter types for thumbnail operations.
//!
//! These structs describe *what* to produce, not *how*. They sit between
//! [`operations`](super::operations), which decides sizes and placements, and
//! the [`backend`](super::backend), which does the pixel and subprocess work,
//! so a mock backend can stand in during tests.

use std::path::PathBuf;

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Scale a still image to exactly `width x height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Grab one video frame at `width x height` and mark it as a video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Position of the frame, in seconds from the start.
    pub offset_seconds: u32,
    pub quality: Quality,
}

/// One cell of a mosaic: the source thumbnail is cover-scaled into the cell
/// and center-cropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicTile {
    pub source: PathBuf,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compose child thumbnails on a plain canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub tiles: Vec<MosaicTile>,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }
}
