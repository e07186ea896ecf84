//! High-level thumbnail operations.
//!
//! These functions combine calculations with backend execution: they take
//! source dimensions and a size limit, compute parameters, and call the
//! backend.

use super::backend::{BackendError, ThumbnailBackend};
use super::calculations::{mosaic_geometry, size_thumbnail, video_frame_offset};
use super::params::{
    ImageThumbnailParams, MosaicParams, MosaicTile, Quality, VideoThumbnailParams,
};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Light grey behind mosaic cells.
pub const MOSAIC_BACKGROUND: [u8; 3] = [0xee, 0xee, 0xee];

/// Settings shared by every thumbnail of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub quality: Quality,
    /// Preferred frame position of video thumbnails, in seconds.
    pub thumb_delay: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            thumb_delay: 5,
        }
    }
}

/// Plan a still image thumbnail without executing it.
pub fn plan_image_thumbnail(
    source: &Path,
    output: &Path,
    dims: (u32, u32),
    max: u32,
    config: &ThumbnailConfig,
) -> ImageThumbnailParams {
    let (width, height) = size_thumbnail(dims.0, dims.1, max);
    ImageThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Plan a video thumbnail without executing it.
pub fn plan_video_thumbnail(
    source: &Path,
    output: &Path,
    dims: (u32, u32),
    max: u32,
    duration: u32,
    config: &ThumbnailConfig,
) -> VideoThumbnailParams {
    let (width, height) = size_thumbnail(dims.0, dims.1, max);
    VideoThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        offset_seconds: video_frame_offset(duration, config.thumb_delay),
        quality: config.quality,
    }
}

/// Plan a mosaic of `tiles` (existing thumbnails, in display order) on a
/// `canvas`. Thumbnails beyond the grid capacity are left out.
pub fn plan_mosaic(
    output: &Path,
    canvas: (u32, u32),
    tiles: &[PathBuf],
    config: &ThumbnailConfig,
) -> MosaicParams {
    let geometry = mosaic_geometry(canvas, tiles.len());
    let tiles = tiles
        .iter()
        .take(geometry.capacity())
        .enumerate()
        .map(|(index, source)| {
            let column = index % geometry.columns as usize;
            let row = index / geometry.columns as usize;
            MosaicTile {
                source: source.clone(),
                x: geometry.offsets_x[column],
                y: geometry.offsets_y[row],
                width: geometry.widths[column],
                height: geometry.heights[row],
            }
        })
        .collect();
    MosaicParams {
        output: output.to_path_buf(),
        width: canvas.0,
        height: canvas.1,
        background: MOSAIC_BACKGROUND,
        tiles,
        quality: config.quality,
    }
}

/// Create a still image thumbnail. Returns its dimensions.
pub fn create_image_thumbnail(
    backend: &impl ThumbnailBackend,
    source: &Path,
    output: &Path,
    dims: (u32, u32),
    max: u32,
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let params = plan_image_thumbnail(source, output, dims, max, config);
    backend.image_thumbnail(&params)?;
    Ok((params.width, params.height))
}

/// Create a video thumbnail. Returns its dimensions.
pub fn create_video_thumbnail(
    backend: &impl ThumbnailBackend,
    source: &Path,
    output: &Path,
    dims: (u32, u32),
    max: u32,
    duration: u32,
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let params = plan_video_thumbnail(source, output, dims, max, duration, config);
    backend.video_thumbnail(&params)?;
    Ok((params.width, params.height))
}

/// Create a mosaic thumbnail. Returns its dimensions.
pub fn create_mosaic(
    backend: &impl ThumbnailBackend,
    output: &Path,
    canvas: (u32, u32),
    tiles: &[PathBuf],
    config: &ThumbnailConfig,
) -> Result<(u32, u32)> {
    let params = plan_mosaic(output, canvas, tiles, config);
    backend.mosaic(&params)?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn tiles(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/t/{i}.jpg"))).collect()
    }

    #[test]
    fn plan_image_scales_longer_side() {
        let params = plan_image_thumbnail(
            Path::new("/a.jpg"),
            Path::new("/t/a.jpg"),
            (4000, 3000),
            300,
            &ThumbnailConfig::default(),
        );
        assert_eq!((params.width, params.height), (300, 225));
        assert_eq!(params.quality, Quality::default());
    }

    #[test]
    fn plan_video_caps_offset() {
        let config = ThumbnailConfig {
            thumb_delay: 5,
            ..ThumbnailConfig::default()
        };
        let short = plan_video_thumbnail(
            Path::new("/v.mp4"),
            Path::new("/t/v.jpg"),
            (1920, 1080),
            300,
            3,
            &config,
        );
        assert_eq!(short.offset_seconds, 2);
        assert_eq!((short.width, short.height), (300, 169));
    }

    #[test]
    fn plan_mosaic_places_tiles_row_by_row() {
        let params = plan_mosaic(
            Path::new("/t/m.jpg"),
            (300, 225),
            &tiles(4),
            &ThumbnailConfig::default(),
        );
        let origins: Vec<(u32, u32)> = params.tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(origins, vec![(1, 1), (151, 1), (1, 113), (151, 113)]);
        assert_eq!(params.background, MOSAIC_BACKGROUND);
    }

    #[test]
    fn plan_mosaic_drops_overflow() {
        let params = plan_mosaic(
            Path::new("/t/m.jpg"),
            (300, 225),
            &tiles(7),
            &ThumbnailConfig::default(),
        );
        assert_eq!(params.tiles.len(), 4);
        let params = plan_mosaic(
            Path::new("/t/m.jpg"),
            (300, 225),
            &tiles(30),
            &ThumbnailConfig::default(),
        );
        assert_eq!(params.tiles.len(), 9);
    }

    #[test]
    fn create_image_thumbnail_calls_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let output = tmp.path().join("post-a.jpg.jpg");
        let dims = create_image_thumbnail(
            &backend,
            Path::new("/a.jpg"),
            &output,
            (1000, 2000),
            400,
            &ThumbnailConfig::default(),
        )
        .unwrap();
        assert_eq!(dims, (200, 400));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Image { width: 200, height: 400, .. }
        ));
    }

    #[test]
    fn create_mosaic_returns_canvas() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let dims = create_mosaic(
            &backend,
            &tmp.path().join("subdir-x.jpg"),
            (300, 225),
            &tiles(2),
            &ThumbnailConfig::default(),
        )
        .unwrap();
        assert_eq!(dims, (300, 225));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Mosaic { tiles, .. } if tiles.len() == 2
        ));
    }
}
