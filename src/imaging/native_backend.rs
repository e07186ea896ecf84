//! Production thumbnail backend.
//!
//! ## Tool mapping
//!
//! | Operation | Crate / tool |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image` crate |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Video frame | `ffmpeg` subprocess (mjpeg, one frame) |
//! | Play icon, mosaic | `image::imageops::overlay` / `replace` |

use super::backend::{BackendError, ThumbnailBackend};
use super::calculations::{center_crop_origin, cover_size};
use super::params::{ImageThumbnailParams, MosaicParams, VideoThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use std::process::Command;

/// Backend built on the `image` crate, with `ffmpeg` for video frames.
///
/// See the [module docs](self) for the operation mapping.
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Size and position of the play icon on video thumbnails.
const ICON_WIDTH: u32 = 24;
const ICON_HEIGHT: u32 = 20;
const ICON_MARGIN: u32 = 6;

/// Check that `ffmpeg` and `ffprobe` can be run.
pub fn check_tools() -> Result<(), BackendError> {
    for tool in ["ffmpeg", "ffprobe"] {
        let ok = Command::new(tool)
            .arg("-version")
            .output()
            .is_ok_and(|out| out.status.success());
        if !ok {
            return Err(BackendError::MissingTool(tool));
        }
    }
    Ok(())
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode and save as JPEG.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

/// Translucent dark badge with a white play triangle.
fn play_icon() -> RgbaImage {
    RgbaImage::from_fn(ICON_WIDTH, ICON_HEIGHT, |x, y| {
        // Triangle pointing right, from (8, 4)-(8, 15) to (17, 10).
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let half_height = 6.0 * (1.0 - (fx - 8.0) / 10.0);
        let inside = (8.0..=18.0).contains(&fx) && (fy - 10.0).abs() <= half_height;
        if inside {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 160])
        }
    })
}

/// Overlay the play icon near the bottom-left corner of a frame.
fn mark_as_video(frame: &mut RgbaImage) {
    let y = frame.height().saturating_sub(ICON_HEIGHT + ICON_MARGIN);
    imageops::overlay(frame, &play_icon(), ICON_MARGIN as i64, y as i64);
}

impl ThumbnailBackend for NativeBackend {
    fn image_thumbnail(&self, params: &ImageThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_jpeg(&resized, &params.output, params.quality.value())
    }

    fn video_thumbnail(&self, params: &VideoThumbnailParams) -> Result<(), BackendError> {
        let output = Command::new("ffmpeg")
            .args(["-y", "-v", "error", "-itsoffset"])
            .arg(format!("-{}", params.offset_seconds))
            .arg("-i")
            .arg(&params.source)
            .args(["-vcodec", "mjpeg", "-vframes", "1", "-an", "-f", "rawvideo", "-s"])
            .arg(format!("{}x{}", params.width, params.height))
            .arg(&params.output)
            .output()
            .map_err(|_| BackendError::MissingTool("ffmpeg"))?;
        if !output.status.success() || !params.output.exists() {
            return Err(BackendError::ProcessingFailed(format!(
                "ffmpeg could not extract a frame from {}: {}",
                params.source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut frame = load_image(&params.output)?.to_rgba8();
        mark_as_video(&mut frame);
        save_jpeg(
            &DynamicImage::ImageRgba8(frame),
            &params.output,
            params.quality.value(),
        )
    }

    fn mosaic(&self, params: &MosaicParams) -> Result<(), BackendError> {
        let mut canvas = RgbImage::from_pixel(params.width, params.height, Rgb(params.background));
        for tile in &params.tiles {
            let img = match load_image(&tile.source) {
                Ok(img) => img,
                Err(e) => {
                    tracing::warn!(tile = %tile.source.display(), error = %e, "mosaic tile skipped");
                    continue;
                }
            };
            let target = (tile.width, tile.height);
            let (w, h) = cover_size((img.width(), img.height()), target);
            let (cx, cy) = center_crop_origin((w, h), target);
            let cell = img
                .resize_exact(w, h, FilterType::Lanczos3)
                .crop_imm(cx, cy, tile.width, tile.height)
                .to_rgb8();
            imageops::replace(&mut canvas, &cell, tile.x as i64, tile.y as i64);
        }
        save_jpeg(
            &DynamicImage::ImageRgb8(canvas),
            &params.output,
            params.quality.value(),
        )
    }
}
