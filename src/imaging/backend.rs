//! Thumbnail backend trait and shared types.
//!
//! The [`ThumbnailBackend`] trait defines the three operations every backend
//! must support: still image thumbnail, video frame thumbnail, and mosaic.
//!
//! The production implementation is
//! [`NativeBackend`](super::native_backend::NativeBackend): the `image` crate
//! for pixels, `ffmpeg` for video frames.

use super::params::{ImageThumbnailParams, MosaicParams, VideoThumbnailParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Missing external tool: {0} (must be on PATH)")]
    MissingTool(&'static str),
}

/// Trait for thumbnail backends.
///
/// Every operation writes its JPEG to the `output` path of its parameters.
pub trait ThumbnailBackend: Sync {
    /// Scale a still image to the requested size.
    fn image_thumbnail(&self, params: &ImageThumbnailParams) -> Result<(), BackendError>;

    /// Extract one frame of a video and overlay the play icon.
    fn video_thumbnail(&self, params: &VideoThumbnailParams) -> Result<(), BackendError>;

    /// Compose existing thumbnails into one image.
    fn mosaic(&self, params: &MosaicParams) -> Result<(), BackendError>;
}
