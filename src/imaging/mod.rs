//! Thumbnail imaging.
//!
//! | Operation | Crate / tool |
//! |---|---|
//! | **Still thumbnail** | `image` decode + Lanczos3 + JPEG |
//! | **Video thumbnail** | `ffmpeg` frame grab + play icon overlay |
//! | **Subdirectory mosaic** | up to nine child thumbnails on a grey canvas |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and layout math (unit testable)
//! - **Parameters**: Data structures describing thumbnail operations
//! - **Backend**: [`ThumbnailBackend`] trait + [`NativeBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod native_backend;
pub mod operations;
mod params;

pub use backend::{BackendError, ThumbnailBackend};
pub use calculations::{
    MosaicGeometry, center_crop_origin, cover_size, mosaic_geometry, size_thumbnail,
    subdir_canvas, video_frame_offset,
};
pub use native_backend::{NativeBackend, check_tools};
pub use operations::{
    ThumbnailConfig, create_image_thumbnail, create_mosaic, create_video_thumbnail,
};
pub use params::{
    ImageThumbnailParams, MosaicParams, MosaicTile, Quality, VideoThumbnailParams,
};
