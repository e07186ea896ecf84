//! Thumbnail cache.
//!
//! Thumbnails live in `<dest>/.thumbnails/`. The file name of a thumbnail is
//! a pure function of its source path and its role, and the presence of the
//! file **is** the cache: there is no separate index.
//!
//! ## Names
//!
//! ```text
//! {role}-{source path relative to base, separators and '#' replaced by '_'}.jpg
//!
//! post-2020-01-12-1.jpg.jpg          diary image 2020-01-12-1.jpg
//! dcim-Lisbonne_IMG_4411.JPG.jpg     media directory file Lisbonne/IMG_4411.JPG
//! subdir-Lisbonne.jpg                mosaic of the Lisbonne subdirectory
//! ```
//!
//! The role keeps apart two thumbnails of the same file used in two places (a
//! diary image shown again in the date-matched media of its day).
//!
//! ## Staleness
//!
//! A thumbnail is reused whenever its file exists, without checking the
//! source content. Editing a photo in place keeps the old thumbnail until the
//! run is forced (`--force-thumb`) or the thumbnail is deleted. Mosaics are
//! the exception: they depend on the directory content and are always
//! rebuilt.
//!
//! ## Purge
//!
//! [`purge`] deletes every file of the directory that the final pages do not
//! reference. It must run after every thumbnail of the run has been written.

use crate::imaging::{
    BackendError, ThumbnailBackend, ThumbnailConfig, create_image_thumbnail, create_mosaic,
    create_video_thumbnail, size_thumbnail, subdir_canvas,
};
use crate::index::NOMEDIA;
use crate::types::Thumbnail;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the thumbnail directory inside the destination directory.
pub const THUMBNAIL_DIR: &str = ".thumbnails";

/// Context a thumbnail is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Image written in the diary.
    Post,
    /// Media attached by date or listed from a directory.
    Dcim,
    /// Mosaic standing for a subdirectory.
    Subdir,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Post => "post",
            Role::Dcim => "dcim",
            Role::Subdir => "subdir",
        }
    }
}

/// `source` relative to `base`, flattened into a single file name.
pub fn relative_name(source: &Path, base: &Path) -> String {
    let relative = source.strip_prefix(base).unwrap_or(source);
    relative
        .to_string_lossy()
        .trim_start_matches(['/', '\\'])
        .replace(['\\', '/', '#'], "_")
}

/// File name of the thumbnail of `source` for `role`.
pub fn thumbnail_name(role: Role, source: &Path, base: &Path) -> String {
    format!("{}-{}.jpg", role.as_str(), relative_name(source, base))
}

/// Companion metadata file of a thumbnail (`x.jpg` → `x.info`).
pub fn info_name(thumbnail: &str) -> String {
    let stem = thumbnail.strip_suffix(".jpg").unwrap_or(thumbnail);
    format!("{stem}.info")
}

/// What a thumbnail is made from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThumbnailSource {
    Image,
    Video { duration: u32 },
}

/// A thumbnail lookup: source file, role, and size limit.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailRequest<'a> {
    pub role: Role,
    pub source: &'a Path,
    /// Directory the thumbnail name is made relative to.
    pub base: &'a Path,
    /// Source dimensions.
    pub dims: (u32, u32),
    /// Longer side of the thumbnail.
    pub max: u32,
    pub kind: ThumbnailSource,
}

/// Whether a lookup reused a file or produced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Cached,
    Created,
}

/// The thumbnail directory of one gallery.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
    force: bool,
    config: ThumbnailConfig,
}

impl ThumbnailCache {
    /// Open (and create if needed) `<dest>/.thumbnails`.
    ///
    /// A `.nomedia` marker is dropped in the directory so that media
    /// discovery never picks thumbnails up. With `force`, every
    /// [`get_or_create`](Self::get_or_create) regenerates its file.
    pub fn open(dest: &Path, force: bool, config: ThumbnailConfig) -> io::Result<Self> {
        let dir = dest.join(THUMBNAIL_DIR);
        fs::create_dir_all(&dir)?;
        let marker = dir.join(NOMEDIA);
        if !marker.exists() {
            fs::write(&marker, b"")?;
        }
        Ok(Self { dir, force, config })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a thumbnail file in the cache.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Path of the `.info` companion of a video's thumbnail.
    pub fn info_path(&self, role: Role, source: &Path, base: &Path) -> PathBuf {
        self.dir.join(info_name(&thumbnail_name(role, source, base)))
    }

    /// Return the thumbnail for a request, creating it when absent.
    ///
    /// The returned handle only depends on the request, so a cache hit and a
    /// fresh creation give the same handle.
    pub fn get_or_create<B: ThumbnailBackend>(
        &self,
        backend: &B,
        request: &ThumbnailRequest<'_>,
    ) -> Result<(Thumbnail, CacheStatus), BackendError> {
        let name = thumbnail_name(request.role, request.source, request.base);
        let output = self.path(&name);
        let (width, height) = size_thumbnail(request.dims.0, request.dims.1, request.max);
        let thumbnail = Thumbnail {
            name,
            width,
            height,
        };

        if !self.force && output.exists() {
            tracing::trace!(thumbnail = %thumbnail.name, "cached");
            return Ok((thumbnail, CacheStatus::Cached));
        }

        tracing::debug!(thumbnail = %thumbnail.name, "making thumbnail");
        match request.kind {
            ThumbnailSource::Image => create_image_thumbnail(
                backend,
                request.source,
                &output,
                request.dims,
                request.max,
                &self.config,
            )?,
            ThumbnailSource::Video { duration } => create_video_thumbnail(
                backend,
                request.source,
                &output,
                request.dims,
                request.max,
                duration,
                &self.config,
            )?,
        };
        Ok((thumbnail, CacheStatus::Created))
    }

    /// Build the mosaic thumbnail of a subdirectory from the thumbnails of
    /// its items, in display order. Always regenerated.
    pub fn create_mosaic<B: ThumbnailBackend>(
        &self,
        backend: &B,
        source_dir: &Path,
        base: &Path,
        max: u32,
        children: &[Thumbnail],
    ) -> Result<Thumbnail, BackendError> {
        let name = thumbnail_name(Role::Subdir, source_dir, base);
        let tiles: Vec<PathBuf> = children.iter().map(|t| self.path(&t.name)).collect();
        tracing::debug!(thumbnail = %name, tiles = tiles.len(), "making mosaic");
        let (width, height) = create_mosaic(
            backend,
            &self.path(&name),
            subdir_canvas(max),
            &tiles,
            &self.config,
        )?;
        Ok(Thumbnail {
            name,
            width,
            height,
        })
    }
}

/// Delete every file of `thumb_dir` that is not referenced.
///
/// The `.nomedia` marker and the `.info` companions of referenced thumbnails
/// are kept. Returns the names of the deleted files, sorted.
pub fn purge(thumb_dir: &Path, referenced: &BTreeSet<String>) -> io::Result<Vec<String>> {
    let keep_info: BTreeSet<String> = referenced.iter().map(|n| info_name(n)).collect();
    let mut removed = Vec::new();
    let entries = match fs::read_dir(thumb_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == NOMEDIA || referenced.contains(&name) || keep_info.contains(&name) {
            continue;
        }
        tracing::debug!(file = %name, "removing stale thumbnail");
        fs::remove_file(entry.path())?;
        removed.push(name);
    }
    removed.sort();
    Ok(removed)
}

/// Summary of thumbnail cache use for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: CacheStatus) {
        match status {
            CacheStatus::Cached => self.hits += 1,
            CacheStatus::Created => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} created ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} created", self.misses)
        }
    }
}
