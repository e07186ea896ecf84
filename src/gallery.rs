//! Gallery generation.
//!
//! Builds the HTML pages of a gallery and keeps its thumbnail directory in
//! step with them.
//!
//! ## Modes
//!
//! | Mode | Posts of the main page |
//! |---|---|
//! | `diary` | records of `index.md`, merged with the media directory when one is given |
//! | `bydate` | one post per date of the media directory |
//! | `flat` | a single post holding every media of the directory |
//!
//! With `by_dir`, every subdirectory holding media becomes a link to a page
//! of its own, built with the same mode and shown as a mosaic of its
//! thumbnails.
//!
//! ## Build order
//!
//! The directory tree is scanned first into a [`DirNode`] tree, then built
//! post-order: a subdirectory's page and thumbnails exist before the mosaic
//! that stands for it on the parent page.
//!
//! ```text
//! photos/                 →  index.htm
//! ├── IMG_20200112_*.jpg
//! └── Lisbonne/           →  Lisbonne.htm          (built before index.htm)
//!     ├── IMG_20200115_*.jpg
//!     └── Belem/          →  Lisbonne_Belem.htm    (built before Lisbonne.htm)
//! ```
//!
//! Probing and thumbnailing run on the rayon pool. Once every page is
//! written, thumbnails no page references are purged.

use crate::cache::{
    self, CacheStats, CacheStatus, Role, ThumbnailCache, ThumbnailRequest, ThumbnailSource,
    relative_name,
};
use crate::config::{ConfigError, DiaryConfig, GalleryConfig, GalleryMode};
use crate::dating::{self, DatingError};
use crate::diary::{self, DIARY_FILE, Diary, DiaryError};
use crate::grammar::Locale;
use crate::imaging::{BackendError, ThumbnailBackend, ThumbnailConfig};
use crate::index::{self, DateSelection, IndexError};
use crate::merge;
use crate::naming::{self, NamingError, RenameReport};
use crate::probe::{self, ProbeError};
use crate::render::{RenderOptions, render_page};
use crate::types::{MediaItem, MediaKind, Post, Thumbnail};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Main page of a gallery, in the destination directory.
pub const INDEX_PAGE: &str = "index.htm";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("No media directory given (use --source-dir)")]
    MissingSourceDir,
    #[error(transparent)]
    Diary(#[from] DiaryError),
    #[error(transparent)]
    Dating(#[from] DatingError),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Where a gallery is read from and written to.
///
/// What goes in it comes from the `[source]` section of the config.
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    /// Directory of `index.md` and `config.toml`.
    pub root: PathBuf,
    /// Directory receiving the pages and `.thumbnails/`.
    pub dest: PathBuf,
    /// Year of every diary post, overriding photo capture dates.
    pub year: Option<i32>,
    /// Regenerate every thumbnail.
    pub force_thumbnails: bool,
}

/// Outcome of a gallery build.
#[derive(Debug, Clone)]
pub struct GalleryReport {
    pub title: String,
    /// Every page written, main page last.
    pub pages: Vec<PathBuf>,
    /// Posts of the main page.
    pub posts: usize,
    /// Photos and videos of the main page.
    pub media: usize,
    pub thumbnails: CacheStats,
    /// Stale thumbnail files deleted.
    pub purged: Vec<String>,
}

/// Why a single media was left out.
#[derive(Error, Debug)]
enum ItemError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Thumbnail(#[from] BackendError),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_dir(dir: &Path) -> Result<PathBuf, GalleryError> {
    if !dir.is_dir() {
        return Err(GalleryError::DirectoryNotFound(dir.to_path_buf()));
    }
    Ok(fs::canonicalize(dir)?)
}

/// Photo capture times of the diary images, read from EXIF.
fn fill_capture_times(mut posts: Vec<Post>, root: &Path) -> Vec<Post> {
    posts.par_iter_mut().for_each(|post| {
        for media in &mut post.images {
            if media.kind == MediaKind::Image && media.creation_timestamp.is_none() {
                media.creation_timestamp = probe::exif_timestamp(&root.join(&media.uri));
            }
        }
    });
    posts
}

/// Read the diary of `root` and date its posts.
fn dated_diary(
    root: &Path,
    year: Option<i32>,
    settings: &DiaryConfig,
) -> Result<Diary, GalleryError> {
    let diary = diary::read(&root.join(DIARY_FILE), settings.require_dates)?;
    let posts = fill_capture_times(diary.posts, root);
    let posts = dating::assign(posts, year, settings.locale);
    dating::require_dates(&posts)?;
    dating::check_order(&posts)?;
    Ok(Diary {
        title: diary.title,
        posts,
    })
}

// ============================================================================
// Directory tree
// ============================================================================

/// A directory page to build.
#[derive(Debug)]
struct DirNode {
    dir: PathBuf,
    /// Media files and subdirectories, in display order.
    entries: Vec<Entry>,
}

#[derive(Debug)]
enum Entry {
    Media(PathBuf),
    Dir(DirNode),
}

impl DirNode {
    /// Scan `dir`. Without `by_dir` the node has no subdirectory entries;
    /// `recursive` then pulls the media of subdirectories into it.
    fn scan(dir: &Path, by_dir: bool, recursive: bool) -> io::Result<Self> {
        let entries = if by_dir {
            index::list_entries(dir)?
                .into_iter()
                .map(|path| {
                    if path.is_dir() {
                        DirNode::scan(&path, true, recursive).map(Entry::Dir)
                    } else {
                        Ok(Entry::Media(path))
                    }
                })
                .collect::<io::Result<Vec<_>>>()?
        } else {
            index::list_media(dir, recursive)?
                .into_iter()
                .map(Entry::Media)
                .collect()
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    fn media(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Media(path) => Some(path.clone()),
                Entry::Dir(_) => None,
            })
            .collect()
    }

    fn subdirs(&self) -> Vec<&DirNode> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Dir(node) => Some(node),
                Entry::Media(_) => None,
            })
            .collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Default)]
struct Written {
    pages: Vec<PathBuf>,
    referenced: BTreeSet<String>,
}

struct Builder<'a, B> {
    backend: &'a B,
    config: &'a GalleryConfig,
    options: &'a GalleryOptions,
    cache: ThumbnailCache,
    selection: DateSelection,
    stats: Mutex<CacheStats>,
    written: Mutex<Written>,
}

impl<B: ThumbnailBackend> Builder<'_, B> {
    fn locale(&self) -> Locale {
        self.config.diary.locale
    }

    /// Probe a media file and get its thumbnail.
    fn media_item(
        &self,
        path: &Path,
        kind: MediaKind,
        role: Role,
        base: &Path,
        max: u32,
    ) -> Result<MediaItem, ItemError> {
        let info = match kind {
            MediaKind::Video => probe::probe_video(path, &self.cache.info_path(role, path, base))?,
            MediaKind::Image | MediaKind::Subdir => probe::probe_image(path)?,
        };
        let source = match info.video {
            Some(video) => ThumbnailSource::Video {
                duration: video.duration,
            },
            None => ThumbnailSource::Image,
        };
        let (thumb, status) = self.cache.get_or_create(
            self.backend,
            &ThumbnailRequest {
                role,
                source: path,
                base,
                dims: (info.width, info.height),
                max,
                kind: source,
            },
        )?;
        lock(&self.stats).record(status);

        let mut item = MediaItem::new(kind, path.display().to_string());
        item.description = Some(probe::describe(&dir_name(path), &info));
        item.thumb = Some(thumb);
        item.info = Some(info);
        Ok(item)
    }

    /// Media of the media directory, named relative to `source_dir`.
    fn dcim_item(&self, path: &Path, source_dir: &Path) -> Result<MediaItem, ItemError> {
        let kind = index::media_kind(path).unwrap_or(MediaKind::Image);
        self.media_item(
            path,
            kind,
            Role::Dcim,
            source_dir,
            self.config.thumbnails.dcim_max,
        )
    }

    /// Thumbnails of the images written in the diary. A missing or
    /// unreadable file keeps its link without a thumbnail.
    ///
    /// Each file is probed and thumbnailed once, however many records cite
    /// it, so no two workers write the same thumbnail.
    fn annotate_diary_images(&self, mut posts: Vec<Post>) -> Vec<Post> {
        let root = &self.options.root;
        let max = self.config.thumbnails.post_max;
        let unique: BTreeMap<&str, MediaKind> = posts
            .iter()
            .flat_map(|p| &p.images)
            .map(|m| (m.uri.as_str(), m.kind))
            .collect();
        let items: BTreeMap<String, MediaItem> = unique
            .into_par_iter()
            .filter_map(|(uri, kind)| {
                let path = root.join(uri);
                match self.media_item(&path, kind, Role::Post, root, max) {
                    Ok(item) => Some((uri.to_string(), item)),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "unable to read diary media");
                        None
                    }
                }
            })
            .collect();

        for media in posts.iter_mut().flat_map(|p| p.images.iter_mut()) {
            if let Some(item) = items.get(media.uri.as_str()) {
                media.thumb = item.thumb.clone();
                media.description = item.description.clone();
                media.info = item.info.clone();
            }
        }
        posts
    }

    /// Media of `files` for the dates the page needs, grouped by date.
    fn index_files(
        &self,
        posts: &[Post],
        files: &[PathBuf],
        source_dir: &Path,
    ) -> BTreeMap<NaiveDate, Vec<MediaItem>> {
        let dated = index::date_media(files);
        let required = index::required_dates(self.selection, posts, &dated);
        tracing::debug!(files = dated.len(), dates = required.len(), "indexing media by date");
        index::index_by_date(dated, &required, |file| {
            self.dcim_item(&file.path, source_dir)
        })
    }

    fn diary_posts(&self, source_dir: Option<&Path>) -> Result<Diary, GalleryError> {
        let diary = dated_diary(&self.options.root, self.options.year, &self.config.diary)?;
        let mut posts = self.annotate_diary_images(diary.posts);
        if let Some(source_dir) = source_dir {
            let files = index::list_media(source_dir, self.config.source.recursive)?;
            let by_date = self.index_files(&posts, &files, source_dir);
            posts = merge::merge(posts, by_date, self.locale());
        }
        Ok(Diary {
            title: diary.title,
            posts,
        })
    }

    /// Posts of a directory page. Subdirectory pages are built first.
    fn directory_posts(&self, node: &DirNode, source_dir: &Path) -> Result<Vec<Post>, GalleryError> {
        if self.config.source.mode == GalleryMode::ByDate {
            let subdirs = node
                .subdirs()
                .into_par_iter()
                .map(|child| self.subdir_item(child, source_dir))
                .collect::<Result<Vec<_>, _>>()?;
            let subdirs: Vec<MediaItem> = subdirs.into_iter().flatten().collect();

            let mut posts = Vec::new();
            if !subdirs.is_empty() {
                posts.push(Post {
                    dcim: subdirs,
                    ..Post::default()
                });
            }
            let by_date = self.index_files(&posts, &node.media(), source_dir);
            for (date, media) in by_date {
                let mut post = merge::synthesize_post(date, self.locale());
                post.extra = false;
                post.dcim = media;
                posts.push(post);
            }
            return Ok(posts);
        }

        let items = node
            .entries
            .par_iter()
            .map(|entry| match entry {
                Entry::Media(path) => Ok(self
                    .dcim_item(path, source_dir)
                    .map_err(|e| {
                        tracing::warn!(path = %path.display(), error = %e, "corrupt media, skipped");
                    })
                    .ok()),
                Entry::Dir(child) => self.subdir_item(child, source_dir),
            })
            .collect::<Result<Vec<_>, GalleryError>>()?;
        Ok(vec![Post {
            dcim: items.into_iter().flatten().collect(),
            ..Post::default()
        }])
    }

    /// Build the page of a subdirectory, then the mosaic linking to it.
    ///
    /// `None` when nothing of the subdirectory could be shown.
    fn subdir_item(&self, node: &DirNode, source_dir: &Path) -> Result<Option<MediaItem>, GalleryError> {
        let posts = self.directory_posts(node, source_dir)?;
        let children: Vec<Thumbnail> = posts
            .iter()
            .flat_map(|p| p.dcim.iter())
            .filter_map(|m| m.thumb.clone())
            .collect();
        if children.is_empty() {
            tracing::debug!(dir = %node.dir.display(), "no media shown, subdirectory skipped");
            return Ok(None);
        }

        let name = dir_name(&node.dir);
        let page = format!("{}.htm", relative_name(&node.dir, source_dir));
        self.write_page(&page, &name, &posts, false)?;

        let thumb = self.cache.create_mosaic(
            self.backend,
            &node.dir,
            source_dir,
            self.config.thumbnails.subdir_max,
            &children,
        )?;
        lock(&self.stats).record(CacheStatus::Created);

        let mut item = MediaItem::new(MediaKind::Subdir, page);
        item.thumb = Some(thumb);
        if self.config.thumbnails.subdir_caption {
            item.caption = Some(name);
        }
        Ok(Some(item))
    }

    fn write_page(
        &self,
        file: &str,
        title: &str,
        posts: &[Post],
        diary: bool,
    ) -> Result<PathBuf, GalleryError> {
        let html = render_page(title, posts, &RenderOptions::from_config(self.config, diary));
        let path = self.options.dest.join(file);
        diary::write_atomic(&path, &html.into_string())?;
        tracing::info!(page = %path.display(), posts = posts.len(), "page written");

        let mut written = lock(&self.written);
        written.referenced.extend(
            posts
                .iter()
                .flat_map(|p| p.media())
                .filter_map(|m| m.thumb.as_ref().map(|t| t.name.clone())),
        );
        written.pages.push(path.clone());
        Ok(path)
    }
}

/// Build the gallery described by `config.source`.
///
/// Thumbnails no page references are purged once every page is written.
pub fn build<B: ThumbnailBackend>(
    backend: &B,
    options: &GalleryOptions,
    config: &GalleryConfig,
) -> Result<GalleryReport, GalleryError> {
    let source = &config.source;
    let source_dir = source.source_dir.as_deref().map(resolve_dir).transpose()?;
    if source.mode != GalleryMode::Diary && source_dir.is_none() {
        return Err(GalleryError::MissingSourceDir);
    }

    fs::create_dir_all(&options.dest)?;
    let thumbnail_config = ThumbnailConfig {
        thumb_delay: config.thumbnails.thumb_delay,
        ..ThumbnailConfig::default()
    };
    let builder = Builder {
        backend,
        config,
        options,
        cache: ThumbnailCache::open(&options.dest, options.force_thumbnails, thumbnail_config)?,
        selection: source.date_selection()?,
        stats: Mutex::new(CacheStats::default()),
        written: Mutex::new(Written::default()),
    };

    let (title, posts, diary) = match (source.mode, source_dir.as_deref()) {
        (GalleryMode::Diary, dir) => {
            let diary = builder.diary_posts(dir)?;
            let title = diary.title.unwrap_or_else(|| dir_name(&options.root));
            (title, diary.posts, true)
        }
        (_, Some(dir)) => {
            let tree = DirNode::scan(dir, source.by_dir, source.recursive)?;
            (dir_name(dir), builder.directory_posts(&tree, dir)?, false)
        }
        (_, None) => return Err(GalleryError::MissingSourceDir),
    };
    builder.write_page(INDEX_PAGE, &title, &posts, diary)?;

    let written = builder
        .written
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let purged = cache::purge(builder.cache.dir(), &written.referenced)?;
    if !purged.is_empty() {
        tracing::info!(count = purged.len(), "stale thumbnails removed");
    }

    Ok(GalleryReport {
        title,
        pages: written.pages,
        posts: posts.len(),
        media: posts
            .iter()
            .flat_map(|p| p.media())
            .filter(|m| m.kind != MediaKind::Subdir)
            .count(),
        thumbnails: builder
            .stats
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner),
        purged,
    })
}

// ============================================================================
// Diary maintenance
// ============================================================================

/// Options of [`create_diary`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub source_dir: PathBuf,
    /// Directory receiving `index.md`.
    pub root: PathBuf,
    pub dates: DateSelection,
    pub recursive: bool,
    pub locale: Locale,
}

/// Write a diary skeleton with one dated record per media date.
///
/// Returns the path of the diary and its number of records.
pub fn create_diary(options: &CreateOptions) -> Result<(PathBuf, usize), GalleryError> {
    if options.dates == DateSelection::Diary {
        return Err(IndexError::IncorrectDateFormat(options.dates.to_string()).into());
    }
    let source_dir = resolve_dir(&options.source_dir)?;
    let files = index::list_media(&source_dir, options.recursive)?;
    let dated = index::date_media(&files);
    let required = index::required_dates(options.dates, &[], &dated);

    let posts: Vec<Post> = required
        .into_iter()
        .map(|date| {
            let mut post = merge::synthesize_post(date, options.locale);
            post.extra = false;
            post
        })
        .collect();
    let count = posts.len();
    let diary = Diary {
        title: Some(source_dir.display().to_string()),
        posts,
    };
    let path = options.root.join(DIARY_FILE);
    diary::write(&diary, &path)?;
    Ok((path, count))
}

/// Give the diary images of `root` their sequential names on disk and
/// rewrite the diary with the new names.
pub fn rename_diary_media(
    root: &Path,
    year: Option<i32>,
    settings: &DiaryConfig,
) -> Result<RenameReport, GalleryError> {
    let diary = dated_diary(root, year, settings)?;
    let posts = naming::assign_sequential_names(diary.posts)?;
    let (posts, report) = naming::rename_media(posts, root);
    diary::write(
        &Diary {
            title: diary.title,
            posts,
        },
        &root.join(DIARY_FILE),
    )?;
    Ok(report)
}

/// Parse the diary of `root` and print it to `dest/index.md`.
///
/// With `require_dates`, a record without a date marker is an error.
pub fn idem(root: &Path, dest: &Path, require_dates: bool) -> Result<PathBuf, GalleryError> {
    let diary = diary::read(&root.join(DIARY_FILE), require_dates)?;
    let path = dest.join(DIARY_FILE);
    diary::write(&diary, &path)?;
    Ok(path)
}
