//! End-to-end tests through the public library API.
//!
//! Thumbnails are produced by a backend that only creates empty output
//! files, so these tests need neither ffmpeg nor real pixel work. Source
//! photos are real JPEGs since probing reads their dimensions.

use chrono::NaiveDate;
use diary_gal::cache::THUMBNAIL_DIR;
use diary_gal::config::{self, DiaryConfig, GalleryConfig, GalleryMode, SourceConfig};
use diary_gal::dating;
use diary_gal::error::Error;
use diary_gal::diary::{self, DIARY_FILE};
use diary_gal::gallery::{self, GalleryOptions, INDEX_PAGE};
use diary_gal::grammar::Locale;
use diary_gal::imaging::{
    BackendError, ImageThumbnailParams, MosaicParams, ThumbnailBackend, VideoThumbnailParams,
};
use diary_gal::merge;
use diary_gal::naming;
use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DIARY: &str = "\
# Lisbonne

###### Dimanche 12 janvier

Arrivée.

![](IMG_0001.jpg)
Le Tage
______
###### 15 janvier

Belem.
______
";

struct TouchBackend;

fn touch(path: &Path) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, b"")?;
    Ok(())
}

impl ThumbnailBackend for TouchBackend {
    fn image_thumbnail(&self, params: &ImageThumbnailParams) -> Result<(), BackendError> {
        touch(&params.output)
    }

    fn video_thumbnail(&self, params: &VideoThumbnailParams) -> Result<(), BackendError> {
        touch(&params.output)
    }

    fn mosaic(&self, params: &MosaicParams) -> Result<(), BackendError> {
        touch(&params.output)
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, Rgb([90, 120, 200]))
        .save(path)
        .unwrap();
}

/// Insert an EXIF block with `DateTimeOriginal = datetime` right after the
/// SOI marker of a JPEG file.
fn add_capture_time(path: &Path, datetime: &str) {
    let mut value = datetime.as_bytes().to_vec();
    value.push(0);

    let mut tiff: Vec<u8> = b"II\x2a\x00".to_vec();
    // IFD0 at 8 points to the EXIF IFD at 26, whose entry points to 44
    tiff.extend(8u32.to_le_bytes());
    tiff.extend(1u16.to_le_bytes());
    tiff.extend(0x8769u16.to_le_bytes());
    tiff.extend(4u16.to_le_bytes());
    tiff.extend(1u32.to_le_bytes());
    tiff.extend(26u32.to_le_bytes());
    tiff.extend(0u32.to_le_bytes());
    tiff.extend(1u16.to_le_bytes());
    tiff.extend(0x9003u16.to_le_bytes());
    tiff.extend(2u16.to_le_bytes());
    tiff.extend((value.len() as u32).to_le_bytes());
    tiff.extend(44u32.to_le_bytes());
    tiff.extend(0u32.to_le_bytes());
    tiff.extend(value);

    let jpeg = fs::read(path).unwrap();
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend([0xFF, 0xE1]);
    bytes.extend(((2 + 6 + tiff.len()) as u16).to_be_bytes());
    bytes.extend(b"Exif\0\0");
    bytes.extend(tiff);
    bytes.extend(&jpeg[2..]);
    fs::write(path, bytes).unwrap();
}

fn diary_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(DIARY_FILE), DIARY).unwrap();
    write_jpeg(&tmp.path().join("IMG_0001.jpg"), 40, 30);
    tmp
}

fn options(root: &Path) -> GalleryOptions {
    GalleryOptions {
        root: root.to_path_buf(),
        dest: root.to_path_buf(),
        year: Some(2020),
        force_thumbnails: false,
    }
}

// =========================================================================
// Diary pipeline
// =========================================================================

#[test]
fn titles_and_explicit_year_date_the_posts() {
    let parsed = diary::parse(DIARY, false).unwrap();
    let posts = dating::assign(parsed.posts, Some(2020), Locale::Fr);

    let dates: Vec<_> = posts.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![Some(ymd(2020, 1, 12)), Some(ymd(2020, 1, 15))]);
    assert!(dating::check_order(&posts).is_ok());
    assert!(dating::require_dates(&posts).is_ok());
}

#[test]
fn merge_then_sequential_names() {
    let posts = diary::parse(DIARY, false).unwrap().posts;
    let posts = dating::assign(posts, Some(2020), Locale::Fr);

    let mut by_date = BTreeMap::new();
    by_date.insert(ymd(2020, 1, 13), Vec::new());
    let posts = merge::merge(posts, by_date, Locale::Fr);
    assert_eq!(posts.len(), 3);
    assert!(posts[1].extra);
    assert_eq!(posts[1].date, Some(ymd(2020, 1, 13)));

    let posts = naming::assign_sequential_names(posts).unwrap();
    assert_eq!(posts[0].images[0].sequential_name.as_deref(), Some("2020-01-12-1.jpg"));
}

#[test]
fn printed_diary_parses_back_to_the_same_posts() {
    let parsed = diary::parse(DIARY, false).unwrap();
    let printed = diary::print(&parsed);
    assert_eq!(diary::parse(&printed, false).unwrap(), parsed);
}

#[test]
fn stock_config_matches_defaults() {
    let stock: GalleryConfig = toml::from_str(config::stock_config_toml()).unwrap();
    assert_eq!(stock, GalleryConfig::default());
}

// =========================================================================
// Gallery builds
// =========================================================================

#[test]
fn diary_gallery_end_to_end() {
    let root = diary_root();
    let report = gallery::build(&TouchBackend, &options(root.path()), &GalleryConfig::default())
        .unwrap();

    assert_eq!(report.title, "Lisbonne");
    assert_eq!(report.posts, 2);
    assert_eq!(report.pages, vec![root.path().join(INDEX_PAGE)]);

    let html = fs::read_to_string(root.path().join(INDEX_PAGE)).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Dimanche 12 janvier"));
    assert!(html.contains("gallery-blog-20200112-1"));
    assert!(root
        .path()
        .join(THUMBNAIL_DIR)
        .join("post-IMG_0001.jpg.jpg")
        .is_file());
}

#[test]
fn year_comes_from_photo_capture_time() {
    let root = diary_root();
    add_capture_time(&root.path().join("IMG_0001.jpg"), "2020:01:12 10:30:00");
    let mut opts = options(root.path());
    opts.year = None;

    let report = gallery::build(&TouchBackend, &opts, &GalleryConfig::default()).unwrap();
    assert_eq!(report.posts, 2);

    // The printed diary carries the resolved dates as markers
    gallery::rename_diary_media(root.path(), None, &DiaryConfig::default()).unwrap();
    let dated = diary::read(&root.path().join(DIARY_FILE), true).unwrap();
    let dates: Vec<_> = dated.posts.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![Some(ymd(2020, 1, 12)), Some(ymd(2020, 1, 15))]);
}

#[test]
fn strict_diary_without_markers_exits_with_code_3() {
    let root = diary_root();
    let mut config = GalleryConfig::default();
    config.diary.require_dates = true;

    let err = gallery::build(&TouchBackend, &options(root.path()), &config).unwrap_err();
    assert_eq!(Error::from(err).exit_code(), 3);
}

#[test]
fn flat_gallery_of_a_media_directory() {
    let dest = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    write_jpeg(&photos.path().join("IMG_20200112_090000.jpg"), 40, 30);
    write_jpeg(&photos.path().join("IMG_20200114_090000.jpg"), 30, 40);

    let config = GalleryConfig {
        source: SourceConfig {
            source_dir: Some(photos.path().to_path_buf()),
            mode: GalleryMode::Flat,
            ..SourceConfig::default()
        },
        ..GalleryConfig::default()
    };
    let report = gallery::build(&TouchBackend, &options(dest.path()), &config).unwrap();

    assert_eq!(report.posts, 1);
    assert_eq!(report.media, 2);
    assert_eq!(report.thumbnails.misses, 2);
    assert!(dest.path().join(INDEX_PAGE).is_file());
}

#[test]
fn rename_gives_sequential_names_on_disk() {
    let root = diary_root();
    let report =
        gallery::rename_diary_media(root.path(), Some(2020), &DiaryConfig::default()).unwrap();

    assert_eq!(report.renamed, 1);
    assert!(report.failed.is_empty());
    assert!(root.path().join("2020-01-12-1.jpg").is_file());
    assert!(!root.path().join("IMG_0001.jpg").exists());

    let rewritten = fs::read_to_string(root.path().join(DIARY_FILE)).unwrap();
    assert!(rewritten.contains("![](2020-01-12-1.jpg)"));
}

#[test]
fn idem_round_trip_through_files() {
    let root = diary_root();
    let dest = TempDir::new().unwrap();
    let path = gallery::idem(root.path(), dest.path(), false).unwrap();

    let original = diary::read(&root.path().join(DIARY_FILE), false).unwrap();
    let printed = diary::read(&path, false).unwrap();
    assert_eq!(printed, original);
}
