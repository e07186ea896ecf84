//! Shared test utilities for the diary-gal test suite.
//!
//! Provides small real images, a media directory laid out by date, and
//! lookup helpers over posts.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! setup_media_dir(tmp.path());
//! let files = list_media(tmp.path(), true).unwrap();
//! ```

use crate::types::Post;
use chrono::NaiveDate;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

// =========================================================================
// Images
// =========================================================================

/// Write a small gradient JPEG, creating parent directories.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let writer = BufWriter::new(fs::File::create(path).unwrap());
    img.write_with_encoder(JpegEncoder::new_with_quality(writer, 80))
        .unwrap();
}

/// JPEG APP1 segment holding a single EXIF `DateTimeOriginal` field.
///
/// `datetime` is in EXIF form, `"2020:01:12 10:30:00"`.
pub fn exif_segment(datetime: &str) -> Vec<u8> {
    let mut value = datetime.as_bytes().to_vec();
    value.push(0);
    let count = value.len() as u32;

    // Little-endian TIFF: IFD0 at 8 points to the EXIF IFD at 26, whose
    // only entry points to the ASCII value at 44.
    let mut tiff: Vec<u8> = b"II\x2a\x00".to_vec();
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
    tiff.extend(count.to_le_bytes());
    tiff.extend(44u32.to_le_bytes());
    tiff.extend(0u32.to_le_bytes());
    tiff.extend(value);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend(((2 + 6 + tiff.len()) as u16).to_be_bytes());
    segment.extend(b"Exif\0\0");
    segment.extend(tiff);
    segment
}

/// Write a small JPEG carrying an EXIF capture time.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, datetime: &str) {
    write_jpeg(path, width, height);
    let jpeg = fs::read(path).unwrap();
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend(exif_segment(datetime));
    bytes.extend(&jpeg[2..]);
    fs::write(path, bytes).unwrap();
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Build a media directory:
///
/// ```text
/// IMG_20200112_103000.jpg     2020-01-12 10:30
/// IMG_20200112_090000.jpg     2020-01-12 09:00
/// IMG_20200114_120000.jpg     2020-01-14
/// notes.txt                   ignored
/// Lisbonne/IMG_20200115_080000.jpg
/// Lisbonne/Belem/IMG_20200116_080000.jpg
/// hidden/.nomedia
/// hidden/IMG_20200117_080000.jpg
/// ```
pub fn setup_media_dir(dir: &Path) {
    write_jpeg(&dir.join("IMG_20200112_103000.jpg"), 40, 30);
    write_jpeg(&dir.join("IMG_20200112_090000.jpg"), 30, 40);
    write_jpeg(&dir.join("IMG_20200114_120000.jpg"), 40, 30);
    fs::write(dir.join("notes.txt"), "not media").unwrap();
    write_jpeg(&dir.join("Lisbonne/IMG_20200115_080000.jpg"), 40, 30);
    write_jpeg(&dir.join("Lisbonne/Belem/IMG_20200116_080000.jpg"), 40, 30);
    write_jpeg(&dir.join("hidden/IMG_20200117_080000.jpg"), 40, 30);
    fs::write(dir.join("hidden/.nomedia"), "").unwrap();
}

// =========================================================================
// Lookups
// =========================================================================

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn post_dates(posts: &[Post]) -> Vec<Option<NaiveDate>> {
    posts.iter().map(|p| p.date).collect()
}

/// File names (not paths) of the dated media of a post.
pub fn dcim_names(post: &Post) -> Vec<String> {
    post.dcim
        .iter()
        .map(|m| {
            Path::new(&m.uri)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}
