//! Gallery configuration module.
//!
//! Handles loading, validating, and saving `config.toml` in the gallery root
//! (the directory holding `index.md` and `index.htm`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! # source_dir = "/photos/2020"  # Media directory (no default)
//! mode = "diary"                # diary | bydate | flat
//! by_dir = false                # One page per subdirectory (bydate, flat)
//! recursive = false             # Include media of subdirectories
//! dates = "source"              # diary | source | YYYYMMDD-YYYYMMDD
//!
//! [thumbnails]
//! media_description = true      # Tooltip with date, size, duration
//! subdir_caption = true         # Subdirectory name under its mosaic
//! thumb_delay = 5               # Second of the video used for its thumbnail
//! post_max = 400                # Longer side of diary image thumbnails
//! dcim_max = 300                # Longer side of media directory thumbnails
//! subdir_max = 300              # Width of subdirectory mosaics
//!
//! [photobox]
//! loop = false
//! thumbs = true
//! autoplay = false
//! time = 3000
//! zoomable = true
//! rotatable = true
//! wheel_next_prev = true
//!
//! [diary]
//! locale = "fr"                 # fr | en
//! require_dates = false         # every record needs a [YYYY/MM/DD] marker
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.
//!
//! ## The `[source]` section
//!
//! A `gallery` run writes the `[source]` it used back to the file, so that
//! `gallery --update` can rebuild the page with the same sources.

use crate::diary::write_atomic;
use crate::grammar::Locale;
use crate::index::DateSelection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file in the gallery root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing or incorrect config value: {0} (run `diary-gal gen-config` for the defaults)")]
    Validation(String),
    #[error("Error writing configuration file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error writing configuration file: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// How the posts of a page are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryMode {
    /// Posts of `index.md`, optionally merged with the media directory.
    #[default]
    Diary,
    /// One post per date of the media directory.
    #[serde(rename = "bydate")]
    ByDate,
    /// Every media of the directory in a single post.
    Flat,
}

/// Gallery configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Where media come from and how they are organised.
    pub source: SourceConfig,
    /// Thumbnail sizes and captions.
    pub thumbnails: ThumbnailsConfig,
    /// Options of the photobox viewer.
    pub photobox: PhotoboxConfig,
    /// Diary language.
    pub diary: DiaryConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.date_selection()? == DateSelection::Diary
            && self.source.mode != GalleryMode::Diary
        {
            return Err(ConfigError::Validation(
                "source.dates = \"diary\" needs source.mode = \"diary\"".into(),
            ));
        }
        if self.source.by_dir && self.source.mode == GalleryMode::Diary {
            return Err(ConfigError::Validation(
                "source.by_dir only applies to the bydate and flat modes".into(),
            ));
        }
        let sizes = [
            ("thumbnails.post_max", self.thumbnails.post_max),
            ("thumbnails.dcim_max", self.thumbnails.dcim_max),
            ("thumbnails.subdir_max", self.thumbnails.subdir_max),
        ];
        for (key, value) in sizes {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{key} must be positive")));
            }
        }
        Ok(())
    }
}

/// Media source settings. Mirrors the `gallery` command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Media directory. Required by every mode but `diary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
    pub mode: GalleryMode,
    /// Give every subdirectory its own page.
    pub by_dir: bool,
    /// Include media of subdirectories.
    pub recursive: bool,
    /// `diary`, `source`, or an inclusive range `YYYYMMDD-YYYYMMDD`.
    pub dates: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            mode: GalleryMode::default(),
            by_dir: false,
            recursive: false,
            dates: "source".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn date_selection(&self) -> Result<DateSelection, ConfigError> {
        self.dates
            .parse()
            .map_err(|e| ConfigError::Validation(format!("source.dates: {e}")))
    }
}

/// Thumbnail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Show file name, date, dimensions and size as the thumbnail tooltip.
    pub media_description: bool,
    /// Show the subdirectory name under its mosaic.
    pub subdir_caption: bool,
    /// Second of a video its thumbnail is taken at.
    pub thumb_delay: u32,
    /// Longer side of the thumbnails of diary images.
    pub post_max: u32,
    /// Longer side of the thumbnails of media directory files.
    pub dcim_max: u32,
    /// Width of subdirectory mosaics.
    pub subdir_max: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            media_description: true,
            subdir_caption: true,
            thumb_delay: 5,
            post_max: 400,
            dcim_max: 300,
            subdir_max: 300,
        }
    }
}

/// Options passed to the photobox viewer of each gallery block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoboxConfig {
    /// Navigate from the last image to the first.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Show the gallery thumbnails below the image.
    pub thumbs: bool,
    pub autoplay: bool,
    /// Autoplay interval in milliseconds.
    pub time: u32,
    pub zoomable: bool,
    pub rotatable: bool,
    /// Change image with the horizontal mouse wheel.
    pub wheel_next_prev: bool,
}

impl Default for PhotoboxConfig {
    fn default() -> Self {
        Self {
            looping: false,
            thumbs: true,
            autoplay: false,
            time: 3000,
            zoomable: true,
            rotatable: true,
            wheel_next_prev: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiaryConfig {
    /// Language of titles and of synthesized post text.
    pub locale: Locale,
    /// Every record of `index.md` must start with a `[YYYY/MM/DD]` marker.
    pub require_dates: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel probing and thumbnailing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, saving
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GalleryConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load the `config.toml` of a gallery root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration of a gallery root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(root)?)
}

/// Replace the `[source]` section of the gallery's `config.toml`.
///
/// Other sections are kept as they are; comments are not preserved.
pub fn save_source(root: &Path, source: &SourceConfig) -> Result<(), ConfigError> {
    let mut table = match load_raw_config(root)? {
        Some(toml::Value::Table(table)) => table,
        _ => toml::map::Map::new(),
    };
    table.insert("source".to_string(), toml::Value::try_from(source)?);
    let content = toml::to_string_pretty(&toml::Value::Table(table))?;
    let path = root.join(CONFIG_FILE);
    write_atomic(&path, &content).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Diary Gal Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The file lives in the gallery root, next to index.md and index.htm.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Media source (written back by every `gallery` run, read by --update)
# ---------------------------------------------------------------------------
[source]
# Media directory. Required by the bydate and flat modes.
# source_dir = "/photos/2020"

# diary  : posts of index.md, merged with the media directory if any
# bydate : one post per date found in the media directory
# flat   : all media of the directory in one post
mode = "diary"

# One page per subdirectory, linked from a mosaic (bydate and flat only).
by_dir = false

# Include the media of subdirectories.
recursive = false

# Dates of the media directory to show:
# "diary" (dates of the posts), "source" (all), or "YYYYMMDD-YYYYMMDD".
dates = "source"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Show name, date, dimensions and size as the thumbnail tooltip.
media_description = true

# Show the subdirectory name under its mosaic.
subdir_caption = true

# Second of a video used for its thumbnail.
thumb_delay = 5

# Longer side, in pixels, of diary image thumbnails.
post_max = 400

# Longer side, in pixels, of media directory thumbnails.
dcim_max = 300

# Width, in pixels, of subdirectory mosaics (height is 3/4 of it).
subdir_max = 300

# ---------------------------------------------------------------------------
# Photobox viewer
# ---------------------------------------------------------------------------
[photobox]
# Navigate from the last image to the first.
loop = false

# Show gallery thumbnails below the presented photo.
thumbs = true

# Start the slideshow when the viewer opens.
autoplay = false

# Slideshow interval in milliseconds (below 1000 hides the autoplay button).
time = 3000

# Mouse wheel zoom.
zoomable = true

# Allow rotation of the image.
rotatable = true

# Change image with the horizontal mouse wheel.
wheel_next_prev = true

# ---------------------------------------------------------------------------
# Diary
# ---------------------------------------------------------------------------
[diary]
# Language of post titles ("12 janvier" / "12 January"): "fr" or "en".
locale = "fr"

# Every record must start with a [YYYY/MM/DD] date marker; a record without
# one stops the build instead of taking the date of its title.
require_dates = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel probing and thumbnailing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
