//! Media probing: date, time, dimensions and size of photos and videos.
//!
//! Dates and times come from the file name when it embeds them
//! (`IMG_20200112_103000.jpg`), otherwise from the modification time in local
//! time. Image dimensions are read from the file header; video dimensions,
//! duration and frame rate come from `ffprobe`.
//!
//! `ffprobe` is slow, so video results are cached in a one-line `.info` file
//! next to the video's thumbnail:
//!
//! ```text
//! 20200112 103000 1920 1080 12.3 42 29.9
//! date     time   w    h    MB   s  fps
//! ```

use crate::grammar;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use std::fs;
use std::io::{self, BufReader};
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unable to read image {path}: {message}")]
    Decode { path: String, message: String },
    #[error("{tool} failed on {path}: {message}")]
    Tool {
        tool: &'static str,
        path: String,
        message: String,
    },
    #[error("Unexpected ffprobe output: {0:?}")]
    Parse(String),
}

/// Duration and frame rate of a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Whole seconds.
    pub duration: u32,
    /// Frames per second, one decimal.
    pub fps: f64,
}

/// What the probe knows about a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub width: u32,
    pub height: u32,
    /// Megabytes (10^6 bytes), one decimal.
    pub size_mb: f64,
    /// Only set for videos.
    pub video: Option<VideoInfo>,
}

const FFPROBE_ARGS: &[&str] = &[
    "-v",
    "error",
    "-select_streams",
    "v:0",
    "-show_entries",
    "stream=width,height,avg_frame_rate,r_frame_rate:format=duration",
    "-of",
    "csv=p=0",
];

/// First stream line gives `w,h,avg_rate,r_rate`, the last line the duration.
static FFPROBE_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\d+),(\d+),(\d+)/(\d+),(\d+/\d+).*\s(\d+\.\d+)").expect("static pattern")
});

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn modified(path: &Path) -> io::Result<NaiveDateTime> {
    let mtime = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(mtime).naive_local())
}

/// Date and time of a media file: file name first, modification time second.
pub fn date_time(path: &Path) -> io::Result<(NaiveDate, NaiveTime)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let max_year = Local::now().year();
    let from_name = (
        grammar::date_from_filename(&name, max_year),
        grammar::time_from_filename(&name),
    );
    match from_name {
        (Some(date), Some(time)) => Ok((date, time)),
        (date, time) => {
            let mtime = modified(path)?;
            Ok((
                date.unwrap_or(mtime.date()),
                time.unwrap_or_else(|| mtime.time().with_nanosecond(0).unwrap_or(mtime.time())),
            ))
        }
    }
}

fn size_mb(path: &Path) -> io::Result<f64> {
    Ok(round1(fs::metadata(path)?.len() as f64 / 1e6))
}

/// Probe a still image.
pub fn probe_image(path: &Path) -> Result<MediaInfo, ProbeError> {
    let (width, height) = image::image_dimensions(path).map_err(|e| ProbeError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let (date, time) = date_time(path)?;
    Ok(MediaInfo {
        date,
        time,
        width,
        height,
        size_mb: size_mb(path)?,
        video: None,
    })
}

/// Parse `ffprobe` csv output into `(width, height, fps, duration)`.
pub fn parse_ffprobe_output(output: &str) -> Result<(u32, u32, f64, u32), ProbeError> {
    let parse_error = || ProbeError::Parse(output.to_string());
    let caps = FFPROBE_OUTPUT.captures(output).ok_or_else(parse_error)?;
    let width: u32 = caps[1].parse().map_err(|_| parse_error())?;
    let height: u32 = caps[2].parse().map_err(|_| parse_error())?;
    let num: f64 = caps[3].parse().map_err(|_| parse_error())?;
    let den: f64 = caps[4].parse().map_err(|_| parse_error())?;
    let duration: f64 = caps[6].parse().map_err(|_| parse_error())?;
    let fps = if den > 0.0 { round1(num / den) } else { 0.0 };
    Ok((width, height, fps, duration.round() as u32))
}

fn run_ffprobe(path: &Path) -> Result<String, ProbeError> {
    let output = Command::new("ffprobe")
        .args(FFPROBE_ARGS)
        .arg(path)
        .output()?;
    if !output.status.success() {
        return Err(ProbeError::Tool {
            tool: "ffprobe",
            path: path.display().to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// One-line `.info` representation of a video probe.
pub fn format_info_line(info: &MediaInfo) -> String {
    let video = info.video.unwrap_or(VideoInfo {
        duration: 0,
        fps: 0.0,
    });
    format!(
        "{} {} {} {} {:.1} {} {:.1}",
        info.date.format("%Y%m%d"),
        info.time.format("%H%M%S"),
        info.width,
        info.height,
        info.size_mb,
        video.duration,
        video.fps,
    )
}

/// Parse a `.info` line. `None` when any field is missing or malformed.
pub fn parse_info_line(line: &str) -> Option<MediaInfo> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [date, time, width, height, size, duration, fps] = fields[..] else {
        return None;
    };
    Some(MediaInfo {
        date: NaiveDate::parse_from_str(date, "%Y%m%d").ok()?,
        time: NaiveTime::parse_from_str(time, "%H%M%S").ok()?,
        width: width.parse().ok()?,
        height: height.parse().ok()?,
        size_mb: size.parse().ok()?,
        video: Some(VideoInfo {
            duration: duration.parse().ok()?,
            fps: fps.parse().ok()?,
        }),
    })
}

/// Probe a video, reusing `info_path` when it holds a previous result.
///
/// A fresh probe is written back to `info_path`.
pub fn probe_video(path: &Path, info_path: &Path) -> Result<MediaInfo, ProbeError> {
    if let Ok(cached) = fs::read_to_string(info_path)
        && let Some(info) = cached.lines().next().and_then(parse_info_line)
    {
        tracing::trace!(path = %path.display(), "video info from cache");
        return Ok(info);
    }

    let (date, time) = date_time(path)?;
    let (width, height, fps, duration) = parse_ffprobe_output(&run_ffprobe(path)?)?;
    let info = MediaInfo {
        date,
        time,
        width,
        height,
        size_mb: size_mb(path)?,
        video: Some(VideoInfo { duration, fps }),
    };
    if let Some(parent) = info_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(info_path, format_info_line(&info) + "\n")?;
    Ok(info)
}

/// `m:s=MM:SS`, or `h:m:s=HH:MM:SS` past 59 minutes.
pub fn format_duration(seconds: u32) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    if minutes <= 59 {
        format!("m:s={minutes:02}:{secs:02}")
    } else {
        format!("h:m:s={:02}:{:02}:{secs:02}", minutes / 60, minutes % 60)
    }
}

/// Human readable summary shown as the media tooltip.
pub fn describe(name: &str, info: &MediaInfo) -> String {
    let stamp = format!(
        "{} {}, dim={}x{}",
        info.date.format("%Y%m%d"),
        info.time.format("%H%M%S"),
        info.width,
        info.height
    );
    match info.video {
        Some(video) => format!(
            "{name}: {stamp}, {}, fps={:.1}, {:.1} MB",
            format_duration(video.duration),
            video.fps,
            info.size_mb
        ),
        None => format!("{name}: {stamp}, {:.1} MB", info.size_mb),
    }
}

/// Capture time of a photo (EXIF `DateTimeOriginal`) as a UTC timestamp.
///
/// `None` when the file has no readable EXIF block or no such tag.
pub fn exif_timestamp(path: &Path) -> Option<i64> {
    let file = fs::File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    let field = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)?;
    let exif::Value::Ascii(ref values) = field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(values.first()?).ok()?;
    let date = NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?;
    let time = NaiveTime::from_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())?;
    Some(date.and_time(time).and_utc().timestamp())
}
