//! Date grammar for post titles and media file names.
//!
//! ## Titles
//!
//! A title carries a day and a month: an optional weekday, a day number
//! (`1`–`31` or the locale's "first of month" token), a space and a full month
//! name, ending on a word boundary. The first match in the line wins:
//!
//! - `"Dimanche 12 janvier, départ"` → day 12, month 1
//! - `"1er mai"` → day 1, month 5
//! - `"Sunday 3 May"` (English vocabulary) → day 3, month 5
//!
//! The year never comes from the title; [`dating`](crate::dating) supplies it.
//!
//! ## File names
//!
//! Camera and phone file names embed an 8-digit `YYYYMMDD` run, optionally
//! followed by a separator and a 6-digit `HHMMSS` run
//! (`IMG_20200112_103000.jpg`, `VID-20200112-WA0003.mp4`). Both runs must be
//! bounded by non-digits and hold plausible values.

use chrono::{Datelike, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Language of the diary: picks the weekday and month vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

/// Weekday and month names of a locale, lowercase as they appear mid-sentence.
#[derive(Debug)]
pub struct Vocabulary {
    /// Monday first.
    pub weekdays: [&'static str; 7],
    pub months: [&'static str; 12],
    /// Ordinal used for the first day of a month (`1er`, `1st`).
    pub first_of_month: &'static str,
}

static FRENCH: Vocabulary = Vocabulary {
    weekdays: [
        "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
    ],
    months: [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ],
    first_of_month: "1er",
};

static ENGLISH: Vocabulary = Vocabulary {
    weekdays: [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ],
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    first_of_month: "1st",
};

fn title_regex(vocabulary: &Vocabulary) -> Regex {
    let pattern = format!(
        r"(?:(?:{}) )?({}|[0-9]{{1,2}}) ({})\b",
        vocabulary.weekdays.join("|"),
        regex::escape(vocabulary.first_of_month),
        vocabulary.months.join("|"),
    );
    Regex::new(&pattern).expect("title pattern is built from static vocabulary")
}

static FRENCH_TITLE: LazyLock<Regex> = LazyLock::new(|| title_regex(&FRENCH));
static ENGLISH_TITLE: LazyLock<Regex> = LazyLock::new(|| title_regex(&ENGLISH));

static FILENAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[^0-9]|^)([0-9]{8})(?:[^0-9]|$)").expect("static pattern"));

static FILENAME_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[^0-9]|^)([0-9]{8})[^0-9]([0-9]{6})(?:[^0-9]|$)").expect("static pattern")
});

/// Earliest year accepted in a file name date.
const MIN_FILENAME_YEAR: i32 = 2000;

impl Locale {
    pub fn vocabulary(self) -> &'static Vocabulary {
        match self {
            Locale::Fr => &FRENCH,
            Locale::En => &ENGLISH,
        }
    }

    fn title_pattern(self) -> &'static Regex {
        match self {
            Locale::Fr => &FRENCH_TITLE,
            Locale::En => &ENGLISH_TITLE,
        }
    }
}

/// Extract `(day, month)` from the first date-like run in `line`.
pub fn day_month(line: &str, locale: Locale) -> Option<(u32, u32)> {
    let caps = locale.title_pattern().captures(line)?;
    let vocabulary = locale.vocabulary();
    let day = if &caps[1] == vocabulary.first_of_month {
        1
    } else {
        caps[1].parse().ok()?
    };
    let month = vocabulary.months.iter().position(|m| *m == &caps[2])? as u32 + 1;
    Some((day, month))
}

/// Whether a line reads like a date-bearing title.
pub fn is_title(line: &str, locale: Locale) -> bool {
    locale.title_pattern().is_match(line)
}

/// Calendar date named by a title, in the given year.
///
/// Returns `None` when the title has no day/month or names a day that does
/// not exist (`31 février`).
pub fn date_from_title(title: &str, year: i32, locale: Locale) -> Option<NaiveDate> {
    let (day, month) = day_month(title, locale)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Date embedded in a media file name.
///
/// Only the first 8-digit run is considered. Its year must fall between 2000
/// and `max_year` (usually the current year).
pub fn date_from_filename(name: &str, max_year: i32) -> Option<NaiveDate> {
    let caps = FILENAME_DATE.captures(name)?;
    let digits = &caps[1];
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    if !(MIN_FILENAME_YEAR..=max_year).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Time of day following the date run in a media file name.
pub fn time_from_filename(name: &str) -> Option<NaiveTime> {
    let caps = FILENAME_TIME.captures(name)?;
    let digits = &caps[2];
    let hour: u32 = digits[0..2].parse().ok()?;
    let minute: u32 = digits[2..4].parse().ok()?;
    let second: u32 = digits[4..6].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Text of a post synthesized for a date: `"Lundi 12 octobre 2020"`.
pub fn weekday_date_text(date: NaiveDate, locale: Locale) -> String {
    let vocabulary = locale.vocabulary();
    let weekday = vocabulary.weekdays[date.weekday().num_days_from_monday() as usize];
    let month = vocabulary.months[date.month0() as usize];
    let text = format!("{} {:02} {} {}", weekday, date.day(), month, date.year());
    capitalize(&text)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
