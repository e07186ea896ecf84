//! Post date assignment.
//!
//! Every post ends up with a calendar date even when most of them carry no
//! explicit one. Post order is trusted; gaps are always filled by copying the
//! nearest preceding resolved value, never interpolated.
//!
//! Two passes run one after the other, each in two phases:
//!
//! 1. **Years** ([`assign_years`]): a post takes the year of its date marker,
//!    else the year of its first photo with a capture timestamp. An explicit
//!    year overrides everything.
//! 2. **Dates** ([`assign_dates`]): a post keeps its date marker, else takes
//!    the day and month of its title in its resolved year.
//!
//! Each pass then backfills ([`backfill`]): if the first post is still
//! unresolved it takes the first resolved value found further on, and a forward
//! sweep copies the last resolved value into every unresolved post.
//!
//! Each pass takes the sequence by value and returns the updated sequence, so
//! every step can be tested in isolation.

use crate::grammar::{self, Locale};
use crate::types::Post;
use chrono::{DateTime, Datelike, NaiveDate};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatingError {
    #[error("Posts are not ordered: post {index} ({next}) comes after a post dated {previous}")]
    OrderingViolation {
        index: usize,
        previous: NaiveDate,
        next: NaiveDate,
    },
    #[error("No date in post {index}: no marker, dated title or dated photo anywhere in the diary")]
    Undated { index: usize },
}

/// Fill unresolved slots from their neighbours.
///
/// The first slot may borrow from the first resolved slot after it; every
/// other slot only ever copies from before it.
pub fn backfill<T: Copy>(values: &mut [Option<T>]) {
    let Some(first) = values.first() else {
        return;
    };
    if first.is_none() {
        values[0] = values.iter().skip(1).find_map(|v| *v);
    }
    let mut current = values[0];
    for value in values.iter_mut().skip(1) {
        match value {
            Some(v) => current = Some(*v),
            None => *value = current,
        }
    }
}

/// Year of the first image in the post that carries a capture timestamp.
fn year_from_images(post: &Post) -> Option<i32> {
    post.images
        .iter()
        .find_map(|image| image.creation_timestamp)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.year())
}

/// Pass A: give every post a year.
///
/// With an `explicit_year`, every post gets it and nothing else is looked at.
pub fn assign_years(mut posts: Vec<Post>, explicit_year: Option<i32>) -> Vec<Post> {
    if let Some(year) = explicit_year {
        for post in &mut posts {
            post.year = Some(year);
        }
        return posts;
    }

    let mut years: Vec<Option<i32>> = posts
        .iter()
        .map(|post| post.date.map(|d| d.year()).or_else(|| year_from_images(post)))
        .collect();
    backfill(&mut years);

    for (post, year) in posts.iter_mut().zip(years) {
        post.year = year;
    }
    posts
}

/// Pass B: give every post a date.
///
/// Must run after [`assign_years`]. Leaves every date unset when nothing in
/// the sequence names a day.
pub fn assign_dates(mut posts: Vec<Post>, locale: Locale) -> Vec<Post> {
    let mut dates: Vec<Option<NaiveDate>> = posts
        .iter()
        .map(|post| {
            post.date.or_else(|| {
                let title = post.title.as_deref().filter(|t| !t.is_empty())?;
                grammar::date_from_title(title, post.year?, locale)
            })
        })
        .collect();
    backfill(&mut dates);

    for (post, date) in posts.iter_mut().zip(dates) {
        if let Some(date) = date {
            tracing::trace!(%date, title = ?post.title, "post dated");
        }
        post.date = date;
    }
    posts
}

/// Number posts 1, 2, 3… within each date, in sequence order.
///
/// Undated posts keep rank 0.
pub fn assign_ranks(mut posts: Vec<Post>) -> Vec<Post> {
    let mut previous: Option<NaiveDate> = None;
    let mut rank = 0;
    for post in &mut posts {
        match post.date {
            Some(date) => {
                rank = if previous == Some(date) { rank + 1 } else { 1 };
                previous = Some(date);
                post.date_rank = rank;
            }
            None => post.date_rank = 0,
        }
    }
    posts
}

/// Run both passes and rank the result.
pub fn assign(posts: Vec<Post>, explicit_year: Option<i32>, locale: Locale) -> Vec<Post> {
    if posts.is_empty() {
        return posts;
    }
    let posts = assign_years(posts, explicit_year);
    let posts = assign_dates(posts, locale);
    assign_ranks(posts)
}

/// Fail on the first date that goes backwards.
///
/// Used wherever the source guarantees chronological order; the sequence is
/// never reordered to hide the problem.
pub fn check_order(posts: &[Post]) -> Result<(), DatingError> {
    let mut previous: Option<NaiveDate> = None;
    for (index, post) in posts.iter().enumerate() {
        if let Some(date) = post.date {
            if let Some(prev) = previous
                && date < prev
            {
                return Err(DatingError::OrderingViolation {
                    index,
                    previous: prev,
                    next: date,
                });
            }
            previous = Some(date);
        }
    }
    Ok(())
}

/// Fail if any post is still undated.
pub fn require_dates(posts: &[Post]) -> Result<(), DatingError> {
    match posts.iter().position(|p| p.date.is_none()) {
        Some(index) => Err(DatingError::Undated { index }),
        None => Ok(()),
    }
}
