//! Merging dated media into diary posts.
//!
//! Dates that only exist in the media directory get a synthesized post
//! (weekday and date as text, marked `extra`) inserted at its date position.
//! Each date's media then go to the **first** post of that date only, so a day
//! described by several diary entries shows its media once.

use crate::grammar::{self, Locale};
use crate::types::{MediaItem, Post};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Post standing for a date that has media but no diary entry.
pub fn synthesize_post(date: NaiveDate, locale: Locale) -> Post {
    let mut post = Post::new(vec![grammar::weekday_date_text(date, locale)]).with_date(date);
    post.date_rank = 1;
    post.extra = true;
    post
}

/// Insert posts for extra dates and attach each date's media to its rank-1 post.
///
/// `posts` must be dated and sorted by date.
pub fn merge(
    mut posts: Vec<Post>,
    mut by_date: BTreeMap<NaiveDate, Vec<MediaItem>>,
    locale: Locale,
) -> Vec<Post> {
    let known: BTreeSet<NaiveDate> = posts.iter().filter_map(|p| p.date).collect();
    for &date in by_date.keys().filter(|d| !known.contains(d)) {
        let at = posts.partition_point(|p| p.date.is_some_and(|d| d <= date));
        tracing::debug!(%date, "extra date from media directory");
        posts.insert(at, synthesize_post(date, locale));
    }

    for post in &mut posts {
        if post.date_rank != 1 {
            continue;
        }
        if let Some(media) = post.date.and_then(|d| by_date.remove(&d)) {
            post.dcim = media;
        }
    }
    posts
}
