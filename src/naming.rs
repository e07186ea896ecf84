//! Sequential media file names.
//!
//! Media attached to posts are named `{YYYY-MM-DD}-{N}{ext}`, where `N`
//! counts from 1 across **all** posts sharing that date, in traversal order:
//!
//! ```text
//! [2020/01/12] post A: IMG_4411.jpg, IMG_4420.jpg  → 2020-01-12-1.jpg, 2020-01-12-2.jpg
//! [2020/01/12] post B: VID_0003.mp4, IMG_4431.jpg  → 2020-01-12-3.mp4, 2020-01-12-4.jpg
//! [2020/01/13] post C: IMG_4502.jpg                → 2020-01-13-1.jpg
//! ```
//!
//! Names are stable across reruns only while the traversal order is unchanged,
//! so computing names ([`assign_sequential_names`]) and renaming files on disk
//! ([`rename_media`]) are separate steps.

use crate::types::Post;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("No date in post {index}: cannot name its media")]
    UndatedPost { index: usize },
}

/// Sequential name of the `counter`-th media of `date`.
pub fn sequential_name(date: NaiveDate, counter: u32, extension: &str) -> String {
    format!("{}-{}{}", date.format("%Y-%m-%d"), counter, extension)
}

/// Set `sequential_name` on every image of every post.
///
/// Requires every post to be dated.
pub fn assign_sequential_names(mut posts: Vec<Post>) -> Result<Vec<Post>, NamingError> {
    let mut counters: HashMap<NaiveDate, u32> = HashMap::new();
    for (index, post) in posts.iter_mut().enumerate() {
        let date = post.date.ok_or(NamingError::UndatedPost { index })?;
        let counter = counters.entry(date).or_insert(0);
        for image in &mut post.images {
            *counter += 1;
            image.sequential_name = Some(sequential_name(date, *counter, image.extension()));
        }
    }
    Ok(posts)
}

/// Outcome of a [`rename_media`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: u32,
    pub unchanged: u32,
    pub failed: Vec<String>,
}

fn staging_name(name: &str) -> String {
    format!(".{name}.renaming")
}

/// Rename media files in `dir` to their sequential names and update the uris.
///
/// Runs in two phases (every source to a staging name, then every staging
/// name to its final name) so that permutations of already-numbered files
/// never clobber each other. A file that cannot be renamed is reported and
/// keeps its uri; the batch continues.
pub fn rename_media(mut posts: Vec<Post>, dir: &Path) -> (Vec<Post>, RenameReport) {
    let mut report = RenameReport::default();
    let mut staged: Vec<(usize, usize)> = Vec::new();

    for (p, post) in posts.iter_mut().enumerate() {
        for (i, image) in post.images.iter_mut().enumerate() {
            let Some(target) = image.sequential_name.as_deref() else {
                continue;
            };
            if image.uri == target {
                report.unchanged += 1;
                continue;
            }
            let from = dir.join(&image.uri);
            let staging = dir.join(staging_name(target));
            match std::fs::rename(&from, &staging) {
                Ok(()) => staged.push((p, i)),
                Err(e) => {
                    tracing::warn!(from = %from.display(), error = %e, "unable to rename");
                    report.failed.push(image.uri.clone());
                }
            }
        }
    }

    for (p, i) in staged {
        let image = &mut posts[p].images[i];
        let Some(target) = image.sequential_name.clone() else {
            continue;
        };
        let staging = dir.join(staging_name(&target));
        let to = dir.join(&target);
        let result = if to.exists() {
            Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ))
        } else {
            std::fs::rename(&staging, &to)
        };
        match result {
            Ok(()) => {
                tracing::debug!(from = %image.uri, to = %target, "renamed");
                image.uri = target;
                report.renamed += 1;
            }
            Err(e) => {
                tracing::warn!(from = %image.uri, to = %target, error = %e, "unable to rename");
                // Put the file back under its old name.
                if let Err(e) = std::fs::rename(&staging, dir.join(&image.uri)) {
                    tracing::warn!(staging = %staging.display(), error = %e, "unable to restore");
                }
                report.failed.push(image.uri.clone());
            }
        }
    }

    (posts, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaItem;
    use std::fs;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn post_on(date: NaiveDate, uris: &[&str]) -> Post {
        Post::new(vec![])
            .with_date(date)
            .with_images(uris.iter().map(|u| MediaItem::image(*u)).collect())
    }

    fn names(posts: &[Post]) -> Vec<Vec<String>> {
        posts
            .iter()
            .map(|p| {
                p.images
                    .iter()
                    .map(|i| i.sequential_name.clone().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    // =========================================================================
    // assign_sequential_names
    // =========================================================================

    #[test]
    fn counter_spans_posts_of_the_same_date() {
        let d = ymd(2020, 1, 1);
        let posts = vec![post_on(d, &["a.jpg", "b.jpg"]), post_on(d, &["c.jpg", "d.jpg"])];
        let posts = assign_sequential_names(posts).unwrap();
        assert_eq!(
            names(&posts),
            vec![
                vec!["2020-01-01-1.jpg", "2020-01-01-2.jpg"],
                vec!["2020-01-01-3.jpg", "2020-01-01-4.jpg"],
            ]
        );
    }

    #[test]
    fn counter_resets_per_date() {
        let posts = vec![
            post_on(ymd(2020, 1, 1), &["a.jpg"]),
            post_on(ymd(2020, 1, 2), &["b.png", "c.mp4"]),
        ];
        let posts = assign_sequential_names(posts).unwrap();
        assert_eq!(
            names(&posts),
            vec![
                vec!["2020-01-01-1.jpg"],
                vec!["2020-01-02-1.png", "2020-01-02-2.mp4"],
            ]
        );
    }

    #[test]
    fn keeps_original_extension_case() {
        let posts = vec![post_on(ymd(2020, 1, 1), &["dir/IMG_1.JPG"])];
        let posts = assign_sequential_names(posts).unwrap();
        assert_eq!(names(&posts), vec![vec!["2020-01-01-1.JPG"]]);
    }

    #[test]
    fn undated_post_is_an_error() {
        let posts = vec![
            post_on(ymd(2020, 1, 1), &["a.jpg"]),
            Post::new(vec![]).with_images(vec![MediaItem::image("b.jpg")]),
        ];
        assert!(matches!(
            assign_sequential_names(posts),
            Err(NamingError::UndatedPost { index: 1 })
        ));
    }

    #[test]
    fn names_do_not_touch_dcim() {
        let mut post = post_on(ymd(2020, 1, 1), &["a.jpg"]);
        post.dcim = vec![MediaItem::image("/src/b.jpg")];
        let posts = assign_sequential_names(vec![post]).unwrap();
        assert_eq!(posts[0].dcim[0].sequential_name, None);
    }

    // =========================================================================
    // rename_media
    // =========================================================================

    #[test]
    fn rename_moves_files_and_updates_uris() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("IMG_1.jpg"), "one").unwrap();
        fs::write(tmp.path().join("IMG_2.jpg"), "two").unwrap();

        let posts = vec![post_on(ymd(2020, 1, 1), &["IMG_1.jpg", "IMG_2.jpg"])];
        let posts = assign_sequential_names(posts).unwrap();
        let (posts, report) = rename_media(posts, tmp.path());

        assert_eq!(report.renamed, 2);
        assert!(report.failed.is_empty());
        assert_eq!(posts[0].images[0].uri, "2020-01-01-1.jpg");
        assert_eq!(
            fs::read_to_string(tmp.path().join("2020-01-01-2.jpg")).unwrap(),
            "two"
        );
        assert!(!tmp.path().join("IMG_1.jpg").exists());
    }

    #[test]
    fn rename_swaps_already_numbered_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2020-01-01-1.jpg"), "first").unwrap();
        fs::write(tmp.path().join("2020-01-01-2.jpg"), "second").unwrap();

        // Images were reordered in the diary.
        let posts = vec![post_on(
            ymd(2020, 1, 1),
            &["2020-01-01-2.jpg", "2020-01-01-1.jpg"],
        )];
        let posts = assign_sequential_names(posts).unwrap();
        let (_, report) = rename_media(posts, tmp.path());

        assert_eq!(report.renamed, 2);
        assert_eq!(
            fs::read_to_string(tmp.path().join("2020-01-01-1.jpg")).unwrap(),
            "second"
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("2020-01-01-2.jpg")).unwrap(),
            "first"
        );
    }

    #[test]
    fn rename_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "a").unwrap();
        let posts = assign_sequential_names(vec![post_on(ymd(2020, 1, 1), &["a.jpg"])]).unwrap();
        let (posts, _) = rename_media(posts, tmp.path());
        let (_, report) = rename_media(posts, tmp.path());
        assert_eq!(report.renamed, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn rename_missing_file_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.jpg"), "b").unwrap();
        let posts = vec![post_on(ymd(2020, 1, 1), &["missing.jpg", "b.jpg"])];
        let posts = assign_sequential_names(posts).unwrap();
        let (posts, report) = rename_media(posts, tmp.path());

        assert_eq!(report.failed, vec!["missing.jpg".to_string()]);
        assert_eq!(report.renamed, 1);
        assert_eq!(posts[0].images[0].uri, "missing.jpg");
        assert_eq!(posts[0].images[1].uri, "2020-01-01-2.jpg");
    }

    #[test]
    fn rename_never_overwrites_unrelated_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "a").unwrap();
        fs::write(tmp.path().join("2020-01-01-1.jpg"), "unrelated").unwrap();
        let posts = assign_sequential_names(vec![post_on(ymd(2020, 1, 1), &["a.jpg"])]).unwrap();
        let (posts, report) = rename_media(posts, tmp.path());

        assert_eq!(report.failed, vec!["a.jpg".to_string()]);
        assert_eq!(posts[0].images[0].uri, "a.jpg");
        assert_eq!(fs::read_to_string(tmp.path().join("a.jpg")).unwrap(), "a");
        assert_eq!(
            fs::read_to_string(tmp.path().join("2020-01-01-1.jpg")).unwrap(),
            "unrelated"
        );
    }
}
