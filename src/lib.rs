//! # Diary Gal
//!
//! Static photo galleries from a markdown travel diary and a folder of photos
//! and videos. The diary (`index.md`) tells the story; the media directory
//! holds everything the camera took. A gallery page shows each diary entry
//! with its images, followed by the media taken on the same day.
//!
//! # Architecture: Dating Then Rendering
//!
//! ```text
//! index.md ──parse──► posts ──date──► dated posts ──merge──► page posts ──render──► index.htm
//!                                                   ▲
//! photos/  ──list──► media ──date/probe/thumbnail───┘
//! ```
//!
//! Every step between parsing and rendering is a function taking a post
//! sequence by value and returning the next one, so each one is tested on
//! its own.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Post`, `MediaItem`, `MediaKind`, `Thumbnail` |
//! | [`grammar`] | Day/month vocabulary, title and file name date patterns |
//! | [`dating`] | Year and date assignment with backfill, ranks, order check |
//! | [`naming`] | Sequential media names (`2020-01-12-3.jpg`) and the rename step |
//! | [`diary`] | Diary markdown parser and printer |
//! | [`export`] | Import of a structured JSON export into a diary |
//! | [`probe`] | Date, time, dimensions and size of photos and videos |
//! | [`index`] | Media discovery and grouping by date |
//! | [`merge`] | Merging media dates into diary posts |
//! | [`cache`] | Thumbnail cache: deterministic names, presence-based reuse, purge |
//! | [`imaging`] | Thumbnail backend: resize, video frame, mosaic |
//! | [`gallery`] | Page generation in every mode, subdirectory pages |
//! | [`render`] | HTML rendering with Maud |
//! | [`config`] | `config.toml` loading, validation, write-back |
//! | [`output`] | CLI output formatting |
//! | [`error`] | Top-level error and exit codes |
//!
//! # Design Decisions
//!
//! ## Order Is Trusted, Dates Are Copied
//!
//! Titles such as "Dimanche 12 janvier" give the day and month of a post;
//! photo capture times give the year. Posts without either take the value of
//! the nearest preceding post (the first post looks ahead instead). Nothing is
//! interpolated: a diary that names no day at all is an error, not a guess.
//!
//! ## The Thumbnail Directory Is the Cache
//!
//! A thumbnail's file name is a pure function of its role and source path, so
//! reruns find it again without any index file. Thumbnails no page references
//! are deleted after the pages are written.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors and every interpolation
//! is escaped.

pub mod cache;
pub mod config;
pub mod dating;
pub mod diary;
pub mod error;
pub mod export;
pub mod gallery;
pub mod grammar;
pub mod imaging;
pub mod index;
pub mod merge;
pub mod naming;
pub mod output;
pub mod probe;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
