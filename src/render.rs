//! HTML page rendering.
//!
//! Turns a dated, thumbnail-annotated post sequence into one gallery page.
//! Every page lives in the destination directory next to `.thumbnails/` and
//! the `photobox/` viewer assets, which it links relatively.
//!
//! ## Page structure
//!
//! ```text
//! [Full] [Diary] [Text]                       diary pages only
//! ┌ post ───────────────────────────────────┐
//! │ ###### title + text (markdown)          │
//! │ div#gallery-blog-20200112-1             │ images written in the diary
//! │ div#gallery-dcim-20200112-1             │ media of the date
//! └ hr ─────────────────────────────────────┘
//! ┌ div.extra (post made for a media date) ─┐
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! <script> one photobox call per gallery block </script>
//! ```
//!
//! Subdirectory items are links to their own page, shown as a mosaic.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Post text is markdown rendered with pulldown-cmark.

use crate::cache::THUMBNAIL_DIR;
use crate::config::{GalleryConfig, PhotoboxConfig};
use crate::types::{MediaItem, MediaKind, Post};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

const CSS: &str = r#"
p { margin-top: 0px; margin-bottom: 0px; }
h3, h6 { font-size: 100%; font-weight: bold; margin-top: 0px; margin-bottom: 0px; }
span { display: inline-table; }
span p { text-align: center; font-size: 80%; }
span.subdir { background-color: #eee; margin-bottom: 8px; border: 1px solid #C0C0C0; }
span.subdir p { margin-left: 2px; }
img.subdir { border: 1px solid #C0C0C0; }
button.view { position: fixed; width: 50px; right: 20px; background-color: white; }
"#;

const BUTTONS_JS: &str = r#"
$('#btn_full').click(function() {
    $("[id^=gallery-blog]").show();
    $("[id^=gallery-dcim]").show();
    $("div.extra").show();
});
$('#btn_text').click(function() {
    $("[id^=gallery-blog]").hide();
    $("[id^=gallery-dcim]").hide();
    $("div.extra").hide();
});
$('#btn_blog').click(function() {
    $("[id^=gallery-blog]").show();
    $("[id^=gallery-dcim]").hide();
    $("div.extra").hide();
});
"#;

/// What a page needs to know besides its posts.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Diary pages get the view buttons and render diary images.
    pub diary: bool,
    /// Use media descriptions as tooltips.
    pub media_description: bool,
    pub photobox: &'a PhotoboxConfig,
}

impl<'a> RenderOptions<'a> {
    pub fn from_config(config: &'a GalleryConfig, diary: bool) -> Self {
        Self {
            diary,
            media_description: config.thumbnails.media_description,
            photobox: &config.photobox,
        }
    }
}

/// Render a complete page.
pub fn render_page(title: &str, posts: &[Post], options: &RenderOptions<'_>) -> Markup {
    let content = html! {
        @if options.diary {
            (view_buttons())
        }
        @for post in posts {
            (render_post(post, options))
        }
        script { (PreEscaped(gallery_calls(posts, options.photobox))) }
    };
    base_document(title, content)
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width";
                title { (title) }
                link rel="stylesheet" href="photobox/photobox.css";
                script src="photobox/jquery.min.js" {}
                script src="photobox/jquery.photobox.js" {}
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn view_buttons() -> Markup {
    html! {
        button.view id="btn_full" type="button" style="top: 20px;" { "Full" }
        button.view id="btn_blog" type="button" style="top: 40px;" { "Diary" }
        button.view id="btn_text" type="button" style="top: 60px;" { "Text" }
        script { (PreEscaped(BUTTONS_JS)) }
    }
}

fn separator() -> Markup {
    html! { hr color="#C0C0C0" size="1"; }
}

/// `20200112`, or `00000000` for the undated post of a directory page.
fn date_key(post: &Post) -> String {
    post.date
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "00000000".to_string())
}

pub fn gallery_id(block: &str, post: &Post) -> String {
    format!("gallery-{block}-{}-{}", date_key(post), post.date_rank)
}

/// Title and text of a post, as HTML.
fn post_text(post: &Post) -> Option<String> {
    let mut markdown = String::new();
    if let Some(title) = &post.title {
        markdown.push_str("###### ");
        markdown.push_str(title);
        markdown.push_str("\n\n");
    }
    markdown.push_str(&post.text.join("\n"));
    if markdown.trim().is_empty() {
        return None;
    }
    let mut body = String::new();
    md_html::push_html(&mut body, Parser::new(&markdown));
    Some(body)
}

fn render_post(post: &Post, options: &RenderOptions<'_>) -> Markup {
    let body = if options.diary {
        diary_post(post, options)
    } else {
        directory_post(post, options)
    };
    html! {
        @if post.extra {
            div.extra { (body) }
        } @else {
            (body)
        }
    }
}

fn diary_post(post: &Post, options: &RenderOptions<'_>) -> Markup {
    let dated: Vec<&MediaItem> = post
        .dcim
        .iter()
        .filter(|m| m.kind != MediaKind::Subdir)
        .collect();
    html! {
        @if let Some(text) = post_text(post) {
            (PreEscaped(text))
        }
        @if !post.images.is_empty() {
            div id=(gallery_id("blog", post)) {
                @for media in &post.images {
                    (post_media(media, options))
                }
            }
        }
        @if !dated.is_empty() {
            div id=(gallery_id("dcim", post)) {
                (separator())
                @for media in dated {
                    (directory_media(media, options))
                }
            }
        }
        (separator())
    }
}

fn directory_post(post: &Post, options: &RenderOptions<'_>) -> Markup {
    let (subdirs, media): (Vec<&MediaItem>, Vec<&MediaItem>) = post
        .dcim
        .iter()
        .partition(|m| m.kind == MediaKind::Subdir);
    html! {
        @if let Some(text) = post_text(post) {
            (PreEscaped(text))
        }
        @if !post.dcim.is_empty() {
            (separator())
        }
        @for subdir in subdirs {
            (directory_media(subdir, options))
        }
        @if !media.is_empty() {
            div id=(gallery_id("dcim", post)) {
                @for item in media {
                    (directory_media(item, options))
                }
            }
        }
        (separator())
    }
}

fn tooltip<'a>(media: &'a MediaItem, options: &RenderOptions<'_>) -> Option<&'a str> {
    if options.media_description {
        media.description.as_deref()
    } else {
        None
    }
}

fn thumbnail_img(media: &MediaItem, options: &RenderOptions<'_>) -> Markup {
    html! {
        @match &media.thumb {
            Some(thumb) => {
                img
                    src={ (THUMBNAIL_DIR) "/" (thumb.name) }
                    width=(thumb.width)
                    height=(thumb.height)
                    title=[tooltip(media, options)];
            }
            None => {
                img src=(media.uri) title=[tooltip(media, options)];
            }
        }
    }
}

/// Image or video written in the diary, linked to its file next to the page.
fn post_media(media: &MediaItem, options: &RenderOptions<'_>) -> Markup {
    let link = html! {
        @match media.kind {
            MediaKind::Image => {
                a href=(media.uri) { (thumbnail_img(media, options)) }
            }
            MediaKind::Video => {
                a href=(media.uri) rel="video" { (thumbnail_img(media, options)) }
            }
            MediaKind::Subdir => { (subdir_link(media)) }
        }
    };
    html! {
        @match &media.caption {
            Some(caption) => {
                span { (link) p { (caption) } }
            }
            None => { (link) }
        }
    }
}

/// Media of the media directory, linked to the original file.
fn directory_media(media: &MediaItem, options: &RenderOptions<'_>) -> Markup {
    let href = format!("file:///{}", media.uri.trim_start_matches('/'));
    html! {
        @match media.kind {
            MediaKind::Image => {
                a href=(href) { (thumbnail_img(media, options)) }
            }
            MediaKind::Video => {
                a href=(href) rel="video" { (thumbnail_img(media, options)) }
            }
            MediaKind::Subdir => { (subdir_link(media)) }
        }
    }
}

/// Mosaic linking to the page of a subdirectory (`uri` is the page name).
fn subdir_link(media: &MediaItem) -> Markup {
    let link = html! {
        a href=(media.uri) {
            @if let Some(thumb) = &media.thumb {
                img.subdir
                    src={ (THUMBNAIL_DIR) "/" (thumb.name) }
                    width=(thumb.width)
                    height=(thumb.height);
            }
        }
    };
    html! {
        @match &media.caption {
            Some(caption) => {
                span.subdir { (link) p { (caption) } }
            }
            None => { (link) }
        }
    }
}

/// One photobox initialisation per gallery block of the page.
fn gallery_calls(posts: &[Post], photobox: &PhotoboxConfig) -> String {
    let mut calls = String::new();
    for post in posts {
        if !post.images.is_empty() {
            calls.push_str(&gallery_call(&gallery_id("blog", post), photobox));
        }
        if post.dcim.iter().any(|m| m.kind != MediaKind::Subdir) {
            calls.push_str(&gallery_call(&gallery_id("dcim", post), photobox));
        }
    }
    calls
}

pub fn gallery_call(id: &str, photobox: &PhotoboxConfig) -> String {
    format!(
        "\n$('#{id}').photobox('a', {{loop:{},thumbs:{},autoplay:{},time:{},zoomable:{},rotatable:{},wheelNextPrev:{}}});",
        photobox.looping,
        photobox.thumbs,
        photobox.autoplay,
        photobox.time,
        photobox.zoomable,
        photobox.rotatable,
        photobox.wheel_next_prev,
    )
}

// ============================================================================
// Tests
// ============================================================================
