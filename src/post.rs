use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::cache::{OfflineCache, post_page_path};
use crate::error::{ExtractError, PostError};
use crate::formats::{Post, PostStub};
use crate::html::{AttrEdit, collapsed_text, escape_attribute, render_inner, selector};
use crate::rewrite::{LinkRules, LinkTarget};

/// Attributes the old rich-text editor left on content nodes.
pub const LEGACY_EDITOR_ATTRIBUTES: &[&str] = &["mce_href", "mce_keep", "mce_src"];

/// Double-escaped entities the old engine produced, and what they stood for.
pub const ENTITY_FIXES: &[(&str, &str)] = &[
    ("&amp;ndash;", "--"),
    ("&amp;ldquo;", "\""),
    ("&amp;rdquo;", "\""),
    ("&amp;rsquo;", "'"),
    ("&amp;nbsp;", " "),
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%d %B %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d %B %Y", "%B %d, %Y", "%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d"];

static POST_DATE: LazyLock<Selector> = LazyLock::new(|| selector("div.post-date"));
static POST_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| selector("div.post-content.user-defined-markup"));
static POST_TAGS: LazyLock<Selector> = LazyLock::new(|| selector("div.post-tags"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// A file referenced from a post body that has to be localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub url: Url,
    pub file_name: String,
}

/// Everything read from one post page, with the body already rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub published_at: DateTime<Utc>,
    pub content: String,
    pub tags: Vec<String>,
    pub assets: Vec<AssetRef>,
}

/// Turns stubs into posts: fetch, parse, rewrite, localize assets.
#[derive(Clone)]
pub struct PostHydrator {
    cache: OfflineCache,
    rules: LinkRules,
    posts_dir: PathBuf,
    assets_dir: PathBuf,
}

impl PostHydrator {
    pub fn new(
        cache: OfflineCache,
        rules: LinkRules,
        posts_dir: PathBuf,
        assets_dir: PathBuf,
    ) -> Self {
        Self {
            cache,
            rules,
            posts_dir,
            assets_dir,
        }
    }

    pub fn hydrate(&self, stub: &PostStub) -> Result<Post, PostError> {
        let page_path = post_page_path(&self.posts_dir, &stub.relative_url)
            .map_err(|err| PostError::InvalidUrl {
                reason: format!("{err:#}"),
            })?;
        let page_url = Url::parse(&stub.full_url).map_err(|err| PostError::InvalidUrl {
            reason: format!("{}: {err}", stub.full_url),
        })?;

        if !self.cache.ensure(&page_url, &page_path).is_available() {
            return Err(PostError::NotCached { path: page_path });
        }
        let bytes = std::fs::read(&page_path).map_err(|source| PostError::Read {
            path: page_path.clone(),
            source,
        })?;
        // Legacy pages are not always valid UTF-8; a cached page is never refetched.
        let html = String::from_utf8_lossy(&bytes);

        let page = parse_post_page(&html, stub, &self.rules)?;

        for asset in &page.assets {
            let path = self.assets_dir.join(&asset.file_name);
            if !self.cache.ensure(&asset.url, &path).is_available() {
                tracing::warn!(
                    post = %stub.full_url,
                    asset = %asset.url,
                    "asset could not be downloaded; reference is rewritten anyway"
                );
            }
        }

        Ok(Post {
            stub: stub.clone(),
            published_at: page.published_at,
            content: page.content,
            tags: page.tags,
        })
    }
}

/// Parses a cached post page and produces its rewritten body.
///
/// The publish date, the body, and the body's trailing clearing div are
/// required. The tags section is optional.
pub fn parse_post_page(
    html: &str,
    stub: &PostStub,
    rules: &LinkRules,
) -> Result<PostPage, ExtractError> {
    let document = Html::parse_document(html);

    let date = document
        .select(&POST_DATE)
        .next()
        .ok_or(ExtractError::MissingElement {
            selector: "div.post-date",
        })?;
    let published_at = parse_publish_date(&collapsed_text(date))?;

    let body = document
        .select(&POST_CONTENT)
        .next()
        .ok_or(ExtractError::MissingElement {
            selector: "div.post-content.user-defined-markup",
        })?;
    let trailing = trailing_clear_div(body)?;

    let assets = collect_assets(body, stub, rules);

    let rendered = render_inner(body, Some(trailing), &|element, attr, value| {
        if LEGACY_EDITOR_ATTRIBUTES.contains(&attr) {
            return AttrEdit::Drop;
        }
        let target = match (element.value().name(), attr) {
            ("img", "src") => rules.classify_image(value),
            ("a", "href") => rules.classify_link(value, &stub.relative_url),
            _ => return AttrEdit::Keep,
        };
        match rules.replacement(&target) {
            Some(replacement) => AttrEdit::Replace(replacement),
            None => AttrEdit::Keep,
        }
    });

    let mut content = normalize_entities(&rendered);
    content.push_str(&provenance_block(&stub.full_url));

    Ok(PostPage {
        published_at,
        content,
        tags: extract_tags(&document),
        assets,
    })
}

fn collect_assets(body: ElementRef<'_>, stub: &PostStub, rules: &LinkRules) -> Vec<AssetRef> {
    let images = body
        .select(&IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .map(|src| rules.classify_image(src));
    let links = body
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| rules.classify_link(href, &stub.relative_url));

    let mut seen = HashSet::new();
    images
        .chain(links)
        .filter_map(|target| match target {
            LinkTarget::Asset { url, file_name } => Some(AssetRef { url, file_name }),
            _ => None,
        })
        .filter(|asset| seen.insert(asset.file_name.clone()))
        .collect()
}

/// The layout-only `<div style="clear:both;">` the old engine appends to
/// every post body.
fn trailing_clear_div(body: ElementRef<'_>) -> Result<ElementRef<'_>, ExtractError> {
    let last = body
        .children()
        .filter(|node| !matches!(node.value(), Node::Text(text) if text.trim().is_empty()))
        .last()
        .ok_or_else(|| ExtractError::MissingTrailingClear {
            found: "an empty body".to_owned(),
        })?;

    let element = ElementRef::wrap(last).ok_or_else(|| ExtractError::MissingTrailingClear {
        found: "a non-element node".to_owned(),
    })?;

    let name = element.value().name();
    let style = element.value().attr("style").unwrap_or_default();
    if name == "div" && is_clear_both(style) {
        Ok(element)
    } else {
        Err(ExtractError::MissingTrailingClear {
            found: format!("<{name} style={style:?}>"),
        })
    }
}

fn is_clear_both(style: &str) -> bool {
    let compact = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.trim_end_matches(';') == "clear:both"
}

fn extract_tags(document: &Html) -> Vec<String> {
    let Some(section) = document.select(&POST_TAGS).next() else {
        return Vec::new();
    };
    section
        .select(&ANCHOR)
        .map(collapsed_text)
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub fn parse_publish_date(raw: &str) -> Result<DateTime<Utc>, ExtractError> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&text, format) {
            return Ok(parsed.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Some(parsed) = NaiveDate::parse_from_str(&text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(parsed.and_utc());
        }
    }

    Err(ExtractError::InvalidDate { raw: text })
}

pub fn normalize_entities(html: &str) -> String {
    ENTITY_FIXES
        .iter()
        .fold(html.to_owned(), |acc, (from, to)| acc.replace(from, to))
}

/// Note appended to every migrated post pointing back at where it came from.
pub fn provenance_block(original_url: &str) -> String {
    let url = escape_attribute(original_url);
    format!(
        "<blockquote class=\"note original-post\"><div><p><strong>Note: </strong>\
         This post originally appeared at <a href=\"{url}\">{url}</a></p></div></blockquote>"
    )
}
