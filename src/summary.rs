use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context as _;
use scraper::{Html, Selector};
use url::Url;

use crate::error::ExtractError;
use crate::formats::{PostStub, slug_from_path};
use crate::html::{collapsed_text, selector};

/// Text the legacy engine renders on an archive page for a month without posts.
pub const EMPTY_ARCHIVE_MARKER: &str = "No blog posts have yet been created";

static ABBREVIATED_POST: LazyLock<Selector> = LazyLock::new(|| selector(".abbreviated-post"));
static POST_NAME: LazyLock<Selector> = LazyLock::new(|| selector("h4.post-name"));
static POST_NAME_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static POST_SUMMARY: LazyLock<Selector> = LazyLock::new(|| selector("div.post-summary"));
static USER_NAME: LazyLock<Selector> = LazyLock::new(|| selector("span.user-name"));

/// Reads every post summary on one archive page.
pub fn extract_stubs(html: &str, old_base: &Url) -> Result<Vec<PostStub>, ExtractError> {
    if html.contains(EMPTY_ARCHIVE_MARKER) {
        return Ok(Vec::new());
    }

    let document = Html::parse_document(html);
    let mut stubs = Vec::new();

    for summary in document.select(&ABBREVIATED_POST) {
        let heading = summary
            .select(&POST_NAME)
            .next()
            .ok_or(ExtractError::MissingElement {
                selector: "h4.post-name",
            })?;
        let link = heading
            .select(&POST_NAME_LINK)
            .next()
            .ok_or(ExtractError::MissingElement {
                selector: "h4.post-name a",
            })?;
        let href = link
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or(ExtractError::MissingAttribute {
                selector: "h4.post-name a",
                attribute: "href",
            })?;
        let author = summary
            .select(&USER_NAME)
            .next()
            .map(collapsed_text)
            .ok_or(ExtractError::MissingElement {
                selector: "span.user-name",
            })?;

        let full_url = old_base
            .join(href)
            .map_err(|_| ExtractError::InvalidAddress {
                value: href.to_owned(),
            })?;
        let relative_url = full_url.path().to_owned();

        stubs.push(PostStub {
            title: collapsed_text(heading),
            author,
            slug: slug_from_path(&relative_url),
            full_url: full_url.to_string(),
            relative_url,
            summary: summary
                .select(&POST_SUMMARY)
                .next()
                .map(collapsed_text)
                .unwrap_or_default(),
        });
    }

    Ok(stubs)
}

/// Reads one cached archive page from disk.
pub fn extract_stubs_from_file(path: &Path, old_base: &Url) -> anyhow::Result<Vec<PostStub>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read archive page: {}", path.display()))?;
    extract_stubs(&String::from_utf8_lossy(&bytes), old_base)
        .with_context(|| format!("extract post summaries: {}", path.display()))
}

/// Drops repeated mentions of the same post, keeping the first.
pub fn dedup_stubs(stubs: Vec<PostStub>) -> Vec<PostStub> {
    let mut seen = HashSet::new();
    stubs
        .into_iter()
        .filter(|stub| seen.insert(stub.relative_url.clone()))
        .collect()
}
