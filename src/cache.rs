use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

/// Retrieves the raw bytes behind an address.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> anyhow::Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "blogmigrate/0.1")
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url} returned {status}");
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The file was already on disk; nothing was fetched.
    Hit,
    Fetched,
    /// The fetch failed and no file was written.
    Unavailable,
}

impl CacheStatus {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Disk cache keyed by local path. A file that exists is never fetched again.
#[derive(Clone)]
pub struct OfflineCache {
    fetcher: Arc<dyn Fetcher>,
}

impl OfflineCache {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn ensure(&self, url: &Url, path: &Path) -> CacheStatus {
        if path.exists() {
            tracing::debug!(%url, path = %path.display(), "cache hit");
            return CacheStatus::Hit;
        }

        tracing::info!(%url, "downloading");
        match self.download(url, path) {
            Ok(()) => CacheStatus::Fetched,
            Err(err) => {
                tracing::warn!(%url, error = %format!("{err:#}"), "could not download");
                CacheStatus::Unavailable
            }
        }
    }

    fn download(&self, url: &Url, path: &Path) -> anyhow::Result<()> {
        let parent_dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("cache path must have parent: {}", path.display()))?;
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("create cache dir: {}", parent_dir.display()))?;

        let bytes = self.fetcher.fetch(url)?;

        // Readers only ever see the complete file: it appears via rename.
        let mut staged = tempfile::NamedTempFile::new_in(parent_dir)
            .with_context(|| format!("create temp file in {}", parent_dir.display()))?;
        staged
            .write_all(&bytes)
            .with_context(|| format!("write temp file for {}", path.display()))?;
        staged
            .persist(path)
            .with_context(|| format!("move cached file into place: {}", path.display()))?;
        Ok(())
    }
}

/// Maps a post's site-relative URL to its cached page:
/// `/b/blog/archive/2014/03/10/hello.aspx` -> `<posts_dir>/b/blog/archive/2014/03/10/hello.html`.
pub fn post_page_path(posts_dir: &Path, relative_url: &str) -> anyhow::Result<PathBuf> {
    let path_only = relative_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut path = posts_dir.to_path_buf();
    let mut pushed = false;
    for segment in path_only.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            anyhow::bail!("post url must not contain '..': {relative_url}");
        }
        path = path.join(segment);
        pushed = true;
    }
    if !pushed {
        anyhow::bail!("post url has no path: {relative_url:?}");
    }
    path.set_extension("html");

    Ok(path)
}

/// Local file name for a downloaded asset: the final non-empty path segment.
pub fn asset_file_name(url: &Url) -> Option<String> {
    let name = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    if name == "." || name == ".." {
        return None;
    }
    Some(name.to_owned())
}
