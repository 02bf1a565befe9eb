use std::path::{Path, PathBuf};

use anyhow::Context as _;
use url::Url;

/// One monthly archive index page of the old blog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePage {
    pub year: i32,
    pub month: u32,
    pub url: Url,
}

impl ArchivePage {
    pub fn file_name(&self) -> String {
        format!("monthly-summary-{:04}-{:02}.html", self.year, self.month)
    }

    pub fn cache_path(&self, summaries_dir: &Path) -> PathBuf {
        summaries_dir.join(self.file_name())
    }
}

/// Every `(year, month)` archive address from `first_year` through
/// `last_year`, inclusive, twelve months each. Pure address construction.
pub fn archive_pages(
    blog_url: &Url,
    first_year: i32,
    last_year: i32,
) -> impl Iterator<Item = anyhow::Result<ArchivePage>> + '_ {
    (first_year..=last_year).flat_map(move |year| {
        (1..=12).map(move |month| {
            let relative = format!("archive/{year}/{month:02}.aspx");
            let url = blog_url
                .join(&relative)
                .with_context(|| format!("build archive url {relative} under {blog_url}"))?;
            Ok(ArchivePage { year, month, url })
        })
    })
}
