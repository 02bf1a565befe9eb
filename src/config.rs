use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::Datelike as _;
use serde::Deserialize;
use url::Url;

use crate::cli::RunArgs;
use crate::export::ExportOptions;

pub const DEFAULT_OLD_BASE_URL: &str = "http://blogs.msdn.com/";
pub const DEFAULT_BLOG_PATH: &str = "b/africaapps/";
pub const DEFAULT_NEW_BASE_URL: &str = "http://sabbour.me/";
pub const DEFAULT_ASSET_PREFIX: &str = "/content/images/imported/";
pub const DEFAULT_WORK_DIR: &str = "blog-export";
pub const DEFAULT_FIRST_YEAR: i32 = 2013;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run settings as they appear in a YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub old_base_url: Option<String>,
    pub blog_path: Option<String>,
    pub author: Option<String>,
    pub new_base_url: Option<String>,
    pub asset_prefix: Option<String>,
    pub work_dir: Option<String>,
    pub first_year: Option<i32>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub author_id: Option<u32>,
    pub language: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))
    }
}

/// Validated configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub old_base_url: Url,
    /// Old base URL joined with the blog path; always ends with `/`.
    pub blog_url: Url,
    pub author: String,
    /// Always ends with `/`.
    pub new_base_url: Url,
    /// Always ends with `/`.
    pub asset_prefix: String,
    pub work_dir: PathBuf,
    pub first_year: i32,
    pub workers: usize,
    pub timeout: Duration,
    pub export: ExportOptions,
}

impl RunConfig {
    pub fn from_args(args: &RunArgs) -> anyhow::Result<Self> {
        let file = match args.config.as_deref() {
            Some(path) => ConfigFile::load(Path::new(path))?,
            None => ConfigFile::default(),
        };
        Self::resolve(args, file)
    }

    /// Flags win over the file; the file wins over built-in defaults.
    pub fn resolve(args: &RunArgs, file: ConfigFile) -> anyhow::Result<Self> {
        let old_base_url = args
            .old_base_url
            .clone()
            .or(file.old_base_url)
            .unwrap_or_else(|| DEFAULT_OLD_BASE_URL.to_owned());
        let blog_path = args
            .blog_path
            .clone()
            .or(file.blog_path)
            .unwrap_or_else(|| DEFAULT_BLOG_PATH.to_owned());
        let author = args
            .author
            .clone()
            .or(file.author)
            .map(|author| author.trim().to_owned())
            .filter(|author| !author.is_empty())
            .ok_or_else(|| anyhow::anyhow!("--author is required (or `author` in the config file)"))?;
        let new_base_url = args
            .new_base_url
            .clone()
            .or(file.new_base_url)
            .unwrap_or_else(|| DEFAULT_NEW_BASE_URL.to_owned());
        let asset_prefix = args
            .asset_prefix
            .clone()
            .or(file.asset_prefix)
            .unwrap_or_else(|| DEFAULT_ASSET_PREFIX.to_owned());
        let work_dir = args
            .work_dir
            .clone()
            .or(file.work_dir)
            .unwrap_or_else(|| DEFAULT_WORK_DIR.to_owned());
        let first_year = args
            .first_year
            .or(file.first_year)
            .unwrap_or(DEFAULT_FIRST_YEAR);
        let workers = args.workers.or(file.workers).unwrap_or(DEFAULT_WORKERS);
        let timeout_secs = args
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let defaults = ExportOptions::default();
        let export = ExportOptions {
            author_id: args.author_id.or(file.author_id).unwrap_or(defaults.author_id),
            language: args
                .language
                .clone()
                .or(file.language)
                .unwrap_or(defaults.language),
        };

        let old_base_url = parse_site_url(&old_base_url).context("old base url")?;
        let new_base_url = with_trailing_slash(parse_site_url(&new_base_url).context("new base url")?);
        let blog_url = old_base_url
            .join(&blog_path)
            .with_context(|| format!("join blog path {blog_path:?} onto {old_base_url}"))?;
        let blog_url = with_trailing_slash(blog_url);

        if workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        let current_year = chrono::Utc::now().year();
        if first_year > current_year {
            anyhow::bail!("first year {first_year} is after the current year {current_year}");
        }

        Ok(Self {
            old_base_url,
            blog_url,
            author,
            new_base_url,
            asset_prefix: ensure_trailing_slash(asset_prefix),
            work_dir: PathBuf::from(work_dir),
            first_year,
            workers,
            timeout: Duration::from_secs(timeout_secs),
            export,
        })
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.work_dir.join("summaries")
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.work_dir.join("posts")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.work_dir.join("assets")
    }

    pub fn posts_json(&self) -> PathBuf {
        self.work_dir.join("posts.json")
    }

    pub fn export_json(&self) -> PathBuf {
        self.work_dir.join("ghost.json")
    }
}

fn parse_site_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse url {raw:?}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("url must be http/https: {url}");
    }
    Ok(url)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn ensure_trailing_slash(mut value: String) -> String {
    if !value.ends_with('/') {
        value.push('/');
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_author() -> RunArgs {
        RunArgs {
            author: Some("Ahmed Sabbour".to_owned()),
            ..RunArgs::default()
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() -> anyhow::Result<()> {
        let config = RunConfig::resolve(&args_with_author(), ConfigFile::default())?;
        assert_eq!(config.old_base_url.as_str(), "http://blogs.msdn.com/");
        assert_eq!(config.blog_url.as_str(), "http://blogs.msdn.com/b/africaapps/");
        assert_eq!(config.new_base_url.as_str(), "http://sabbour.me/");
        assert_eq!(config.asset_prefix, "/content/images/imported/");
        assert_eq!(config.first_year, 2013);
        assert_eq!(config.workers, 8);
        assert_eq!(config.export.author_id, 1);
        assert_eq!(config.posts_json(), Path::new("blog-export/posts.json"));
        Ok(())
    }

    #[test]
    fn flags_override_file_and_paths_are_normalized() -> anyhow::Result<()> {
        let file: ConfigFile = serde_yaml::from_str(
            "author: From File\nnew_base_url: https://file.example/blog\nblog_path: b/fromfile\nworkers: 2\n",
        )?;
        let args = RunArgs {
            author: Some("From Flag".to_owned()),
            asset_prefix: Some("/img".to_owned()),
            ..RunArgs::default()
        };

        let config = RunConfig::resolve(&args, file)?;
        assert_eq!(config.author, "From Flag");
        assert_eq!(config.new_base_url.as_str(), "https://file.example/blog/");
        assert_eq!(config.blog_url.as_str(), "http://blogs.msdn.com/b/fromfile/");
        assert_eq!(config.asset_prefix, "/img/");
        assert_eq!(config.workers, 2);
        Ok(())
    }

    #[test]
    fn author_is_required() {
        let err = RunConfig::resolve(&RunArgs::default(), ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("--author is required"));
    }

    #[test]
    fn rejects_non_http_urls_and_zero_workers() {
        let args = RunArgs {
            old_base_url: Some("ftp://old.example/".to_owned()),
            ..args_with_author()
        };
        assert!(RunConfig::resolve(&args, ConfigFile::default()).is_err());

        let args = RunArgs {
            workers: Some(0),
            ..args_with_author()
        };
        assert!(RunConfig::resolve(&args, ConfigFile::default()).is_err());
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let parsed: Result<ConfigFile, _> = serde_yaml::from_str("auther: typo\n");
        assert!(parsed.is_err());
    }
}
