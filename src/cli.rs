use clap::{Args, Parser, Subcommand};

use crate::export::{DEFAULT_AUTHOR_ID, DEFAULT_LANGUAGE};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl the old blog, transform the author's posts, and write the export.
    Run(RunArgs),
    /// Rebuild the export document from a previously written post list.
    Export(ExportArgs),
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// YAML file with run settings (flags override its values).
    #[arg(long)]
    pub config: Option<String>,

    /// Base URL of the old site (must be http/https).
    #[arg(long)]
    pub old_base_url: Option<String>,

    /// Blog path under the old base URL, e.g. `b/africaapps/`.
    #[arg(long)]
    pub blog_path: Option<String>,

    /// Display name of the author whose posts are migrated.
    #[arg(long)]
    pub author: Option<String>,

    /// Base URL of the new site; cross-post links are rewritten onto it.
    #[arg(long)]
    pub new_base_url: Option<String>,

    /// Path prefix on the new site where imported assets will be uploaded.
    #[arg(long)]
    pub asset_prefix: Option<String>,

    /// Local working directory (offline cache and output documents).
    #[arg(long)]
    pub work_dir: Option<String>,

    /// First year to enumerate archive pages for.
    #[arg(long)]
    pub first_year: Option<i32>,

    /// Number of worker threads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// HTTP timeout per request, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Id of the user every exported entity is attributed to.
    #[arg(long)]
    pub author_id: Option<u32>,

    /// Language tag written on every exported post.
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Input post list (`posts.json` written by `run`).
    #[arg(long)]
    pub posts: String,

    /// Output path for the export document.
    #[arg(long)]
    pub out: String,

    /// Id of the user every exported entity is attributed to.
    #[arg(long, default_value_t = DEFAULT_AUTHOR_ID)]
    pub author_id: u32,

    /// Language tag written on every exported post.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,
}
