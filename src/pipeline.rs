use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Datelike as _, Utc};

use crate::archive::{ArchivePage, archive_pages};
use crate::cache::OfflineCache;
use crate::cli::ExportArgs;
use crate::config::RunConfig;
use crate::error::{FailureKind, UnitFailure};
use crate::export::{ExportOptions, build_export};
use crate::formats::{ExportDocument, Post, PostStub};
use crate::pool::WorkerPool;
use crate::post::PostHydrator;
use crate::rewrite::LinkRules;
use crate::store;
use crate::summary::{dedup_stubs, extract_stubs_from_file};

/// Outcome of one full run.
#[derive(Debug)]
pub struct RunReport {
    pub archive_pages: usize,
    /// Distinct stubs discovered across every available archive page.
    pub stubs_found: usize,
    /// Stubs written by the configured author.
    pub stubs_matched: usize,
    pub posts: Vec<Post>,
    pub failures: Vec<UnitFailure>,
    pub document: ExportDocument,
}

pub fn run(config: &RunConfig, cache: &OfflineCache, now: DateTime<Utc>) -> anyhow::Result<RunReport> {
    let pool = WorkerPool::new(config.workers)?;
    tracing::info!(
        blog = %config.blog_url,
        author = %config.author,
        workers = pool.workers(),
        work_dir = %config.work_dir.display(),
        "starting migration"
    );

    let pages = archive_pages(&config.blog_url, config.first_year, now.year())
        .collect::<anyhow::Result<Vec<_>>>()
        .context("enumerate archive pages")?;
    let mut failures = Vec::new();

    let stubs = collect_stubs(config, cache, &pool, &pages, &mut failures);
    let stubs_found = stubs.len();
    let matched = stubs
        .into_iter()
        .filter(|stub| stub.author.trim() == config.author)
        .collect::<Vec<_>>();
    tracing::info!(found = stubs_found, matched = matched.len(), "post summaries extracted");

    let hydrator = PostHydrator::new(
        cache.clone(),
        LinkRules::new(&config.old_base_url, &config.new_base_url, &config.asset_prefix),
        config.posts_dir(),
        config.assets_dir(),
    );
    let results = pool.map(&matched, |stub| {
        let result = hydrator.hydrate(stub);
        match &result {
            Ok(_) => tracing::info!(url = %stub.full_url, "post transformed"),
            Err(err) => tracing::warn!(url = %stub.full_url, error = %err, "post dropped"),
        }
        result
    });

    let mut posts = Vec::with_capacity(results.len());
    for (stub, result) in matched.iter().zip(results) {
        match result {
            Ok(post) => posts.push(post),
            Err(err) => failures.push(UnitFailure {
                url: stub.full_url.clone(),
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    store::write_json_pretty(&config.posts_json(), &posts).context("write post list")?;
    let document = build_export(&posts, &config.export, now);
    store::write_json_pretty(&config.export_json(), &document).context("write export document")?;

    tracing::info!(
        posts = posts.len(),
        failures = failures.len(),
        export = %config.export_json().display(),
        assets = %config.assets_dir().display(),
        upload_to = %config.asset_prefix,
        "migration finished; upload the assets folder to the asset prefix on the new site"
    );

    Ok(RunReport {
        archive_pages: pages.len(),
        stubs_found,
        stubs_matched: matched.len(),
        posts,
        failures,
        document,
    })
}

/// Caches every archive page and extracts stubs in discovery order.
fn collect_stubs(
    config: &RunConfig,
    cache: &OfflineCache,
    pool: &WorkerPool,
    pages: &[ArchivePage],
    failures: &mut Vec<UnitFailure>,
) -> Vec<PostStub> {
    let summaries_dir = config.summaries_dir();
    let extracted = pool.map(pages, |page| {
        let path = page.cache_path(&summaries_dir);
        if !cache.ensure(&page.url, &path).is_available() {
            return Err(UnitFailure {
                url: page.url.to_string(),
                kind: FailureKind::Unavailable,
                message: format!("archive page not cached: {}", path.display()),
            });
        }
        extract_stubs_from_file(&path, &config.old_base_url).map_err(|err| {
            tracing::warn!(url = %page.url, error = %format!("{err:#}"), "archive page dropped");
            UnitFailure {
                url: page.url.to_string(),
                kind: FailureKind::Structure,
                message: format!("{err:#}"),
            }
        })
    });

    let mut stubs = Vec::new();
    for result in extracted {
        match result {
            Ok(found) => stubs.extend(found),
            Err(failure) => failures.push(failure),
        }
    }
    dedup_stubs(stubs)
}

/// Re-runs only the export step over a previously written post list.
pub fn export(args: &ExportArgs) -> anyhow::Result<ExportDocument> {
    let posts = store::read_posts(Path::new(&args.posts))?;
    let options = ExportOptions {
        author_id: args.author_id,
        language: args.language.clone(),
    };
    let document = build_export(&posts, &options, Utc::now());
    store::write_json_pretty(Path::new(&args.out), &document)
        .with_context(|| format!("write export document: {}", args.out))?;
    tracing::info!(
        posts = document.data.posts.len(),
        tags = document.data.tags.len(),
        out = %args.out,
        "export written"
    );
    Ok(document)
}
