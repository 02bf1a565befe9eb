use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    blogmigrate::logging::init().context("init logging")?;

    let cli = blogmigrate::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        blogmigrate::cli::Command::Run(args) => {
            let config = blogmigrate::config::RunConfig::from_args(&args).context("config")?;
            let fetcher = blogmigrate::cache::HttpFetcher::new(config.timeout)?;
            let cache = blogmigrate::cache::OfflineCache::new(Arc::new(fetcher));
            let report = blogmigrate::pipeline::run(&config, &cache, chrono::Utc::now())
                .context("run")?;
            if !report.failures.is_empty() {
                tracing::warn!(
                    failures = report.failures.len(),
                    "some pages were skipped; re-run to retry the ones that could not be fetched"
                );
            }
        }
        blogmigrate::cli::Command::Export(args) => {
            blogmigrate::pipeline::export(&args).context("export")?;
        }
    }

    Ok(())
}
