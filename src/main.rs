//! geo-harvest command-line entry point
//!
//! Reads an Identifier file, harvests the linked GEO records and writes the
//! result as JSON.

use anyhow::Context;
use clap::Parser;
use geo_harvest::{Config, Harvester, NoOpAnalysisBackend, harvest_with_shutdown, input};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Harvest GEO dataset records linked from PubMed identifiers
#[derive(Debug, Parser)]
#[command(name = "geo-harvest", version, about)]
struct Cli {
    /// File with one PubMed identifier per line
    #[arg(short, long)]
    file: PathBuf,

    /// NCBI API key (raises the E-utilities rate limit)
    #[arg(short, long, env = "NCBI_API_KEY")]
    key: Option<String>,

    /// JSON configuration file; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of identifiers harvested concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write the harvest here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(key) = &self.key {
            config.api_key = Some(key.clone());
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent_workers = jobs;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let identifiers = input::read_identifiers(&cli.file)
        .await
        .with_context(|| format!("reading identifiers from {}", cli.file.display()))?;

    let harvester = Harvester::new(config).context("invalid configuration")?;
    let harvest = harvest_with_shutdown(&harvester, &identifiers).await;

    match geo_harvest::run_pipeline(&NoOpAnalysisBackend, &harvest, None).await {
        Ok(report) => tracing::info!(
            backend = report.backend,
            clusters = report.cluster_count,
            "Analysis complete"
        ),
        Err(e) => tracing::info!(reason = %e, "Analysis skipped"),
    }

    let json = serde_json::to_string_pretty(&harvest)?;
    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), records = harvest.records.len(), "Wrote harvest");
        }
        None => println!("{json}"),
    }

    Ok(())
}
