use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use floorwatch::config::Config;
use floorwatch::duration::{format_duration, parse_duration};
use floorwatch::listings::{
    run_refresh_cycle, ListingSource, ListingsStore, MagicEdenSource, OpenSeaSource,
    RefreshScheduler,
};

#[derive(Parser)]
#[command(name = "floorwatch")]
#[command(about = "Best-offer aggregation for a fixed NFT collection")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "floorwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the resolved configuration
    Config,
    /// Run a single refresh cycle and print the snapshot as JSON
    Once {
        /// Override the per-source page bound
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Run the refresh scheduler until interrupted
    Run {
        /// Override the refresh interval (e.g. "90s", "5m")
        #[arg(long, value_parser = parse_duration)]
        interval: Option<Duration>,
    },
}

fn build_sources(config: &Config) -> Vec<Arc<dyn ListingSource>> {
    let mut opensea = OpenSeaSource::new(&config.collection.slug, &config.collection.contract)
        .with_base_url(&config.opensea.api_base)
        .with_page_limit(config.refresh.page_limit);
    if let Some(key) = &config.opensea.api_key {
        opensea = opensea.with_api_key(key.clone());
    }

    let mut magiceden = MagicEdenSource::new(&config.collection.contract)
        .with_base_url(&config.magiceden.api_base)
        .with_source_domain(&config.magiceden.source_domain)
        .with_page_limit(config.refresh.page_limit);
    if let Some(key) = &config.magiceden.api_key {
        magiceden = magiceden.with_api_key(key.clone());
    }

    vec![Arc::new(opensea), Arc::new(magiceden)]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            // API keys are skipped during serialization.
            print!("{}", toml::to_string_pretty(&config)?);
            println!(
                "opensea api key: {}",
                if config.opensea.api_key.is_some() { "set" } else { "unset" }
            );
            println!(
                "magiceden api key: {}",
                if config.magiceden.api_key.is_some() { "set" } else { "unset" }
            );
        }
        Command::Once { max_pages } => {
            let sources = build_sources(&config);
            let max_pages = max_pages.unwrap_or(config.refresh.max_pages);

            let (snapshot, report) = run_refresh_cycle(&sources, max_pages).await;
            for source in &report.sources {
                info!(
                    marketplace = %source.marketplace,
                    listings = source.listings,
                    pages_fetched = source.pages_fetched,
                    truncated = source.truncated,
                    error = source.error.as_deref(),
                    "source finished"
                );
            }
            if let Some(error) = &report.error {
                anyhow::ensure!(
                    !report.all_failed(),
                    "refresh cycle failed: {error}"
                );
            }

            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Run { interval } => {
            let sources = build_sources(&config);
            let store = Arc::new(ListingsStore::new());
            let interval = interval.unwrap_or(config.refresh.interval);

            info!(
                collection = %config.collection.slug,
                interval = %format_duration(interval),
                "starting floorwatch"
            );

            let scheduler = RefreshScheduler::new(
                sources,
                store.clone(),
                interval,
                config.refresh.max_pages,
            );
            let handle = scheduler.handle();
            let runner = tokio::spawn(scheduler.run());

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for ctrl-c")?;
            info!("interrupt received, shutting down");
            handle.shutdown();

            runner.await.context("Scheduler task panicked")?;

            if let Some(cycle) = store.last_cycle() {
                info!(
                    tokens = store.listed_count(),
                    completed_at = %cycle.completed_at,
                    "final snapshot"
                );
            }
        }
    }

    Ok(())
}
