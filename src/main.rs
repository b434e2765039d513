//! feedmux — Binary entrypoint.
//! Aggregates configured feeds into one deduplicated, freshness-ranked list,
//! then hands the result to the fzf picker (or prints it with --no-picker).

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use feedmux::{config, opml, picker, pipeline};

#[derive(Parser, Debug)]
#[command(name = "feedmux", about = "Concurrent feed aggregator with a time-windowed cache")]
struct Cli {
    /// Import an OPML file and write ~/.config/feedmux/config.json, then exit
    #[arg(short = 'p', long, value_name = "FILE")]
    opml: Option<PathBuf>,

    /// Path to the feed config (default: ~/.config/feedmux/config.{toml,json},
    /// then ./config.{toml,json})
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the article cache and validator store
    #[arg(long, default_value = ".cache")]
    cache_dir: PathBuf,

    /// Freshness window in hours
    #[arg(long, default_value_t = 24)]
    max_age_hours: i64,

    /// Per-attempt request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Additional attempts after a failed fetch
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Maximum simultaneous in-flight fetches
    #[arg(long, default_value_t = 20)]
    concurrency: usize,

    /// Print the merged list instead of prompting with fzf
    #[arg(long)]
    no_picker: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedmux=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Some(opml_path) = &cli.opml {
        return opml::import_to_config(opml_path);
    }

    let feeds = match &cli.config {
        Some(path) => config::load_feeds_from(path)?,
        None => config::load_feeds_default()?,
    };
    if feeds.is_empty() {
        tracing::warn!("no feeds configured; nothing to do");
        return Ok(());
    }

    let cfg = config::AppConfig {
        feeds,
        cache_dir: cli.cache_dir,
        max_age: chrono::Duration::hours(cli.max_age_hours),
        request_timeout: std::time::Duration::from_secs(cli.timeout_secs),
        retry_attempts: cli.retries,
        max_concurrency: cli.concurrency,
        ..config::AppConfig::default()
    };

    let articles = pipeline::run(&cfg).await?;
    if articles.is_empty() {
        tracing::info!("no articles");
        return Ok(());
    }

    if cli.no_picker {
        for a in &articles {
            println!("{}", a.display_line());
        }
        return Ok(());
    }

    let options: Vec<String> = articles.iter().map(|a| a.display_line()).collect();
    loop {
        let Some(selected) = picker::choose(&options) else {
            break;
        };
        if let Some(article) = articles
            .iter()
            .find(|a| a.display_line() == selected && a.has_link())
        {
            picker::open_in_browser(&article.link);
        }
    }
    Ok(())
}
