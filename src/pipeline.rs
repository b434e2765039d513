// src/pipeline.rs
use anyhow::Result;
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

use crate::cache::ArticleCache;
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::fetch::Fetcher;
use crate::merge::merge;
use crate::types::{Article, FetchOutcome};
use crate::validators::ValidatorStore;

const CACHE_FILE: &str = "rss_cache.json";
const VALIDATORS_FILE: &str = "validators.json";

/// One-time metrics registration (no-op unless the host installs a recorder).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_sources_total", "Sources dispatched per run.");
        describe_counter!("fetch_errors_total", "Sources whose retry budget ran out.");
        describe_counter!(
            "fetch_not_modified_total",
            "Sources answered 304 against stored validators."
        );
        describe_counter!("articles_fetched_total", "Fresh articles kept after the freshness cut.");
        describe_counter!("articles_cached_total", "Cached articles surviving the load filter.");
        describe_counter!("articles_merged_total", "Articles in the final merged list.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Run the fetch–retry–cache–merge pipeline once and return the merged,
/// deduplicated, freshness-bounded article list.
///
/// Per-source failures are contained inside the fetcher; cache and validator
/// persistence failures are logged and do not affect the returned list. An
/// empty feed list yields an empty run, cleanly.
pub async fn run(cfg: &AppConfig) -> Result<Vec<Article>> {
    ensure_metrics_described();

    let sources: Vec<_> = cfg.feeds.iter().filter(|s| s.is_valid()).cloned().collect();
    if sources.is_empty() {
        tracing::warn!("no feeds configured");
        return Ok(Vec::new());
    }

    let now = Utc::now();
    let cache = ArticleCache::new(cfg.cache_dir.join(CACHE_FILE), cfg.max_age);
    let current_names: HashSet<String> = sources.iter().map(|s| s.name.clone()).collect();
    let cached = cache.load(&current_names, now);

    let mut validator_store = ValidatorStore::load(cfg.cache_dir.join(VALIDATORS_FILE));
    let dispatcher = Dispatcher::new(Fetcher::new(cfg)?, cfg.max_concurrency);
    let dispatched = dispatcher.fetch_all(&sources, &validator_store).await;

    counter!("fetch_sources_total").increment(dispatched.outcomes.len() as u64);
    for (source, outcome) in &dispatched.outcomes {
        match outcome {
            FetchOutcome::Fetched { kept } => {
                tracing::info!(source = %source, kept = kept, "fetched");
            }
            FetchOutcome::NotModified => {
                counter!("fetch_not_modified_total").increment(1);
                tracing::info!(source = %source, "not modified");
            }
            FetchOutcome::Failed { attempts, reason } => {
                counter!("fetch_errors_total").increment(1);
                tracing::warn!(source = %source, attempts = attempts, reason = %reason, "source failed");
            }
        }
    }

    counter!("articles_fetched_total").increment(dispatched.articles.len() as u64);
    counter!("articles_cached_total").increment(cached.len() as u64);

    let merged = merge(dispatched.articles, cached);
    counter!("articles_merged_total").increment(merged.len() as u64);

    if let Err(e) = cache.save(&merged, now) {
        tracing::error!(error = ?e, "cache write failed");
    }

    validator_store.apply(dispatched.validators);
    validator_store.retain_sources(&sources);
    if let Err(e) = validator_store.save() {
        tracing::error!(error = ?e, "validator store write failed");
    }

    gauge!("pipeline_last_run_ts").set(now.timestamp().max(0) as f64);
    tracing::info!(articles = merged.len(), "run complete");
    Ok(merged)
}
