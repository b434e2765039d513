// tests/pipeline_scenarios.rs
mod common;

use common::*;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use feedmux::{pipeline, AppConfig, Article, ArticleCache, FeedSource, ValidatorStore};

fn run_config(cache_dir: &Path, feeds: Vec<FeedSource>) -> AppConfig {
    AppConfig {
        feeds,
        cache_dir: cache_dir.to_path_buf(),
        request_timeout: Duration::from_secs(5),
        retry_attempts: 0,
        backoff_base: Duration::from_millis(1),
        max_concurrency: 8,
        ..AppConfig::default()
    }
}

fn source(name: &str, url: &str) -> FeedSource {
    FeedSource {
        name: name.into(),
        url: url.into(),
    }
}

fn cached_article(source: &str, title: &str, link: &str, hours_ago: i64) -> Article {
    Article {
        source: source.into(),
        title: title.into(),
        link: link.into(),
        timestamp: recent(hours_ago),
        summary: None,
    }
}

fn seed_cache(cache_dir: &Path, articles: &[Article]) {
    ArticleCache::new(cache_dir.join("rss_cache.json"), chrono::Duration::hours(24))
        .save(articles, Utc::now())
        .unwrap();
}

#[tokio::test]
async fn partial_failure_keeps_the_surviving_sources() {
    let one = spawn_server(|_| http_ok(&rss_feed(&[("from one", "https://one.test/1", recent(1))]))).await;
    let three = spawn_server(|_| http_ok(&rss_feed(&[("from three", "https://three.test/1", recent(1))]))).await;
    let dead = unreachable_url().await;

    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(
        tmp.path(),
        vec![
            source("One", &one.url),
            source("Two", &dead),
            source("Three", &three.url),
        ],
    );

    let merged = pipeline::run(&cfg).await.unwrap();
    let sources: HashSet<&str> = merged.iter().map(|a| a.source.as_str()).collect();
    assert_eq!(merged.len(), 2);
    assert_eq!(sources, HashSet::from(["One", "Three"]));
}

#[tokio::test]
async fn two_source_scenario_with_cache_overlap() {
    // A serves 3 fresh articles, one of them linkless; B is unreachable.
    let a = spawn_server(|_| {
        http_ok(&rss_feed(&[
            ("fresh new", "https://a.test/new", recent(1)),
            ("fresh shared", "https://a.test/shared", recent(1)),
            ("linkless", "", recent(1)),
        ]))
    })
    .await;
    let b = unreachable_url().await;

    let tmp = tempfile::tempdir().unwrap();
    // Prior cache: two A articles (one overlapping a fresh link) and one for
    // the no-longer-configured source C.
    seed_cache(
        tmp.path(),
        &[
            cached_article("A", "cached shared", "https://a.test/shared", 3),
            cached_article("A", "cached leftover", "https://a.test/leftover", 3),
            cached_article("C", "forgotten", "https://c.test/1", 3),
        ],
    );

    let cfg = run_config(tmp.path(), vec![source("A", &a.url), source("B", &b)]);
    let merged = pipeline::run(&cfg).await.unwrap();

    assert_eq!(merged.len(), 3);
    let links_and_titles: Vec<(&str, &str)> = merged
        .iter()
        .map(|a| (a.link.as_str(), a.title.as_str()))
        .collect();
    // Fresh articles first, the fresh title winning the shared link; the
    // non-overlapping cached article trails; C never loaded.
    assert_eq!(
        links_and_titles,
        vec![
            ("https://a.test/new", "fresh new"),
            ("https://a.test/shared", "fresh shared"),
            ("https://a.test/leftover", "cached leftover"),
        ]
    );
}

#[tokio::test]
async fn empty_run_deletes_the_snapshot() {
    let a = spawn_server(|_| http_ok(&rss_feed(&[]))).await;

    let tmp = tempfile::tempdir().unwrap();
    // Only a stale cached article; the load filter drops it, the merge comes
    // out empty, and the snapshot must be deleted rather than rewritten.
    seed_cache(
        tmp.path(),
        &[cached_article("A", "stale", "https://a.test/old", 48)],
    );
    assert!(tmp.path().join("rss_cache.json").exists());

    let cfg = run_config(tmp.path(), vec![source("A", &a.url)]);
    let merged = pipeline::run(&cfg).await.unwrap();

    assert!(merged.is_empty());
    assert!(!tmp.path().join("rss_cache.json").exists());
}

#[tokio::test]
async fn not_modified_leaves_cached_articles_intact() {
    let a = spawn_server(|req| {
        if req.to_ascii_lowercase().contains("if-none-match") {
            http_not_modified()
        } else {
            http_ok_with_etag(
                &rss_feed(&[("first run article", "https://a.test/1", recent(1))]),
                "\"gen-1\"",
            )
        }
    })
    .await;

    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path(), vec![source("A", &a.url)]);

    // First run fetches fresh and persists both stores.
    let first = pipeline::run(&cfg).await.unwrap();
    assert_eq!(first.len(), 1);
    let store = ValidatorStore::load(tmp.path().join("validators.json"));
    let record = store.get(&cfg.feeds[0]).expect("validator record persisted");
    assert_eq!(record.etag.as_deref(), Some("\"gen-1\""));

    // Second run gets a 304; the article survives through the cache merge.
    let second = pipeline::run(&cfg).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].title, "first run article");
    assert_eq!(a.hits(), 2);
}

#[tokio::test]
async fn empty_configuration_ends_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = run_config(tmp.path(), Vec::new());
    let merged = pipeline::run(&cfg).await.unwrap();
    assert!(merged.is_empty());
    assert!(!tmp.path().join("rss_cache.json").exists());
}
