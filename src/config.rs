// src/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::FeedSource;

const ENV_PATH: &str = "FEEDMUX_CONFIG_PATH";

/// Runtime knobs for one pipeline run. Defaults mirror the CLI defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feeds: Vec<FeedSource>,
    pub cache_dir: PathBuf,
    pub max_age: chrono::Duration,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub backoff_base: Duration,
    pub max_concurrency: usize,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            cache_dir: PathBuf::from(".cache"),
            max_age: chrono::Duration::hours(24),
            request_timeout: Duration::from_secs(5),
            retry_attempts: 2,
            backoff_base: Duration::from_secs(1),
            max_concurrency: 20,
            user_agent: concat!("feedmux/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct FeedsFile {
    #[serde(default)]
    feeds: Vec<RawFeedEntry>,
}

/// Entries may be partially filled (hand-edited configs); anything without
/// both fields is skipped before any network call.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct RawFeedEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Load the feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
}

/// Load the feed list using env var + fallbacks:
/// 1) $FEEDMUX_CONFIG_PATH
/// 2) ~/.config/feedmux/config.toml, then config.json
/// 3) ./config.toml, then ./config.json
///
/// An unreadable candidate is logged and skipped; no candidate at all yields
/// an empty list (the run then ends cleanly with "no feeds").
pub fn load_feeds_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        return Err(anyhow!("FEEDMUX_CONFIG_PATH points to non-existent path"));
    }
    for candidate in candidate_paths() {
        if !candidate.exists() {
            continue;
        }
        match load_feeds_from(&candidate) {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::error!(error = ?e, path = %candidate.display(), "skipping unreadable config");
            }
        }
    }
    Ok(Vec::new())
}

/// Default location OPML import writes to.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("feedmux").join("config.json"))
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut v = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("feedmux").join("config.toml"));
        v.push(dir.join("feedmux").join("config.json"));
    }
    v.push(PathBuf::from("config.toml"));
    v.push(PathBuf::from("config.json"));
    v
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed config format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    let v: FeedsFile = toml::from_str(s)?;
    Ok(clean_entries(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: FeedsFile = serde_json::from_str(s)?;
    Ok(clean_entries(v.feeds))
}

fn clean_entries(entries: Vec<RawFeedEntry>) -> Vec<FeedSource> {
    entries
        .into_iter()
        .filter_map(|e| {
            let name = e.name.map(|n| n.trim().to_string()).unwrap_or_default();
            let url = e.url.map(|u| u.trim().to_string()).unwrap_or_default();
            let src = FeedSource { name, url };
            src.is_valid().then_some(src)
        })
        .collect()
}

/// Serialize a feed list into the JSON config shape (used by OPML import).
pub fn write_feeds(path: &Path, feeds: &[FeedSource]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config dir {}", parent.display()))?;
    }
    let file = FeedsFile {
        feeds: feeds
            .iter()
            .map(|f| RawFeedEntry {
                name: Some(f.name.clone()),
                url: Some(f.url.clone()),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json).with_context(|| format!("writing feed config {}", path.display()))
}
