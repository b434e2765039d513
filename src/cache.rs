// src/cache.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::types::Article;

/// The persisted article state: replaced wholesale on every successful run,
/// deleted outright when a run produces no articles.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    saved_at: DateTime<Utc>,
    articles: Vec<Article>,
}

/// Time-windowed article snapshot on disk, keyed by source name.
#[derive(Debug)]
pub struct ArticleCache {
    path: PathBuf,
    max_age: chrono::Duration,
}

impl ArticleCache {
    pub fn new(path: PathBuf, max_age: chrono::Duration) -> Self {
        Self { path, max_age }
    }

    /// Load the snapshot, keeping only articles whose source is still
    /// configured and whose age is within the window (boundary inclusive).
    /// A missing or corrupt snapshot loads as empty; the run proceeds.
    pub fn load(&self, current_sources: &HashSet<String>, now: DateTime<Utc>) -> Vec<Article> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(error = ?e, path = %self.path.display(), "cache read failed");
                return Vec::new();
            }
        };
        let snapshot: Snapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = ?e, path = %self.path.display(), "cache unreadable, ignoring");
                return Vec::new();
            }
        };
        snapshot
            .articles
            .into_iter()
            .filter(|a| {
                current_sources.contains(&a.source)
                    && now.signed_duration_since(a.timestamp) <= self.max_age
            })
            .collect()
    }

    /// Persist the merged list. An empty list deletes any existing snapshot
    /// instead of writing `{articles: []}`; absence means "no cache",
    /// unambiguously.
    pub fn save(&self, articles: &[Article], now: DateTime<Utc>) -> Result<()> {
        if articles.is_empty() {
            return self.delete();
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache dir {}", parent.display()))?;
        }
        let snapshot = Snapshot {
            saved_at: now,
            articles: articles.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing cache {}", self.path.display()))
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("deleting cache {}", self.path.display())),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
