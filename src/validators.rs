// src/validators.rs
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::types::{FeedSource, ValidatorRecord};

/// Persisted map from source identity to the validation headers of its last
/// successful fetch. Keys are `"name::url"`, so a source whose URL changed
/// starts over with an unconditional request.
#[derive(Debug, Default)]
pub struct ValidatorStore {
    path: PathBuf,
    records: HashMap<String, ValidatorRecord>,
}

fn key(source: &FeedSource) -> String {
    format!("{}::{}", source.name, source.url)
}

impl ValidatorStore {
    /// Load the store from disk. A missing or corrupt file is treated as an
    /// empty store; the next run simply fetches unconditionally.
    pub fn load(path: PathBuf) -> Self {
        let records = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(error = ?e, path = %path.display(), "validator store unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, records }
    }

    pub fn get(&self, source: &FeedSource) -> Option<&ValidatorRecord> {
        self.records.get(&key(source))
    }

    pub fn insert(&mut self, source: &FeedSource, record: ValidatorRecord) {
        self.records.insert(key(source), record);
    }

    /// Fold in the per-key updates collected at the dispatcher fan-in.
    pub fn apply(&mut self, updates: HashMap<String, ValidatorRecord>) {
        self.records.extend(updates);
    }

    /// Drop records for sources no longer configured, matching the cache's
    /// source-membership rule.
    pub fn retain_sources(&mut self, sources: &[FeedSource]) {
        let live: std::collections::HashSet<String> = sources.iter().map(key).collect();
        self.records.retain(|k, _| live.contains(k));
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing validator store {}", self.path.display()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Key helper exposed for the dispatcher's fan-in map.
pub fn store_key(source: &FeedSource) -> String {
    key(source)
}
