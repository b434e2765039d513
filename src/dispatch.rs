// src/dispatch.rs
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::fetch::{FetchResult, Fetcher};
use crate::types::{Article, FeedSource, FetchOutcome, ValidatorRecord};
use crate::validators::{store_key, ValidatorStore};

/// Fan-in of one dispatch round: every source's articles concatenated, the
/// validator updates keyed for the store, and one outcome per source.
#[derive(Debug, Default)]
pub struct DispatchResult {
    pub articles: Vec<Article>,
    pub validators: HashMap<String, ValidatorRecord>,
    pub outcomes: Vec<(String, FetchOutcome)>,
}

/// Runs fetch tasks over all sources under a concurrency bound. Every task
/// runs to completion or terminal failure; nothing cancels siblings.
pub struct Dispatcher {
    fetcher: Arc<Fetcher>,
    max_concurrency: usize,
}

impl Dispatcher {
    pub fn new(fetcher: Fetcher, max_concurrency: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub async fn fetch_all(&self, sources: &[FeedSource], store: &ValidatorStore) -> DispatchResult {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources.iter().filter(|s| s.is_valid()) {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let prior = store.get(source).cloned();
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                // Never closed for the lifetime of this call.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed");
                fetcher.fetch(&source, prior.as_ref()).await
            }));
        }

        let mut result = DispatchResult::default();
        for handle in handles {
            match handle.await {
                Ok(fetched) => collect(&mut result, fetched),
                Err(e) => {
                    // A panicked task is a failed source, not a failed run.
                    tracing::error!(error = ?e, "fetch task aborted");
                }
            }
        }
        result
    }
}

fn collect(result: &mut DispatchResult, fetched: FetchResult) {
    if let Some(record) = fetched.validators {
        result.validators.insert(store_key(&fetched.source), record);
    }
    result
        .outcomes
        .push((fetched.source.name.clone(), fetched.outcome));
    result.articles.extend(fetched.articles);
}
