// src/merge.rs
use std::collections::HashSet;

use crate::types::Article;

/// Combine freshly fetched articles with the cached batch into one ordered,
/// link-deduplicated list. Fresh articles come first in arrival order and win
/// any link collision (their title may have been updated upstream); cached
/// articles follow in arrival order, skipping links already emitted. Articles
/// without a usable link are dropped entirely.
pub fn merge(fresh: Vec<Article>, cached: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(fresh.len() + cached.len());
    for article in fresh.into_iter().chain(cached) {
        if article.has_link() && seen.insert(article.link.clone()) {
            merged.push(article);
        }
    }
    merged
}
