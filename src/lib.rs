// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod merge;
pub mod opml;
pub mod picker;
pub mod pipeline;
pub mod types;
pub mod validators;

// ---- Re-exports for stable public API ----
pub use crate::cache::ArticleCache;
pub use crate::config::AppConfig;
pub use crate::dispatch::{DispatchResult, Dispatcher};
pub use crate::fetch::{FetchResult, Fetcher};
pub use crate::merge::merge;
pub use crate::types::{Article, FeedSource, FetchOutcome, ValidatorRecord, NO_LINK};
pub use crate::validators::ValidatorStore;
