// src/fetch.rs
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::types::{clean_text, Article, FeedSource, FetchOutcome, ValidatorRecord, NO_LINK};

/// Result of fetching one source: the surviving articles, the validator
/// record to persist (only on a fresh 2xx fetch), and the outcome for the
/// observability side-channel. Failures never cross this boundary as errors.
#[derive(Debug)]
pub struct FetchResult {
    pub source: FeedSource,
    pub articles: Vec<Article>,
    pub validators: Option<ValidatorRecord>,
    pub outcome: FetchOutcome,
}

/// Narrow view of one parsed feed entry; everything the pipeline needs and
/// nothing the concrete parser type leaks.
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl From<feed_rs::model::Entry> for FeedEntry {
    fn from(entry: feed_rs::model::Entry) -> Self {
        Self {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            // Prefer the explicit publication instant, fall back to updated.
            published: entry.published.or(entry.updated),
            summary: entry.summary.map(|t| t.content),
        }
    }
}

/// Performs one HTTP retrieval + parse per source, with conditional-request
/// short-circuiting and retry/backoff. One instance is shared by all
/// dispatcher tasks; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    retry_attempts: u32,
    backoff_base: Duration,
    max_age: chrono::Duration,
}

enum Attempt {
    Success {
        articles: Vec<Article>,
        validators: ValidatorRecord,
    },
    NotModified,
    Retry(anyhow::Error),
}

impl Fetcher {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            retry_attempts: cfg.retry_attempts,
            backoff_base: cfg.backoff_base,
            max_age: cfg.max_age,
        })
    }

    /// Fetch one source. Consumes at most `retry_attempts + 1` request
    /// attempts; a 304 response short-circuits as success with zero articles.
    pub async fn fetch(&self, source: &FeedSource, prior: Option<&ValidatorRecord>) -> FetchResult {
        if !source.is_valid() {
            return FetchResult {
                source: source.clone(),
                articles: Vec::new(),
                validators: None,
                outcome: FetchOutcome::Failed {
                    attempts: 0,
                    reason: "missing name or url".into(),
                },
            };
        }

        let mut attempt_no = 0u32;
        loop {
            match self.attempt(source, prior).await {
                Attempt::Success {
                    articles,
                    validators,
                } => {
                    let kept = articles.len();
                    return FetchResult {
                        source: source.clone(),
                        articles,
                        validators: Some(validators),
                        outcome: FetchOutcome::Fetched { kept },
                    };
                }
                Attempt::NotModified => {
                    return FetchResult {
                        source: source.clone(),
                        articles: Vec::new(),
                        validators: None,
                        outcome: FetchOutcome::NotModified,
                    };
                }
                Attempt::Retry(e) if attempt_no < self.retry_attempts => {
                    tracing::warn!(
                        error = ?e,
                        source = %source.name,
                        attempt = attempt_no + 1,
                        "fetch attempt failed, retrying"
                    );
                    tokio::time::sleep(self.backoff_base * 2u32.pow(attempt_no)).await;
                    attempt_no += 1;
                }
                Attempt::Retry(e) => {
                    tracing::error!(error = ?e, source = %source.name, "fetch failed");
                    return FetchResult {
                        source: source.clone(),
                        articles: Vec::new(),
                        validators: None,
                        outcome: FetchOutcome::Failed {
                            attempts: attempt_no + 1,
                            reason: e.to_string(),
                        },
                    };
                }
            }
        }
    }

    async fn attempt(&self, source: &FeedSource, prior: Option<&ValidatorRecord>) -> Attempt {
        let mut req = self.client.get(&source.url);
        if let Some(v) = prior {
            if let Some(etag) = &v.etag {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(lm) = &v.last_modified {
                req = req.header(IF_MODIFIED_SINCE, lm);
            }
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(anyhow::Error::new(e).context("sending request")),
        };

        if resp.status() == StatusCode::NOT_MODIFIED {
            return Attempt::NotModified;
        }
        if !resp.status().is_success() {
            return Attempt::Retry(anyhow!("http status {}", resp.status()));
        }

        let validators = ValidatorRecord {
            etag: header_string(&resp, ETAG),
            last_modified: header_string(&resp, LAST_MODIFIED),
        };

        let body = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => return Attempt::Retry(anyhow::Error::new(e).context("reading body")),
        };

        // A malformed feed retries like a transport failure.
        let parsed = match feed_rs::parser::parse(body.as_ref()) {
            Ok(f) => f,
            Err(e) => return Attempt::Retry(anyhow::Error::new(e).context("parsing feed")),
        };

        let base = Url::parse(&source.url).ok();
        let now = Utc::now();
        let articles = parsed
            .entries
            .into_iter()
            .map(FeedEntry::from)
            .filter_map(|entry| article_from_entry(&source.name, base.as_ref(), entry, now, self.max_age))
            .collect();

        Attempt::Success {
            articles,
            validators,
        }
    }
}

fn header_string(resp: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Build one Article from a parsed entry. Entries with no publication or
/// update instant are dropped, as are entries older than the freshness
/// window (boundary inclusive). Relative links resolve against the feed URL.
pub fn article_from_entry(
    source_name: &str,
    base: Option<&Url>,
    entry: FeedEntry,
    now: DateTime<Utc>,
    max_age: chrono::Duration,
) -> Option<Article> {
    let timestamp = entry.published?;
    if now.signed_duration_since(timestamp) > max_age {
        return None;
    }

    let link = match entry.link.as_deref() {
        Some(href) if !href.is_empty() => resolve_link(base, href),
        _ => NO_LINK.to_string(),
    };

    let title = entry
        .title
        .as_deref()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title".to_string());

    let summary = entry
        .summary
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty());

    Some(Article {
        source: source_name.to_string(),
        title,
        link,
        timestamp,
        summary,
    })
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    match base.and_then(|b| b.join(href).ok()) {
        Some(abs) => abs.to_string(),
        None => href.to_string(),
    }
}
