// src/types.rs
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;

/// Placeholder stored when a feed entry carries no usable link. Articles with
/// this link (or an empty one) are excluded from dedup, cache, and output.
pub const NO_LINK: &str = "No link";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub source: String, // cache partition key, e.g. "Hacker News"
    pub title: String,
    pub link: String, // absolute URL; NO_LINK when the entry had none
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Article {
    /// Line handed to the picker; also the selection key on the way back.
    pub fn display_line(&self) -> String {
        format!("{} | {}", self.source, self.title)
    }

    /// True when the link can identify this article (dedup, browser open).
    pub fn has_link(&self) -> bool {
        !self.link.is_empty() && self.link != NO_LINK
    }
}

/// One configured feed. `name` is unique and keys the cache partition; a
/// renamed source is a different source as far as cached articles go.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.url.is_empty()
    }
}

/// Validation headers from the last successful fetch of one source, replayed
/// as `If-None-Match` / `If-Modified-Since` preconditions.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ValidatorRecord {
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl ValidatorRecord {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Per-source fetch outcome for the observability side-channel. Failure here
/// is scoped to one source and never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh body fetched and parsed; `kept` entries survived the freshness cut.
    Fetched { kept: usize },
    /// Server confirmed our validators; prior cache stands.
    NotModified,
    /// Retry budget exhausted (or the descriptor was unusable).
    Failed { attempts: u32, reason: String },
}

/// Strip markup from feed-supplied text: decode HTML entities, drop tags,
/// collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}
