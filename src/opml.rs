// src/opml.rs
use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config;
use crate::types::FeedSource;

#[derive(Debug, Deserialize)]
struct Opml {
    body: Body,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(rename = "outline", default)]
    outlines: Vec<Outline>,
}

/// OPML outlines nest arbitrarily; folders carry children, feeds carry an
/// `xmlUrl` attribute.
#[derive(Debug, Deserialize)]
struct Outline {
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@text")]
    text: Option<String>,
    #[serde(rename = "@xmlUrl")]
    xml_url: Option<String>,
    #[serde(rename = "outline", default)]
    children: Vec<Outline>,
}

/// Parse an OPML document into the feed-source list. Outlines without an
/// `xmlUrl` or any usable name are skipped; folder nesting is flattened.
pub fn parse_opml(content: &str) -> Result<Vec<FeedSource>> {
    let doc: Opml = from_str(content).context("parsing opml document")?;
    let mut feeds = Vec::new();
    collect(&doc.body.outlines, &mut feeds);
    Ok(feeds)
}

fn collect(outlines: &[Outline], feeds: &mut Vec<FeedSource>) {
    for outline in outlines {
        if let Some(url) = outline.xml_url.as_deref() {
            let name = outline
                .title
                .as_deref()
                .or(outline.text.as_deref())
                .unwrap_or_default();
            let src = FeedSource {
                name: name.trim().to_string(),
                url: url.trim().to_string(),
            };
            if src.is_valid() {
                feeds.push(src);
            }
        }
        collect(&outline.children, feeds);
    }
}

/// Import mode: read an OPML file and write the JSON feed config. Zero valid
/// feeds is a terminal error for the import run.
pub fn import_to_config(opml_path: &Path) -> Result<()> {
    let content = fs::read_to_string(opml_path)
        .with_context(|| format!("reading opml file {}", opml_path.display()))?;
    let feeds = parse_opml(&content)?;
    if feeds.is_empty() {
        return Err(anyhow!("no valid feeds inside OPML"));
    }
    let target = config::default_config_path()
        .ok_or_else(|| anyhow!("no config directory available on this platform"))?;
    config::write_feeds(&target, &feeds)?;
    tracing::info!(count = feeds.len(), path = %target.display(), "imported feeds");
    Ok(())
}
