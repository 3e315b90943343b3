// src/scrape/mod.rs
pub mod rss;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::FeedEntry;
use crate::store::NewsDocument;

use self::types::SourceFeed;

/// Normalize scraped text: decode HTML entities, strip tags, collapse
/// whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

pub fn feeds_from_config(entries: &[FeedEntry]) -> Vec<Box<dyn SourceFeed>> {
    entries
        .iter()
        .map(|e| Box::new(rss::RssFeed::from_url(&e.name, &e.rss)) as Box<dyn SourceFeed>)
        .collect()
}

/// Fetch every source and assemble the cache document. A failing source is
/// logged and skipped; only all sources failing is an error.
pub async fn run_scrape(sources: &[Box<dyn SourceFeed>]) -> Result<NewsDocument> {
    let mut collected = Vec::with_capacity(sources.len());
    for source in sources {
        match source.fetch_latest().await {
            Ok(news) => {
                tracing::debug!(
                    source = source.name(),
                    articles = news.articles.len(),
                    "source fetched"
                );
                collected.push((source.name().to_string(), news));
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = source.name(), "source fetch failed");
            }
        }
    }
    if collected.is_empty() && !sources.is_empty() {
        anyhow::bail!("all {} sources failed", sources.len());
    }
    NewsDocument::from_sources(collected)
}

/// Scrape and persist the cache: write a temp file, then rename it over the
/// old document so a concurrent reader never sees a partial write.
pub async fn scrape_to_cache(
    sources: &[Box<dyn SourceFeed>],
    cache_path: &Path,
) -> Result<NewsDocument> {
    let doc = run_scrape(sources).await?;
    let raw = serde_json::to_string_pretty(&doc).context("encoding news cache")?;
    let tmp = cache_path.with_extension("json.tmp");
    tokio::fs::write(&tmp, raw)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, cache_path)
        .await
        .with_context(|| format!("replacing {}", cache_path.display()))?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "<p>Rate cut &amp; what it\n\nmeans</p>";
        assert_eq!(normalize_text(s), "Rate cut & what it means");
    }

    #[test]
    fn normalize_handles_plain_text() {
        assert_eq!(normalize_text("  already clean  "), "already clean");
        assert_eq!(normalize_text(""), "");
    }
}
