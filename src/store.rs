// src/store.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scraped article. Field names match the cache document. Missing fields
/// decode to empty strings rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    /// Full article text as scraped; summaries are derived at render time.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub published: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceNews {
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// The cache document produced by the scrape step, keyed by source name.
/// Source iteration order is document order (serde_json `preserve_order`),
/// which pins the selection order of [`NewsDocument::top_articles`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsDocument {
    #[serde(default)]
    pub newspapers: Map<String, Value>,
}

impl NewsDocument {
    pub fn from_sources(sources: impl IntoIterator<Item = (String, SourceNews)>) -> Result<Self> {
        let mut newspapers = Map::new();
        for (name, news) in sources {
            let value = serde_json::to_value(news)
                .with_context(|| format!("encoding articles for source {name}"))?;
            newspapers.insert(name, value);
        }
        Ok(Self { newspapers })
    }

    /// First `limit` articles across sources: source order, then per-source
    /// article order. Not recency-sorted. Records that fail to decode are
    /// skipped without disturbing the rest.
    pub fn top_articles(&self, limit: usize) -> Vec<Article> {
        let mut out = Vec::with_capacity(limit);
        for (source, val) in &self.newspapers {
            let Some(items) = val.get("articles").and_then(Value::as_array) else {
                continue;
            };
            for item in items {
                if out.len() >= limit {
                    return out;
                }
                match serde_json::from_value::<Article>(item.clone()) {
                    Ok(article) => out.push(article),
                    Err(e) => {
                        tracing::debug!(
                            error = ?e,
                            source = source.as_str(),
                            "skipping malformed article record"
                        );
                    }
                }
            }
        }
        out
    }
}

/// Reader for the news cache file. The document itself is produced by the
/// scrape step and is read-only here.
pub struct NewsStore {
    path: PathBuf,
}

impl NewsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<NewsDocument> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading news cache {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing news cache {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw: &str) -> NewsDocument {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn selection_follows_document_order_across_sources() {
        let d = doc(
            r#"{"newspapers": {
                "zeta": {"articles": [{"title": "z1"}, {"title": "z2"}]},
                "alpha": {"articles": [{"title": "a1"}]}
            }}"#,
        );
        let titles: Vec<_> = d
            .top_articles(10)
            .into_iter()
            .map(|a| a.title)
            .collect();
        // Document order, not alphabetical: zeta appears first in the file.
        assert_eq!(titles, vec!["z1", "z2", "a1"]);
    }

    #[test]
    fn selection_cuts_off_at_limit() {
        let d = doc(
            r#"{"newspapers": {
                "one": {"articles": [{"title":"1"},{"title":"2"},{"title":"3"}]},
                "two": {"articles": [{"title":"4"},{"title":"5"}]}
            }}"#,
        );
        let picked = d.top_articles(4);
        assert_eq!(picked.len(), 4);
        assert_eq!(picked[3].title, "4");
    }

    #[test]
    fn malformed_records_and_sources_are_skipped() {
        let d = doc(
            r#"{"newspapers": {
                "bad": {"articles": "nope"},
                "mixed": {"articles": [{"title": "ok"}, 42]}
            }}"#,
        );
        let picked = d.top_articles(10);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "ok");
    }
}
