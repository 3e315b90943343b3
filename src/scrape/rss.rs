// src/scrape/rss.rs
use std::time::Duration;

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::normalize_text;
use super::types::SourceFeed;
use crate::store::{Article, SourceNews};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// RSS-backed source feed. HTTP mode fetches the configured URL; fixture
/// mode parses embedded XML for tests.
pub struct RssFeed {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssFeed {
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_items(&self, xml: &str) -> Result<SourceNews> {
        let rss: Rss = from_str(xml).with_context(|| format!("parsing {} rss xml", self.name))?;

        let mut articles = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let text = normalize_text(it.description.as_deref().unwrap_or_default());
            let link = it.link.unwrap_or_default();
            // An item with neither headline nor destination renders as nothing.
            if title.is_empty() && link.is_empty() {
                continue;
            }
            articles.push(Article {
                title,
                text,
                link,
                published: it.pub_date.unwrap_or_default(),
            });
        }
        Ok(SourceNews { articles })
    }
}

#[async_trait::async_trait]
impl SourceFeed for RssFeed {
    async fn fetch_latest(&self) -> Result<SourceNews> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .timeout(FETCH_TIMEOUT)
                    .send()
                    .await
                    .with_context(|| format!("{} rss get", self.name))?
                    .error_for_status()
                    .with_context(|| format!("{} rss non-2xx", self.name))?
                    .text()
                    .await
                    .with_context(|| format!("{} rss body", self.name))?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
