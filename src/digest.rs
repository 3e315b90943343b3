// src/digest.rs
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::clock::ClockJob;
use crate::notify::MailDispatcher;
use crate::store::{Article, NewsStore};
use crate::subscribe::SubscriptionState;

/// Articles per digest (and per display page).
pub const MAX_ARTICLES: usize = 10;
/// Summary cap in characters; newlines collapse to spaces first.
pub const SUMMARY_MAX_CHARS: usize = 300;

const UNSUBSCRIBE_FOOTER: &str =
    "This is an automated news digest. To unsubscribe, please reply with 'UNSUBSCRIBE'.";

/// Collapse whitespace runs (including newlines) and cap the length.
pub fn summarize(text: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let collapsed = re_ws.replace_all(text.trim(), " ");
    collapsed.chars().take(SUMMARY_MAX_CHARS).collect()
}

pub fn display_title(article: &Article) -> &str {
    if article.title.is_empty() {
        "No title"
    } else {
        &article.title
    }
}

/// Dated subject line, e.g. `Top News - 2025-11-30`.
pub fn format_subject(date: NaiveDate) -> String {
    format!("Top News - {}", date.format("%Y-%m-%d"))
}

/// Plain-text digest body. Byte-stable for a fixed article list.
pub fn format_body(articles: &[Article]) -> String {
    let mut body = String::from("Today's Top News Headlines:\n\n");
    for (i, article) in articles.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", i + 1, display_title(article)));
        body.push_str(&format!("Published: {}\n", article.published));
        body.push_str(&format!("{}...\n", summarize(&article.text)));
        body.push_str(&format!("Read more: {}\n\n", article.link));
    }
    body.push_str("\n---\n");
    body.push_str(UNSUBSCRIBE_FOOTER);
    body
}

/// The daily clock action: pull from the store, format, send to the current
/// recipient. No-ops without an active subscriber; an unreadable cache skips
/// the day instead of failing the clock.
pub struct DigestJob {
    store: Arc<NewsStore>,
    state: Arc<Mutex<SubscriptionState>>,
    dispatcher: Arc<dyn MailDispatcher>,
}

impl DigestJob {
    pub fn new(
        store: Arc<NewsStore>,
        state: Arc<Mutex<SubscriptionState>>,
        dispatcher: Arc<dyn MailDispatcher>,
    ) -> Self {
        Self {
            store,
            state,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl ClockJob for DigestJob {
    async fn run(&self) -> Result<()> {
        let (recipient, active) = {
            let state = self.state.lock().expect("subscription mutex poisoned");
            (state.recipient.clone(), state.active)
        };
        if !active || recipient.is_empty() {
            tracing::debug!("digest skipped: no active subscriber");
            return Ok(());
        }

        let doc = match self.store.load().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = ?e, "digest skipped: news cache unreadable");
                return Ok(());
            }
        };

        let articles = doc.top_articles(MAX_ARTICLES);
        let subject = format_subject(Local::now().date_naive());
        let body = format_body(&articles);
        self.dispatcher.send(&subject, &body, &recipient).await?;
        tracing::info!(recipient = %recipient, articles = articles.len(), "daily digest sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "daily-digest"
    }
}
