// src/display.rs
use std::process::Command;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::digest::{self, MAX_ARTICLES};
use crate::scrape::{self, types::SourceFeed};
use crate::store::{Article, NewsStore};

/// How a frame line should be styled by the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Headline,
    Date,
    Body,
    Link,
}

#[derive(Debug, Clone)]
pub struct FrameLine {
    pub text: String,
    pub style: LineStyle,
}

/// Line span mapped to an article URL. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRegion {
    pub start_line: usize,
    pub end_line: usize,
    pub url: String,
}

/// One rendered screen of news: lines plus the clickable regions built in
/// the same pass. Replaced wholesale on refresh; regions never accumulate.
#[derive(Debug, Clone, Default)]
pub struct NewsFrame {
    pub lines: Vec<FrameLine>,
    pub regions: Vec<LinkRegion>,
}

impl NewsFrame {
    /// Render the current article selection as numbered entries, recording
    /// each entry's line span as its clickable region.
    pub fn render(articles: &[Article]) -> Self {
        let mut lines = vec![
            FrameLine {
                text: "Today's Top News Headlines".into(),
                style: LineStyle::Title,
            },
            FrameLine {
                text: String::new(),
                style: LineStyle::Body,
            },
        ];
        let mut regions = Vec::with_capacity(articles.len());
        for (i, article) in articles.iter().enumerate() {
            let start_line = lines.len();
            lines.push(FrameLine {
                text: format!("{}. {}", i + 1, digest::display_title(article)),
                style: LineStyle::Headline,
            });
            lines.push(FrameLine {
                text: format!("Published: {}", article.published),
                style: LineStyle::Date,
            });
            lines.push(FrameLine {
                text: format!("{}...", digest::summarize(&article.text)),
                style: LineStyle::Body,
            });
            lines.push(FrameLine {
                text: format!("Read more: {}", article.link),
                style: LineStyle::Link,
            });
            let end_line = lines.len() - 1;
            lines.push(FrameLine {
                text: String::new(),
                style: LineStyle::Body,
            });
            regions.push(LinkRegion {
                start_line,
                end_line,
                url: article.link.clone(),
            });
        }
        Self { lines, regions }
    }

    /// Frame carrying a failure message in place of content.
    pub fn error(message: &str) -> Self {
        Self {
            lines: vec![FrameLine {
                text: format!("Failed to load news: {message}"),
                style: LineStyle::Body,
            }],
            regions: Vec::new(),
        }
    }
}

/// Opens a URL in the user's browser. Seam for tests and for embedding in a
/// real window system.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Default opener: hand the URL to the platform's opener command.
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        #[cfg(target_os = "macos")]
        let program = "open";
        #[cfg(not(target_os = "macos"))]
        let program = "xdg-open";
        Command::new(program)
            .arg(url)
            .spawn()
            .with_context(|| format!("launching {program}"))?;
        Ok(())
    }
}

/// What the render loop draws to. The console stand-in numbers each line so
/// `open <line>` has something to aim at.
pub trait RenderSurface {
    fn present(&self, frame: &NewsFrame);
}

pub struct ConsoleSurface;

impl RenderSurface for ConsoleSurface {
    fn present(&self, frame: &NewsFrame) {
        let mut out = String::new();
        for (i, line) in frame.lines.iter().enumerate() {
            out.push_str(&format!("{i:>3}  {}\n", line.text));
        }
        print!("{out}");
    }
}

/// Owns the current frame and its link regions; refreshes off the render
/// loop and swaps results back in atomically.
pub struct DisplayController {
    store: Arc<NewsStore>,
    sources: Arc<Vec<Box<dyn SourceFeed>>>,
    frame: RwLock<NewsFrame>,
    frames_tx: mpsc::Sender<NewsFrame>,
    opener: Box<dyn LinkOpener>,
}

impl DisplayController {
    pub fn new(
        store: Arc<NewsStore>,
        sources: Arc<Vec<Box<dyn SourceFeed>>>,
        frames_tx: mpsc::Sender<NewsFrame>,
        opener: Box<dyn LinkOpener>,
    ) -> Self {
        Self {
            store,
            sources,
            frame: RwLock::new(NewsFrame::default()),
            frames_tx,
            opener,
        }
    }

    /// Swap in a new frame; lines and regions replace the old ones together,
    /// so no hit test ever sees a half-updated region list.
    pub fn apply(&self, frame: NewsFrame) {
        *self.frame.write().expect("frame lock poisoned") = frame;
    }

    pub fn frame(&self) -> NewsFrame {
        self.frame.read().expect("frame lock poisoned").clone()
    }

    /// Map a frame line to the enclosing link region's URL, if any.
    pub fn hit_test(&self, line: usize) -> Option<String> {
        let frame = self.frame.read().expect("frame lock poisoned");
        frame
            .regions
            .iter()
            .find(|r| r.start_line <= line && line <= r.end_line)
            .map(|r| r.url.clone())
    }

    /// Hit-test and open in the external browser. No-op outside all regions.
    pub fn open_link(&self, line: usize) {
        let Some(url) = self.hit_test(line) else {
            return;
        };
        if let Err(e) = self.opener.open(&url) {
            tracing::warn!(error = ?e, url = %url, "opening link failed");
        }
    }

    /// Kick off scrape + reload off the render loop; the resulting frame
    /// comes back over the frames channel for the loop to apply.
    pub fn request_refresh(&self) {
        let store = Arc::clone(&self.store);
        let sources = Arc::clone(&self.sources);
        let tx = self.frames_tx.clone();
        tokio::spawn(async move {
            let frame = build_frame(&store, &sources).await;
            if tx.send(frame).await.is_err() {
                tracing::debug!("render loop gone, dropping frame");
            }
        });
    }
}

async fn build_frame(store: &NewsStore, sources: &[Box<dyn SourceFeed>]) -> NewsFrame {
    tracing::info!("updating news");
    // A failed scrape falls back to whatever the cache already holds.
    if let Err(e) = scrape::scrape_to_cache(sources, store.path()).await {
        tracing::warn!(error = ?e, "scrape failed, rendering last cached document");
    }
    match store.load().await {
        Ok(doc) => NewsFrame::render(&doc.top_articles(MAX_ARTICLES)),
        Err(e) => {
            tracing::warn!(error = ?e, "news cache unreadable");
            NewsFrame::error(&format!("{e:#}"))
        }
    }
}
