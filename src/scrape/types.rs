// src/scrape/types.rs
use anyhow::Result;

use crate::store::SourceNews;

/// One configured headline source. Fetch and parse failures stay behind this
/// boundary as `Err`; the scrape step decides whether to skip or abort.
#[async_trait::async_trait]
pub trait SourceFeed: Send + Sync {
    async fn fetch_latest(&self) -> Result<SourceNews>;
    fn name(&self) -> &str;
}
