//! News sources - capped headline lists per syndication feed
//!
//! Same split as the quote side: `FeedProvider` may fail, `NewsSource` applies
//! the timeout and per-feed cap and turns failures into an empty list.

mod feed;

pub use feed::{parse_channel, RssFeedClient};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SourceError;
use crate::types::{FeedSpec, NewsItem};

/// Trait for syndication feed providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch every entry of the feed in provider order
    async fn fetch_items(&self, feed: &FeedSpec) -> Result<Vec<NewsItem>, SourceError>;
}

/// Fail-soft headline fetcher
#[derive(Clone)]
pub struct NewsSource {
    provider: Arc<dyn FeedProvider>,
    timeout: Duration,
    max_items: usize,
}

impl NewsSource {
    pub fn new(provider: Arc<dyn FeedProvider>, timeout: Duration, max_items: usize) -> Self {
        Self {
            provider,
            timeout,
            max_items,
        }
    }

    /// Top `max_items` headlines of the feed, or none on any failure
    pub async fn fetch(&self, feed: &FeedSpec) -> Vec<NewsItem> {
        match self.try_fetch(feed).await {
            Ok(mut items) => {
                items.truncate(self.max_items);
                tracing::debug!(feed = %feed.label, items = items.len(), "Feed fetched");
                items
            }
            Err(e) => {
                tracing::warn!(
                    source = self.provider.name(),
                    feed = %feed.label,
                    url = %feed.url,
                    error = %e,
                    "⚠️ Feed fetch failed, contributing no headlines"
                );
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, feed: &FeedSpec) -> Result<Vec<NewsItem>, SourceError> {
        tokio::time::timeout(self.timeout, self.provider.fetch_items(feed))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
    }
}
