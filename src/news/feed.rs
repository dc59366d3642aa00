//! RSS 2.0 feed client

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SourceError;
use crate::news::FeedProvider;
use crate::types::{FeedSpec, NewsItem};

const DEFAULT_USER_AGENT: &str = "pulseboard/0.1 (+rss)";

#[derive(Debug, Clone)]
pub struct RssFeedClient {
    client: reqwest::Client,
}

impl RssFeedClient {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for RssFeedClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), None)
    }
}

#[async_trait]
impl FeedProvider for RssFeedClient {
    fn name(&self) -> &'static str {
        "RSS"
    }

    async fn fetch_items(&self, feed: &FeedSpec) -> Result<Vec<NewsItem>, SourceError> {
        let response = self.client.get(&feed.url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::unavailable(format!(
                "feed returned HTTP {}",
                response.status()
            )));
        }
        let body = response.bytes().await?;
        parse_channel(&body, &feed.label)
    }
}

/// Parse an RSS document into headlines tagged with `source`
///
/// Entries without a title are dropped. A missing link falls back to a
/// permalink guid, a missing `pubDate` to an empty string.
pub fn parse_channel(body: &[u8], source: &str) -> Result<Vec<NewsItem>, SourceError> {
    let channel = ::rss::Channel::read_from(body)
        .map_err(|e| SourceError::malformed(format!("invalid RSS document: {}", e)))?;

    let items = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            if title.is_empty() {
                return None;
            }
            let link = item
                .link()
                .or_else(|| item.guid().filter(|g| g.is_permalink()).map(|g| g.value()))
                .unwrap_or_default()
                .trim();
            Some(NewsItem {
                title: title.to_string(),
                link: link.to_string(),
                source: source.to_string(),
                published: item.pub_date().unwrap_or_default().trim().to_string(),
            })
        })
        .collect();

    Ok(items)
}
