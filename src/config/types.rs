//! Configuration section types

use serde::Deserialize;
use std::time::Duration;

use crate::metrics::ReferencePolicy;
use crate::sentiment::{default_drivers, DriverVerdict};
use crate::types::{FeedSpec, Symbol};

/// CNBC technology headlines
pub const DEFAULT_FEED_URL: &str =
    "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=19854910";

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Version tag for logging
    pub tag: String,
    /// Delay between the end of one cycle and the start of the next
    pub refresh_interval_secs: u64,
    /// Baseline for the change figure
    pub reference_policy: ReferencePolicy,
}

impl BoardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotesConfig {
    /// Chart API base URL
    pub base_url: String,
    /// Per-symbol fetch timeout in milliseconds
    pub timeout_ms: u64,
    /// User-Agent header sent to the chart API
    pub user_agent: Option<String>,
    /// Symbols in display order
    #[serde(default = "default_symbols")]
    pub symbols: Vec<Symbol>,
}

impl QuotesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Per-feed fetch timeout in milliseconds
    pub timeout_ms: u64,
    /// Headlines kept per feed
    pub max_items_per_feed: usize,
    /// User-Agent header sent to feed hosts
    pub user_agent: Option<String>,
    /// Feeds in display order
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSpec>,
}

impl NewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_drivers")]
    pub drivers: Vec<DriverVerdict>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            drivers: default_drivers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Serve the HTTP/WebSocket API (needs the `dashboard` feature)
    pub enabled: bool,
    pub bind_addr: String,
}

pub fn default_symbols() -> Vec<Symbol> {
    vec![Symbol::us100_futures(), Symbol::usd_sek()]
}

pub fn default_feeds() -> Vec<FeedSpec> {
    vec![FeedSpec::new(DEFAULT_FEED_URL, "CNBC Tech")]
}
