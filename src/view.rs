//! View model handed to the render layer
//!
//! One `ViewModel` is built per refresh cycle and shared as `Arc<ViewModel>`.
//! Nothing mutates it after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::DerivedMetric;
use crate::sentiment::DriverVerdict;
use crate::types::NewsItem;

/// Headlines from every feed, in configured feed order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBundle {
    items: Vec<NewsItem>,
}

impl NewsBundle {
    /// Concatenate per-feed lists, keeping feed order and provider order
    pub fn from_feeds(per_feed: Vec<Vec<NewsItem>>) -> Self {
        Self {
            items: per_feed.into_iter().flatten().collect(),
        }
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Headlines from one feed label
    pub fn from_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a NewsItem> + 'a {
        self.items.iter().filter(move |i| i.source == source)
    }
}

/// Complete snapshot for one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    /// Monotonic cycle counter, starting at 1
    pub cycle: u64,
    pub fetched_at: DateTime<Utc>,
    /// One metric per configured symbol, configured order
    pub metrics: Vec<DerivedMetric>,
    pub news: NewsBundle,
    pub drivers: Vec<DriverVerdict>,
}

impl ViewModel {
    /// Metric for a symbol code
    pub fn metric(&self, code: &str) -> Option<&DerivedMetric> {
        self.metrics.iter().find(|m| m.symbol.code == code)
    }

    pub fn stale_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.stale).count()
    }

    /// Metrics with neither fresh nor carried-forward data
    pub fn missing_count(&self) -> usize {
        self.metrics.iter().filter(|m| !m.has_data()).count()
    }

    /// Plain-text rendering: one line per metric, then drivers and headlines
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for m in &self.metrics {
            out.push_str(&format!("{:<16} {:>12}", m.symbol.label, m.price_display()));
            if let Some(change) = m.change_display() {
                out.push_str(&format!("  {}", change));
            }
            if m.stale {
                out.push_str("  STALE");
            }
            out.push('\n');
        }
        for d in &self.drivers {
            out.push_str(&format!("[{} ({})] {}\n", d.topic, d.stance, d.note));
        }
        for item in self.news.items() {
            out.push_str(&format!("- {} ({})", item.title, item.source));
            if !item.published.is_empty() {
                out.push_str(&format!(" {}...", item.published_short()));
            }
            out.push('\n');
        }
        out
    }
}
