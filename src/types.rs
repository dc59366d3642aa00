//! Core types used throughout Pulseboard
//!
//! Defines symbols, price samples, news items and feed descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display hint for a symbol's price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFormat {
    /// Decimal places shown for the price
    #[serde(default = "default_decimals")]
    pub decimals: usize,
    /// Group the integer part with commas (21,345)
    #[serde(default)]
    pub thousands: bool,
    /// Unit appended after the price (e.g. "kr")
    #[serde(default)]
    pub suffix: Option<String>,
    /// Render the change/percent line
    #[serde(default = "default_show_change")]
    pub show_change: bool,
}

fn default_decimals() -> usize {
    2
}

fn default_show_change() -> bool {
    true
}

impl Default for SymbolFormat {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            thousands: false,
            suffix: None,
            show_change: default_show_change(),
        }
    }
}

/// Tradable instrument tracked by the board (futures contract, currency pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Provider identifier (e.g. "NQ=F", "SEK=X")
    pub code: String,
    /// Human label (e.g. "US100 Futures")
    pub label: String,
    #[serde(default)]
    pub format: SymbolFormat,
}

impl Symbol {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            format: SymbolFormat::default(),
        }
    }

    pub fn with_format(mut self, format: SymbolFormat) -> Self {
        self.format = format;
        self
    }

    /// US100 index futures, whole points with thousands separators
    pub fn us100_futures() -> Self {
        Self::new("NQ=F", "US100 Futures").with_format(SymbolFormat {
            decimals: 0,
            thousands: true,
            suffix: None,
            show_change: true,
        })
    }

    /// USD/SEK spot rate, quoted in kronor
    pub fn usd_sek() -> Self {
        Self::new("SEK=X", "USD/SEK").with_format(SymbolFormat {
            decimals: 2,
            thousands: false,
            suffix: Some("kr".to_string()),
            show_change: false,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// One observed price point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub ts: DateTime<Utc>,
    pub price: f64,
}

impl PriceSample {
    pub fn new(ts: DateTime<Utc>, price: f64) -> Self {
        Self { ts, price }
    }
}

/// Intraday one-minute series for one symbol, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub samples: Vec<PriceSample>,
    /// Prior session close, when the provider reports it
    pub previous_close: Option<f64>,
}

impl PriceSeries {
    /// Empty series (provider failure, pre-market, holiday)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from samples, sorting chronologically
    pub fn from_samples(mut samples: Vec<PriceSample>) -> Self {
        samples.sort_by_key(|s| s.ts);
        Self {
            samples,
            previous_close: None,
        }
    }

    pub fn with_previous_close(mut self, close: Option<f64>) -> Self {
        self.previous_close = close;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    /// Most recent sample
    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }
}

/// Syndication feed to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub url: String,
    /// Source label attached to every headline from this feed
    pub label: String,
}

impl FeedSpec {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// One headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Label of the originating feed
    pub source: String,
    /// Raw provider string, format not guaranteed
    pub published: String,
}

impl NewsItem {
    /// First 25 characters of the published string, as shown under a headline
    pub fn published_short(&self) -> &str {
        match self.published.char_indices().nth(25) {
            Some((idx, _)) => &self.published[..idx],
            None => &self.published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_series_sorted_on_build() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_700_000_060, 0).unwrap();
        let series =
            PriceSeries::from_samples(vec![PriceSample::new(t1, 2.0), PriceSample::new(t0, 1.0)]);

        assert_eq!(series.first().unwrap().price, 1.0);
        assert_eq!(series.last().unwrap().price, 2.0);
    }

    #[test]
    fn test_published_short_truncates_on_char_boundary() {
        let item = NewsItem {
            title: "t".into(),
            link: "l".into(),
            source: "s".into(),
            published: "Mon, 20 Jan 2025 14:03:11 GMT".into(),
        };
        assert_eq!(item.published_short(), "Mon, 20 Jan 2025 14:03:11");

        let short = NewsItem {
            published: "åäö".into(),
            ..item
        };
        assert_eq!(short.published_short(), "åäö");
    }

    #[test]
    fn test_builtin_symbols() {
        assert_eq!(Symbol::us100_futures().code, "NQ=F");
        assert_eq!(Symbol::usd_sek().format.suffix.as_deref(), Some("kr"));
        assert!(!Symbol::usd_sek().format.show_change);
    }
}
