//! Quote sources - intraday price series per symbol
//!
//! `QuoteProvider` is the raw provider call and may fail. `QuoteSource` wraps a
//! provider with a bounded timeout and absorbs every failure into an empty
//! series, so callers never see a fault from a quote fetch.

mod yahoo;

pub use yahoo::{parse_chart, YahooChartClient, YAHOO_CHART_URL};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SourceError;
use crate::types::{PriceSeries, Symbol};

/// Trait for price series providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch today's one-minute series for a symbol
    async fn fetch_series(&self, symbol: &Symbol) -> Result<PriceSeries, SourceError>;
}

/// Fail-soft quote fetcher
#[derive(Clone)]
pub struct QuoteSource {
    provider: Arc<dyn QuoteProvider>,
    timeout: Duration,
}

impl QuoteSource {
    pub fn new(provider: Arc<dyn QuoteProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Fetch the series, or an empty one on any failure
    pub async fn fetch(&self, symbol: &Symbol) -> PriceSeries {
        match self.try_fetch(symbol).await {
            Ok(series) => {
                tracing::debug!(
                    source = self.provider.name(),
                    symbol = %symbol,
                    samples = series.len(),
                    "Quote series fetched"
                );
                series
            }
            Err(e) => {
                tracing::warn!(
                    source = self.provider.name(),
                    symbol = %symbol,
                    error = %e,
                    "⚠️ Quote fetch failed, using empty series"
                );
                PriceSeries::empty()
            }
        }
    }

    async fn try_fetch(&self, symbol: &Symbol) -> Result<PriceSeries, SourceError> {
        tokio::time::timeout(self.timeout, self.provider.fetch_series(symbol))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
    }
}
