//! Refresh scheduler - drives the polling cadence
//!
//! One cycle fetches every symbol and feed concurrently, derives the metrics,
//! assembles a `ViewModel` and hands it to every publisher. Cycles never
//! overlap: the next one starts `interval` after the previous one finished.
//! Cancellation is observed between cycles only.

use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::OrchestrationError;
use crate::metrics::{DerivedMetric, MetricDeriver};
use crate::news::NewsSource;
use crate::publish::Publisher;
use crate::quotes::QuoteSource;
use crate::sentiment::{SentimentSource, StaticSentiment};
use crate::types::{FeedSpec, Symbol};
use crate::view::{NewsBundle, ViewModel};

pub struct RefreshScheduler {
    symbols: Vec<Symbol>,
    feeds: Vec<FeedSpec>,
    quotes: QuoteSource,
    news: NewsSource,
    deriver: MetricDeriver,
    sentiment: Arc<dyn SentimentSource>,
    publishers: Vec<Arc<dyn Publisher>>,
    interval: Duration,
    /// Previous snapshot, kept only for stale carry-forward
    last: Option<Arc<ViewModel>>,
    cycle: u64,
}

impl RefreshScheduler {
    /// Create a scheduler; symbol codes must be unique
    pub fn new(
        symbols: Vec<Symbol>,
        feeds: Vec<FeedSpec>,
        quotes: QuoteSource,
        news: NewsSource,
        deriver: MetricDeriver,
        interval: Duration,
    ) -> Result<Self, OrchestrationError> {
        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol.code.as_str()) {
                return Err(OrchestrationError::DuplicateSymbol(symbol.code.clone()));
            }
        }

        Ok(Self {
            symbols,
            feeds,
            quotes,
            news,
            deriver,
            sentiment: Arc::new(StaticSentiment::default()),
            publishers: Vec::new(),
            interval,
            last: None,
            cycle: 0,
        })
    }

    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentSource>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Snapshot published by the most recent cycle
    pub fn last_view(&self) -> Option<Arc<ViewModel>> {
        self.last.clone()
    }

    /// Run cycles until `cancel` fires
    ///
    /// Returns the number of completed cycles. Only an orchestration fault
    /// ends the loop with an error.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<u64, OrchestrationError> {
        tracing::info!(
            symbols = self.symbols.len(),
            feeds = self.feeds.len(),
            interval_secs = self.interval.as_secs_f64(),
            policy = %self.deriver.policy(),
            "🚀 Refresh loop started"
        );

        let mut completed = 0u64;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.run_once().await?;
            completed += 1;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(cycles = completed, "🛑 Refresh loop stopped");
        Ok(completed)
    }

    /// One full cycle: assemble, then publish to every publisher
    pub async fn run_once(&mut self) -> Result<Arc<ViewModel>, OrchestrationError> {
        let view = self.assemble().await?;
        for publisher in &self.publishers {
            publisher.publish(Arc::clone(&view)).await;
        }
        self.last = Some(Arc::clone(&view));
        Ok(view)
    }

    /// Fetch all sources and build the next snapshot without publishing it
    pub async fn assemble(&mut self) -> Result<Arc<ViewModel>, OrchestrationError> {
        let started = Instant::now();

        let quote_fetches = self.symbols.iter().map(|s| self.quotes.fetch(s));
        let news_fetches = self.feeds.iter().map(|f| self.news.fetch(f));
        let (all_series, per_feed) = tokio::join!(join_all(quote_fetches), join_all(news_fetches));

        let metrics: Vec<DerivedMetric> = self
            .symbols
            .iter()
            .zip(all_series.iter())
            .map(|(symbol, series)| self.carry_forward(self.deriver.derive(symbol, series)))
            .collect();
        verify_order(&self.symbols, &metrics)?;

        self.cycle += 1;
        let view = Arc::new(ViewModel {
            cycle: self.cycle,
            fetched_at: chrono::Utc::now(),
            metrics,
            news: NewsBundle::from_feeds(per_feed),
            drivers: self.sentiment.verdicts(),
        });

        tracing::info!(
            cycle = view.cycle,
            elapsed_ms = started.elapsed().as_millis() as u64,
            metrics = view.metrics.len(),
            stale = view.stale_count(),
            missing = view.missing_count(),
            headlines = view.news.len(),
            "✅ Cycle assembled"
        );

        Ok(view)
    }

    /// Replace an empty metric with the last good one, marked stale
    fn carry_forward(&self, metric: DerivedMetric) -> DerivedMetric {
        if metric.has_data() {
            return metric;
        }
        let previous = self
            .last
            .as_ref()
            .and_then(|view| view.metric(&metric.symbol.code))
            .filter(|prev| prev.has_data());

        match previous {
            Some(prev) => {
                tracing::debug!(symbol = %metric.symbol, "Carrying forward last good metric");
                DerivedMetric {
                    symbol: metric.symbol,
                    ..prev.clone().into_stale()
                }
            }
            None => metric,
        }
    }
}

/// Metrics must line up one-to-one with the configured symbols
pub(crate) fn verify_order(
    symbols: &[Symbol],
    metrics: &[DerivedMetric],
) -> Result<(), OrchestrationError> {
    if symbols.len() != metrics.len() {
        return Err(OrchestrationError::MetricCountMismatch {
            expected: symbols.len(),
            found: metrics.len(),
        });
    }
    for (index, (symbol, metric)) in symbols.iter().zip(metrics).enumerate() {
        if symbol.code != metric.symbol.code {
            return Err(OrchestrationError::MetricOrderMismatch {
                index,
                expected: symbol.code.clone(),
                found: metric.symbol.code.clone(),
            });
        }
    }
    Ok(())
}
