//! Yahoo Finance chart client
//!
//! Pulls the current session's one-minute bars from the v8 chart endpoint and
//! keeps the close of every bar as a price sample.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::error::SourceError;
use crate::quotes::QuoteProvider;
use crate::types::{PriceSample, PriceSeries, Symbol};

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) pulseboard/0.1";

/// Yahoo reports unknown or delisted symbols with this error code
const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1m",
            self.base_url, symbol.code
        )
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new(YAHOO_CHART_URL, Duration::from_secs(10), None)
    }
}

#[async_trait]
impl QuoteProvider for YahooChartClient {
    fn name(&self) -> &'static str {
        "Yahoo"
    }

    async fn fetch_series(&self, symbol: &Symbol) -> Result<PriceSeries, SourceError> {
        let url = self.chart_url(symbol);
        tracing::debug!(symbol = %symbol, url = %url, "Requesting Yahoo chart");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match parse_chart(&body) {
            Ok(series) => Ok(series),
            Err(e) if status.is_success() => Err(e),
            // Non-2xx without a readable chart error
            Err(_) => Err(SourceError::unavailable(format!(
                "Yahoo chart returned HTTP {}",
                status
            ))),
        }
    }
}

/// Parse a v8 chart document into a price series
///
/// A missing `timestamp` array means the session has no bars yet and yields an
/// empty series. Bars whose close is null are skipped.
pub fn parse_chart(body: &str) -> Result<PriceSeries, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse Yahoo chart: {}", e)))?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND_CODE {
            return Ok(PriceSeries::empty());
        }
        return Err(SourceError::unavailable(format!(
            "Yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| SourceError::malformed("no chart result in response"))?;

    let previous_close = result
        .meta
        .as_ref()
        .and_then(|m| m.previous_close.or(m.chart_previous_close));

    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty().with_previous_close(previous_close));
    };

    let closes = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close)
        .ok_or_else(|| SourceError::malformed("chart has timestamps but no quote data"))?;

    let samples = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let price = close.filter(|p| p.is_finite())?;
            let ts = Utc.timestamp_opt(ts, 0).single()?;
            Some(PriceSample::new(ts, price))
        })
        .collect();

    Ok(PriceSeries::from_samples(samples).with_previous_close(previous_close))
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
