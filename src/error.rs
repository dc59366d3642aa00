//! Error taxonomy
//!
//! `SourceError` is absorbed at the quote/news source boundary and never
//! reaches the view model. `OrchestrationError` means the refresh cycle itself
//! is broken and stops the scheduler.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single upstream fetch
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network, HTTP status or provider-reported error
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// Response arrived but could not be understood
    #[error("malformed data: {0}")]
    MalformedData(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedData(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

/// Invariant violation while assembling a cycle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestrationError {
    #[error("metric at position {index} is for {found}, expected {expected}")]
    MetricOrderMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("assembled {found} metrics for {expected} configured symbols")]
    MetricCountMismatch { expected: usize, found: usize },
    #[error("symbol {0} is configured more than once")]
    DuplicateSymbol(String),
}
