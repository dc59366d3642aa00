//! Pulseboard Library
//!
//! Polling refresh pipeline for a single-page market board: index futures,
//! FX rate and RSS headlines

pub mod config;
pub mod error;
pub mod metrics;
pub mod news;
pub mod publish;
pub mod quotes;
pub mod scheduler;
pub mod sentiment;
pub mod types;
pub mod view;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use error::{OrchestrationError, SourceError};
pub use metrics::{derive, DerivedMetric, MetricDeriver, ReferencePolicy};
pub use scheduler::RefreshScheduler;
pub use view::{NewsBundle, ViewModel};
