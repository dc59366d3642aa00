//! Market drivers block
//!
//! Verdicts are static placeholders served from configuration. Nothing here
//! looks at prices or headlines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour-coded stance of one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Bullish,
    Caution,
    Risk,
}

impl Stance {
    /// Badge colour (green/orange/red)
    pub fn color(&self) -> &'static str {
        match self {
            Stance::Bullish => "#00FF00",
            Stance::Caution => "#FFA500",
            Stance::Risk => "#FF4444",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Bullish => write!(f, "Bullish"),
            Stance::Caution => write!(f, "Caution"),
            Stance::Risk => write!(f, "Risk"),
        }
    }
}

/// One market driver shown above the news list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverVerdict {
    pub topic: String,
    pub stance: Stance,
    #[serde(default)]
    pub note: String,
}

impl DriverVerdict {
    pub fn new(topic: impl Into<String>, stance: Stance, note: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            stance,
            note: note.into(),
        }
    }
}

/// Producer of market driver verdicts
pub trait SentimentSource: Send + Sync {
    fn verdicts(&self) -> Vec<DriverVerdict>;
}

/// Fixed verdicts from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticSentiment {
    drivers: Vec<DriverVerdict>,
}

impl StaticSentiment {
    pub fn new(drivers: Vec<DriverVerdict>) -> Self {
        Self { drivers }
    }
}

impl SentimentSource for StaticSentiment {
    fn verdicts(&self) -> Vec<DriverVerdict> {
        self.drivers.clone()
    }
}

/// Placeholder drivers shipped as the default configuration
pub fn default_drivers() -> Vec<DriverVerdict> {
    vec![
        DriverVerdict::new(
            "TECH",
            Stance::Bullish,
            "Large-cap tech holding gains pre-market.",
        ),
        DriverVerdict::new(
            "FED",
            Stance::Caution,
            "Rate uncertainty ahead of the next meeting.",
        ),
        DriverVerdict::new(
            "GEO",
            Stance::Risk,
            "Tariff headlines driving erratic futures moves.",
        ),
    ]
}
