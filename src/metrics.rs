//! Metric derivation - price series to price/change/percent triple
//!
//! Pure functions. An empty series always produces the zero-value metric.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{PriceSeries, Symbol};

/// Baseline used for the change figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// First sample of the current session
    #[default]
    SessionOpen,
    /// Provider-reported prior session close
    PreviousClose,
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePolicy::SessionOpen => write!(f, "session_open"),
            ReferencePolicy::PreviousClose => write!(f, "previous_close"),
        }
    }
}

/// Presentation-ready metric for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub pct: f64,
    /// Carried forward from an earlier cycle because this one had no data
    pub stale: bool,
    /// Timestamp of the sample the price came from
    pub as_of: Option<DateTime<Utc>>,
}

impl DerivedMetric {
    /// Defined zero-value (no data)
    pub fn zero(symbol: Symbol) -> Self {
        Self {
            symbol,
            price: 0.0,
            change: 0.0,
            pct: 0.0,
            stale: false,
            as_of: None,
        }
    }

    /// True when the metric carries a real observed price
    pub fn has_data(&self) -> bool {
        self.as_of.is_some()
    }

    /// Copy of this metric flagged as carried forward
    pub fn into_stale(self) -> Self {
        Self {
            stale: true,
            ..self
        }
    }

    /// Price formatted with the symbol's hint: "21,345", "10.52 kr"
    pub fn price_display(&self) -> String {
        let fmt = &self.symbol.format;
        let mut out = format!("{:.*}", fmt.decimals, self.price);
        if fmt.thousands {
            out = group_thousands(&out);
        }
        if let Some(suffix) = &fmt.suffix {
            out.push(' ');
            out.push_str(suffix);
        }
        out
    }

    /// Change line: "+12.5 (+0.1%)", None when the symbol hides it
    pub fn change_display(&self) -> Option<String> {
        if !self.symbol.format.show_change {
            return None;
        }
        Some(format!("{:+.1} ({:+.1}%)", self.change, self.pct))
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}

/// Derive the metric for one symbol under a reference policy
pub fn derive(symbol: &Symbol, series: &PriceSeries, policy: ReferencePolicy) -> DerivedMetric {
    let Some(last) = series.last() else {
        return DerivedMetric::zero(symbol.clone());
    };

    let current = last.price;
    let reference = match policy {
        ReferencePolicy::SessionOpen => series.first().map(|s| s.price),
        ReferencePolicy::PreviousClose => series.previous_close,
    };

    let (change, pct) = match reference {
        Some(reference) => change_and_pct(current, reference),
        None => (0.0, 0.0),
    };

    DerivedMetric {
        symbol: symbol.clone(),
        price: finite_or_zero(current),
        change,
        pct,
        stale: false,
        as_of: Some(last.ts),
    }
}

fn change_and_pct(current: f64, reference: f64) -> (f64, f64) {
    let change = finite_or_zero(current - reference);
    if reference == 0.0 {
        return (change, 0.0);
    }
    (change, finite_or_zero(100.0 * change / reference))
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Stateless deriver bound to the deployment's reference policy
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricDeriver {
    policy: ReferencePolicy,
}

impl MetricDeriver {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    pub fn derive(&self, symbol: &Symbol, series: &PriceSeries) -> DerivedMetric {
        derive(symbol, series, self.policy)
    }
}
