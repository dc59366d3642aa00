//! Configuration management for Pulseboard
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub quotes: QuotesConfig,
    pub news: NewsConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::with_defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PULSEBOARD_*)
            .add_source(Self::environment())
            .build()
            .context("Failed to build configuration")?;

        Self::from_config(config)
    }

    /// `PULSEBOARD_BOARD__REFRESH_INTERVAL_SECS` -> `board.refresh_interval_secs`
    pub fn environment() -> Environment {
        Environment::with_prefix("PULSEBOARD")
            .prefix_separator("_")
            .separator("__")
    }

    /// Builder pre-loaded with every scalar default
    pub fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Board defaults
            .set_default("board.tag", env!("CARGO_PKG_VERSION"))?
            .set_default("board.refresh_interval_secs", 30)?
            .set_default("board.reference_policy", "session_open")?
            // Quote defaults
            .set_default("quotes.base_url", crate::quotes::YAHOO_CHART_URL)?
            .set_default("quotes.timeout_ms", 8000)?
            // News defaults
            .set_default("news.timeout_ms", 8000)?
            .set_default("news.max_items_per_feed", 6)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Dashboard defaults
            .set_default("dashboard.enabled", false)?
            .set_default("dashboard.bind_addr", "127.0.0.1:8787")?;
        Ok(builder)
    }

    /// Deserialize and validate a built configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        let symbols: Vec<&str> = self.quotes.symbols.iter().map(|s| s.code.as_str()).collect();
        let feeds: Vec<&str> = self.news.feeds.iter().map(|f| f.label.as_str()).collect();
        format!(
            "board={} interval={}s policy={} symbols={:?} feeds={:?} cap={}",
            self.board.tag,
            self.board.refresh_interval_secs,
            self.board.reference_policy,
            symbols,
            feeds,
            self.news.max_items_per_feed
        )
    }

    /// Reject settings the refresh loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.board.refresh_interval_secs == 0 {
            bail!("board.refresh_interval_secs must be greater than zero");
        }
        if self.quotes.timeout_ms == 0 || self.news.timeout_ms == 0 {
            bail!("quotes.timeout_ms and news.timeout_ms must be greater than zero");
        }
        if self.news.max_items_per_feed == 0 {
            bail!("news.max_items_per_feed must be greater than zero");
        }
        if self.quotes.symbols.is_empty() {
            bail!("quotes.symbols must list at least one symbol");
        }

        let mut codes = HashSet::new();
        for symbol in &self.quotes.symbols {
            if symbol.code.trim().is_empty() {
                bail!("quotes.symbols contains an empty code");
            }
            if !codes.insert(symbol.code.as_str()) {
                bail!("Symbol {} is configured more than once", symbol.code);
            }
        }

        for feed in &self.news.feeds {
            if !feed.url.starts_with("http://") && !feed.url.starts_with("https://") {
                bail!("Feed {} has a non-HTTP url: {}", feed.label, feed.url);
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ReferencePolicy;
    use config::FileFormat;

    fn from_yaml(yaml: &str) -> Result<AppConfig> {
        let config = AppConfig::with_defaults()?
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        AppConfig::from_config(config)
    }

    #[test]
    fn test_defaults() {
        let cfg = from_yaml("").unwrap();
        assert_eq!(cfg.board.refresh_interval_secs, 30);
        assert_eq!(cfg.board.reference_policy, ReferencePolicy::SessionOpen);
        assert_eq!(cfg.news.max_items_per_feed, 6);
        assert_eq!(cfg.quotes.symbols.len(), 2);
        assert_eq!(cfg.quotes.symbols[0].code, "NQ=F");
        assert_eq!(cfg.news.feeds[0].label, "CNBC Tech");
        assert_eq!(cfg.sentiment.drivers.len(), 3);
        assert!(!cfg.dashboard.enabled);
    }

    #[test]
    fn test_yaml_overrides() {
        let cfg = from_yaml(
            r#"
board:
  refresh_interval_secs: 60
  reference_policy: previous_close
quotes:
  symbols:
    - code: "ES=F"
      label: "S&P 500 Futures"
      format: { decimals: 2, thousands: true }
news:
  max_items_per_feed: 5
  feeds:
    - url: "https://feeds.example.com/markets.xml"
      label: "Markets"
    - url: "https://feeds.example.com/tech.xml"
      label: "Tech"
"#,
        )
        .unwrap();

        assert_eq!(cfg.board.refresh_interval().as_secs(), 60);
        assert_eq!(cfg.board.reference_policy, ReferencePolicy::PreviousClose);
        assert_eq!(cfg.quotes.symbols.len(), 1);
        assert!(cfg.quotes.symbols[0].format.thousands);
        assert!(cfg.quotes.symbols[0].format.show_change);
        assert_eq!(cfg.news.feeds.len(), 2);
        assert!(cfg.digest().contains("policy=previous_close"));
    }

    #[test]
    fn test_env_overrides_use_single_underscore_prefix() {
        let vars: config::Map<String, String> = [
            ("PULSEBOARD_BOARD__REFRESH_INTERVAL_SECS", "60"),
            ("PULSEBOARD_LOGGING__JSON", "true"),
            ("PULSEBOARD_NEWS__MAX_ITEMS_PER_FEED", "4"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = AppConfig::with_defaults()
            .unwrap()
            .add_source(AppConfig::environment().source(Some(vars)))
            .build()
            .unwrap();
        let cfg = AppConfig::from_config(config).unwrap();

        assert_eq!(cfg.board.refresh_interval_secs, 60);
        assert!(cfg.logging.json);
        assert_eq!(cfg.news.max_items_per_feed, 4);
    }

    #[test]
    fn test_env_overrides_yaml() {
        let vars: config::Map<String, String> =
            [("PULSEBOARD_BOARD__REFERENCE_POLICY".to_string(), "previous_close".to_string())]
                .into_iter()
                .collect();

        let config = AppConfig::with_defaults()
            .unwrap()
            .add_source(File::from_str("board: { reference_policy: session_open }", FileFormat::Yaml))
            .add_source(AppConfig::environment().source(Some(vars)))
            .build()
            .unwrap();
        let cfg = AppConfig::from_config(config).unwrap();

        assert_eq!(cfg.board.reference_policy, ReferencePolicy::PreviousClose);
    }

    #[test]
    fn test_rejects_duplicate_symbols() {
        let err = from_yaml(
            r#"
quotes:
  symbols:
    - { code: "NQ=F", label: "a" }
    - { code: "NQ=F", label: "b" }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_zero_interval_and_cap() {
        assert!(from_yaml("board: { refresh_interval_secs: 0 }").is_err());
        assert!(from_yaml("news: { max_items_per_feed: 0 }").is_err());
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(from_yaml("board: { reference_policy: vwap }").is_err());
    }
}
