//! Pulseboard binary - runs the refresh loop until Ctrl-C

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pulseboard::config::{AppConfig, LoggingConfig};
use pulseboard::metrics::MetricDeriver;
use pulseboard::news::{NewsSource, RssFeedClient};
use pulseboard::publish::LogPublisher;
use pulseboard::quotes::{QuoteSource, YahooChartClient};
use pulseboard::scheduler::RefreshScheduler;
use pulseboard::sentiment::StaticSentiment;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging.level filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    tracing::info!(config = %config, "⚙️ Configuration loaded");

    let quote_client = YahooChartClient::new(
        config.quotes.base_url.clone(),
        config.quotes.timeout(),
        config.quotes.user_agent.as_deref(),
    );
    let feed_client = RssFeedClient::new(config.news.timeout(), config.news.user_agent.as_deref());

    let quotes = QuoteSource::new(Arc::new(quote_client), config.quotes.timeout());
    let news = NewsSource::new(
        Arc::new(feed_client),
        config.news.timeout(),
        config.news.max_items_per_feed,
    );

    #[cfg_attr(not(feature = "dashboard"), allow(unused_mut))]
    let mut scheduler = RefreshScheduler::new(
        config.quotes.symbols.clone(),
        config.news.feeds.clone(),
        quotes,
        news,
        MetricDeriver::new(config.board.reference_policy),
        config.board.refresh_interval(),
    )
    .context("Invalid symbol configuration")?
    .with_sentiment(Arc::new(StaticSentiment::new(
        config.sentiment.drivers.clone(),
    )))
    .with_publisher(Arc::new(LogPublisher));

    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, finishing current cycle");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    #[cfg(feature = "dashboard")]
    let dashboard_task = if config.dashboard.enabled {
        use pulseboard::dashboard::{DashboardMemory, DashboardPublisher, WebSocketBroadcaster};

        let memory = Arc::new(DashboardMemory::new());
        let broadcaster = WebSocketBroadcaster::default();
        scheduler = scheduler.with_publisher(Arc::new(DashboardPublisher::new(
            Arc::clone(&memory),
            broadcaster.clone(),
        )));

        let bind_addr = config.dashboard.bind_addr.clone();
        let server_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            pulseboard::dashboard::serve(&bind_addr, memory, broadcaster, server_cancel).await
        }))
    } else {
        None
    };

    #[cfg(not(feature = "dashboard"))]
    if config.dashboard.enabled {
        tracing::warn!("dashboard.enabled is set but this build lacks the `dashboard` feature");
    }

    let result = scheduler.run(cancel.clone()).await;
    cancel.cancel();

    #[cfg(feature = "dashboard")]
    if let Some(task) = dashboard_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Dashboard server stopped with error"),
            Err(e) => tracing::error!(error = %e, "Dashboard task panicked"),
            Ok(Ok(())) => {}
        }
    }

    let cycles = result.context("Refresh loop aborted")?;
    tracing::info!(cycles, "👋 Pulseboard stopped");
    Ok(())
}
