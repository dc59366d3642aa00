//! Refresh pipeline tests

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pulseboard::error::SourceError;
    use pulseboard::metrics::{DerivedMetric, MetricDeriver, ReferencePolicy};
    use pulseboard::news::{parse_channel, FeedProvider, NewsSource};
    use pulseboard::publish::{Publisher, WatchPublisher};
    use pulseboard::quotes::{parse_chart, QuoteProvider, QuoteSource};
    use pulseboard::scheduler::RefreshScheduler;
    use pulseboard::sentiment::{default_drivers, StaticSentiment};
    use pulseboard::types::{FeedSpec, NewsItem, PriceSample, PriceSeries, Symbol};
    use pulseboard::view::ViewModel;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    // ============================================================================
    // Fakes
    // ============================================================================

    /// Fixed series per symbol, with an optional delay per symbol
    #[derive(Default)]
    struct FakeQuotes {
        series: HashMap<String, PriceSeries>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
    }

    impl FakeQuotes {
        fn with_series(mut self, code: &str, series: PriceSeries) -> Self {
            self.series.insert(code.to_string(), series);
            self
        }

        fn with_delay(mut self, code: &str, delay: Duration) -> Self {
            self.delays.insert(code.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeQuotes {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_series(&self, symbol: &Symbol) -> Result<PriceSeries, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&symbol.code) {
                tokio::time::sleep(*delay).await;
            }
            self.series
                .get(&symbol.code)
                .cloned()
                .ok_or_else(|| SourceError::unavailable("unknown symbol"))
        }
    }

    /// Raw RSS bodies per feed url, parsed with the real parser
    #[derive(Default)]
    struct FakeFeeds {
        bodies: HashMap<String, String>,
    }

    impl FakeFeeds {
        fn with_body(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl FeedProvider for FakeFeeds {
        fn name(&self) -> &'static str {
            "fake-rss"
        }

        async fn fetch_items(&self, feed: &FeedSpec) -> Result<Vec<NewsItem>, SourceError> {
            let body = self
                .bodies
                .get(&feed.url)
                .ok_or_else(|| SourceError::unavailable("404"))?;
            parse_channel(body.as_bytes(), &feed.label)
        }
    }

    /// Records every snapshot and how many publishes overlapped
    #[derive(Default)]
    struct RecordingPublisher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        hold: Duration,
        seen: Mutex<Vec<(Instant, Arc<ViewModel>)>>,
    }

    impl RecordingPublisher {
        fn holding(hold: Duration) -> Self {
            Self {
                hold,
                ..Default::default()
            }
        }

        fn seen(&self) -> Vec<(Instant, Arc<ViewModel>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn publish(&self, view: Arc<ViewModel>) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.hold.is_zero() {
                tokio::time::sleep(self.hold).await;
            }
            self.seen.lock().unwrap().push((Instant::now(), view));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn rss(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{}</title><link>https://x.example/{}</link></item>", t, t))
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>c</title><link>l</link><description>d</description>{}</channel></rss>"#,
            items
        )
    }

    fn prices(values: &[f64]) -> PriceSeries {
        PriceSeries::from_samples(
            values
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    PriceSample::new(Utc.timestamp_opt(1_737_381_600 + i as i64 * 60, 0).unwrap(), p)
                })
                .collect(),
        )
    }

    fn board(
        quotes: Arc<FakeQuotes>,
        feeds: Arc<FakeFeeds>,
        feed_specs: Vec<FeedSpec>,
        interval: Duration,
    ) -> RefreshScheduler {
        RefreshScheduler::new(
            vec![Symbol::us100_futures(), Symbol::usd_sek()],
            feed_specs,
            QuoteSource::new(quotes, Duration::from_secs(5)),
            NewsSource::new(feeds, Duration::from_secs(5), 3),
            MetricDeriver::new(ReferencePolicy::SessionOpen),
            interval,
        )
        .unwrap()
        .with_sentiment(Arc::new(StaticSentiment::new(default_drivers())))
    }

    fn healthy_quotes() -> FakeQuotes {
        FakeQuotes::default()
            .with_series("NQ=F", prices(&[21_000.0, 21_105.0]))
            .with_series("SEK=X", prices(&[10.40, 10.52]))
    }

    // ============================================================================
    // Partial failure
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_slow_symbol_does_not_block_fast_symbol() {
        let quotes = Arc::new(healthy_quotes().with_delay("NQ=F", Duration::from_secs(3600)));
        let mut sched = board(quotes, Arc::new(FakeFeeds::default()), vec![], Duration::from_secs(30));

        let started = Instant::now();
        let view = sched.run_once().await.unwrap();

        // Bounded by the 5s quote timeout, not the 1h stall
        assert!(started.elapsed() <= Duration::from_secs(6));
        assert_eq!(view.metrics[0], DerivedMetric::zero(Symbol::us100_futures()));
        let sek = &view.metrics[1];
        assert_eq!(sek.symbol.code, "SEK=X");
        assert!((sek.price - 10.52).abs() < 1e-9);
        assert!(!sek.stale);
    }

    #[tokio::test]
    async fn test_broken_feed_contributes_nothing_others_still_do() {
        let feeds = Arc::new(
            FakeFeeds::default()
                .with_body("https://a.example/rss", &rss(&["a1", "a2"]))
                .with_body("https://b.example/rss", "<html>502 Bad Gateway</html>")
                .with_body("https://c.example/rss", &rss(&["c1", "c2", "c3", "c4"])),
        );
        let specs = vec![
            FeedSpec::new("https://a.example/rss", "A"),
            FeedSpec::new("https://b.example/rss", "B"),
            FeedSpec::new("https://c.example/rss", "C"),
            FeedSpec::new("https://missing.example/rss", "D"),
        ];
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sched = board(Arc::new(healthy_quotes()), feeds, specs, Duration::from_secs(30))
            .with_publisher(publisher.clone());

        sched.run_once().await.unwrap();

        let seen = publisher.seen();
        assert_eq!(seen.len(), 1);
        let titles: Vec<_> = seen[0].1.news.items().iter().map(|i| i.title.as_str()).collect();
        // C is capped at 3, B and D contribute nothing
        assert_eq!(titles, vec!["a1", "a2", "c1", "c2", "c3"]);
        assert_eq!(seen[0].1.news.from_source("B").count(), 0);
        assert_eq!(seen[0].1.drivers.len(), 3);
    }

    #[tokio::test]
    async fn test_all_sources_down_still_publishes() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sched = board(
            Arc::new(FakeQuotes::default()),
            Arc::new(FakeFeeds::default()),
            vec![FeedSpec::new("https://a.example/rss", "A")],
            Duration::from_secs(30),
        )
        .with_publisher(publisher.clone());

        let view = sched.run_once().await.unwrap();
        assert_eq!(view.missing_count(), 2);
        assert!(view.news.is_empty());
        assert_eq!(publisher.seen().len(), 1);
        assert!(!view.render_text().is_empty());
    }

    // ============================================================================
    // Loop behaviour
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_publishes_never_overlap() {
        let publisher = Arc::new(RecordingPublisher::holding(Duration::from_secs(2)));
        let mut sched = board(
            Arc::new(healthy_quotes()),
            Arc::new(FakeFeeds::default()),
            vec![],
            Duration::from_secs(1),
        )
        .with_publisher(publisher.clone());

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            stopper.cancel();
        });

        let cycles = sched.run(cancel).await.unwrap();

        let seen = publisher.seen();
        assert_eq!(seen.len() as u64, cycles);
        assert!(cycles >= 3);
        assert_eq!(publisher.max_in_flight.load(Ordering::SeqCst), 1);
        let numbers: Vec<u64> = seen.iter().map(|(_, v)| v.cycle).collect();
        let expected: Vec<u64> = (1..=cycles).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_cadence() {
        // Each cycle spends 2s in the slow SEK fetch before the 30s wait
        let quotes = Arc::new(healthy_quotes().with_delay("SEK=X", Duration::from_secs(2)));
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sched = board(quotes, Arc::new(FakeFeeds::default()), vec![], Duration::from_secs(30))
            .with_publisher(publisher.clone());

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(70)).await;
            stopper.cancel();
        });

        sched.run(cancel).await.unwrap();

        let seen = publisher.seen();
        assert!(seen.len() >= 2);
        assert_eq!(seen[1].0 - seen[0].0, Duration::from_secs(32));
    }

    #[tokio::test]
    async fn test_cancel_before_start_runs_nothing() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sched = board(
            Arc::new(healthy_quotes()),
            Arc::new(FakeFeeds::default()),
            vec![],
            Duration::from_secs(30),
        )
        .with_publisher(publisher.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(sched.run(cancel).await.unwrap(), 0);
        assert!(publisher.seen().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_cycle_finishes_and_publishes() {
        let quotes = Arc::new(healthy_quotes().with_delay("NQ=F", Duration::from_secs(3)));
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sched = board(quotes, Arc::new(FakeFeeds::default()), vec![], Duration::from_secs(30))
            .with_publisher(publisher.clone());

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.cancel();
        });

        let started = Instant::now();
        let cycles = sched.run(cancel).await.unwrap();

        assert_eq!(cycles, 1);
        let seen = publisher.seen();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.metrics[0].has_data());
        // Stopped right after the cycle, without waiting out the interval
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_watch_subscriber_sees_complete_snapshot() {
        let watch = Arc::new(WatchPublisher::new());
        let mut rx = watch.subscribe();
        let mut sched = board(
            Arc::new(healthy_quotes()),
            Arc::new(FakeFeeds::default()),
            vec![],
            Duration::from_secs(30),
        )
        .with_publisher(watch.clone());

        sched.run_once().await.unwrap();
        rx.changed().await.unwrap();
        let view = rx.borrow().clone().unwrap();
        assert_eq!(view.metrics.len(), 2);
        assert_eq!(view.metrics[0].change, 105.0);
        assert!((view.metrics[0].pct - 0.5).abs() < 1e-9);
    }

    // ============================================================================
    // Idempotence
    // ============================================================================

    #[tokio::test]
    async fn test_repeated_fetches_are_identical() {
        let quotes = Arc::new(healthy_quotes());
        let source = QuoteSource::new(quotes.clone(), Duration::from_secs(5));
        let a = source.fetch(&Symbol::us100_futures()).await;
        let b = source.fetch(&Symbol::us100_futures()).await;
        assert_eq!(a, b);
        // Every call reaches the provider, nothing is cached
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 2);

        let feeds = Arc::new(FakeFeeds::default().with_body("https://a.example/rss", &rss(&["x", "y"])));
        let news = NewsSource::new(feeds, Duration::from_secs(5), 6);
        let spec = FeedSpec::new("https://a.example/rss", "A");
        assert_eq!(news.fetch(&spec).await, news.fetch(&spec).await);
    }

    #[test]
    fn test_chart_to_metric_previous_close() {
        let body = r#"{"chart":{"result":[{"meta":{"previousClose":100.0},
            "timestamp":[1737381600,1737381660],
            "indicators":{"quote":[{"close":[100.0,95.0]}]}}],"error":null}}"#;
        let series = parse_chart(body).unwrap();
        let metric = MetricDeriver::new(ReferencePolicy::PreviousClose)
            .derive(&Symbol::us100_futures(), &series);
        assert_eq!(metric.change, -5.0);
        assert_eq!(metric.pct, -5.0);
        assert_eq!(metric.price_display(), "95");
    }
}
