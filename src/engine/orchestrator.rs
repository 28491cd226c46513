use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::watch;

use crate::analysis::{classify_with_tolerance, summarize};
use crate::config::{DF, DIAGNOSTICS, SweepConfig};
use crate::data::{MarketDataService, SignalService, SymbolRegistry};
use crate::domain::{Probe, build_grid};
use crate::models::{DiagnosticRun, ProbeResult, RunProgress, SweepSnapshot};
use crate::utils::to_iso;

use super::bootstrap::ensure_connected;
use super::error::{SweepError, SweepResult};

/// Source of "now" for error timestamps and the cached-data date check.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs diagnostic sweeps against a signal service and a market-data feed.
///
/// The engine itself holds no run state; every call to [`SweepEngine::run`]
/// builds its own [`DiagnosticRun`], so concurrent sweeps never share progress
/// or results.
pub struct SweepEngine {
    signals: Arc<dyn SignalService>,
    market: Arc<dyn MarketDataService>,
    config: SweepConfig,
    clock: Clock,
}

impl SweepEngine {
    pub fn new(
        signals: Arc<dyn SignalService>,
        market: Arc<dyn MarketDataService>,
        config: SweepConfig,
    ) -> Self {
        Self {
            signals,
            market,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Reject grids with an empty axis. Returns the probe count otherwise.
    pub fn validate_grid(symbols: &[String], timeframes: &[String]) -> SweepResult<usize> {
        if symbols.is_empty() || timeframes.is_empty() {
            return Err(SweepError::InvalidGrid {
                symbols: symbols.len(),
                timeframes: timeframes.len(),
            });
        }
        Ok(symbols.len() * timeframes.len())
    }

    /// Sweep the grid without an outside observer.
    pub async fn run(&self, symbols: &[String], timeframes: &[String]) -> SweepResult<DiagnosticRun> {
        let (tx, _rx) = watch::channel(SweepSnapshot::default());
        self.run_with_observer(symbols, timeframes, &tx).await
    }

    pub async fn run_from_registry(
        &self,
        registry: &dyn SymbolRegistry,
        timeframes: &[String],
    ) -> SweepResult<DiagnosticRun> {
        let symbols = registry.list_available_symbols();
        self.run(&symbols, timeframes).await
    }

    /// Sweep the grid, publishing progress and batched results on `observer`.
    ///
    /// Publication points: start (loading, empty results), every completed probe
    /// (progress), every K-th result (results), loop end (all results), and
    /// finally the summary with `loading = false`.
    pub async fn run_with_observer(
        &self,
        symbols: &[String],
        timeframes: &[String],
        observer: &watch::Sender<SweepSnapshot>,
    ) -> SweepResult<DiagnosticRun> {
        let total = Self::validate_grid(symbols, timeframes)?;
        let grid = build_grid(symbols, timeframes);
        debug_assert_eq!(grid.len(), total);

        let mut run = DiagnosticRun::new(total);
        observer.send_replace(SweepSnapshot {
            loading: true,
            progress: RunProgress::new(total),
            results: Vec::new(),
            summary: None,
        });

        log::info!(
            "Starting sweep: {} symbols x {} timeframes = {} probes",
            symbols.len(),
            timeframes.len(),
            total
        );

        // Outcome does not gate probing.
        ensure_connected(self.market.as_ref(), self.config.connect_grace).await;

        let batch = self.config.batch_size();

        // `buffered` keeps grid order even with several probes in flight.
        let mut probes = futures::stream::iter(grid)
            .map(|probe| self.execute_probe(probe))
            .buffered(self.config.pool_size());

        while let Some(result) = probes.next().await {
            run.record(result);
            let publish_results = run.results.len() % batch == 0;

            observer.send_modify(|snapshot| {
                snapshot.progress = run.progress;
                if publish_results {
                    snapshot.results = run.results.clone();
                }
            });

            if publish_results && DF.log_publish {
                log::debug!("Published {} results", run.results.len());
            }
        }
        drop(probes);
        debug_assert!(run.progress.is_done());

        observer.send_modify(|snapshot| {
            snapshot.progress = run.progress;
            snapshot.results = run.results.clone();
        });

        let summary = summarize(&run.results, total, self.market.is_connected());
        log::info!(
            "Sweep complete: {}/{} live ({:.1}%), connected: {}. {}",
            summary.live_count,
            summary.total_tests,
            summary.live_percentage,
            summary.is_connected,
            summary.status_message
        );

        run.summary = Some(summary.clone());
        observer.send_modify(|snapshot| {
            snapshot.summary = Some(summary);
            snapshot.loading = false;
        });

        Ok(run)
    }

    /// One probe. Never fails: a signal error becomes an `ERROR` result.
    async fn execute_probe(&self, probe: Probe) -> ProbeResult {
        let last_price = self.market.get_current_price(&probe.price_key());

        let outcome = crate::trace_time!(&format!("Probe [{}]", probe), DIAGNOSTICS.slow_probe_micros, {
            self.signals
                .get_signal(&probe.timeframe, &probe.symbol)
                .await
        });

        let now = (self.clock)();
        match outcome {
            Ok(signal) => {
                let verdict = classify_with_tolerance(
                    &signal,
                    last_price,
                    now.date_naive(),
                    self.config.live_tolerance,
                );
                if DF.log_probe_results {
                    log::info!(
                        "{} -> {} (entry {:.4}, price {:?}) {}",
                        probe,
                        verdict.source,
                        signal.entry_point,
                        last_price,
                        verdict.message
                    );
                }
                ProbeResult::classified(&probe, &signal, last_price, verdict)
            }
            Err(e) => {
                log::warn!("{} -> signal request failed: {}", probe, e);
                ProbeResult::failed(&probe, &e.to_string(), to_iso(&now))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SignalFetchError;
    use crate::engine::test_support::{FakeMarket, ScriptedSignals, fixed_clock, strings, today_signal};
    use crate::models::{ERROR_LABEL, HealthStatus, SignalSource};
    use std::time::Duration;

    fn config() -> SweepConfig {
        SweepConfig {
            connect_grace: Duration::ZERO,
            ..SweepConfig::default()
        }
    }

    fn engine(signals: Arc<ScriptedSignals>, market: Arc<FakeMarket>, config: SweepConfig) -> SweepEngine {
        SweepEngine::new(signals, market, config).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn completes_every_probe_in_grid_order() {
        let signals = Arc::new(ScriptedSignals::new());
        let market = Arc::new(FakeMarket::connected());
        let run = engine(signals.clone(), market, config())
            .run(&strings(&["ETHUSDT", "BTCUSDT"]), &strings(&["15m", "1h", "4h"]))
            .await
            .unwrap();

        assert_eq!(run.progress, RunProgress { completed: 6, total: 6 });
        assert_eq!(run.results.len(), 6);
        let order: Vec<String> = run.results.iter().map(|r| r.probe().to_string()).collect();
        assert_eq!(
            order,
            vec!["ETHUSDT/15m", "ETHUSDT/1h", "ETHUSDT/4h", "BTCUSDT/15m", "BTCUSDT/1h", "BTCUSDT/4h"]
        );
        assert_eq!(
            signals.calls(),
            vec![
                ("15m".to_string(), "ETHUSDT".to_string()),
                ("1h".to_string(), "ETHUSDT".to_string()),
                ("4h".to_string(), "ETHUSDT".to_string()),
                ("15m".to_string(), "BTCUSDT".to_string()),
                ("1h".to_string(), "BTCUSDT".to_string()),
                ("4h".to_string(), "BTCUSDT".to_string()),
            ]
        );
        assert!(run.summary.is_some());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_sweep() {
        let signals = Arc::new(
            ScriptedSignals::new().fail("1h", "SOLUSDT", SignalFetchError::transport("connection reset")),
        );
        let market = Arc::new(FakeMarket::connected());
        let run = engine(signals, market, config())
            .run(&strings(&["ETHUSDT", "SOLUSDT"]), &strings(&["15m", "1h"]))
            .await
            .unwrap();

        assert_eq!(run.results.len(), 4);
        let errors: Vec<&ProbeResult> = run.errors().collect();
        assert_eq!(errors.len(), 1);
        let failed = errors[0];
        assert_eq!(failed.probe(), Probe::new("SOLUSDT", "1h"));
        assert_eq!(failed.signal_label, ERROR_LABEL);
        assert_eq!(failed.confidence, 0.0);
        assert!(!failed.is_live_data);
        assert_eq!(failed.last_price, None);
        assert_eq!(failed.message, "Error: transport error: connection reset");
        assert_eq!(failed.timestamp_iso, "2024-05-17T12:00:00.000Z");

        for ok in run.results.iter().filter(|r| !r.is_error()) {
            assert_eq!(ok.signal_source, SignalSource::Cached);
            assert_eq!(ok.message, "Using cached data");
        }
    }

    #[tokio::test]
    async fn eth_btc_scenario() {
        let signals = Arc::new(
            ScriptedSignals::new()
                .respond("15m", "ETHUSDT", today_signal(2500.0, 80.0, "trend up"))
                .fail("4h", "BTCUSDT", SignalFetchError::Status { code: 502, body: "bad gateway".into() }),
        );
        let market = Arc::new(FakeMarket::connected().with_price("ethusdt", 2505.0));
        let run = engine(signals, market, config())
            .run(&strings(&["ETHUSDT", "BTCUSDT"]), &strings(&["15m", "1h", "4h"]))
            .await
            .unwrap();

        assert_eq!(run.progress, RunProgress { completed: 6, total: 6 });
        let eth_15m = &run.results[0];
        assert_eq!(eth_15m.signal_source, SignalSource::Live);
        assert!(eth_15m.is_live_data);
        assert_eq!(eth_15m.last_price, Some(2505.0));

        let errors: Vec<&ProbeResult> = run.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].probe(), Probe::new("BTCUSDT", "4h"));

        let summary = run.summary.unwrap();
        assert!(summary.live_count >= 1);
        assert_eq!(summary.total_tests, 6);
        assert!(summary.is_connected);
    }

    #[tokio::test]
    async fn empty_axis_is_rejected_before_any_io() {
        let signals = Arc::new(ScriptedSignals::new());
        let market = Arc::new(FakeMarket::disconnected());
        let engine = engine(signals.clone(), market.clone(), config());

        let err = engine.run(&[], &strings(&["15m"])).await.unwrap_err();
        assert_eq!(err, SweepError::InvalidGrid { symbols: 0, timeframes: 1 });
        let err = engine.run(&strings(&["ETHUSDT"]), &[]).await.unwrap_err();
        assert_eq!(err, SweepError::InvalidGrid { symbols: 1, timeframes: 0 });

        assert!(signals.calls().is_empty());
        assert_eq!(market.connect_calls(), 0);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_runs() {
        let build = || {
            let signals = Arc::new(
                ScriptedSignals::new()
                    .respond("1h", "ETHUSDT", today_signal(2500.0, 70.0, "trend"))
                    .fail("4h", "BTCUSDT", SignalFetchError::transport("timeout")),
            );
            let market = Arc::new(FakeMarket::connected().with_price("ethusdt", 2499.0));
            engine(signals, market, config())
        };
        let symbols = strings(&["ETHUSDT", "BTCUSDT"]);
        let timeframes = strings(&["1h", "4h"]);

        let first = build().run(&symbols, &timeframes).await.unwrap();
        let second = build().run(&symbols, &timeframes).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn results_are_published_every_k_completions() {
        let (tx, rx) = watch::channel(SweepSnapshot::default());
        let signals = Arc::new(ScriptedSignals::new().observing(rx.clone()));
        let market = Arc::new(FakeMarket::connected());
        let symbols = strings(&["A1USDT", "A2USDT", "A3USDT", "A4USDT", "A5USDT", "A6USDT", "A7USDT"]);

        let run = engine(signals.clone(), market, config())
            .run_with_observer(&symbols, &strings(&["1h"]), &tx)
            .await
            .unwrap();

        // What an observer saw when probe i started: completed == i, results in batches of 3.
        let seen = signals.observed();
        let completed: Vec<usize> = seen.iter().map(|(c, _)| *c).collect();
        let published: Vec<usize> = seen.iter().map(|(_, p)| *p).collect();
        assert_eq!(completed, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(published, vec![0, 0, 0, 3, 3, 3, 6]);

        let last = rx.borrow().clone();
        assert!(!last.loading);
        assert_eq!(last.results.len(), 7);
        assert_eq!(last.progress, RunProgress { completed: 7, total: 7 });
        assert_eq!(last.summary, run.summary);
    }

    #[tokio::test]
    async fn publish_every_one_streams_each_result() {
        let (tx, rx) = watch::channel(SweepSnapshot::default());
        let signals = Arc::new(ScriptedSignals::new().observing(rx));
        let market = Arc::new(FakeMarket::connected());
        let cfg = SweepConfig {
            publish_every: 1,
            ..config()
        };

        engine(signals.clone(), market, cfg)
            .run_with_observer(&strings(&["ETHUSDT"]), &strings(&["1m", "5m", "15m"]), &tx)
            .await
            .unwrap();

        let published: Vec<usize> = signals.observed().iter().map(|(_, p)| *p).collect();
        assert_eq!(published, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_feed_still_sweeps_and_reports_critical() {
        let signals = Arc::new(ScriptedSignals::failing_all(SignalFetchError::transport("refused")));
        let market = Arc::new(FakeMarket::disconnected());
        let cfg = SweepConfig::default();

        let run = engine(signals, market.clone(), cfg)
            .run(&strings(&["ETHUSDT", "BTCUSDT"]), &strings(&["15m"]))
            .await
            .unwrap();

        assert_eq!(market.connect_calls(), 1);
        assert_eq!(run.results.len(), 2);
        assert!(run.results.iter().all(|r| r.is_error()));
        let summary = run.summary.unwrap();
        assert!(!summary.is_connected);
        assert_eq!(summary.live_count, 0);
        assert_eq!(summary.status, HealthStatus::Critical);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_pool_keeps_grid_order_and_summary() {
        let symbols = strings(&["ETHUSDT", "BTCUSDT", "SOLUSDT"]);
        let timeframes = strings(&["15m", "1h"]);
        let build = |concurrency: usize| {
            // Earlier probes answer slower, so completion order is reversed.
            let signals = Arc::new(
                ScriptedSignals::new()
                    .respond("15m", "ETHUSDT", today_signal(2500.0, 80.0, "trend up"))
                    .with_delays(vec![
                        Duration::from_millis(600),
                        Duration::from_millis(500),
                        Duration::from_millis(400),
                        Duration::from_millis(300),
                        Duration::from_millis(200),
                        Duration::from_millis(100),
                    ]),
            );
            let market = Arc::new(FakeMarket::connected().with_price("ethusdt", 2505.0));
            let cfg = SweepConfig {
                concurrency,
                ..config()
            };
            engine(signals, market, cfg)
        };

        let started = tokio::time::Instant::now();
        let sequential = build(1).run(&symbols, &timeframes).await.unwrap();
        let sequential_elapsed = started.elapsed();

        let started = tokio::time::Instant::now();
        let pooled = build(3).run(&symbols, &timeframes).await.unwrap();
        let pooled_elapsed = started.elapsed();

        // One at a time pays every delay (2.1s). Three in flight overlap them:
        // the first three finish by 600ms, the last three start then and end by 900ms.
        assert!(sequential_elapsed >= Duration::from_millis(2100), "{:?}", sequential_elapsed);
        assert!(pooled_elapsed < sequential_elapsed);
        assert!(pooled_elapsed <= Duration::from_millis(1000), "{:?}", pooled_elapsed);

        assert_eq!(pooled.results, sequential.results);
        assert_eq!(pooled.summary, sequential.summary);
        assert_eq!(pooled.progress, RunProgress { completed: 6, total: 6 });
    }

    #[tokio::test]
    async fn runs_symbols_from_registry() {
        use crate::data::StaticSymbolRegistry;

        let signals = Arc::new(ScriptedSignals::new());
        let market = Arc::new(FakeMarket::connected());
        let registry = StaticSymbolRegistry::new(["ethusdt", "btcusdt"]);
        let run = engine(signals.clone(), market, config())
            .run_from_registry(&registry, &strings(&["1h"]))
            .await
            .unwrap();

        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[0].symbol, "ETHUSDT");
    }
}
