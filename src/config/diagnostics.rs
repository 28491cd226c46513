//! Tunables for the diagnostic sweep.

use std::time::Duration;

pub struct DiagnosticsConfig {
    /// How long the bootstrapper waits after asking the market-data feed to connect.
    pub connect_grace: Duration,
    /// Publish a partial result snapshot every time this many probes have completed.
    pub publish_every: usize,
    /// Relative distance between entry point and last price still counted as live (1%).
    pub live_tolerance: f64,
    /// Probes in flight at once. 1 keeps the sweep strictly sequential.
    pub max_concurrency: usize,
    pub default_timeframes: &'static [&'static str],
    pub default_symbols: &'static [&'static str],
    /// Probes slower than this are reported by trace_time (micros).
    pub slow_probe_micros: u128,
}

pub const DIAGNOSTICS: DiagnosticsConfig = DiagnosticsConfig {
    connect_grace: Duration::from_millis(1000),
    publish_every: 3,
    live_tolerance: 0.01,
    max_concurrency: 1,
    default_timeframes: &["1m", "5m", "15m", "1h", "4h", "1d"],
    default_symbols: &["ETHUSDT", "BTCUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT"],
    slow_probe_micros: 2_000_000,
};

pub struct SignalClientDefaults {
    pub base_url: &'static str,
    pub timeout_ms: u64,
    /// Requests allowed per wall-clock minute against the signal backend.
    pub requests_per_minute: u32,
}

pub const SIGNAL_CLIENT: SignalClientDefaults = SignalClientDefaults {
    base_url: "http://localhost:8000",
    timeout_ms: 10_000,
    requests_per_minute: 600,
};

/// Runtime knobs for one sweep. Defaults come from [`DIAGNOSTICS`].
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub connect_grace: Duration,
    pub publish_every: usize,
    pub live_tolerance: f64,
    pub concurrency: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            connect_grace: DIAGNOSTICS.connect_grace,
            publish_every: DIAGNOSTICS.publish_every,
            live_tolerance: DIAGNOSTICS.live_tolerance,
            concurrency: DIAGNOSTICS.max_concurrency,
        }
    }
}

impl SweepConfig {
    /// K used for batched publication. Never zero.
    pub fn batch_size(&self) -> usize {
        self.publish_every.max(1)
    }

    pub fn pool_size(&self) -> usize {
        self.concurrency.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct SignalClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub requests_per_minute: u32,
}

impl Default for SignalClientConfig {
    fn default() -> Self {
        Self {
            base_url: SIGNAL_CLIENT.base_url.to_string(),
            timeout_ms: SIGNAL_CLIENT.timeout_ms,
            requests_per_minute: SIGNAL_CLIENT.requests_per_minute,
        }
    }
}
