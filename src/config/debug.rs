//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Emit verbose logging for live price stream connections and ticks.
    pub log_price_stream_updates: bool,

    /// Log the connectivity check and grace wait before a sweep.
    pub log_bootstrap: bool,

    /// Log every classified probe (symbol, timeframe, source, message).
    pub log_probe_results: bool,

    /// Log each partial result publication.
    pub log_publish: bool,

    pub log_signal_requests: bool,
}

pub const DF: LogFlags = LogFlags {
    log_bootstrap: true,
    log_probe_results: true,

    log_publish: false,
    log_signal_requests: false,
    log_price_stream_updates: false,
};

/// Activate trace_time macro (scope-level timing of slow probes)
pub const LOG_PERFORMANCE: bool = cfg!(debug_assertions);
