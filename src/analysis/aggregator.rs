use crate::models::{HealthStatus, ProbeResult, RunSummary, SignalSource};

/// Reduce a finished result set to counts and a health verdict.
///
/// `total` is the grid size; a zero total only happens on a rejected grid and
/// yields 0% rather than dividing by zero.
pub fn summarize(results: &[ProbeResult], total: usize, is_connected: bool) -> RunSummary {
    let live_count = results
        .iter()
        .filter(|r| r.signal_source == SignalSource::Live)
        .count();
    let live_percentage = live_percentage(live_count, total);
    let status = HealthStatus::from_percentage(live_percentage);

    RunSummary {
        live_count,
        total_tests: total,
        live_percentage,
        is_connected,
        status,
        status_message: status.to_string(),
    }
}

pub fn live_percentage(live_count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * live_count as f64 / total as f64
}
