use {
    super::probe_result::{ProbeResult, SignalSource},
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunProgress {
    pub completed: usize,
    pub total: usize,
}

impl RunProgress {
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

impl std::fmt::Display for RunProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Qualitative verdict on the share of probes backed by live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum HealthStatus {
    #[strum(to_string = "Excellent: Most symbols are using live data")]
    Excellent,
    #[strum(to_string = "Good: Majority of symbols are using live data")]
    Good,
    #[strum(to_string = "Fair: About half of symbols are using live data")]
    Fair,
    #[strum(to_string = "Poor: Less than half of symbols are using live data")]
    Poor,
    #[strum(to_string = "Critical: Few or no symbols are using live data")]
    Critical,
}

impl HealthStatus {
    /// Thresholds are checked high to low; the first one reached wins.
    pub fn from_percentage(live_pct: f64) -> Self {
        if live_pct >= 90.0 {
            HealthStatus::Excellent
        } else if live_pct >= 70.0 {
            HealthStatus::Good
        } else if live_pct >= 50.0 {
            HealthStatus::Fair
        } else if live_pct >= 30.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub live_count: usize,
    pub total_tests: usize,
    pub live_percentage: f64,
    pub is_connected: bool,
    pub status: HealthStatus,
    pub status_message: String,
}

/// State owned by one sweep. A new sweep gets a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRun {
    pub progress: RunProgress,
    pub results: Vec<ProbeResult>,
    pub summary: Option<RunSummary>,
}

impl DiagnosticRun {
    pub fn new(total: usize) -> Self {
        Self {
            progress: RunProgress::new(total),
            results: Vec::with_capacity(total),
            summary: None,
        }
    }

    /// Append a finished probe; progress moves in lock step with the result list.
    pub fn record(&mut self, result: ProbeResult) {
        self.results.push(result);
        self.progress.completed = self.results.len();
    }

    pub fn count_by_source(&self, source: SignalSource) -> usize {
        self.results
            .iter()
            .filter(|r| r.signal_source == source)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.is_error())
    }
}

/// What an observer of a sweep can see at any moment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepSnapshot {
    pub loading: bool,
    pub progress: RunProgress,
    /// Latest published (partial or final) result list.
    pub results: Vec<ProbeResult>,
    pub summary: Option<RunSummary>,
}
