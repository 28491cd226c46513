use {
    crate::analysis::classifier::Classification,
    crate::domain::{Probe, SignalResponse},
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter},
};

pub const ERROR_LABEL: &str = "ERROR";

/// Where the signal shown to a user is coming from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalSource {
    #[strum(to_string = "LIVE")]
    Live,
    #[strum(to_string = "CACHED")]
    Cached,
    #[strum(to_string = "FALLBACK")]
    Fallback,
    #[strum(to_string = "UNKNOWN")]
    #[default]
    Unknown,
}

/// Outcome of one probe. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub symbol: String,
    pub timeframe: String,
    pub is_live_data: bool,
    pub signal_source: SignalSource,
    pub last_price: Option<f64>,
    pub entry_point: f64,
    pub signal_label: String,
    pub confidence: f64,
    #[serde(rename = "timestamp")]
    pub timestamp_iso: String,
    pub message: String,
}

impl ProbeResult {
    pub fn classified(
        probe: &Probe,
        signal: &SignalResponse,
        last_price: Option<f64>,
        verdict: Classification,
    ) -> Self {
        Self {
            symbol: probe.symbol.clone(),
            timeframe: probe.timeframe.clone(),
            is_live_data: verdict.is_live,
            signal_source: verdict.source,
            last_price,
            entry_point: signal.entry_point,
            signal_label: signal.signal_label.clone(),
            confidence: signal.confidence,
            timestamp_iso: signal.timestamp_iso.clone(),
            message: verdict.message,
        }
    }

    /// Entry recorded when the signal request itself failed.
    pub fn failed(probe: &Probe, description: &str, now_iso: String) -> Self {
        Self {
            symbol: probe.symbol.clone(),
            timeframe: probe.timeframe.clone(),
            is_live_data: false,
            signal_source: SignalSource::Unknown,
            last_price: None,
            entry_point: 0.0,
            signal_label: ERROR_LABEL.to_string(),
            confidence: 0.0,
            timestamp_iso: now_iso,
            message: format!("Error: {}", description),
        }
    }

    pub fn is_error(&self) -> bool {
        self.signal_label == ERROR_LABEL
    }

    pub fn probe(&self) -> Probe {
        Probe::new(self.symbol.as_str(), self.timeframe.as_str())
    }
}
