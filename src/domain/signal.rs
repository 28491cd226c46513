use serde::{Deserialize, Serialize};

/// Trading recommendation as returned by the signal service for one (timeframe, symbol).
///
/// Field names follow the backend's camelCase JSON body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalResponse {
    pub entry_point: f64,
    #[serde(rename = "signal")]
    pub signal_label: String,
    /// 0..=100
    pub confidence: f64,
    #[serde(rename = "reasoning")]
    pub reasoning_text: String,
    #[serde(rename = "timestamp")]
    pub timestamp_iso: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
}

impl SignalResponse {
    pub fn new(
        signal_label: impl Into<String>,
        entry_point: f64,
        confidence: f64,
        reasoning_text: impl Into<String>,
        timestamp_iso: impl Into<String>,
    ) -> Self {
        Self {
            entry_point,
            signal_label: signal_label.into(),
            confidence,
            reasoning_text: reasoning_text.into(),
            timestamp_iso: timestamp_iso.into(),
            stop_loss: None,
            target_price: None,
        }
    }
}
