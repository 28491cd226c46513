//! Decides where a probe's signal came from.
//!
//! Rules run in a fixed priority order and the first match wins. The fallback
//! checks sit above the price-proximity check so a placeholder signal whose
//! entry happens to sit near the market is never reported as live.

use chrono::NaiveDate;

use crate::config::DIAGNOSTICS;
use crate::domain::SignalResponse;
use crate::models::SignalSource;
use crate::utils::calendar_date_utc;

const WAITING_MARKER: &str = "Waiting for";
const CONNECT_FAILURE_MARKER: &str = "Unable to connect";

pub const MSG_FALLBACK: &str = "Using fallback signal";
pub const MSG_CONNECTION_ISSUE: &str = "Connection issue";
pub const MSG_LIVE: &str = "Using live data";
pub const MSG_CACHED: &str = "Using cached data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub source: SignalSource,
    pub is_live: bool,
    pub message: String,
}

impl Classification {
    fn new(source: SignalSource, message: &str) -> Self {
        Self {
            source,
            is_live: source == SignalSource::Live,
            message: message.to_string(),
        }
    }
}

/// Classify with the default 1% live tolerance.
pub fn classify(signal: &SignalResponse, last_price: Option<f64>, today: NaiveDate) -> Classification {
    classify_with_tolerance(signal, last_price, today, DIAGNOSTICS.live_tolerance)
}

pub fn classify_with_tolerance(
    signal: &SignalResponse,
    last_price: Option<f64>,
    today: NaiveDate,
    tolerance: f64,
) -> Classification {
    // 1. Placeholder emitted while the signal engine has nothing computed yet
    if signal.confidence == 0.0 && signal.reasoning_text.contains(WAITING_MARKER) {
        return Classification::new(SignalSource::Fallback, MSG_FALLBACK);
    }

    // 2. Upstream reported it could not reach its own data source
    if signal.reasoning_text.contains(CONNECT_FAILURE_MARKER) {
        return Classification::new(SignalSource::Fallback, MSG_CONNECTION_ISSUE);
    }

    // 3. Entry point within tolerance of the observed price
    if let Some(price) = last_price {
        if is_near_price(price, signal.entry_point, tolerance) {
            return Classification::new(SignalSource::Live, MSG_LIVE);
        }
    }

    // 4. Produced today (UTC) but not tracking the market
    if calendar_date_utc(&signal.timestamp_iso) == Some(today) {
        return Classification::new(SignalSource::Cached, MSG_CACHED);
    }

    Classification::new(SignalSource::Unknown, "")
}

/// Strict `|price - entry| < tolerance * price`.
pub fn is_near_price(price: f64, entry_point: f64, tolerance: f64) -> bool {
    (price - entry_point).abs() < tolerance * price
}
