use std::time::Duration;

use async_trait::async_trait;

use crate::config::{DF, SignalClientConfig};
use crate::domain::SignalResponse;

use super::provider::{SignalFetchError, SignalService};
use super::rate_limiter::SignalRateLimiter;

/// Longest error body kept in a `Status` error.
const MAX_ERROR_BODY: usize = 200;

/// Signal service reached over HTTP: `GET {base}/api/signal?timeframe=..&symbol=..`.
pub struct HttpSignalService {
    client: reqwest::Client,
    base_url: String,
    limiter: SignalRateLimiter,
}

impl HttpSignalService {
    pub fn new(config: &SignalClientConfig) -> Result<Self, SignalFetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SignalFetchError::transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: SignalRateLimiter::new(config.requests_per_minute),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/signal", self.base_url)
    }
}

#[async_trait]
impl SignalService for HttpSignalService {
    async fn get_signal(
        &self,
        timeframe: &str,
        symbol: &str,
    ) -> Result<SignalResponse, SignalFetchError> {
        self.limiter.acquire(1, symbol).await;

        if DF.log_signal_requests {
            log::debug!("GET {} timeframe={} symbol={}", self.endpoint(), timeframe, symbol);
        }

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("timeframe", timeframe), ("symbol", symbol)])
            .send()
            .await
            .map_err(|e| SignalFetchError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SignalFetchError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SignalFetchError::Status {
                code: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        // 204, or 200 with nothing in it: the backend has no signal for this pair.
        if body.trim().is_empty() {
            return Err(SignalFetchError::unavailable(format!(
                "empty response for {} {} (HTTP {})",
                symbol,
                timeframe,
                status.as_u16()
            )));
        }

        decode_signal(&body)
    }
}

pub fn decode_signal(body: &str) -> Result<SignalResponse, SignalFetchError> {
    serde_json::from_str(body).map_err(|e| SignalFetchError::parse(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
