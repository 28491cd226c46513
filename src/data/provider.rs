use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SignalResponse;

/// Failure of a single signal request. The `Display` text is what ends up in
/// the probe's `"Error: ..."` message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalFetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("signal service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not decode signal: {0}")]
    Parse(String),

    #[error("signal unavailable: {0}")]
    Unavailable(String),
}

impl SignalFetchError {
    pub fn transport(msg: impl Into<String>) -> Self {
        SignalFetchError::Transport(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        SignalFetchError::Parse(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        SignalFetchError::Unavailable(msg.into())
    }
}

/// Abstract interface for fetching trading signals.
#[async_trait]
pub trait SignalService: Send + Sync {
    async fn get_signal(
        &self,
        timeframe: &str,
        symbol: &str,
    ) -> Result<SignalResponse, SignalFetchError>;
}

/// Live price feed as seen by the diagnostics.
pub trait MarketDataService: Send + Sync {
    /// Last observed price, keyed by lowercase symbol.
    fn get_current_price(&self, symbol_lowercase: &str) -> Option<f64>;

    fn is_connected(&self) -> bool;

    /// Ask the feed to connect. Returns immediately; the connection comes up in the background.
    fn connect(&self);
}

pub trait SymbolRegistry: Send + Sync {
    fn list_available_symbols(&self) -> Vec<String>;
}
