pub mod price_stream;
pub mod provider;
mod rate_limiter;
pub mod signal_client;
pub mod symbols;

pub use {
    price_stream::{ConnectionStatus, PriceStreamManager},
    provider::{MarketDataService, SignalFetchError, SignalService, SymbolRegistry},
    rate_limiter::SignalRateLimiter,
    signal_client::HttpSignalService,
    symbols::StaticSymbolRegistry,
};
