//! Configuration module for the signal sweep.

// Can all be private now because we have a public re-export.
mod binance;
mod debug;
mod diagnostics;

// Re-export commonly used items
pub use binance::{BINANCE, BINANCE_MAX_PAIRS, BINANCE_PAIRS_FILENAME, BinanceApiConfig};
pub use debug::{DF, LOG_PERFORMANCE};
pub use diagnostics::{DIAGNOSTICS, SIGNAL_CLIENT, SignalClientConfig, SweepConfig};
