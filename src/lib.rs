#![allow(clippy::collapsible_if)]
#![allow(clippy::new_without_default)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::config::{BINANCE_PAIRS_FILENAME, DIAGNOSTICS, SIGNAL_CLIENT, SignalClientConfig, SweepConfig};
use crate::data::{StaticSymbolRegistry, SymbolRegistry};
use crate::utils::TimeUtils;

// Re-export commonly used types outside of crate
pub use analysis::{classify, summarize};
pub use data::{HttpSignalService, MarketDataService, PriceStreamManager, SignalService};
pub use domain::{Probe, SignalResponse};
pub use engine::{SweepController, SweepEngine, SweepError, SweepHandle};
pub use models::{DiagnosticRun, ProbeResult, RunProgress, RunSummary, SignalSource, SweepSnapshot};

// CLI argument parsing
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Check whether every symbol/timeframe signal is backed by live data", long_about = None)]
pub struct Cli {
    /// Symbols to probe, comma separated. Takes precedence over --pairs-file
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// File with one symbol per line (defaults to ./pairs.txt when present)
    #[arg(long)]
    pub pairs_file: Option<PathBuf>,

    /// Timeframes to probe, comma separated
    #[arg(long, value_delimiter = ',')]
    pub timeframes: Vec<String>,

    /// Base URL of the signal service
    #[arg(long, default_value = SIGNAL_CLIENT.base_url)]
    pub signal_url: String,

    /// Probes in flight at once (1 = strictly sequential)
    #[arg(long, default_value_t = DIAGNOSTICS.max_concurrency)]
    pub concurrency: usize,

    /// Publish partial results every N completed probes
    #[arg(long, default_value_t = DIAGNOSTICS.publish_every)]
    pub publish_every: usize,

    /// Wait after asking the price feed to connect, in milliseconds
    #[arg(long, default_value_t = DIAGNOSTICS.connect_grace.as_millis() as u64)]
    pub grace_ms: u64,

    /// Print the finished run as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Cli {
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            connect_grace: Duration::from_millis(self.grace_ms),
            publish_every: self.publish_every,
            concurrency: self.concurrency,
            ..SweepConfig::default()
        }
    }

    pub fn signal_client_config(&self) -> SignalClientConfig {
        SignalClientConfig {
            base_url: self.signal_url.clone(),
            ..SignalClientConfig::default()
        }
    }

    /// --symbols, else --pairs-file, else ./pairs.txt if it exists, else the built-in list.
    pub fn resolve_symbols(&self) -> Result<Vec<String>> {
        let registry = if !self.symbols.is_empty() {
            StaticSymbolRegistry::new(&self.symbols)
        } else if let Some(path) = &self.pairs_file {
            StaticSymbolRegistry::from_pairs_file(path)?
        } else if Path::new(BINANCE_PAIRS_FILENAME).exists() {
            StaticSymbolRegistry::from_pairs_file(Path::new(BINANCE_PAIRS_FILENAME))?
        } else {
            StaticSymbolRegistry::defaults()
        };
        Ok(registry.list_available_symbols())
    }

    /// Requested timeframes, or the default set. Unknown shorthands are kept but flagged.
    pub fn resolve_timeframes(&self) -> Vec<String> {
        let timeframes: Vec<String> = if self.timeframes.is_empty() {
            DIAGNOSTICS
                .default_timeframes
                .iter()
                .map(|tf| tf.to_string())
                .collect()
        } else {
            self.timeframes
                .iter()
                .map(|tf| tf.trim().to_string())
                .filter(|tf| !tf.is_empty())
                .collect()
        };

        for tf in &timeframes {
            if TimeUtils::interval_from_string(tf).is_none() {
                log::warn!("Timeframe '{}' is not a known interval; probing it anyway", tf);
            }
        }
        timeframes
    }
}
