use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use strum::IntoEnumIterator;
use tabled::{Table, Tabled};

use signal_sweep::{
    Cli, DiagnosticRun, HttpSignalService, MarketDataService, PriceStreamManager, ProbeResult,
    SignalSource, SweepController, SweepEngine, utils::format_duration,
};

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "TF")]
    timeframe: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Last Price")]
    last_price: String,
    #[tabled(rename = "Conf")]
    confidence: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&ProbeResult> for ResultRow {
    fn from(r: &ProbeResult) -> Self {
        Self {
            symbol: r.symbol.clone(),
            timeframe: r.timeframe.clone(),
            source: r.signal_source.to_string(),
            signal: r.signal_label.clone(),
            entry: format!("{:.4}", r.entry_point),
            last_price: r
                .last_price
                .map(|p| format!("{:.4}", p))
                .unwrap_or_else(|| "-".to_string()),
            confidence: format!("{:.0}", r.confidence),
            message: r.message.clone(),
        }
    }
}

fn init_log() {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Error)
    };

    env_logger::Builder::new()
        .filter(None, global_level)
        .filter(Some("signal_sweep"), my_code_level)
        .parse_default_env() // RUST_LOG wins when set
        .init();
}

fn print_report(run: &DiagnosticRun, elapsed_ms: i64) {
    let rows: Vec<ResultRow> = run.results.iter().map(ResultRow::from).collect();
    println!("{}", Table::new(rows));

    if let Some(summary) = &run.summary {
        println!();
        println!(
            "Live: {}/{} ({:.1}%) | Feed connected: {} | Errors: {} | Took {}",
            summary.live_count,
            summary.total_tests,
            summary.live_percentage,
            summary.is_connected,
            run.errors().count(),
            format_duration(elapsed_ms)
        );
        let by_source: Vec<String> = SignalSource::iter()
            .map(|source| format!("{}: {}", source, run.count_by_source(source)))
            .collect();
        println!("{}", by_source.join(" | "));
        println!("{}", summary.status_message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_log();

    let args = Cli::parse();
    let symbols = args.resolve_symbols()?;
    let timeframes = args.resolve_timeframes();

    log::info!("Symbols: {:?}", symbols);
    log::info!("Timeframes: {:?}", timeframes);

    let market = Arc::new(PriceStreamManager::new(&symbols));
    let signals = Arc::new(
        HttpSignalService::new(&args.signal_client_config())
            .context("Failed to build signal service client")?,
    );

    let engine = SweepEngine::new(signals, market.clone(), args.sweep_config());
    let mut controller = SweepController::new(Arc::new(engine));

    let started = std::time::Instant::now();
    controller.start_run(symbols, timeframes)?;
    let handle = controller
        .take_current()
        .context("Sweep did not start")?;

    // Progress goes to stderr so --json output stays clean.
    let mut rx = handle.subscribe();
    let progress = tokio::spawn(async move {
        let mut last_completed = usize::MAX;
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.progress.completed != last_completed {
                last_completed = snapshot.progress.completed;
                eprintln!(
                    "[{}] {:.0}% | published {} results",
                    snapshot.progress,
                    snapshot.progress.fraction() * 100.0,
                    snapshot.results.len()
                );
            }
        }
    });

    let run = handle.finish().await?;
    let _ = progress.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_report(&run, started.elapsed().as_millis() as i64);
        if !market.is_connected() {
            log::warn!("Price feed never came up; live detection had no prices to compare against");
        } else {
            log::info!("Price feed health: {:.0}% of streams connected", market.connection_health());
        }
    }

    Ok(())
}
