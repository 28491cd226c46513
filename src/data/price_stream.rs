use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use {
    binance_sdk::{
        config::ConfigurationRestApi,
        spot::{
            SpotRestApi,
            rest_api::{TickerPriceParams, TickerPriceResponse},
        },
    },
    futures::StreamExt,
    tokio::{runtime::Runtime, time::sleep},
    tokio_tungstenite::{connect_async, tungstenite::Message},
};

use crate::config::{BINANCE, BINANCE_MAX_PAIRS, BinanceApiConfig, DF};

use super::provider::MarketDataService;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
}

type PriceMap = Arc<Mutex<HashMap<String, f64>>>;
type StatusMap = Arc<Mutex<HashMap<String, ConnectionStatus>>>;

/// Manages the WebSocket connection to Binance for live price updates.
/// Subscribes to all pairs upfront with automatic reconnection.
pub struct PriceStreamManager {
    // Map of lowercase symbol -> current price
    prices: PriceMap,
    // Map of lowercase symbol -> connection status
    connection_status: StatusMap,
    subscribed_symbols: Arc<Mutex<Vec<String>>>,
    started: AtomicBool,
}

fn build_combined_stream_url(symbols: &[String]) -> String {
    let streams: Vec<String> = symbols
        .iter()
        .map(|symbol| format!("{}@kline_{}", symbol.to_lowercase(), BINANCE.ws.kline_interval))
        .collect();

    format!("{}{}", BINANCE.ws.combined_base_url, streams.join("/"))
}

impl PriceStreamManager {
    /// Subscribes to at most `BINANCE_MAX_PAIRS` symbols; the rest get no live price.
    pub fn new(symbols: &[String]) -> Self {
        if symbols.len() > BINANCE_MAX_PAIRS {
            log::warn!(
                "PriceStream: {} symbols requested, streaming only the first {}; the rest have no live price",
                symbols.len(),
                BINANCE_MAX_PAIRS
            );
        }
        let symbols_lower: Vec<String> = symbols
            .iter()
            .take(BINANCE_MAX_PAIRS)
            .map(|s| s.to_lowercase())
            .collect();
        Self {
            prices: Arc::new(Mutex::new(HashMap::new())),
            connection_status: Arc::new(Mutex::new(HashMap::new())),
            subscribed_symbols: Arc::new(Mutex::new(symbols_lower)),
            started: AtomicBool::new(false),
        }
    }

    /// Get the current live price for a symbol (any case).
    pub fn get_price(&self, symbol: &str) -> Option<f64> {
        let symbol_lower = symbol.to_lowercase();
        lock(&self.prices).get(&symbol_lower).copied()
    }

    /// Seed or overwrite a price, e.g. from a REST snapshot.
    pub fn update_price(&self, symbol: &str, price: f64) {
        lock(&self.prices).insert(symbol.to_lowercase(), price);
    }

    pub fn subscribed_symbols(&self) -> Vec<String> {
        lock(&self.subscribed_symbols).clone()
    }

    /// Get overall connection health (percentage of connected streams)
    pub fn connection_health(&self) -> f64 {
        let status_map = lock(&self.connection_status);
        if status_map.is_empty() {
            return 0.0;
        }
        let connected = status_map
            .values()
            .filter(|&&s| s == ConnectionStatus::Connected)
            .count();
        (connected as f64 / status_map.len() as f64) * 100.0
    }

    fn spawn_stream(&self) {
        let symbols_lower = self.subscribed_symbols();
        if symbols_lower.is_empty() {
            log::warn!("PriceStream: no symbols subscribed, nothing to connect");
            return;
        }

        // Clone Arcs to move into the background thread
        let prices_arc = self.prices.clone();
        let status_arc = self.connection_status.clone();

        set_status(&status_arc, &symbols_lower, ConnectionStatus::Connecting);

        // Spawn a dedicated thread for the runtime so callers never block on it
        thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("PriceStream: failed to create runtime: {}", e);
                    set_status(&status_arc, &symbols_lower, ConnectionStatus::Disconnected);
                    return;
                }
            };
            rt.block_on(async move {
                // 1. PULL (Batch Snapshot)
                warm_up_prices(prices_arc.clone(), &symbols_lower).await;

                // 2. PUSH (Live Updates)
                run_combined_price_stream_with_reconnect(&symbols_lower, prices_arc, status_arc)
                    .await;
            });
        });
    }
}

impl MarketDataService for PriceStreamManager {
    fn get_current_price(&self, symbol_lowercase: &str) -> Option<f64> {
        self.get_price(symbol_lowercase)
    }

    /// Last-known status: true while any subscribed stream reports Connected.
    fn is_connected(&self) -> bool {
        lock(&self.connection_status)
            .values()
            .any(|&s| s == ConnectionStatus::Connected)
    }

    fn connect(&self) {
        // The stream task reconnects on its own, so one spawn per manager is enough.
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.spawn_stream();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_status(status_arc: &StatusMap, symbols: &[String], status: ConnectionStatus) {
    let mut status_map = lock(status_arc);
    for symbol in symbols {
        status_map.insert(symbol.clone(), status);
    }
}

async fn run_combined_price_stream_with_reconnect(
    symbols: &[String],
    prices_arc: PriceMap,
    status_arc: StatusMap,
) {
    let mut reconnect_delay = BINANCE.ws.initial_reconnect_delay_sec;
    let url = build_combined_stream_url(symbols);

    loop {
        set_status(&status_arc, symbols, ConnectionStatus::Connecting);

        if DF.log_price_stream_updates {
            log::info!("Attempting connection to Binance Stream...");
        }
        match run_combined_price_stream(symbols, &url, prices_arc.clone(), status_arc.clone())
            .await
        {
            Ok(_) => {
                log::warn!("WebSocket closed normally. Reconnecting...");
                reconnect_delay = BINANCE.ws.initial_reconnect_delay_sec;
            }
            Err(e) => {
                log::error!(
                    "WebSocket connection failed: {}. Retrying in {}s...",
                    e,
                    reconnect_delay
                );
            }
        }

        set_status(&status_arc, symbols, ConnectionStatus::Disconnected);

        sleep(Duration::from_secs(reconnect_delay)).await;
        reconnect_delay = (reconnect_delay * 2).min(BINANCE.ws.max_reconnect_delay_sec);
    }
}

async fn run_combined_price_stream(
    symbols: &[String],
    url: &str,
    prices_arc: PriceMap,
    status_arc: StatusMap,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (ws_stream, _) = connect_async(url).await?;

    set_status(&status_arc, symbols, ConnectionStatus::Connected);

    let (_write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(v) => {
                    if let Some((symbol, price)) = parse_kline_close(&v) {
                        if DF.log_price_stream_updates {
                            log::info!("[kline-tick] {} -> {:.6}", symbol, price);
                        }
                        lock(&prices_arc).insert(symbol, price);
                    }
                }
                Err(_) => log::warn!("⚠️ Failed to parse WebSocket JSON message"),
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                log::error!("WebSocket error: {}", e);
                return Err(e.into());
            }
            _ => {}
        }
    }

    Ok(())
}

/// Pull `(lowercase symbol, close)` out of a combined-stream kline event.
/// The forming candle's close is the latest traded price.
fn parse_kline_close(v: &serde_json::Value) -> Option<(String, f64)> {
    let data = v.get("data")?;
    if data.get("e")?.as_str()? != "kline" {
        return None;
    }
    let price = data.get("k")?.get("c")?.as_str()?.parse::<f64>().ok()?;
    let symbol = data.get("s")?.as_str()?.to_lowercase();
    if symbol.is_empty() || price <= 0.0 {
        return None;
    }
    Some((symbol, price))
}

async fn warm_up_prices(prices_arc: PriceMap, symbols: &[String]) {
    if DF.log_price_stream_updates {
        log::info!(">>> PriceStream: Warming up price cache via REST API...");
    }
    let config = BinanceApiConfig::default();

    let rest_conf = match ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()
    {
        Ok(conf) => conf,
        Err(e) => {
            log::error!(">>> PriceStream: Failed to build Binance REST config: {:?}", e);
            return;
        }
    };

    let client = SpotRestApi::production(rest_conf);

    let params = TickerPriceParams {
        symbol: None,
        symbols: None,
        symbol_status: None,
    };

    // 1. Make the Request
    let response = match client.ticker_price(params).await {
        Ok(response) => response,
        Err(e) => {
            log::error!(">>> PriceStream: Warmup request failed: {:?}", e);
            return;
        }
    };

    // 2. Await the data extraction
    let ticker_data = match response.data().await {
        Ok(data) => data,
        Err(e) => {
            log::error!(">>> PriceStream: Failed to parse response data: {:?}", e);
            return;
        }
    };

    match ticker_data {
        // 3. Match the Vector Variant
        TickerPriceResponse::TickerPriceResponse2(all_tickers) => {
            let wanted_set: HashSet<String> = symbols.iter().map(|s| s.to_lowercase()).collect();
            let mut p_lock = lock(&prices_arc);
            let mut updated_count = 0;

            for ticker in all_tickers {
                if let (Some(s), Some(p)) = (&ticker.symbol, &ticker.price) {
                    let symbol_lower = s.to_lowercase();
                    if wanted_set.contains(&symbol_lower) {
                        let price = p.parse::<f64>().unwrap_or(0.0);
                        if price > 0.0 {
                            p_lock.insert(symbol_lower, price);
                            updated_count += 1;
                        }
                    }
                }
            }
            log::info!(
                ">>> PriceStream: Warmup complete. Updated {}/{} pairs.",
                updated_count,
                symbols.len()
            );
        }
        TickerPriceResponse::TickerPriceResponse1(_) => {
            log::warn!(">>> PriceStream: Unexpected 'Single' response type during batch warmup.");
        }
        _ => {
            log::warn!(">>> PriceStream: Unexpected 'Other' response type.");
        }
    }
}
