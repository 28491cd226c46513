//! Scripted collaborators for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;

use crate::data::{MarketDataService, SignalFetchError, SignalService};
use crate::domain::SignalResponse;
use crate::models::SweepSnapshot;

use super::orchestrator::Clock;

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
}

pub fn fixed_clock() -> Clock {
    Arc::new(fixed_now)
}

/// A signal stamped earlier on the fixed clock's day.
pub fn today_signal(entry_point: f64, confidence: f64, reasoning: &str) -> SignalResponse {
    SignalResponse::new("BUY", entry_point, confidence, reasoning, "2024-05-17T09:00:00Z")
}

type Outcome = Result<SignalResponse, SignalFetchError>;

pub struct ScriptedSignals {
    responses: HashMap<(String, String), Outcome>,
    fallback: Outcome,
    /// Delay per call, by call index.
    delays: Vec<Duration>,
    observer: Option<watch::Receiver<SweepSnapshot>>,
    calls: Mutex<Vec<(String, String)>>,
    /// (completed, published results) seen by each call as it started.
    observed: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedSignals {
    pub fn new() -> Self {
        Self::with_fallback(Ok(today_signal(100.0, 50.0, "steady")))
    }

    pub fn failing_all(err: SignalFetchError) -> Self {
        Self::with_fallback(Err(err))
    }

    fn with_fallback(fallback: Outcome) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            delays: Vec::new(),
            observer: None,
            calls: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, timeframe: &str, symbol: &str, signal: SignalResponse) -> Self {
        self.responses
            .insert((timeframe.to_string(), symbol.to_string()), Ok(signal));
        self
    }

    pub fn fail(mut self, timeframe: &str, symbol: &str, err: SignalFetchError) -> Self {
        self.responses
            .insert((timeframe.to_string(), symbol.to_string()), Err(err));
        self
    }

    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    pub fn observing(mut self, rx: watch::Receiver<SweepSnapshot>) -> Self {
        self.observer = Some(rx);
        self
    }

    /// (timeframe, symbol) in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn observed(&self) -> Vec<(usize, usize)> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalService for ScriptedSignals {
    async fn get_signal(&self, timeframe: &str, symbol: &str) -> Result<SignalResponse, SignalFetchError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((timeframe.to_string(), symbol.to_string()));
            calls.len() - 1
        };

        if let Some(rx) = &self.observer {
            let seen = {
                let snapshot = rx.borrow();
                (snapshot.progress.completed, snapshot.results.len())
            };
            self.observed.lock().unwrap().push(seen);
        }

        if let Some(delay) = self.delays.get(index).copied() {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(&(timeframe.to_string(), symbol.to_string()))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FakeMarket {
    prices: HashMap<String, f64>,
    connected: AtomicBool,
    connects_on_request: bool,
    connect_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn connected() -> Self {
        Self::build(true, true)
    }

    /// Stays down no matter how often connect is called.
    pub fn disconnected() -> Self {
        Self::build(false, false)
    }

    fn build(connected: bool, connects_on_request: bool) -> Self {
        Self {
            prices: HashMap::new(),
            connected: AtomicBool::new(connected),
            connects_on_request,
            connect_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(mut self, symbol_lowercase: &str, price: f64) -> Self {
        self.prices.insert(symbol_lowercase.to_string(), price);
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

impl MarketDataService for FakeMarket {
    fn get_current_price(&self, symbol_lowercase: &str) -> Option<f64> {
        self.prices.get(symbol_lowercase).copied()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connect(&self) {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.connects_on_request {
            self.connected.store(true, Ordering::SeqCst);
        }
    }
}
