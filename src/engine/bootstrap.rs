use std::time::Duration;

use tokio::time::sleep;

use crate::config::DF;
use crate::data::MarketDataService;

/// Best-effort check that the market-data feed is up before probing.
///
/// Already connected: returns true with no side effect. Otherwise fires a
/// connect request, waits `grace`, and reports whatever the feed says then.
/// Never fails; probes surface their own errors.
pub async fn ensure_connected(market: &dyn MarketDataService, grace: Duration) -> bool {
    if market.is_connected() {
        return true;
    }

    if DF.log_bootstrap {
        log::info!(
            "Market data feed not connected. Connecting and waiting {}ms...",
            grace.as_millis()
        );
    }

    market.connect();
    sleep(grace).await;

    let connected = market.is_connected();
    if !connected {
        log::warn!("Market data feed still down after grace period; sweeping anyway");
    }
    connected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Feed {
        connected: AtomicBool,
        connects_on_request: bool,
        connect_calls: AtomicUsize,
    }

    impl Feed {
        fn new(connected: bool, connects_on_request: bool) -> Self {
            Self {
                connected: AtomicBool::new(connected),
                connects_on_request,
                connect_calls: AtomicUsize::new(0),
            }
        }
    }

    impl MarketDataService for Feed {
        fn get_current_price(&self, _symbol_lowercase: &str) -> Option<f64> {
            None
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

    #[tokio::test(start_paused = true)]
    async fn connected_feed_is_left_alone() {
        let feed = Feed::new(true, true);
        let start = tokio::time::Instant::now();
        assert!(ensure_connected(&feed, Duration::from_millis(1000)).await);
        assert_eq!(feed.connect_calls.load(Ordering::SeqCst), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn connects_then_waits_grace() {
        let feed = Feed::new(false, true);
        let start = tokio::time::Instant::now();
        assert!(ensure_connected(&feed, Duration::from_millis(1000)).await);
        assert_eq!(feed.connect_calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_feed_reports_false() {
        let feed = Feed::new(false, false);
        assert!(!ensure_connected(&feed, Duration::from_millis(1000)).await);
        assert_eq!(feed.connect_calls.load(Ordering::SeqCst), 1);
    }
}
