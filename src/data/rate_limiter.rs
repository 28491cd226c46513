use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Requests-per-minute budget for the signal backend.
///
/// The window is the wall-clock minute, so every clone drawing from the same
/// budget resets together at `:00`.
#[derive(Clone)]
pub struct SignalRateLimiter {
    window: Arc<Mutex<MinuteWindow>>,
}

struct MinuteWindow {
    spent: u32,
    /// Minutes since the Unix epoch.
    minute: u64,
    per_minute: u32,
}

impl SignalRateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            window: Arc::new(Mutex::new(MinuteWindow {
                spent: 0,
                minute: epoch_minute(),
                per_minute: per_minute.max(1),
            })),
        }
    }

    /// Spends `requests` from this minute's budget, sleeping into the next
    /// minute while it is exhausted. `label` names the caller in the log.
    pub async fn acquire(&self, requests: u32, label: &str) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let minute = epoch_minute();
                if minute > window.minute {
                    window.minute = minute;
                    window.spent = 0;
                }

                // An empty window always admits, however large the request.
                if window.spent == 0 || window.spent + requests <= window.per_minute {
                    window.spent += requests;
                    return;
                }

                let wait = until_next_minute();
                log::warn!(
                    "Signal request budget spent ({}/{} this minute); {} waits {:.1}s",
                    window.spent,
                    window.per_minute,
                    label,
                    wait.as_secs_f64()
                );
                wait
            };

            tokio::time::sleep(wait).await;
        }
    }

    #[cfg(test)]
    async fn spent(&self) -> u32 {
        self.window.lock().await.spent
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn epoch_minute() -> u64 {
    epoch_seconds() / 60
}

/// Time left in the current minute, plus a small margin past `:00`.
fn until_next_minute() -> Duration {
    Duration::from_secs(60 - epoch_seconds() % 60) + Duration::from_millis(100)
}
