use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SweepError {
    /// Empty symbol or timeframe list. Rejected before any probe or connect attempt.
    #[error("invalid probe grid: {symbols} symbol(s) x {timeframes} timeframe(s), both must be non-empty")]
    InvalidGrid { symbols: usize, timeframes: usize },

    #[error("sweep task failed: {0}")]
    TaskFailed(String),
}

pub type SweepResult<T> = Result<T, SweepError>;
