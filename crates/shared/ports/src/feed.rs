use meridian_core::{Bar, Timestamp};
use thiserror::Error;

/// Errors from the market data feed collaborator
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed disconnected: {0}")]
    Disconnected(String),
}

/// All bars that closed at one interval boundary, plus the decision time.
///
/// `as_of` is strictly after every contained bar's open timestamp; it is the
/// moment the strategy is allowed to act on these bars.
#[derive(Debug, Clone)]
pub struct CycleBars {
    pub as_of: Timestamp,
    pub bars: Vec<Bar>,
}

impl CycleBars {
    pub fn new(as_of: Timestamp, bars: Vec<Bar>) -> Self {
        Self { as_of, bars }
    }
}

/// Port for the bar source.
///
/// The feed guarantees no duplicate (instrument, timestamp) pairs and no
/// retroactive revision of a bar once it has been consumed. The backtest
/// driver pulls cycles synchronously; in live mode an adapter pushes the
/// same `CycleBars` values through the session event channel instead.
pub trait BarFeed: Send {
    /// Advance to the next bar-close boundary, or None when exhausted
    fn next_cycle(&mut self) -> Result<Option<CycleBars>, FeedError>;
}
