//! Feature Builder errors

use meridian_core::Timestamp;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Not enough trailing bars for the schema's minimum window.
    /// Recoverable: the instrument is skipped this cycle.
    #[error("Insufficient history for {instrument_id}: required={required}, available={available}")]
    InsufficientHistory {
        instrument_id: String,
        required: usize,
        available: usize,
    },

    /// A bar at or after the decision timestamp was offered to the builder.
    /// This would be lookahead; the window is rejected outright.
    #[error("Lookahead bar for {instrument_id}: bar at {bar_timestamp} not strictly before {as_of}")]
    LookaheadBar {
        instrument_id: String,
        bar_timestamp: Timestamp,
        as_of: Timestamp,
    },

    /// A transform produced NaN/inf (e.g. zero cumulative volume).
    /// Recoverable: the instrument is skipped this cycle.
    #[error("Non-finite value for feature {feature} of {instrument_id}")]
    NonFiniteFeature {
        instrument_id: String,
        feature: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
