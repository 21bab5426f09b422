//! Session driver errors
//!
//! The driver distinguishes per-instrument faults, which the cycle pipeline
//! absorbs by skipping the instrument, from session faults, which halt the
//! run. Everything that reaches this enum is in the second category.

use meridian_ports::FeedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Feed failure: {0}")]
    Feed(#[from] FeedError),

    /// The feature builder saw a bar at or after decision time. Something
    /// upstream is mis-stamping bars; every decision is suspect, so halt.
    #[error("Lookahead detected: {0}")]
    Lookahead(#[source] meridian_features::Error),

    /// Shape mismatches and non-finite scores halt the session; a model
    /// that disagrees with its schema cannot be trusted for any instrument.
    #[error("Model failure: {0}")]
    Model(#[from] meridian_model::Error),

    #[error("Execution failure: {0}")]
    Execution(#[from] meridian_execution::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
