//! Signal Model Adapter errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Feature vector width disagrees with the model's training schema.
    /// Fatal: a shape mismatch means the model cannot be trusted for any
    /// instrument, so the run halts rather than coercing.
    #[error("Model input shape mismatch: expected {expected}, got {actual}")]
    InputShapeMismatch { expected: usize, actual: usize },

    /// The model produced NaN/inf for a finite input
    #[error("Model returned non-finite score for {instrument_id}")]
    NonFiniteScore { instrument_id: String },

    /// Model artifact could not be loaded
    #[error("Failed to load model artifact: {0}")]
    ArtifactLoad(String),
}

pub type Result<T> = std::result::Result<T, Error>;
