//! Meridian Model
//!
//! The Signal Model Adapter: wraps a frozen, pre-trained classifier behind
//! the `SignalModel` port and maps feature vectors to bounded directional
//! scores. Inference never mutates model state, and scoring a batch is
//! order-independent by construction (each vector is scored in isolation).
//!
//! A built-in [`LogisticModel`] (JSON-loadable weights) stands in for
//! externally trained artifacts so backtests and tests run self-contained.

mod adapter;
mod error;
mod logistic;
mod score;

pub use adapter::ModelAdapter;
pub use error::{Error, Result};
pub use logistic::LogisticModel;
pub use score::Score;
