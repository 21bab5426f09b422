//! Meridian Portfolio
//!
//! The Portfolio Constructor: turns one cycle's scores into target weights.
//!
//! Ranks instruments by score, takes the strongest names long and the
//! weakest short under position-count and exposure constraints, and emits a
//! flat target for every held name that drops out of both baskets (the
//! rebalancing signal to close). Pure function of (scores, holdings,
//! volatilities, config): no hidden state, no I/O.

mod config;
mod constructor;

pub use config::{ConstructorConfig, SkewPolicy, WeightPolicy};
pub use constructor::PortfolioConstructor;
