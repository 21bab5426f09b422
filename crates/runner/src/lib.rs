//! Meridian Runner
//!
//! The session driver: owns the clock, pulls bar-close cycles from the
//! feed, and walks each one through the same pipeline regardless of mode.
//!
//! - [`BacktestDriver`]: replays history against the simulated broker,
//!   advancing a simulated clock one bar close at a time
//! - [`LiveDriver`]: selects over a bar-close channel and the broker's
//!   notification stream, with bounded settling and snapshot persistence
//!
//! Everything below the driver is shared, which is what makes a backtest a
//! faithful rehearsal of a live session: same features, same scores, same
//! targets, same order plan for the same bars.

mod backtest;
mod cycle;
mod error;
mod history;
mod live;
mod metrics;
mod phase;

pub use backtest::BacktestDriver;
pub use cycle::{CyclePipeline, CycleReport};
pub use error::{Error, Result};
pub use history::BarHistory;
pub use live::{LiveConfig, LiveDriver};
pub use metrics::{EquityPoint, PerformanceSummary, SessionReport};
pub use phase::SessionPhase;
