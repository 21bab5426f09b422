//! Meridian Clock
//!
//! Clock implementations behind the `Clock` port:
//! - [`SimulatedClock`]: advanced explicitly by the backtest driver, so a
//!   historical run observes historical time
//! - [`SystemClock`]: real UTC time for live trading
//!
//! Every component reads time through the port; which clock is wired in is
//! decided once, by the session driver.

mod simulated;
mod system;

pub use simulated::SimulatedClock;
pub use system::SystemClock;
