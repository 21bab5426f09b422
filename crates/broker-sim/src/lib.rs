//! Meridian Broker-Sim
//!
//! Backtest-side collaborators behind the `Broker` and `BarFeed` ports:
//!
//! - [`SimulatedBroker`]: fills market orders immediately at the current
//!   mark adjusted for slippage, mirrors positions for reconciliation, and
//!   can be scripted to reject instruments or redeliver fills for failure
//!   testing
//! - [`ReplayFeed`]: replays historical bars cycle by cycle, applying the
//!   same data-hygiene rules a production loader applies
//!
//! Because both sit behind ports, the session driver and everything above
//! it cannot tell a simulated session from a live one.

mod broker;
mod feed;

pub use broker::{SimulatedBroker, SimulatedBrokerConfig};
pub use feed::ReplayFeed;
