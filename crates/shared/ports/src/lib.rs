//! Meridian Ports
//!
//! Port definitions (traits) for the Meridian strategy engine.
//! These define the boundaries between the strategy pipeline and its
//! external collaborators: clock, market data feed, signal model, broker.

mod broker;
mod clock;
mod feed;
mod model;
mod universe;

pub use broker::{Broker, BrokerError, BrokerEvent, BrokerPositions, BrokerResult, OrderRequest};
pub use clock::Clock;
pub use feed::{BarFeed, CycleBars, FeedError};
pub use model::SignalModel;
pub use universe::{AcceptAll, UniverseFilter};
