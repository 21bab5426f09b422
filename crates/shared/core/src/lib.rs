//! Meridian Core Domain
//!
//! Pure domain types for the Meridian strategy engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instrument;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Bar, Fill, Holding, Order, OrderId, OrderStatus, PortfolioState, Side, TargetPosition,
    TargetSide,
};
pub use instrument::InstrumentId;
pub use values::{Price, Quantity, Timestamp};
