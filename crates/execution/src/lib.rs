//! Meridian Execution
//!
//! The Execution Engine: the system's central state machine. It diffs
//! target weights against current holdings, sequences and submits orders,
//! tracks each order's lifecycle to a terminal state, applies fills to the
//! holdings ledger, and reconciles that ledger against the broker's
//! authoritative snapshot.
//!
//! Ownership rules:
//! - Orders belong to the engine from creation to terminal state
//! - Holdings/cash mutate only through confirmed fills or reconciliation
//! - All mutation goes through `&mut self`: the session driver is the single
//!   writer; notification handlers enqueue events instead of calling in
//!
//! No order submission is ever silently retried: only errors the broker
//! explicitly classifies as transient are retried, with backoff, a bounded
//! number of times.

mod config;
mod diff;
mod engine;
mod error;
mod persistence;

pub use config::ExecutionConfig;
pub use diff::plan_orders;
pub use engine::{ExecutionEngine, FillOutcome, ReconciliationMismatch};
pub use error::{Error, Result};
pub use persistence::{EngineSnapshot, JsonStateStore};
