use std::collections::BTreeMap;

use async_trait::async_trait;
use meridian_core::{Fill, InstrumentId, OrderId, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the broker collaborator
#[derive(Error, Debug, Clone)]
pub enum BrokerError {
    /// Broker refused the order. Permanent: never retried.
    #[error("Order rejected: {reason}")]
    Rejected { reason: String },

    /// Connectivity fault. Transient: retried with backoff, bounded.
    #[error("Broker connectivity error: {0}")]
    Connectivity(String),

    /// No response within the broker's deadline. Transient.
    #[error("Timeout waiting for broker response")]
    Timeout,

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Session is down; submissions are paused until restored
    #[error("Broker connection lost")]
    Disconnected,
}

impl BrokerError {
    /// Transient errors may be retried (bounded); everything else must not
    /// be, to avoid duplicating financial orders.
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::Connectivity(_) | BrokerError::Timeout)
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;

/// Order submission request, as handed to the broker.
///
/// The engine assigns the order id before submission so fills can be
/// correlated even if the acknowledgment is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub quantity: Decimal,
}

/// Authoritative position snapshot: signed quantity per instrument
pub type BrokerPositions = BTreeMap<InstrumentId, Decimal>;

/// Events delivered on the broker's notification stream.
///
/// These may arrive at any time relative to the cycle that submitted the
/// order, including duplicates and after settling has timed out. Handlers
/// enqueue them; only the session driver applies them.
#[derive(Debug, Clone)]
pub enum BrokerEvent {
    Fill(Fill),
    Cancelled { order_id: OrderId },
    Rejected { order_id: OrderId, reason: String },
    ConnectionLost,
    ConnectionRestored,
}

/// Port for the broker collaborator.
///
/// The engine depends only on this contract, never on a specific broker's
/// wire format. Reconnection is the broker's responsibility, surfaced only
/// as `ConnectionLost` / `ConnectionRestored` events.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Submit an order; Ok means the broker acknowledged it
    async fn submit_order(&self, request: &OrderRequest) -> BrokerResult<()>;

    /// Cancel a working order
    async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()>;

    /// Authoritative position snapshot for reconciliation
    async fn positions(&self) -> BrokerResult<BrokerPositions>;

    /// Subscribe to the fill/lifecycle notification stream
    fn subscribe(&self) -> mpsc::UnboundedReceiver<BrokerEvent>;
}
