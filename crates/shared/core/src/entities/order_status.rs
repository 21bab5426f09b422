use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `Pending -> Submitted -> {PartiallyFilled <-> PartiallyFilled, Filled,
/// Cancelled, Rejected}`. Fills, cancels and rejects arriving for an order
/// already in a terminal state must be ignored, never re-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been created but not yet acknowledged by the broker
    Pending,
    /// Broker acknowledged the order
    Submitted,
    /// Order has been partially filled
    PartiallyFilled,
    /// Order has been completely filled
    Filled,
    /// Order has been cancelled
    Cancelled,
    /// Order was rejected by the broker
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Returns true if the order is still working at the broker
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Submitted | OrderStatus::PartiallyFilled
        )
    }
}
