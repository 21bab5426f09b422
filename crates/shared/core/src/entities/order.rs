use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, Side};
use crate::instrument::InstrumentId;
use crate::values::Timestamp;

/// Unique identifier for an order
pub type OrderId = Uuid;

/// A working order, owned by the execution engine from creation to terminal
/// state. The portfolio constructor never sees or mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Create a new Pending order with a clock-provided timestamp
    pub fn new(
        instrument_id: impl Into<InstrumentId>,
        side: Side,
        quantity: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            side,
            quantity,
            filled_quantity: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Quantity still to be filled
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Signed quantity this order would add to a holding if fully filled
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.quantity
    }
}
