use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, Side};
use crate::instrument::InstrumentId;
use crate::values::Timestamp;

/// An execution report from the broker for (part of) an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Order this fill belongs to
    pub order_id: OrderId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    /// Quantity filled (always positive)
    pub quantity: Decimal,
    /// Execution price
    pub price: Decimal,
    /// When the fill occurred
    pub timestamp: Timestamp,
}

impl Fill {
    /// Signed quantity: positive for buys, negative for sells
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.quantity
    }

    /// Cash impact: negative for buys (cash out), positive for sells
    pub fn cash_delta(&self) -> Decimal {
        -self.signed_quantity() * self.price
    }
}
