use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use serde::{Deserialize, Serialize};

use super::Side;

/// A held position in one instrument
///
/// `quantity` is signed: positive = long, negative = short. Mutated only by
/// confirmed fills (via [`Holding::apply_fill`]) or by reconciliation against
/// the broker's authoritative snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub quantity: Decimal,
    /// Average entry cost, weighted across the fills that built the position
    pub average_cost: Decimal,
}

impl Holding {
    pub fn new(quantity: Decimal, average_cost: Decimal) -> Self {
        Self {
            quantity,
            average_cost,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// Apply a confirmed fill to this holding.
    ///
    /// Average cost is updated by weighted average when the fill extends the
    /// position, left unchanged when it reduces, reset to the fill price when
    /// the position flips sides, and zeroed when the position goes flat.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) {
        let signed_qty = side.sign() * quantity;
        let new_quantity = self.quantity + signed_qty;

        if new_quantity.is_zero() {
            self.average_cost = Decimal::ZERO;
        } else if (self.quantity >= Decimal::ZERO && signed_qty > Decimal::ZERO)
            || (self.quantity <= Decimal::ZERO && signed_qty < Decimal::ZERO)
        {
            // Extending - weighted average
            let total_cost = self.quantity.abs() * self.average_cost + quantity * price;
            self.average_cost = total_cost / new_quantity.abs();
        } else if new_quantity.signum() != self.quantity.signum() {
            // Flipped sides - remaining quantity was opened at the fill price
            self.average_cost = price;
        }
        // Reducing without flipping leaves average_cost unchanged

        self.quantity = new_quantity;
    }

    /// Market value at a mark price (signed)
    pub fn market_value(&self, mark_price: Decimal) -> Decimal {
        self.quantity * mark_price
    }

    /// Unrealized PnL at a mark price
    pub fn unrealized_pnl(&self, mark_price: Decimal) -> Decimal {
        self.quantity * (mark_price - self.average_cost)
    }
}
