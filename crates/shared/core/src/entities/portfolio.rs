use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Fill, Holding};
use crate::instrument::InstrumentId;

/// The single mutable portfolio aggregate: cash plus holdings.
///
/// Explicitly passed, never ambient. Only the execution engine mutates it,
/// and only through confirmed fills or broker reconciliation. `BTreeMap`
/// keeps iteration order deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: Decimal,
    pub holdings: BTreeMap<InstrumentId, Holding>,
}

impl PortfolioState {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            holdings: BTreeMap::new(),
        }
    }

    /// Signed quantity held in an instrument (zero when absent)
    pub fn held_quantity(&self, instrument_id: &InstrumentId) -> Decimal {
        self.holdings
            .get(instrument_id)
            .map(|h| h.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Apply a confirmed fill: updates the holding and cash together.
    /// Holdings that go flat are removed from the map.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let holding = self.holdings.entry(fill.instrument_id.clone()).or_default();
        holding.apply_fill(fill.side, fill.quantity, fill.price);
        if holding.is_flat() {
            self.holdings.remove(&fill.instrument_id);
        }
        self.cash += fill.cash_delta();
    }

    /// Total equity: cash plus holdings marked at the supplied prices.
    /// Holdings without a mark price are valued at average cost.
    pub fn equity(&self, prices: &HashMap<InstrumentId, Decimal>) -> Decimal {
        let positions: Decimal = self
            .holdings
            .iter()
            .map(|(id, h)| h.market_value(*prices.get(id).unwrap_or(&h.average_cost)))
            .sum();
        self.cash + positions
    }

    /// Gross exposure: sum of absolute position values over equity
    pub fn gross_exposure(&self, prices: &HashMap<InstrumentId, Decimal>) -> Decimal {
        let equity = self.equity(prices);
        if equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let gross: Decimal = self
            .holdings
            .iter()
            .map(|(id, h)| h.market_value(*prices.get(id).unwrap_or(&h.average_cost)).abs())
            .sum();
        gross / equity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Side;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn fill(instrument: &str, side: Side, qty: Decimal, price: Decimal) -> Fill {
        Fill {
            order_id: Uuid::new_v4(),
            instrument_id: instrument.into(),
            side,
            quantity: qty,
            price,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn buy_fill_moves_cash_into_holding() {
        let mut p = PortfolioState::new(dec!(10000));
        p.apply_fill(&fill("AAA", Side::Buy, dec!(10), dec!(100)));
        assert_eq!(p.cash, dec!(9000));
        assert_eq!(p.held_quantity(&"AAA".into()), dec!(10));

        let prices = HashMap::from([(InstrumentId::from("AAA"), dec!(100))]);
        assert_eq!(p.equity(&prices), dec!(10000));
    }

    #[test]
    fn closing_fill_removes_holding_and_returns_cash() {
        let mut p = PortfolioState::new(dec!(10000));
        p.apply_fill(&fill("AAA", Side::Buy, dec!(10), dec!(100)));
        p.apply_fill(&fill("AAA", Side::Sell, dec!(10), dec!(110)));
        assert!(p.holdings.is_empty());
        assert_eq!(p.cash, dec!(10100));
    }

    #[test]
    fn gross_exposure_counts_shorts_as_positive() {
        let mut p = PortfolioState::new(dec!(10000));
        p.apply_fill(&fill("AAA", Side::Buy, dec!(50), dec!(100)));
        p.apply_fill(&fill("BBB", Side::Sell, dec!(50), dec!(100)));
        let prices = HashMap::from([
            (InstrumentId::from("AAA"), dec!(100)),
            (InstrumentId::from("BBB"), dec!(100)),
        ]);
        assert_eq!(p.equity(&prices), dec!(10000));
        assert_eq!(p.gross_exposure(&prices), dec!(1));
    }
}
