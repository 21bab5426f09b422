//! Target-to-order planning.
//!
//! Converts target weights into the signed quantity delta per instrument and
//! sequences the resulting order requests. The sequencing is a documented
//! contract, not an incidental detail: **closes and sells go first**, so the
//! cash and margin they free is available before any buy opens new exposure.
//! In live trading the opposite order causes spurious buying-power
//! rejections.

use std::collections::HashMap;

use log::debug;
use meridian_core::{InstrumentId, PortfolioState, Side, TargetPosition};
use meridian_ports::OrderRequest;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::ExecutionConfig;

/// Plan order requests for one cycle's targets.
///
/// `prices` supplies the mark used both for equity valuation and for
/// sizing. Instruments without a price are skipped (cannot size). Deltas
/// below the configured minimum quantity or notional are suppressed.
pub fn plan_orders(
    targets: &[TargetPosition],
    portfolio: &PortfolioState,
    prices: &HashMap<InstrumentId, Decimal>,
    config: &ExecutionConfig,
) -> Vec<OrderRequest> {
    let equity = portfolio.equity(prices);
    let mut sells: Vec<OrderRequest> = Vec::new();
    let mut buys: Vec<OrderRequest> = Vec::new();

    for target in targets {
        let Some(price) = prices.get(&target.instrument_id).copied() else {
            debug!("No price for {}; skipping", target.instrument_id);
            continue;
        };
        if price <= Decimal::ZERO {
            continue;
        }

        let target_qty = round_to_step(
            target.target_weight * equity / price,
            config.quantity_step,
        );
        let held_qty = portfolio.held_quantity(&target.instrument_id);
        let delta = target_qty - held_qty;

        if delta.abs() < config.min_trade_qty || delta.abs() * price < config.min_trade_notional {
            continue;
        }

        let Some(side) = Side::from_delta(delta) else {
            continue;
        };
        let request = OrderRequest {
            order_id: Uuid::new_v4(),
            instrument_id: target.instrument_id.clone(),
            side,
            quantity: delta.abs(),
        };
        match side {
            Side::Sell => sells.push(request),
            Side::Buy => buys.push(request),
        }
    }

    // Deterministic within each leg as well
    sells.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
    buys.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));

    sells.into_iter().chain(buys).collect()
}

/// Round toward zero to a multiple of `step`
fn round_to_step(quantity: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return quantity;
    }
    (quantity / step).trunc() * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{Fill, TargetPosition};
    use rust_decimal_macros::dec;

    fn prices(entries: &[(&str, Decimal)]) -> HashMap<InstrumentId, Decimal> {
        entries
            .iter()
            .map(|(id, p)| (InstrumentId::from(*id), *p))
            .collect()
    }

    fn buy_fill(instrument: &str, qty: Decimal, price: Decimal) -> Fill {
        Fill {
            order_id: Uuid::new_v4(),
            instrument_id: instrument.into(),
            side: Side::Buy,
            quantity: qty,
            price,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn sells_are_sequenced_before_buys() {
        let mut portfolio = PortfolioState::new(dec!(10000));
        portfolio.apply_fill(&buy_fill("ZZZ", dec!(50), dec!(100)));

        let targets = vec![
            TargetPosition::long("AAA", dec!(0.5)),
            TargetPosition::flat("ZZZ"),
        ];
        let prices = prices(&[("AAA", dec!(100)), ("ZZZ", dec!(100))]);
        let orders = plan_orders(&targets, &portfolio, &prices, &ExecutionConfig::default());

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, Side::Sell);
        assert_eq!(orders[0].instrument_id.as_str(), "ZZZ");
        assert_eq!(orders[0].quantity, dec!(50));
        assert_eq!(orders[1].side, Side::Buy);
        assert_eq!(orders[1].instrument_id.as_str(), "AAA");
        // Equity 10000, half into AAA at 100
        assert_eq!(orders[1].quantity, dec!(50));
    }

    #[test]
    fn small_deltas_are_suppressed() {
        let mut portfolio = PortfolioState::new(dec!(10000));
        portfolio.apply_fill(&buy_fill("AAA", dec!(50), dec!(100)));

        // Equity 10000; target implies 50.9 shares -> rounds to 50 -> delta 0
        let targets = vec![TargetPosition::long("AAA", dec!(0.509))];
        let prices = prices(&[("AAA", dec!(100))]);
        let orders = plan_orders(&targets, &portfolio, &prices, &ExecutionConfig::default());
        assert!(orders.is_empty());
    }

    #[test]
    fn unpriced_instruments_are_skipped() {
        let portfolio = PortfolioState::new(dec!(10000));
        let targets = vec![TargetPosition::long("AAA", dec!(0.5))];
        let orders = plan_orders(
            &targets,
            &portfolio,
            &HashMap::new(),
            &ExecutionConfig::default(),
        );
        assert!(orders.is_empty());
    }

    #[test]
    fn short_target_emits_sell_from_flat() {
        let portfolio = PortfolioState::new(dec!(10000));
        let targets = vec![TargetPosition::short("BBB", dec!(0.2))];
        let prices = prices(&[("BBB", dec!(50))]);
        let orders = plan_orders(&targets, &portfolio, &prices, &ExecutionConfig::default());

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Sell);
        // 0.2 * 10000 / 50 = 40 shares short
        assert_eq!(orders[0].quantity, dec!(40));
    }
}
