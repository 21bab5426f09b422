use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;
use meridian_core::{Fill, InstrumentId, OrderId, Side};
use meridian_ports::{
    Broker, BrokerError, BrokerEvent, BrokerPositions, BrokerResult, Clock, OrderRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Simulated broker configuration
#[derive(Debug, Clone)]
pub struct SimulatedBrokerConfig {
    /// Fractional slippage applied against the trader (buys fill higher,
    /// sells fill lower)
    pub slippage_pct: Decimal,
    /// Deliver every fill notification twice (duplicate-delivery testing)
    pub duplicate_fills: bool,
    /// Split each fill into two partial fills where quantity allows
    pub split_fills: bool,
}

impl Default for SimulatedBrokerConfig {
    fn default() -> Self {
        Self {
            slippage_pct: dec!(0.0002),
            duplicate_fills: false,
            split_fills: false,
        }
    }
}

/// In-process broker for backtests.
///
/// Market orders fill in full at the current mark the moment they are
/// submitted, so a backtest cycle settles synchronously. The internal
/// position mirror is what `positions()` reports, which makes backtest
/// reconciliation a guaranteed no-op unless a test forces divergence.
pub struct SimulatedBroker {
    config: SimulatedBrokerConfig,
    clock: Arc<dyn Clock>,
    marks: Mutex<HashMap<InstrumentId, Decimal>>,
    positions: Mutex<BrokerPositions>,
    rejected_instruments: Mutex<HashSet<InstrumentId>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<BrokerEvent>>>,
    submissions: Mutex<Vec<OrderRequest>>,
}

impl SimulatedBroker {
    pub fn new(config: SimulatedBrokerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            marks: Mutex::new(HashMap::new()),
            positions: Mutex::new(BrokerPositions::new()),
            rejected_instruments: Mutex::new(HashSet::new()),
            subscribers: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Every request this broker has accepted or rejected, in arrival order
    pub fn submission_log(&self) -> Vec<OrderRequest> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Update the mark prices orders will fill against (once per cycle)
    pub fn set_marks(&self, marks: &HashMap<InstrumentId, Decimal>) {
        let mut guard = self.marks.lock().unwrap_or_else(|e| e.into_inner());
        for (id, price) in marks {
            guard.insert(id.clone(), *price);
        }
    }

    /// Script a permanent rejection for an instrument
    pub fn reject_instrument(&self, instrument_id: impl Into<InstrumentId>) {
        self.rejected_instruments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(instrument_id.into());
    }

    /// Force the position mirror to a given quantity (reconciliation tests)
    pub fn force_position(&self, instrument_id: impl Into<InstrumentId>, quantity: Decimal) {
        let mut positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
        let id = instrument_id.into();
        if quantity.is_zero() {
            positions.remove(&id);
        } else {
            positions.insert(id, quantity);
        }
    }

    /// Push a connection-lifecycle event to all subscribers
    pub fn emit(&self, event: BrokerEvent) {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for tx in subscribers.iter() {
            let _ = tx.send(event.clone());
        }
    }

    fn fill_price(&self, side: Side, mark: Decimal) -> Decimal {
        match side {
            Side::Buy => mark * (Decimal::ONE + self.config.slippage_pct),
            Side::Sell => mark * (Decimal::ONE - self.config.slippage_pct),
        }
    }

    fn record_and_emit_fill(&self, request: &OrderRequest, quantity: Decimal, price: Decimal) {
        {
            let mut positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
            let entry = positions
                .entry(request.instrument_id.clone())
                .or_insert(Decimal::ZERO);
            *entry += request.side.sign() * quantity;
            if entry.is_zero() {
                positions.remove(&request.instrument_id);
            }
        }

        let fill = Fill {
            order_id: request.order_id,
            instrument_id: request.instrument_id.clone(),
            side: request.side,
            quantity,
            price,
            timestamp: self.clock.now(),
        };
        self.emit(BrokerEvent::Fill(fill.clone()));
        if self.config.duplicate_fills {
            self.emit(BrokerEvent::Fill(fill));
        }
    }
}

#[async_trait]
impl Broker for SimulatedBroker {
    async fn submit_order(&self, request: &OrderRequest) -> BrokerResult<()> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        if self
            .rejected_instruments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&request.instrument_id)
        {
            return Err(BrokerError::Rejected {
                reason: format!("instrument {} not tradeable", request.instrument_id),
            });
        }

        let mark = {
            let marks = self.marks.lock().unwrap_or_else(|e| e.into_inner());
            marks.get(&request.instrument_id).copied()
        };
        let Some(mark) = mark else {
            return Err(BrokerError::Rejected {
                reason: format!("no market for {}", request.instrument_id),
            });
        };

        let price = self.fill_price(request.side, mark);
        debug!(
            "Sim fill: {:?} {} x{} @ {}",
            request.side, request.instrument_id, request.quantity, price
        );

        if self.config.split_fills && request.quantity >= dec!(2) {
            let first = (request.quantity / dec!(2)).trunc();
            let second = request.quantity - first;
            self.record_and_emit_fill(request, first, price);
            self.record_and_emit_fill(request, second, price);
        } else {
            self.record_and_emit_fill(request, request.quantity, price);
        }
        Ok(())
    }

    async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()> {
        // Market orders fill immediately; there is never anything to cancel
        Err(BrokerError::UnknownOrder(order_id))
    }

    async fn positions(&self) -> BrokerResult<BrokerPositions> {
        Ok(self
            .positions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<BrokerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct FixedClock;
    impl Clock for FixedClock {
        fn now(&self) -> meridian_core::Timestamp {
            Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap()
        }
    }

    fn broker(config: SimulatedBrokerConfig) -> SimulatedBroker {
        SimulatedBroker::new(config, Arc::new(FixedClock))
    }

    fn request(instrument: &str, side: Side, qty: Decimal) -> OrderRequest {
        OrderRequest {
            order_id: uuid::Uuid::new_v4(),
            instrument_id: instrument.into(),
            side,
            quantity: qty,
        }
    }

    #[tokio::test]
    async fn buys_fill_above_the_mark() {
        let broker = broker(SimulatedBrokerConfig::default());
        let mut events = broker.subscribe();
        broker.set_marks(&HashMap::from([(InstrumentId::from("AAA"), dec!(100))]));

        broker
            .submit_order(&request("AAA", Side::Buy, dec!(10)))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            BrokerEvent::Fill(fill) => {
                assert_eq!(fill.quantity, dec!(10));
                assert_eq!(fill.price, dec!(100.02));
            }
            other => panic!("expected fill, got {other:?}"),
        }
        let positions = broker.positions().await.unwrap();
        assert_eq!(positions[&InstrumentId::from("AAA")], dec!(10));
    }

    #[tokio::test]
    async fn unknown_instrument_is_rejected() {
        let broker = broker(SimulatedBrokerConfig::default());
        let err = broker
            .submit_order(&request("NOPE", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Rejected { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn split_fills_cover_the_full_quantity() {
        let config = SimulatedBrokerConfig {
            split_fills: true,
            ..Default::default()
        };
        let broker = broker(config);
        let mut events = broker.subscribe();
        broker.set_marks(&HashMap::from([(InstrumentId::from("AAA"), dec!(50))]));

        broker
            .submit_order(&request("AAA", Side::Sell, dec!(9)))
            .await
            .unwrap();

        let mut total = Decimal::ZERO;
        for _ in 0..2 {
            if let BrokerEvent::Fill(fill) = events.recv().await.unwrap() {
                total += fill.quantity;
            }
        }
        assert_eq!(total, dec!(9));
        let positions = broker.positions().await.unwrap();
        assert_eq!(positions[&InstrumentId::from("AAA")], dec!(-9));
    }
}
