//! Execution Engine lifecycle tests
//!
//! Covers the order state machine end to end against a scriptable stub
//! broker: submission and retry policy, fill application and idempotence,
//! commutativity of partial-fill sequences, and reconciliation against an
//! authoritative position snapshot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use meridian_clock::SimulatedClock;
use meridian_core::{Fill, InstrumentId, OrderStatus, Side};
use meridian_execution::{Error, ExecutionConfig, ExecutionEngine, FillOutcome};
use meridian_ports::{
    Broker, BrokerError, BrokerEvent, BrokerPositions, BrokerResult, Clock, OrderRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Broker stub: every submission succeeds unless a scripted response is
/// queued; position snapshot is whatever the test sets.
#[derive(Default)]
struct StubBroker {
    submissions: Mutex<Vec<OrderRequest>>,
    scripted: Mutex<VecDeque<BrokerResult<()>>>,
    positions: Mutex<BrokerPositions>,
}

impl StubBroker {
    fn script(&self, responses: Vec<BrokerResult<()>>) {
        *self.scripted.lock().unwrap() = responses.into();
    }

    fn set_position(&self, instrument: &str, quantity: Decimal) {
        self.positions
            .lock()
            .unwrap()
            .insert(InstrumentId::from(instrument), quantity);
    }

    fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl Broker for StubBroker {
    async fn submit_order(&self, request: &OrderRequest) -> BrokerResult<()> {
        self.submissions.lock().unwrap().push(request.clone());
        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn cancel_order(&self, _order_id: meridian_core::OrderId) -> BrokerResult<()> {
        Ok(())
    }

    async fn positions(&self) -> BrokerResult<BrokerPositions> {
        Ok(self.positions.lock().unwrap().clone())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<BrokerEvent> {
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    }
}

fn engine_with(broker: Arc<StubBroker>, cash: Decimal) -> ExecutionEngine {
    let clock: Arc<dyn Clock> = Arc::new(SimulatedClock::new(Utc::now()));
    ExecutionEngine::new(ExecutionConfig::default(), broker, clock, cash)
}

fn request(instrument: &str, side: Side, qty: Decimal) -> OrderRequest {
    OrderRequest {
        order_id: Uuid::new_v4(),
        instrument_id: instrument.into(),
        side,
        quantity: qty,
    }
}

fn fill_for(request: &OrderRequest, qty: Decimal, price: Decimal) -> Fill {
    Fill {
        order_id: request.order_id,
        instrument_id: request.instrument_id.clone(),
        side: request.side,
        quantity: qty,
        price,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn fills_summing_to_quantity_reach_the_target() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker, dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    engine.submit(&req).await.unwrap();

    assert_eq!(engine.on_fill(&fill_for(&req, dec!(4), dec!(100))), FillOutcome::Applied);
    assert_eq!(
        engine.order(&req.order_id).unwrap().status,
        OrderStatus::PartiallyFilled
    );
    assert_eq!(engine.on_fill(&fill_for(&req, dec!(6), dec!(100))), FillOutcome::Applied);

    let order = engine.order(&req.order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(engine.portfolio().held_quantity(&"AAA".into()), dec!(10));
    assert_eq!(engine.portfolio().cash, dec!(9000));
}

#[tokio::test]
async fn partial_fill_sequences_commute() {
    // Same multiset of fills, opposite arrival order, identical ledger
    let fills = [(dec!(2), dec!(101)), (dec!(5), dec!(99)), (dec!(3), dec!(100))];

    let mut ledgers = Vec::new();
    for reversed in [false, true] {
        let broker = Arc::new(StubBroker::default());
        let mut engine = engine_with(broker, dec!(10000));
        let req = request("AAA", Side::Buy, dec!(10));
        engine.submit(&req).await.unwrap();

        let mut sequence: Vec<_> = fills.to_vec();
        if reversed {
            sequence.reverse();
        }
        for (qty, price) in sequence {
            engine.on_fill(&fill_for(&req, qty, price));
        }
        assert_eq!(engine.order(&req.order_id).unwrap().status, OrderStatus::Filled);
        ledgers.push((
            engine.portfolio().cash,
            engine.portfolio().held_quantity(&"AAA".into()),
        ));
    }
    assert_eq!(ledgers[0], ledgers[1]);
}

#[tokio::test]
async fn closing_a_holding_returns_its_notional_to_cash() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker, dec!(10000));

    let buy = request("AAA", Side::Buy, dec!(10));
    engine.submit(&buy).await.unwrap();
    engine.on_fill(&fill_for(&buy, dec!(10), dec!(100)));
    assert_eq!(engine.portfolio().cash, dec!(9000));

    let sell = request("AAA", Side::Sell, dec!(10));
    engine.submit(&sell).await.unwrap();
    engine.on_fill(&fill_for(&sell, dec!(10), dec!(110)));

    // Flat holdings disappear from the ledger; proceeds land in cash
    assert!(engine.portfolio().holdings.is_empty());
    assert_eq!(engine.portfolio().cash, dec!(10100));
}

#[tokio::test]
async fn duplicate_fill_on_terminal_order_is_ignored() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker, dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    engine.submit(&req).await.unwrap();

    let fill = fill_for(&req, dec!(10), dec!(100));
    assert_eq!(engine.on_fill(&fill), FillOutcome::Applied);
    let cash_after = engine.portfolio().cash;

    // Broker redelivers the identical fill
    assert_eq!(engine.on_fill(&fill), FillOutcome::DuplicateIgnored);
    assert_eq!(engine.portfolio().cash, cash_after);
    assert_eq!(engine.portfolio().held_quantity(&"AAA".into()), dec!(10));
}

#[tokio::test]
async fn permanent_rejection_is_not_retried() {
    let broker = Arc::new(StubBroker::default());
    broker.script(vec![Err(BrokerError::Rejected {
        reason: "insufficient buying power".to_string(),
    })]);
    let mut engine = engine_with(broker.clone(), dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    let result = engine.submit(&req).await.unwrap();
    assert!(result.is_none());
    assert_eq!(broker.submission_count(), 1);
    assert_eq!(
        engine.order(&req.order_id).unwrap().status,
        OrderStatus::Rejected
    );
}

#[tokio::test(start_paused = true)]
async fn transient_errors_retry_then_succeed() {
    let broker = Arc::new(StubBroker::default());
    broker.script(vec![
        Err(BrokerError::Connectivity("socket reset".to_string())),
        Err(BrokerError::Timeout),
        Ok(()),
    ]);
    let mut engine = engine_with(broker.clone(), dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    let submitted = engine.submit(&req).await.unwrap();
    assert_eq!(submitted, Some(req.order_id));
    assert_eq!(broker.submission_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_escalate_after_retry_budget() {
    let broker = Arc::new(StubBroker::default());
    broker.script(vec![
        Err(BrokerError::Timeout),
        Err(BrokerError::Timeout),
        Err(BrokerError::Timeout),
        Err(BrokerError::Timeout),
    ]);
    let mut engine = engine_with(broker.clone(), dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    let err = engine.submit(&req).await.unwrap_err();
    assert!(matches!(err, Error::TransientExhausted { attempts: 3, .. }));
    // Initial attempt plus the full retry budget
    assert_eq!(broker.submission_count(), 4);
}

#[tokio::test]
async fn paused_engine_refuses_submissions() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker.clone(), dec!(10000));

    engine.apply_event(&BrokerEvent::ConnectionLost);
    let err = engine.submit(&request("AAA", Side::Buy, dec!(1))).await.unwrap_err();
    assert!(matches!(err, Error::SubmissionsPaused));
    assert_eq!(broker.submission_count(), 0);

    // Restore forces reconciliation before the next cycle trades
    engine.apply_event(&BrokerEvent::ConnectionRestored);
    assert!(!engine.is_paused());
    assert!(engine.reconciliation_forced());
}

#[tokio::test]
async fn reconciliation_adopts_broker_truth() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker.clone(), dec!(10000));

    // Build an internal position of 10 AAA
    let req = request("AAA", Side::Buy, dec!(10));
    engine.submit(&req).await.unwrap();
    engine.on_fill(&fill_for(&req, dec!(10), dec!(100)));

    // Broker says 7 AAA and 3 CCC (we missed fills)
    broker.set_position("AAA", dec!(7));
    broker.set_position("CCC", dec!(3));

    let mismatches = engine.reconcile().await.unwrap();
    assert_eq!(mismatches.len(), 2);
    assert_eq!(engine.portfolio().held_quantity(&"AAA".into()), dec!(7));
    assert_eq!(engine.portfolio().held_quantity(&"CCC".into()), dec!(3));

    // A clean second pass reports nothing
    let clean = engine.reconcile().await.unwrap();
    assert!(clean.is_empty());
}

#[tokio::test]
async fn snapshot_restores_open_orders_without_resubmitting() {
    let broker = Arc::new(StubBroker::default());
    let mut engine = engine_with(broker.clone(), dec!(10000));

    let req = request("AAA", Side::Buy, dec!(10));
    engine.submit(&req).await.unwrap();
    engine.on_fill(&fill_for(&req, dec!(4), dec!(100)));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.open_orders.len(), 1);

    let submissions_before = broker.submission_count();
    let clock: Arc<dyn Clock> = Arc::new(SimulatedClock::new(Utc::now()));
    let restored = ExecutionEngine::from_snapshot(
        ExecutionConfig::default(),
        broker.clone(),
        clock,
        snapshot,
    );

    // Open order re-adopted, nothing re-submitted, reconciliation forced
    assert!(restored.has_open_orders());
    assert_eq!(broker.submission_count(), submissions_before);
    assert!(restored.reconciliation_forced());
    assert_eq!(restored.portfolio().held_quantity(&"AAA".into()), dec!(4));
}
