use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use meridian_core::{
    Fill, Holding, InstrumentId, Order, OrderId, OrderStatus, PortfolioState, TargetPosition,
    Timestamp,
};
use meridian_ports::{Broker, BrokerError, BrokerEvent, Clock, OrderRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ExecutionConfig;
use crate::diff::plan_orders;
use crate::error::{Error, Result};
use crate::persistence::EngineSnapshot;

/// Result of applying a fill notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Fill applied; order and holding updated together
    Applied,
    /// Order already terminal: expected broker-side duplicate, ignored
    DuplicateIgnored,
    /// No such order in the table
    UnknownOrder,
}

/// Audit record for one reconciliation discrepancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationMismatch {
    pub instrument_id: InstrumentId,
    pub ledger_quantity: Decimal,
    pub broker_quantity: Decimal,
    pub timestamp: Timestamp,
}

/// The Execution Engine.
///
/// Owns the order table and the portfolio ledger. Exactly one caller (the
/// session driver) holds `&mut` access; broker notifications never mutate
/// state directly, they arrive here through [`ExecutionEngine::apply_event`]
/// on the driver's thread.
pub struct ExecutionEngine {
    config: ExecutionConfig,
    broker: Arc<dyn Broker>,
    clock: Arc<dyn Clock>,
    portfolio: PortfolioState,
    orders: BTreeMap<OrderId, Order>,
    paused: bool,
    force_reconcile: bool,
}

impl ExecutionEngine {
    pub fn new(
        config: ExecutionConfig,
        broker: Arc<dyn Broker>,
        clock: Arc<dyn Clock>,
        initial_cash: Decimal,
    ) -> Self {
        Self {
            config,
            broker,
            clock,
            portfolio: PortfolioState::new(initial_cash),
            orders: BTreeMap::new(),
            paused: false,
            force_reconcile: false,
        }
    }

    /// Resume from a persisted snapshot after a restart. Open orders are
    /// re-adopted, not re-submitted; the first reconciliation squares the
    /// ledger with whatever happened while we were down.
    pub fn from_snapshot(
        config: ExecutionConfig,
        broker: Arc<dyn Broker>,
        clock: Arc<dyn Clock>,
        snapshot: EngineSnapshot,
    ) -> Self {
        let orders = snapshot
            .open_orders
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        Self {
            config,
            broker,
            clock,
            portfolio: PortfolioState {
                cash: snapshot.cash,
                holdings: snapshot.holdings,
            },
            orders,
            paused: false,
            force_reconcile: true,
        }
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.status.is_open())
    }

    pub fn has_open_orders(&self) -> bool {
        self.open_orders().next().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when the next cycle must reconcile before trading (after a
    /// restart or a connection restore)
    pub fn reconciliation_forced(&self) -> bool {
        self.force_reconcile
    }

    /// Diff targets against current holdings into sequenced order requests
    pub fn plan(
        &self,
        targets: &[TargetPosition],
        prices: &HashMap<InstrumentId, Decimal>,
    ) -> Vec<OrderRequest> {
        plan_orders(targets, &self.portfolio, prices, &self.config)
    }

    /// Submit a batch of order requests in their planned sequence.
    ///
    /// Permanent rejections are logged and skipped (the instrument stays
    /// where it was this cycle); transient errors are retried with backoff
    /// up to the configured budget, then escalated. Returns the ids that
    /// were acknowledged.
    pub async fn submit_all(&mut self, requests: &[OrderRequest]) -> Result<Vec<OrderId>> {
        let mut submitted = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some(id) = self.submit(request).await? {
                submitted.push(id);
            }
        }
        Ok(submitted)
    }

    /// Submit one order. `Ok(None)` means the broker rejected it
    /// permanently; the order is recorded as Rejected and trading goes on.
    pub async fn submit(&mut self, request: &OrderRequest) -> Result<Option<OrderId>> {
        if self.paused {
            return Err(Error::SubmissionsPaused);
        }

        let now = self.clock.now();
        let mut order = Order::new(
            request.instrument_id.clone(),
            request.side,
            request.quantity,
            now,
        );
        order.id = request.order_id;
        self.orders.insert(order.id, order);

        let mut attempt: u32 = 0;
        loop {
            match self.broker.submit_order(request).await {
                Ok(()) => {
                    self.set_status(&request.order_id, OrderStatus::Submitted);
                    debug!(
                        "Submitted {:?} {} x{} as {}",
                        request.side, request.instrument_id, request.quantity, request.order_id
                    );
                    return Ok(Some(request.order_id));
                }
                Err(e) if e.is_transient() => {
                    attempt += 1;
                    if attempt > self.config.max_transient_retries {
                        self.set_status(&request.order_id, OrderStatus::Rejected);
                        return Err(Error::TransientExhausted {
                            attempts: attempt - 1,
                            source: e,
                        });
                    }
                    let delay = self.config.retry_backoff * 2u32.pow(attempt - 1);
                    warn!(
                        "Transient broker error on {} (attempt {}/{}): {}; retrying in {:?}",
                        request.order_id, attempt, self.config.max_transient_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(BrokerError::Rejected { reason }) => {
                    self.set_status(&request.order_id, OrderStatus::Rejected);
                    warn!(
                        "Submission rejected for {}: {}",
                        request.instrument_id, reason
                    );
                    return Ok(None);
                }
                Err(BrokerError::Disconnected) => {
                    self.set_status(&request.order_id, OrderStatus::Rejected);
                    self.pause();
                    return Err(Error::SubmissionsPaused);
                }
                Err(e) => {
                    self.set_status(&request.order_id, OrderStatus::Rejected);
                    return Err(e.into());
                }
            }
        }
    }

    /// Apply a fill notification. Idempotent: fills for terminal orders are
    /// logged and dropped, never double-applied, which defends against
    /// broker-side duplicate delivery.
    pub fn on_fill(&mut self, fill: &Fill) -> FillOutcome {
        match self.orders.get_mut(&fill.order_id) {
            None => {
                warn!("Fill for unknown order {}", fill.order_id);
                FillOutcome::UnknownOrder
            }
            Some(order) if order.status.is_terminal() => {
                debug!(
                    "DuplicateFillIgnored: order {} already {:?}",
                    fill.order_id, order.status
                );
                FillOutcome::DuplicateIgnored
            }
            Some(order) => {
                order.filled_quantity += fill.quantity;
                order.status = if order.is_filled() {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };
                order.updated_at = self.clock.now();
                // Holding and order state move together: no observer can see
                // one updated without the other
                self.portfolio.apply_fill(fill);
                FillOutcome::Applied
            }
        }
    }

    /// Broker confirmed a cancel; any unfilled remainder is dropped
    pub fn on_cancel(&mut self, order_id: &OrderId) {
        self.terminalize(order_id, OrderStatus::Cancelled);
    }

    /// Broker rejected a working order
    pub fn on_reject(&mut self, order_id: &OrderId, reason: &str) {
        warn!("Order {} rejected by broker: {}", order_id, reason);
        self.terminalize(order_id, OrderStatus::Rejected);
    }

    /// Apply one broker notification. This is the only entry point for the
    /// notification stream, and it runs on the driver's thread.
    pub fn apply_event(&mut self, event: &BrokerEvent) -> Option<FillOutcome> {
        match event {
            BrokerEvent::Fill(fill) => Some(self.on_fill(fill)),
            BrokerEvent::Cancelled { order_id } => {
                self.on_cancel(order_id);
                None
            }
            BrokerEvent::Rejected { order_id, reason } => {
                self.on_reject(order_id, reason);
                None
            }
            BrokerEvent::ConnectionLost => {
                self.pause();
                None
            }
            BrokerEvent::ConnectionRestored => {
                self.resume();
                None
            }
        }
    }

    /// Stop accepting submissions (connection lost)
    pub fn pause(&mut self) {
        if !self.paused {
            warn!("Broker connection lost; pausing submissions");
            self.paused = true;
        }
    }

    /// Require a reconciliation pass before this cycle trades. The live
    /// driver requests this at every bar close, so a missed fill
    /// notification surfaces at the next cycle instead of drifting.
    pub fn request_reconciliation(&mut self) {
        self.force_reconcile = true;
    }

    /// Accept submissions again; the next cycle must reconcile first, since
    /// fills may have been missed while the connection was down
    pub fn resume(&mut self) {
        if self.paused {
            info!("Broker connection restored; forcing reconciliation");
            self.paused = false;
            self.force_reconcile = true;
        }
    }

    /// Reconcile the internal ledger against the broker's authoritative
    /// position snapshot. Broker truth wins on every mismatch; each
    /// discrepancy is logged and returned for audit.
    pub async fn reconcile(&mut self) -> Result<Vec<ReconciliationMismatch>> {
        let snapshot = self.broker.positions().await?;
        let now = self.clock.now();

        let mut instruments: Vec<InstrumentId> = self.portfolio.holdings.keys().cloned().collect();
        for id in snapshot.keys() {
            if !self.portfolio.holdings.contains_key(id) {
                instruments.push(id.clone());
            }
        }

        let mut mismatches = Vec::new();
        for instrument_id in instruments {
            let ledger_quantity = self.portfolio.held_quantity(&instrument_id);
            let broker_quantity = snapshot
                .get(&instrument_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if ledger_quantity == broker_quantity {
                continue;
            }

            warn!(
                "ReconciliationMismatch for {}: ledger={}, broker={}; broker wins",
                instrument_id, ledger_quantity, broker_quantity
            );
            if broker_quantity.is_zero() {
                self.portfolio.holdings.remove(&instrument_id);
            } else {
                // Keep our cost basis where we have one; an unknown basis
                // stays zero until the next fill establishes it
                let entry = self
                    .portfolio
                    .holdings
                    .entry(instrument_id.clone())
                    .or_insert_with(|| Holding::new(Decimal::ZERO, Decimal::ZERO));
                entry.quantity = broker_quantity;
            }
            mismatches.push(ReconciliationMismatch {
                instrument_id,
                ledger_quantity,
                broker_quantity,
                timestamp: now,
            });
        }

        self.force_reconcile = false;
        Ok(mismatches)
    }

    /// Snapshot for crash recovery: cash, holdings, and still-open orders
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            taken_at: self.clock.now(),
            cash: self.portfolio.cash,
            holdings: self.portfolio.holdings.clone(),
            open_orders: self.open_orders().cloned().collect(),
        }
    }

    fn set_status(&mut self, order_id: &OrderId, status: OrderStatus) {
        if let Some(order) = self.orders.get_mut(order_id) {
            order.status = status;
            order.updated_at = self.clock.now();
        }
    }

    fn terminalize(&mut self, order_id: &OrderId, status: OrderStatus) {
        match self.orders.get_mut(order_id) {
            None => warn!("{:?} for unknown order {}", status, order_id),
            Some(order) if order.status.is_terminal() => {
                debug!(
                    "Ignoring {:?} for order {} already {:?}",
                    status, order_id, order.status
                );
            }
            Some(order) => {
                order.status = status;
                order.updated_at = self.clock.now();
            }
        }
    }
}
