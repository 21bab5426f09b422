use std::sync::Arc;

use log::{info, warn};
use meridian_broker_sim::SimulatedBroker;
use meridian_clock::SimulatedClock;
use meridian_execution::ExecutionEngine;
use meridian_ports::{BarFeed, Broker};
use tokio::sync::mpsc;

use crate::cycle::CyclePipeline;
use crate::error::Result;
use crate::history::BarHistory;
use crate::metrics::SessionReport;

/// Drives a historical session.
///
/// Each cycle: pull the next bar-close boundary from the feed, advance
/// simulated time to it, refresh the broker's marks, run the pipeline, then
/// drain and apply the broker's notifications. The simulated broker fills
/// at submission, so every cycle settles before the next one starts and the
/// equity curve observes each cycle fully settled.
pub struct BacktestDriver {
    clock: Arc<SimulatedClock>,
    broker: Arc<SimulatedBroker>,
    feed: Box<dyn BarFeed>,
    pipeline: CyclePipeline,
    engine: ExecutionEngine,
    history: BarHistory,
    events: mpsc::UnboundedReceiver<meridian_ports::BrokerEvent>,
}

impl BacktestDriver {
    pub fn new(
        clock: Arc<SimulatedClock>,
        broker: Arc<SimulatedBroker>,
        feed: Box<dyn BarFeed>,
        pipeline: CyclePipeline,
        engine: ExecutionEngine,
    ) -> Self {
        let events = broker.subscribe();
        Self {
            clock,
            broker,
            feed,
            pipeline,
            engine,
            history: BarHistory::default(),
            events,
        }
    }

    /// Replay the feed to exhaustion
    pub async fn run(&mut self) -> Result<SessionReport> {
        let mut report = SessionReport::new(self.engine.portfolio().cash);
        info!(
            "Backtest starting with {} cash",
            self.engine.portfolio().cash
        );

        while let Some(cycle) = self.feed.next_cycle()? {
            self.clock.advance_to(cycle.as_of);
            self.history.push_cycle(&cycle.bars);
            self.broker.set_marks(&self.history.latest_closes());

            let outcome = match self
                .pipeline
                .run(&mut self.engine, &self.history, cycle.as_of)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Square the ledger before surfacing the halt
                    warn!("Backtest halting on fatal error: {e}");
                    if let Err(re) = self.engine.reconcile().await {
                        warn!("Reconciliation during halt failed: {re}");
                    }
                    return Err(e);
                }
            };

            // Fills were emitted synchronously during submission; apply
            // them now so this cycle's equity point is fully settled
            while let Ok(event) = self.events.try_recv() {
                crate::metrics::apply_and_record(&mut self.engine, &event, &mut report);
            }

            report.cycles += 1;
            report.orders_submitted += outcome.submitted.len();
            report.reconciliation_mismatches += outcome.mismatches.len();
            let settled_equity = self
                .engine
                .portfolio()
                .equity(&self.history.latest_closes());
            report.record_equity(cycle.as_of, settled_equity);
        }

        let summary = report.summary();
        info!(
            "Backtest finished: {} cycles, {} fills, final equity {}, return {:.2}%, max drawdown {:.2}%",
            report.cycles,
            report.fills_applied,
            summary.final_equity,
            summary.total_return * 100.0,
            summary.max_drawdown * 100.0
        );
        if let Some(cagr) = summary.cagr {
            info!("CAGR {:.2}%", cagr * 100.0);
        }
        Ok(report)
    }

    /// The engine's state, for inspection after a run
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }
}
