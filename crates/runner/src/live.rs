use std::time::Duration;

use log::{debug, info, warn};
use meridian_execution::{ExecutionEngine, JsonStateStore};
use meridian_ports::{BrokerEvent, CycleBars};
use tokio::sync::mpsc;

use crate::cycle::{CyclePipeline, CycleReport};
use crate::error::Result;
use crate::history::BarHistory;
use crate::metrics::SessionReport;
use crate::phase::SessionPhase;

/// Live session configuration
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// How long the settling phase waits for fills after submitting. On
    /// expiry the cycle ends anyway; still-open orders carry forward and
    /// their fills are applied whenever they arrive.
    pub settle_timeout: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(30),
        }
    }
}

/// Drives a live session.
///
/// Bar closes arrive on a channel (pushed by a feed adapter task) and
/// broker notifications on another; a select loop is the single consumer of
/// both, so every state mutation happens on this task. The decision path
/// per cycle is the same [`CyclePipeline`] the backtest runs; only the
/// collaborators behind the ports differ.
pub struct LiveDriver {
    config: LiveConfig,
    pipeline: CyclePipeline,
    engine: ExecutionEngine,
    history: BarHistory,
    bars: mpsc::UnboundedReceiver<CycleBars>,
    events: mpsc::UnboundedReceiver<BrokerEvent>,
    store: Option<JsonStateStore>,
    cycle_reports: Option<mpsc::UnboundedSender<CycleReport>>,
    phase: SessionPhase,
}

impl LiveDriver {
    pub fn new(
        config: LiveConfig,
        pipeline: CyclePipeline,
        engine: ExecutionEngine,
        bars: mpsc::UnboundedReceiver<CycleBars>,
        events: mpsc::UnboundedReceiver<BrokerEvent>,
    ) -> Self {
        Self {
            config,
            pipeline,
            engine,
            history: BarHistory::default(),
            bars,
            events,
            store: None,
            cycle_reports: None,
            phase: SessionPhase::Waiting,
        }
    }

    /// Persist a snapshot after every cycle and at teardown
    pub fn with_state_store(mut self, store: JsonStateStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Publish each cycle's report as it completes (monitoring, tests)
    pub fn with_cycle_reports(mut self, sender: mpsc::UnboundedSender<CycleReport>) -> Self {
        self.cycle_reports = Some(sender);
        self
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    /// Run until the bar channel closes (end of session), then flush state.
    /// A fatal error still halts through [`LiveDriver::halt`], so no
    /// in-flight order is left unaccounted.
    pub async fn run(&mut self) -> Result<SessionReport> {
        let mut report = SessionReport::new(self.engine.portfolio().cash);
        info!(
            "Live session starting with {} cash, settle timeout {:?}",
            self.engine.portfolio().cash, self.config.settle_timeout
        );

        if let Err(e) = self.session_loop(&mut report).await {
            warn!("Live session halting on fatal error: {e}");
            self.halt().await;
            return Err(e);
        }

        self.flush_state()?;
        let summary = report.summary();
        info!(
            "Live session ended: {} cycles, {} fills, final equity {}",
            report.cycles, report.fills_applied, summary.final_equity
        );
        Ok(report)
    }

    async fn session_loop(&mut self, report: &mut SessionReport) -> Result<()> {
        loop {
            tokio::select! {
                cycle = self.bars.recv() => {
                    let Some(cycle) = cycle else {
                        return Ok(());
                    };
                    self.run_cycle(cycle, report).await?;
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Ok(());
                    };
                    self.apply(&event, report);
                }
            }
        }
    }

    /// Square the ledger and persist it before a fatal exit. Both steps
    /// are best-effort: the original error is what the caller sees.
    async fn halt(&mut self) {
        if let Err(e) = self.engine.reconcile().await {
            warn!("Reconciliation during halt failed: {e}");
        }
        if let Err(e) = self.flush_state() {
            warn!("Snapshot flush during halt failed: {e}");
        }
    }

    async fn run_cycle(&mut self, cycle: CycleBars, report: &mut SessionReport) -> Result<()> {
        self.transition(SessionPhase::Computing);
        // Every live cycle reconciles before it trades; only a backtest may
        // trust its ledger blindly
        self.engine.request_reconciliation();
        self.history.push_cycle(&cycle.bars);

        self.transition(SessionPhase::Executing);
        let outcome = self
            .pipeline
            .run(&mut self.engine, &self.history, cycle.as_of)
            .await?;

        self.transition(SessionPhase::Settling);
        self.settle(report).await;

        report.cycles += 1;
        report.orders_submitted += outcome.submitted.len();
        report.reconciliation_mismatches += outcome.mismatches.len();
        let settled_equity = self
            .engine
            .portfolio()
            .equity(&self.history.latest_closes());
        report.record_equity(cycle.as_of, settled_equity);

        self.flush_state()?;
        if let Some(sender) = &self.cycle_reports {
            let _ = sender.send(outcome);
        }
        self.transition(SessionPhase::Waiting);
        Ok(())
    }

    /// Wait (bounded) for this cycle's orders to reach a terminal state.
    /// A timeout is not an error: open orders carry forward and settle in a
    /// later cycle or between cycles.
    async fn settle(&mut self, report: &mut SessionReport) {
        let deadline = tokio::time::Instant::now() + self.config.settle_timeout;
        while self.engine.has_open_orders() {
            let next = tokio::time::timeout_at(deadline, self.events.recv()).await;
            match next {
                Ok(Some(event)) => self.apply(&event, report),
                Ok(None) => break,
                Err(_) => {
                    let open = self.engine.open_orders().count();
                    warn!(
                        "Settle timeout: {open} orders still open, carrying them forward"
                    );
                    break;
                }
            }
        }
    }

    fn apply(&mut self, event: &BrokerEvent, report: &mut SessionReport) {
        crate::metrics::apply_and_record(&mut self.engine, event, report);
    }

    fn flush_state(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&self.engine.snapshot())?;
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionPhase) {
        if self.phase != next {
            debug!("Session phase: {} -> {}", self.phase, next);
            self.phase = next;
        }
    }
}
