use log::{debug, info, warn};
use meridian_core::{OrderId, Timestamp};
use meridian_execution::{ExecutionEngine, ReconciliationMismatch};
use meridian_features::{FeatureBuilder, FeatureVector};
use meridian_model::ModelAdapter;
use meridian_portfolio::PortfolioConstructor;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::history::BarHistory;

/// What one cycle did, for the driver's accounting
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub as_of: Timestamp,
    /// Instruments that produced a score this cycle
    pub scored: usize,
    /// Instruments skipped for insufficient history or degenerate features
    pub skipped: usize,
    pub submitted: Vec<OrderId>,
    pub mismatches: Vec<ReconciliationMismatch>,
    /// Equity at this cycle's marks, after submissions returned
    pub equity: Decimal,
    /// True when submissions were paused and the trading half of the cycle
    /// was skipped
    pub paused: bool,
}

/// One decision cycle, end to end: features, scores, targets, orders.
///
/// Mode-agnostic by construction. The backtest and live drivers feed it the
/// same inputs through the same ports, so a decision here cannot depend on
/// which driver is running.
pub struct CyclePipeline {
    builder: FeatureBuilder,
    adapter: ModelAdapter,
    constructor: PortfolioConstructor,
}

impl CyclePipeline {
    pub fn new(
        builder: FeatureBuilder,
        adapter: ModelAdapter,
        constructor: PortfolioConstructor,
    ) -> Self {
        Self {
            builder,
            adapter,
            constructor,
        }
    }

    /// Run one cycle at decision time `as_of` against the given history.
    ///
    /// Per-instrument feature faults skip the instrument; model faults and
    /// exhausted retries halt the run. A paused engine skips the trading
    /// half of the cycle and reports it, leaving positions untouched until
    /// the connection is restored.
    pub async fn run(
        &self,
        engine: &mut ExecutionEngine,
        history: &BarHistory,
        as_of: Timestamp,
    ) -> Result<CycleReport> {
        let mismatches = if engine.reconciliation_forced() && !engine.is_paused() {
            engine.reconcile().await?
        } else {
            Vec::new()
        };

        let mut vectors: Vec<FeatureVector> = Vec::new();
        let mut skipped = 0usize;
        for instrument_id in history.instruments() {
            match self.builder.build(instrument_id, history.window(instrument_id), as_of) {
                Ok(vector) => vectors.push(vector),
                Err(e @ meridian_features::Error::LookaheadBar { .. }) => {
                    return Err(Error::Lookahead(e));
                }
                Err(e) => {
                    debug!("Skipping {instrument_id} this cycle: {e}");
                    skipped += 1;
                }
            }
        }

        let scores = self.adapter.score_all(&vectors)?;
        let prices = history.latest_closes();
        let volatilities = history.volatilities();
        let targets =
            self.constructor
                .construct(&scores, &engine.portfolio().holdings, &volatilities);
        let requests = engine.plan(&targets, &prices);

        let mut paused = engine.is_paused();
        let submitted = if paused {
            warn!("Cycle {as_of}: submissions paused, holding all positions");
            Vec::new()
        } else {
            match engine.submit_all(&requests).await {
                Ok(ids) => ids,
                Err(meridian_execution::Error::SubmissionsPaused) => {
                    warn!("Cycle {as_of}: connection lost mid-cycle, remaining orders dropped");
                    paused = true;
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            }
        };

        let equity = engine.portfolio().equity(&prices);
        info!(
            "Cycle {as_of}: {} scored, {} skipped, {} orders submitted, equity {equity}",
            scores.len(),
            skipped,
            submitted.len()
        );

        Ok(CycleReport {
            as_of,
            scored: scores.len(),
            skipped,
            submitted,
            mismatches,
            equity,
            paused,
        })
    }
}
