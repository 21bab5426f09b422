//! Session performance accounting.
//!
//! The driver records one equity observation per cycle after settlement;
//! the summary derives return, annualized growth, and drawdown from that
//! curve. Equity stays `Decimal` end to end; only the derived ratios drop
//! to `f64`.

use meridian_core::Timestamp;
use meridian_execution::{ExecutionEngine, FillOutcome};
use meridian_ports::BrokerEvent;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Annualization requires at least this much elapsed time; below it, CAGR
/// extrapolates noise and is omitted.
const MIN_CAGR_DAYS: i64 = 30;

/// One post-settlement equity observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: Timestamp,
    pub equity: Decimal,
}

/// What one driver run produced
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub initial_cash: Decimal,
    pub cycles: usize,
    pub orders_submitted: usize,
    pub fills_applied: usize,
    /// Completed round trips: positions taken back to flat by a fill
    pub round_trips: usize,
    pub reconciliation_mismatches: usize,
    pub equity_curve: Vec<EquityPoint>,
}

impl SessionReport {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cycles: 0,
            orders_submitted: 0,
            fills_applied: 0,
            round_trips: 0,
            reconciliation_mismatches: 0,
            equity_curve: Vec::new(),
        }
    }

    pub fn record_equity(&mut self, timestamp: Timestamp, equity: Decimal) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    pub fn final_equity(&self) -> Decimal {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }

    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary::from_report(self)
    }
}

/// Derived performance figures
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub final_equity: Decimal,
    /// Fractional return over the whole session
    pub total_return: f64,
    /// Annualized growth rate; None when the session spans under 30 days
    pub cagr: Option<f64>,
    /// Worst peak-to-trough equity decline, as a positive fraction
    pub max_drawdown: f64,
    pub fills: usize,
    pub round_trips: usize,
}

impl PerformanceSummary {
    fn from_report(report: &SessionReport) -> Self {
        let initial = report.initial_cash.to_f64().unwrap_or(0.0);
        let final_equity = report.final_equity();
        let final_f = final_equity.to_f64().unwrap_or(0.0);

        let total_return = if initial > 0.0 {
            final_f / initial - 1.0
        } else {
            0.0
        };

        let cagr = match (report.equity_curve.first(), report.equity_curve.last()) {
            (Some(first), Some(last)) => {
                let days = (last.timestamp - first.timestamp).num_days();
                if days >= MIN_CAGR_DAYS && initial > 0.0 && final_f > 0.0 {
                    let years = days as f64 / 365.25;
                    Some((final_f / initial).powf(1.0 / years) - 1.0)
                } else {
                    None
                }
            }
            _ => None,
        };

        Self {
            final_equity,
            total_return,
            cagr,
            max_drawdown: max_drawdown(&report.equity_curve),
            fills: report.fills_applied,
            round_trips: report.round_trips,
        }
    }
}

/// Apply one broker notification and fold the outcome into the report.
/// A fill that takes its position back to exactly flat completes one
/// round trip.
pub(crate) fn apply_and_record(
    engine: &mut ExecutionEngine,
    event: &BrokerEvent,
    report: &mut SessionReport,
) {
    let was_open = match event {
        BrokerEvent::Fill(fill) => !engine
            .portfolio()
            .held_quantity(&fill.instrument_id)
            .is_zero(),
        _ => false,
    };

    if let Some(FillOutcome::Applied) = engine.apply_event(event) {
        report.fills_applied += 1;
        if let BrokerEvent::Fill(fill) = event {
            if was_open
                && engine
                    .portfolio()
                    .held_quantity(&fill.instrument_id)
                    .is_zero()
            {
                report.round_trips += 1;
            }
        }
    }
}

fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst: f64 = 0.0;
    for point in curve {
        let equity = point.equity.to_f64().unwrap_or(0.0);
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            worst = worst.max(1.0 - equity / peak);
        }
    }
    worst
}
