use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentId;

/// Which basket a target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSide {
    Long,
    Short,
    /// Close any held position; the rebalancing signal for dropped names
    Flat,
}

/// Desired portfolio weight for one instrument, emitted by the portfolio
/// constructor once per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPosition {
    pub instrument_id: InstrumentId,
    /// Fraction of portfolio equity in [-1, 1]; negative = short
    pub target_weight: Decimal,
    pub side: TargetSide,
}

impl TargetPosition {
    pub fn long(instrument_id: impl Into<InstrumentId>, weight: Decimal) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            target_weight: weight,
            side: TargetSide::Long,
        }
    }

    pub fn short(instrument_id: impl Into<InstrumentId>, weight: Decimal) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            target_weight: -weight.abs(),
            side: TargetSide::Short,
        }
    }

    pub fn flat(instrument_id: impl Into<InstrumentId>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            target_weight: Decimal::ZERO,
            side: TargetSide::Flat,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.side, TargetSide::Flat)
    }
}
