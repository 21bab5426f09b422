use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentId;
use crate::values::Timestamp;

/// OHLCV summary for one instrument over one time interval.
///
/// `timestamp` is the bar's **open** time; the bar only becomes visible to
/// the strategy once the interval has fully elapsed. Bars are immutable once
/// emitted and strictly increasing in timestamp per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument_id: InstrumentId,
    pub timestamp: Timestamp,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument_id: impl Into<InstrumentId>,
        timestamp: Timestamp,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True range against the previous bar's close
    pub fn true_range(&self, prev_close: Decimal) -> Decimal {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}
