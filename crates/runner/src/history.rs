use std::collections::{BTreeMap, HashMap};

use meridian_core::{Bar, InstrumentId};
use meridian_features::indicators;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Default trailing window length kept per instrument. Comfortably more
/// than the feature schema's 30-bar minimum.
pub const DEFAULT_CAPACITY: usize = 64;

const ATR_PERIOD: usize = 14;

/// Rolling trailing-bar windows, one per instrument.
///
/// The driver appends each cycle's bars here before running the pipeline;
/// the pipeline reads windows, latest closes, and volatility estimates.
/// Windows are bounded, so a long session holds constant memory.
pub struct BarHistory {
    capacity: usize,
    windows: BTreeMap<InstrumentId, Vec<Bar>>,
}

impl BarHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: BTreeMap::new(),
        }
    }

    /// Append one cycle's bars, evicting the oldest beyond capacity
    pub fn push_cycle(&mut self, bars: &[Bar]) {
        for bar in bars {
            let window = self.windows.entry(bar.instrument_id.clone()).or_default();
            window.push(bar.clone());
            if window.len() > self.capacity {
                window.remove(0);
            }
        }
    }

    /// Instruments with any history, in deterministic order
    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentId> {
        self.windows.keys()
    }

    /// Trailing window for one instrument, ascending by timestamp
    pub fn window(&self, instrument_id: &InstrumentId) -> &[Bar] {
        self.windows
            .get(instrument_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent close per instrument; the mark prices the cycle trades
    /// and values equity against
    pub fn latest_closes(&self) -> HashMap<InstrumentId, Decimal> {
        self.windows
            .iter()
            .filter_map(|(id, window)| window.last().map(|bar| (id.clone(), bar.close)))
            .collect()
    }

    /// Per-instrument volatility estimate: ATR relative to the last close.
    /// Instruments without enough history, or whose estimate is degenerate,
    /// are simply absent; the constructor falls back to equal weight.
    pub fn volatilities(&self) -> HashMap<InstrumentId, Decimal> {
        let mut out = HashMap::new();
        for (id, window) in &self.windows {
            if window.len() < ATR_PERIOD + 1 {
                continue;
            }
            let highs: Vec<f64> = window.iter().map(|b| to_f64(b.high)).collect();
            let lows: Vec<f64> = window.iter().map(|b| to_f64(b.low)).collect();
            let closes: Vec<f64> = window.iter().map(|b| to_f64(b.close)).collect();
            let last_close = closes[closes.len() - 1];
            if last_close <= 0.0 {
                continue;
            }
            let vol = indicators::atr(&highs, &lows, &closes, ATR_PERIOD) / last_close;
            if vol.is_finite() && vol > 0.0 {
                if let Some(vol) = Decimal::from_f64(vol) {
                    out.insert(id.clone(), vol);
                }
            }
        }
        out
    }
}

impl Default for BarHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar(instrument: &str, minute: i64, close: Decimal) -> Bar {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap() + Duration::minutes(minute);
        Bar::new(
            instrument,
            ts,
            close,
            close + dec!(1),
            close - dec!(1),
            close,
            dec!(10000),
        )
    }

    #[test]
    fn windows_are_bounded() {
        let mut history = BarHistory::new(5);
        for i in 0..10 {
            history.push_cycle(&[bar("AAA", 30 * i, Decimal::from(100 + i))]);
        }
        let window = history.window(&"AAA".into());
        assert_eq!(window.len(), 5);
        // Oldest evicted first
        assert_eq!(window[0].close, dec!(105));
        assert_eq!(window[4].close, dec!(109));
    }

    #[test]
    fn latest_closes_track_the_newest_bar() {
        let mut history = BarHistory::default();
        history.push_cycle(&[bar("AAA", 0, dec!(100)), bar("BBB", 0, dec!(50))]);
        history.push_cycle(&[bar("AAA", 30, dec!(101))]);

        let closes = history.latest_closes();
        assert_eq!(closes[&InstrumentId::from("AAA")], dec!(101));
        assert_eq!(closes[&InstrumentId::from("BBB")], dec!(50));
    }

    #[test]
    fn volatility_needs_enough_bars() {
        let mut history = BarHistory::default();
        for i in 0..10 {
            history.push_cycle(&[bar("AAA", 30 * i, dec!(100))]);
        }
        assert!(history.volatilities().is_empty());

        for i in 10..20 {
            history.push_cycle(&[bar("AAA", 30 * i, dec!(100))]);
        }
        // Constant 2-point range around a 100 close: ATR/close = 0.02
        let vols = history.volatilities();
        let vol = vols[&InstrumentId::from("AAA")];
        assert!(vol > dec!(0.019) && vol < dec!(0.021));
    }
}
