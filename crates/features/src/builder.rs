use chrono::Timelike;
use meridian_core::{Bar, InstrumentId, Timestamp};
use rust_decimal::prelude::ToPrimitive;

use crate::error::{Error, Result};
use crate::indicators;
use crate::schema::FeatureSchema;
use crate::vector::FeatureVector;

/// Feature Builder configuration
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Minimum trailing bars before any vector is produced
    pub min_bars: usize,
    /// Rolling VWAP window for the vwap_gap feature
    pub vwap_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_bars: 30,
            vwap_window: 20,
        }
    }
}

/// Builds feature vectors from trailing bar windows.
///
/// Pure: holds only configuration, no per-instrument state. The same window
/// always yields the same vector, which is what makes backtest and live
/// decisions comparable and tests reproducible.
pub struct FeatureBuilder {
    config: FeatureConfig,
    schema: FeatureSchema,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            schema: FeatureSchema::standard(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build the feature vector for one instrument at decision time `as_of`.
    ///
    /// `bars` is the trailing window, ascending by timestamp. Every bar must
    /// be strictly before `as_of`; a violating bar fails the whole window
    /// rather than being silently dropped.
    pub fn build(
        &self,
        instrument_id: &InstrumentId,
        bars: &[Bar],
        as_of: Timestamp,
    ) -> Result<FeatureVector> {
        if bars.len() < self.config.min_bars {
            return Err(Error::InsufficientHistory {
                instrument_id: instrument_id.to_string(),
                required: self.config.min_bars,
                available: bars.len(),
            });
        }
        if let Some(bar) = bars.iter().find(|b| b.timestamp >= as_of) {
            return Err(Error::LookaheadBar {
                instrument_id: instrument_id.to_string(),
                bar_timestamp: bar.timestamp,
                as_of,
            });
        }

        let closes = to_f64(bars, |b| b.close);
        let highs = to_f64(bars, |b| b.high);
        let lows = to_f64(bars, |b| b.low);
        let volumes = to_f64(bars, |b| b.volume);

        // Time-of-day encoding from the most recent bar's open
        let last_ts = bars[bars.len() - 1].timestamp;
        let minutes = (last_ts.hour() * 60 + last_ts.minute()) as f64;
        let angle = 2.0 * std::f64::consts::PI * minutes / 1440.0;

        let bb_mid = indicators::sma(&closes, 20);
        let bb_std = indicators::stddev(&closes, 20);
        let vwap = indicators::vwap(&closes, &volumes, self.config.vwap_window);
        let last_close = closes[closes.len() - 1];
        let return_1 = indicators::trailing_return(&closes, 1);

        // Schema order; see FeatureSchema::standard
        let values = vec![
            indicators::sma(&closes, 5),
            indicators::sma(&closes, 20),
            indicators::rsi(&closes, 14),
            bb_mid + 2.0 * bb_std,
            bb_mid - 2.0 * bb_std,
            return_1,
            indicators::trailing_return(&closes, 2),
            indicators::trailing_return(&closes, 5),
            indicators::atr(&highs, &lows, &closes, 14),
            return_1, // mom_1, kept for schema compatibility
            angle.sin(),
            angle.cos(),
            last_close / vwap - 1.0,
        ];
        debug_assert_eq!(values.len(), self.schema.width());

        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteFeature {
                instrument_id: instrument_id.to_string(),
                feature: crate::schema::STANDARD_FEATURES[idx],
            });
        }

        Ok(FeatureVector {
            instrument_id: instrument_id.clone(),
            timestamp: as_of,
            values,
        })
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

fn to_f64(bars: &[Bar], field: impl Fn(&Bar) -> rust_decimal::Decimal) -> Vec<f64> {
    // A Decimal that cannot convert surfaces as NaN and fails the finite check
    bars.iter()
        .map(|b| field(b).to_f64().unwrap_or(f64::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn window(n: usize) -> (Vec<Bar>, Timestamp) {
        // 30-minute bars climbing one point per bar
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap();
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let close = Decimal::from(100 + i as i64);
                Bar::new(
                    "AAA",
                    start + Duration::minutes(30 * i as i64),
                    close - dec!(0.5),
                    close + dec!(0.5),
                    close - dec!(1),
                    close,
                    dec!(10000),
                )
            })
            .collect();
        let as_of = start + Duration::minutes(30 * n as i64);
        (bars, as_of)
    }

    #[test]
    fn short_window_is_insufficient_history() {
        let builder = FeatureBuilder::default();
        let (bars, as_of) = window(10);
        let err = builder.build(&"AAA".into(), &bars, as_of).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientHistory {
                required: 30,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn bar_at_decision_time_is_rejected() {
        let builder = FeatureBuilder::default();
        let (bars, _) = window(35);
        // as_of equal to the last bar's open: that bar must not contribute
        let as_of = bars[bars.len() - 1].timestamp;
        let err = builder.build(&"AAA".into(), &bars, as_of).unwrap_err();
        assert!(matches!(err, Error::LookaheadBar { .. }));
    }

    #[test]
    fn output_is_deterministic() {
        let builder = FeatureBuilder::default();
        let (bars, as_of) = window(40);
        let a = builder.build(&"AAA".into(), &bars, as_of).unwrap();
        let b = builder.build(&"AAA".into(), &bars, as_of).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.width(), builder.schema().width());
    }

    #[test]
    fn monotonic_closes_saturate_rsi() {
        let builder = FeatureBuilder::default();
        let (bars, as_of) = window(40);
        let v = builder.build(&"AAA".into(), &bars, as_of).unwrap();
        // rsi_14 is index 2 in the schema
        assert_eq!(v.values[2], 100.0);
        // return_1 equals mom_1
        assert_eq!(v.values[5], v.values[9]);
    }

    #[test]
    fn zero_volume_window_is_non_finite() {
        let builder = FeatureBuilder::default();
        let (mut bars, as_of) = window(40);
        for bar in &mut bars {
            bar.volume = Decimal::ZERO;
        }
        let err = builder.build(&"AAA".into(), &bars, as_of).unwrap_err();
        assert!(matches!(
            err,
            Error::NonFiniteFeature {
                feature: "vwap_gap",
                ..
            }
        ));
    }
}
