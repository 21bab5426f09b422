use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// How long and short baskets are balanced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkewPolicy {
    /// Up to max_positions/2 per side
    #[default]
    Balanced,
    /// No shorts; up to max_positions longs
    LongOnly,
}

/// How weight is allocated within the baskets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightPolicy {
    /// Every selected name gets the same weight
    #[default]
    EqualWeight,
    /// Weight proportional to 1/sigma across selected names; falls back to
    /// equal weight when any selected name lacks a volatility estimate
    InverseVolatility,
}

/// Portfolio Constructor configuration
#[derive(Debug, Clone)]
pub struct ConstructorConfig {
    /// Maximum count of non-flat positions across both baskets
    pub max_positions: usize,
    /// Minimum score to qualify as a long candidate
    pub long_threshold: f64,
    /// Maximum score to qualify as a short candidate
    pub short_threshold: f64,
    /// Extra edge over 0.5 required in either direction, covering expected
    /// slippage; widens both thresholds
    pub min_edge: f64,
    /// Target gross exposure as a fraction of equity (1.0 = fully invested)
    pub gross_exposure_target: Decimal,
    /// Fraction of equity held back in cash
    pub cash_buffer_pct: Decimal,
    /// Cap on any single |target_weight|
    pub max_position_pct: Decimal,
    pub skew: SkewPolicy,
    pub weighting: WeightPolicy,
}

impl Default for ConstructorConfig {
    fn default() -> Self {
        Self {
            max_positions: 20,
            long_threshold: 0.58,
            short_threshold: 0.42,
            min_edge: 0.0005,
            gross_exposure_target: Decimal::ONE,
            cash_buffer_pct: dec!(0.05),
            max_position_pct: dec!(0.20),
            skew: SkewPolicy::default(),
            weighting: WeightPolicy::default(),
        }
    }
}

impl ConstructorConfig {
    /// Effective long entry bar: the configured threshold, widened by min_edge
    pub fn effective_long_threshold(&self) -> f64 {
        self.long_threshold.max(0.5 + self.min_edge)
    }

    /// Effective short entry bar
    pub fn effective_short_threshold(&self) -> f64 {
        self.short_threshold.min(0.5 - self.min_edge)
    }

    /// Per-side position cap under the configured skew policy
    pub fn per_side_cap(&self) -> (usize, usize) {
        match self.skew {
            SkewPolicy::Balanced => (self.max_positions / 2, self.max_positions / 2),
            SkewPolicy::LongOnly => (self.max_positions, 0),
        }
    }
}
