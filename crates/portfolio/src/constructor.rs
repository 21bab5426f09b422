use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, warn};
use meridian_core::{Holding, InstrumentId, TargetPosition};
use meridian_model::Score;
use meridian_ports::{AcceptAll, UniverseFilter};
use rust_decimal::Decimal;

use crate::config::{ConstructorConfig, WeightPolicy};

/// Builds the target portfolio from one cycle's scores.
///
/// Holds only configuration and the eligibility filter; `construct` is a
/// pure function of its inputs, so the same scores and holdings always
/// produce the same targets, in the same order.
pub struct PortfolioConstructor {
    config: ConstructorConfig,
    filter: Arc<dyn UniverseFilter>,
}

impl PortfolioConstructor {
    pub fn new(config: ConstructorConfig) -> Self {
        Self {
            config,
            filter: Arc::new(AcceptAll),
        }
    }

    /// Replace the default accept-all eligibility filter
    pub fn with_filter(mut self, filter: Arc<dyn UniverseFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &ConstructorConfig {
        &self.config
    }

    /// Construct target positions for this cycle.
    ///
    /// `volatilities` feeds the inverse-volatility weighting policy and is
    /// ignored under equal weight. Every held instrument absent from both
    /// baskets gets an explicit flat target.
    pub fn construct(
        &self,
        scores: &[Score],
        holdings: &BTreeMap<InstrumentId, Holding>,
        volatilities: &HashMap<InstrumentId, Decimal>,
    ) -> Vec<TargetPosition> {
        let eligible: Vec<&Score> = scores
            .iter()
            .filter(|s| self.filter.is_eligible(&s.instrument_id))
            .collect();

        let (long_cap, short_cap) = self.config.per_side_cap();

        let mut longs: Vec<&Score> = eligible
            .iter()
            .copied()
            .filter(|s| s.value >= self.config.effective_long_threshold())
            .collect();
        longs.sort_by(|a, b| rank(a, b, holdings, true));
        longs.truncate(long_cap);

        let mut shorts: Vec<&Score> = eligible
            .iter()
            .copied()
            .filter(|s| s.value <= self.config.effective_short_threshold())
            .collect();
        shorts.sort_by(|a, b| rank(a, b, holdings, false));
        shorts.truncate(short_cap);

        let selected = longs.len() + shorts.len();
        let weights = self.allocate(&longs, &shorts, volatilities);

        let mut targets: Vec<TargetPosition> = Vec::with_capacity(selected + holdings.len());
        for score in &longs {
            let w = weights[&score.instrument_id];
            targets.push(TargetPosition::long(score.instrument_id.clone(), w));
        }
        for score in &shorts {
            let w = weights[&score.instrument_id];
            targets.push(TargetPosition::short(score.instrument_id.clone(), w));
        }

        // Held names that dropped out of both baskets close out
        for instrument_id in holdings.keys() {
            if !weights.contains_key(instrument_id) {
                targets.push(TargetPosition::flat(instrument_id.clone()));
            }
        }

        debug!(
            "Constructed {} targets: {} long, {} short, {} flat",
            targets.len(),
            longs.len(),
            shorts.len(),
            targets.len() - selected
        );
        targets
    }

    /// Allocate |weight| per selected instrument under the gross budget
    fn allocate(
        &self,
        longs: &[&Score],
        shorts: &[&Score],
        volatilities: &HashMap<InstrumentId, Decimal>,
    ) -> HashMap<InstrumentId, Decimal> {
        let selected: Vec<&InstrumentId> = longs
            .iter()
            .chain(shorts.iter())
            .map(|s| &s.instrument_id)
            .collect();
        if selected.is_empty() {
            return HashMap::new();
        }

        let budget = self.config.gross_exposure_target * (Decimal::ONE - self.config.cash_buffer_pct);
        let count = Decimal::from(selected.len());

        let inverse_vols: Option<Vec<Decimal>> = match self.config.weighting {
            WeightPolicy::EqualWeight => None,
            WeightPolicy::InverseVolatility => {
                let inv: Vec<Option<Decimal>> = selected
                    .iter()
                    .map(|id| {
                        volatilities
                            .get(*id)
                            .filter(|v| **v > Decimal::ZERO)
                            .map(|v| Decimal::ONE / *v)
                    })
                    .collect();
                if inv.iter().any(|v| v.is_none()) {
                    warn!("Missing volatility for a selected instrument; using equal weight");
                    None
                } else {
                    Some(inv.into_iter().flatten().collect())
                }
            }
        };

        let mut weights = HashMap::with_capacity(selected.len());
        match inverse_vols {
            None => {
                let w = (budget / count).min(self.config.max_position_pct);
                for id in selected {
                    weights.insert(id.clone(), w);
                }
            }
            Some(inv) => {
                let total: Decimal = inv.iter().sum();
                for (id, iv) in selected.into_iter().zip(inv) {
                    let w = (budget * iv / total).min(self.config.max_position_pct);
                    weights.insert(id.clone(), w);
                }
            }
        }
        weights
    }
}

/// Ranking comparator: by score (descending for longs, ascending for
/// shorts), then prefer the instrument already held (minimizes turnover),
/// then instrument id ascending. Scores are finite by the adapter's
/// contract, so the partial compare never actually falls through.
fn rank(
    a: &Score,
    b: &Score,
    holdings: &BTreeMap<InstrumentId, Holding>,
    descending: bool,
) -> Ordering {
    let primary = if descending {
        b.value.partial_cmp(&a.value)
    } else {
        a.value.partial_cmp(&b.value)
    }
    .unwrap_or(Ordering::Equal);

    primary
        .then_with(|| {
            let a_held = holdings.contains_key(&a.instrument_id);
            let b_held = holdings.contains_key(&b.instrument_id);
            b_held.cmp(&a_held)
        })
        .then_with(|| a.instrument_id.cmp(&b.instrument_id))
}
