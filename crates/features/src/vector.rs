use meridian_core::{InstrumentId, Timestamp};
use serde::{Deserialize, Serialize};

/// Fixed-width feature vector for one instrument at one decision time.
///
/// Purely derived: recomputed fresh each cycle and discarded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub instrument_id: InstrumentId,
    /// Decision timestamp; every contributing bar is strictly before this
    pub timestamp: Timestamp,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn width(&self) -> usize {
        self.values.len()
    }
}
