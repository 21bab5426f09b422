use meridian_core::{InstrumentId, Timestamp};
use serde::{Deserialize, Serialize};

/// Directional score for one instrument at one decision time.
///
/// `value` is a probability-like score in [0, 1]: above 0.5 favors long,
/// below favors short. `model_version` records which artifact produced the
/// score, for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub instrument_id: InstrumentId,
    pub timestamp: Timestamp,
    pub value: f64,
    pub model_version: String,
}
