use std::sync::Arc;

use log::debug;
use meridian_features::FeatureVector;
use meridian_ports::SignalModel;

use crate::error::{Error, Result};
use crate::score::Score;

/// Adapter from the `SignalModel` port to cycle-level scoring.
///
/// Validates vector width against the model's training schema (a mismatch
/// is fatal, never coerced), clamps raw output into [0, 1], and stamps each
/// score with the model version for audit.
pub struct ModelAdapter {
    model: Arc<dyn SignalModel>,
}

impl ModelAdapter {
    pub fn new(model: Arc<dyn SignalModel>) -> Self {
        Self { model }
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// Score a single feature vector
    pub fn score_one(&self, features: &FeatureVector) -> Result<Score> {
        if features.width() != self.model.input_width() {
            return Err(Error::InputShapeMismatch {
                expected: self.model.input_width(),
                actual: features.width(),
            });
        }

        let raw = self.model.predict(&features.values);
        if !raw.is_finite() {
            return Err(Error::NonFiniteScore {
                instrument_id: features.instrument_id.to_string(),
            });
        }

        let value = raw.clamp(0.0, 1.0);
        debug!(
            "Scored {} at {}: {:.4} (model {})",
            features.instrument_id,
            features.timestamp,
            value,
            self.model.version()
        );

        Ok(Score {
            instrument_id: features.instrument_id.clone(),
            timestamp: features.timestamp,
            value,
            model_version: self.model.version().to_string(),
        })
    }

    /// Score a whole cycle's feature vectors.
    ///
    /// Each vector is scored in isolation, so batch order cannot influence
    /// any individual score. A shape mismatch fails the batch: if one
    /// vector disagrees with the schema, the schema itself is suspect.
    pub fn score_all(&self, vectors: &[FeatureVector]) -> Result<Vec<Score>> {
        vectors.iter().map(|v| self.score_one(v)).collect()
    }
}
