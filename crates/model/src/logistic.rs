use std::path::Path;

use meridian_ports::SignalModel;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Built-in logistic classifier: sigmoid(w . x + b).
///
/// A serde-loadable stand-in for externally trained artifacts; anything
/// implementing the `SignalModel` port can replace it without touching the
/// rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub version: String,
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, bias: f64, version: impl Into<String>) -> Self {
        Self {
            weights,
            bias,
            version: version.into(),
        }
    }

    /// Load a model artifact from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path.as_ref()).map_err(|e| Error::ArtifactLoad(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| Error::ArtifactLoad(e.to_string()))
    }
}

impl SignalModel for LogisticModel {
    fn predict(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_score_half() {
        let model = LogisticModel::new(vec![0.0; 3], 0.0, "test-0");
        assert_eq!(model.predict(&[1.0, 2.0, 3.0]), 0.5);
    }

    #[test]
    fn positive_logit_scores_above_half() {
        let model = LogisticModel::new(vec![1.0], 0.0, "test-0");
        assert!(model.predict(&[2.0]) > 0.5);
        assert!(model.predict(&[-2.0]) < 0.5);
    }

    #[test]
    fn round_trips_through_json() {
        let model = LogisticModel::new(vec![0.1, -0.2], 0.05, "v3");
        let json = serde_json::to_string(&model).unwrap();
        let loaded: LogisticModel = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.weights, model.weights);
        assert_eq!(loaded.version, "v3");
    }
}
