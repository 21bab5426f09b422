use serde::{Deserialize, Serialize};

/// Ordered list of feature names: the contract between the builder and any
/// trained model. Position in this list is position in the vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

/// The standard schema, in vector order
pub const STANDARD_FEATURES: [&str; 13] = [
    "sma_5",
    "sma_20",
    "rsi_14",
    "bb_upper",
    "bb_lower",
    "return_1",
    "return_2",
    "return_5",
    "atr_14",
    "mom_1",
    "tod_sin",
    "tod_cos",
    "vwap_gap",
];

impl FeatureSchema {
    /// The standard 13-feature technical-indicator schema
    pub fn standard() -> Self {
        Self {
            names: STANDARD_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Number of features in the vector
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Feature name at a vector index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}
