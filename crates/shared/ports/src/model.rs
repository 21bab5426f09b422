/// Port for the pre-trained classifier.
///
/// A single-method capability: any model family (tree ensemble, linear,
/// neural) satisfies it. Inference must be stateless and thread-safe;
/// scoring one instrument must never depend on what else was scored in the
/// same cycle.
pub trait SignalModel: Send + Sync {
    /// Map a feature vector to a raw directional score.
    ///
    /// The caller guarantees `features.len() == self.input_width()`.
    fn predict(&self, features: &[f64]) -> f64;

    /// Feature-vector width this model was trained against
    fn input_width(&self) -> usize;

    /// Model artifact version, recorded on every score for audit
    fn version(&self) -> &str;
}
