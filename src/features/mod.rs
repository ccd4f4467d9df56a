//! Feature vectors
//!
//! Feature vectors have a dimension fixed at construction.
//! Unset indices implicitly have the value 0.
mod dense;
mod sparse;

pub use dense::DenseVector;
pub use sparse::SparseVector;

/// A fixed-dimension real vector indexed by feature.
pub trait FeatureVector {
    /// Number of features; fixed at construction.
    fn dimension(&self) -> usize;

    /// The value of a feature. Unset features are 0.
    fn get(&self, index: usize) -> f64;

    /// Number of stored (possibly non-zero) entries.
    fn nnz(&self) -> usize;

    /// Sum of absolute values.
    fn l1_norm(&self) -> f64;

    /// Euclidean norm.
    fn l2_norm(&self) -> f64;

    /// Whether no feature is active.
    ///
    /// An empty state feature vector marks a terminal state.
    fn is_empty(&self) -> bool {
        self.nnz() == 0
    }
}

/// Weighted sum of feature vectors, written into `out`.
///
/// Used to form the expected next state-action features under a policy distribution.
/// Weights of exactly 0 are skipped.
pub fn expected_features(weights: &[f64], features: &[SparseVector], out: &mut SparseVector) {
    assert_eq!(weights.len(), features.len());
    out.clear();
    for (&w, phi) in weights.iter().zip(features) {
        if w != 0.0 {
            out.add_scaled(w, phi);
        }
    }
}
