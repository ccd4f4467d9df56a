//! Dense weight vector
use super::{FeatureVector, SparseVector};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A dense real vector; the storage for learned weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseVector(Array1<f64>);

impl DenseVector {
    /// All-zero vector.
    pub fn zeros(dimension: usize) -> Self {
        Self(Array1::zeros(dimension))
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(Array1::from(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    /// View as an `ndarray` array.
    pub const fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    pub fn set_entry(&mut self, index: usize, value: f64) {
        self.0[index] = value;
    }

    /// Inner product with a sparse vector; cost proportional to `features.nnz()`.
    pub fn dot(&self, features: &SparseVector) -> f64 {
        debug_assert_eq!(self.dimension(), features.dimension());
        features.iter().map(|(i, v)| self.0[i] * v).sum()
    }

    /// In-place `self += factor * features`; cost proportional to `features.nnz()`.
    pub fn add_scaled(&mut self, factor: f64, features: &SparseVector) {
        debug_assert_eq!(self.dimension(), features.dimension());
        for (i, v) in features.iter() {
            self.0[i] += factor * v;
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.0.fill(value);
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Overwrite with the given values.
    ///
    /// # Panics
    /// If the length differs from the dimension.
    pub fn assign(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.dimension(), "dimension mismatch");
        self.0
            .iter_mut()
            .zip(values)
            .for_each(|(w, &v)| *w = v);
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|w| w.is_finite())
    }

    /// Assert that the weights on the support of `features` are finite.
    ///
    /// Weight updates only touch the support of the trace or feature vector they apply,
    /// so checking that support after each update keeps every weight finite.
    ///
    /// # Panics
    /// If any such weight is NaN or infinite. Divergence is unrecoverable.
    pub fn assert_finite_on(&self, features: &SparseVector, owner: &str) {
        for &i in features.indices() {
            let w = self.0[i];
            assert!(
                w.is_finite(),
                "{}: weight {} diverged to {}",
                owner,
                i,
                w
            );
        }
    }
}

impl FeatureVector for DenseVector {
    fn dimension(&self) -> usize {
        Self::dimension(self)
    }

    fn get(&self, index: usize) -> f64 {
        Self::get(self, index)
    }

    fn nnz(&self) -> usize {
        self.0.iter().filter(|&&w| w != 0.0).count()
    }

    fn l1_norm(&self) -> f64 {
        self.0.iter().map(|w| w.abs()).sum()
    }

    fn l2_norm(&self) -> f64 {
        self.0.dot(&self.0).sqrt()
    }
}

impl Index<usize> for DenseVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl From<Vec<f64>> for DenseVector {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_dot_and_update() {
        let mut w = DenseVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let x = SparseVector::from_entries(4, [(1, 1.0), (3, 0.5)]);
        assert_eq!(w.dot(&x), 4.0);
        w.add_scaled(2.0, &x);
        assert_eq!(w.to_vec(), vec![1.0, 4.0, 3.0, 5.0]);
    }

    #[test]
    fn norms() {
        let w = DenseVector::from_vec(vec![3.0, 0.0, -4.0]);
        assert_eq!(w.l1_norm(), 7.0);
        assert_eq!(w.l2_norm(), 5.0);
        assert_eq!(w.nnz(), 2);
    }

    #[test]
    fn assign_overwrites() {
        let mut w = DenseVector::zeros(3);
        w.assign(&[1.0, 2.0, 3.0]);
        assert_eq!(w[2], 3.0);
    }

    #[test]
    #[should_panic(expected = "diverged")]
    fn non_finite_weights_are_fatal() {
        let mut w = DenseVector::zeros(3);
        let x = SparseVector::from_entries(3, [(1, 1.0)]);
        w.add_scaled(f64::INFINITY, &x);
        w.assert_finite_on(&x, "test");
    }

    #[test]
    fn finite_check_only_inspects_support() {
        let mut w = DenseVector::zeros(3);
        w.set_entry(0, f64::NAN);
        let x = SparseVector::from_entries(3, [(2, 1.0)]);
        w.assert_finite_on(&x, "test");
        assert!(!w.is_finite());
    }
}
