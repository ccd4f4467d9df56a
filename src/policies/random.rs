//! Fixed random policy
use super::{weighted_index, DiscretePolicy};
use crate::error::BuildError;
use crate::Prng;
use rand::distributions::{Distribution, WeightedIndex};

/// A fixed action distribution that ignores action values.
///
/// Used as a behavior policy for off-policy learning.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    distribution: Vec<f64>,
    sampler: WeightedIndex<f64>,
}

impl RandomPolicy {
    /// Uniform distribution over `num_actions` actions.
    pub fn uniform(num_actions: usize) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        Self::new(vec![1.0 / num_actions as f64; num_actions])
    }

    /// Explicit action probabilities.
    ///
    /// # Errors
    /// If `distribution` is empty, has negative entries or does not sum to 1.
    pub fn new(distribution: Vec<f64>) -> Result<Self, BuildError> {
        if distribution.is_empty() {
            return Err(BuildError::EmptyActionSet);
        }
        let total: f64 = distribution.iter().sum();
        if distribution.iter().any(|&p| p.is_nan() || p < 0.0) || (total - 1.0).abs() > 1e-9 {
            return Err(BuildError::InvalidDistribution);
        }
        let sampler = weighted_index(&distribution)?;
        Ok(Self {
            distribution,
            sampler,
        })
    }
}

impl PartialEq for RandomPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.distribution == other.distribution
    }
}

impl DiscretePolicy for RandomPolicy {
    fn num_actions(&self) -> usize {
        self.distribution.len()
    }

    fn update_values(&mut self, _values: &[f64]) {}

    fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    fn sample(&self, rng: &mut Prng) -> usize {
        self.sampler.sample(rng)
    }
}
