//! Boltzmann (Gibbs) action distribution
use super::softmax::softmax_into;
use super::{argmax, sample_index, PolicyDistribution};
use crate::envs::Action;
use crate::error::BuildError;
use crate::features::{DenseVector, SparseVector};
use crate::Prng;

/// Discrete distribution with `π(a|s) ∝ exp(u · φ(s, a))`.
///
/// A single parameter group `u` over state-action features.
#[derive(Debug, Clone, PartialEq)]
pub struct BoltzmannDistribution {
    parameters: [DenseVector; 1],
    preferences: Vec<f64>,
    distribution: Vec<f64>,
}

impl BoltzmannDistribution {
    /// Uniform initial distribution over `num_actions` with state-action features of `dimension`.
    pub fn new(dimension: usize, num_actions: usize) -> Result<Self, BuildError> {
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        Ok(Self {
            parameters: [DenseVector::zeros(dimension)],
            preferences: vec![0.0; num_actions],
            distribution: vec![1.0 / num_actions as f64; num_actions],
        })
    }

    pub fn num_actions(&self) -> usize {
        self.distribution.len()
    }

    /// Probability of each action under the last update.
    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }
}

impl PolicyDistribution for BoltzmannDistribution {
    fn update(&mut self, features: &[SparseVector]) {
        assert_eq!(features.len(), self.num_actions(), "one feature vector per action");
        let u = &self.parameters[0];
        for (preference, phi) in self.preferences.iter_mut().zip(features) {
            *preference = u.dot(phi);
        }
        softmax_into(&self.preferences, 1.0, &mut self.distribution);
    }

    fn probability(&self, action: &Action) -> f64 {
        self.distribution[action.index()]
    }

    fn sample(&self, rng: &mut Prng) -> Action {
        Action::Discrete(sample_index(&self.distribution, rng))
    }

    fn best_action(&self) -> Action {
        Action::Discrete(argmax(&self.distribution))
    }

    /// `φ(s, a) − Σ_b π(b|s) φ(s, b)`
    fn grad_log(&self, features: &[SparseVector], action: &Action, grads: &mut [SparseVector]) {
        let grad = &mut grads[0];
        grad.set(&features[action.index()]);
        for (phi, &p) in features.iter().zip(&self.distribution) {
            grad.add_scaled(-p, phi);
        }
    }

    fn parameters(&self) -> &[DenseVector] {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut [DenseVector] {
        &mut self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_features() -> Vec<SparseVector> {
        (0..3)
            .map(|a| SparseVector::from_entries(6, [(2 * a, 1.0), (2 * a + 1, 1.0)]))
            .collect()
    }

    #[test]
    fn initially_uniform() {
        let mut policy = BoltzmannDistribution::new(6, 3).unwrap();
        policy.update(&action_features());
        for a in 0..3 {
            assert!((policy.probability(&Action::Discrete(a)) - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn preferences_follow_parameters() {
        let mut policy = BoltzmannDistribution::new(6, 3).unwrap();
        policy.parameters_mut()[0].set_entry(4, 2.0);
        policy.update(&action_features());
        assert_eq!(policy.best_action(), Action::Discrete(2));
        let total: f64 = policy.distribution().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grad_log_matches_finite_difference() {
        let features = action_features();
        let mut policy = BoltzmannDistribution::new(6, 3).unwrap();
        policy.parameters_mut()[0].assign(&[0.1, -0.2, 0.3, 0.0, 0.5, -0.1]);
        policy.update(&features);
        let action = Action::Discrete(1);
        let mut grads = vec![SparseVector::new(6)];
        policy.grad_log(&features, &action, &mut grads);

        let log_p = policy.probability(&action).ln();
        let eps = 1e-6;
        for i in 0..6 {
            let mut shifted = policy.clone();
            let w = shifted.parameters()[0].get(i);
            shifted.parameters_mut()[0].set_entry(i, w + eps);
            shifted.update(&features);
            let numeric = (shifted.probability(&action).ln() - log_p) / eps;
            assert!((numeric - grads[0].get(i)).abs() < 1e-4, "feature {}", i);
        }
    }
}
