//! Action selection policies.
//!
//! [`DiscretePolicy`] selects among a finite set of actions from action-value estimates
//! (or ignores them, for fixed policies).
//! [`PolicyDistribution`] is a parametric distribution trained by an actor.
mod boltzmann;
mod greedy;
mod normal;
mod random;
mod softmax;

pub use boltzmann::BoltzmannDistribution;
pub use greedy::{EpsilonGreedy, Greedy};
pub use normal::{NormalConfig, NormalDistribution};
pub use random::RandomPolicy;
pub use softmax::SoftMax;

use crate::envs::Action;
use crate::error::BuildError;
use crate::features::{DenseVector, SparseVector};
use crate::Prng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

/// A policy over a finite action set driven by action values.
pub trait DiscretePolicy {
    fn num_actions(&self) -> usize;

    /// Recompute the action distribution from the values of each action in the current state.
    fn update_values(&mut self, values: &[f64]);

    /// Probability of each action.
    fn distribution(&self) -> &[f64];

    fn probability(&self, action: usize) -> f64 {
        self.distribution()[action]
    }

    /// Sample an action from the current distribution.
    fn sample(&self, rng: &mut Prng) -> usize {
        sample_index(self.distribution(), rng)
    }

    /// The most probable action. Ties go to the lowest index.
    fn best_action(&self) -> usize {
        argmax(self.distribution())
    }

    /// Whether every action has positive probability whatever the action values.
    ///
    /// Defaults to checking the current distribution, which is exact for fixed policies.
    fn has_full_support(&self) -> bool {
        self.distribution().iter().all(|&p| p > 0.0)
    }
}

impl<P: DiscretePolicy + ?Sized> DiscretePolicy for Box<P> {
    fn num_actions(&self) -> usize {
        P::num_actions(self)
    }
    fn update_values(&mut self, values: &[f64]) {
        P::update_values(self, values)
    }
    fn distribution(&self) -> &[f64] {
        P::distribution(self)
    }
    fn probability(&self, action: usize) -> f64 {
        P::probability(self, action)
    }
    fn sample(&self, rng: &mut Prng) -> usize {
        P::sample(self, rng)
    }
    fn best_action(&self) -> usize {
        P::best_action(self)
    }
    fn has_full_support(&self) -> bool {
        P::has_full_support(self)
    }
}

/// Configuration of a value-driven discrete policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValuePolicyConfig {
    Greedy,
    EpsilonGreedy { epsilon: f64 },
    SoftMax { temperature: f64 },
}

impl Default for ValuePolicyConfig {
    fn default() -> Self {
        Self::EpsilonGreedy { epsilon: 0.01 }
    }
}

impl ValuePolicyConfig {
    pub fn build(&self, num_actions: usize) -> Result<Box<dyn DiscretePolicy>, BuildError> {
        let policy: Box<dyn DiscretePolicy> = match *self {
            Self::Greedy => Box::new(Greedy::new(num_actions)?),
            Self::EpsilonGreedy { epsilon } => Box::new(EpsilonGreedy::new(num_actions, epsilon)?),
            Self::SoftMax { temperature } => Box::new(SoftMax::new(num_actions, temperature)?),
        };
        Ok(policy)
    }
}

/// A parametric action distribution conditioned on features.
///
/// Parameters are split into groups (e.g. mean and standard deviation),
/// each a weight vector over the feature space. An actor keeps one trace per group.
pub trait PolicyDistribution {
    /// Compute the action distribution for a state.
    ///
    /// `features[a]` are the features of action `a`; continuous distributions take a single
    /// vector of state features.
    fn update(&mut self, features: &[SparseVector]);

    /// Probability (or density) of an action under the current distribution.
    fn probability(&self, action: &Action) -> f64;

    /// Sample an action from the current distribution.
    fn sample(&self, rng: &mut Prng) -> Action;

    /// The most likely action.
    fn best_action(&self) -> Action;

    /// Gradient of `log π(action)` with respect to each parameter group.
    ///
    /// Must follow an [`update`](PolicyDistribution::update) with the same features.
    /// `grads[g]` is overwritten with the gradient for group `g`.
    fn grad_log(&self, features: &[SparseVector], action: &Action, grads: &mut [SparseVector]);

    fn parameters(&self) -> &[DenseVector];

    fn parameters_mut(&mut self) -> &mut [DenseVector];
}

impl<P: PolicyDistribution + ?Sized> PolicyDistribution for Box<P> {
    fn update(&mut self, features: &[SparseVector]) {
        P::update(self, features)
    }
    fn probability(&self, action: &Action) -> f64 {
        P::probability(self, action)
    }
    fn sample(&self, rng: &mut Prng) -> Action {
        P::sample(self, rng)
    }
    fn best_action(&self) -> Action {
        P::best_action(self)
    }
    fn grad_log(&self, features: &[SparseVector], action: &Action, grads: &mut [SparseVector]) {
        P::grad_log(self, features, action, grads)
    }
    fn parameters(&self) -> &[DenseVector] {
        P::parameters(self)
    }
    fn parameters_mut(&mut self) -> &mut [DenseVector] {
        P::parameters_mut(self)
    }
}

/// Index of the largest value. Ties go to the lowest index.
///
/// # Panics
/// If `values` is empty.
pub fn argmax(values: &[f64]) -> usize {
    assert!(!values.is_empty(), "argmax of an empty slice");
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Categorical sampler over action probabilities.
///
/// # Errors
/// If `distribution` is empty, has a negative or non-finite entry, or sums to zero.
fn weighted_index(distribution: &[f64]) -> Result<WeightedIndex<f64>, BuildError> {
    WeightedIndex::new(distribution).map_err(|_| BuildError::InvalidDistribution)
}

/// Sample an index from a probability vector.
///
/// # Panics
/// If `distribution` is not a valid set of weights. Distributions computed from finite action
/// values always are, so this only happens once the values have diverged.
fn sample_index(distribution: &[f64], rng: &mut Prng) -> usize {
    match weighted_index(distribution) {
        Ok(sampler) => sampler.sample(rng),
        Err(err) => panic!("{}: {:?}", err, distribution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn argmax_prefers_lowest_index() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
        assert_eq!(argmax(&[-1.0]), 0);
    }

    #[test]
    fn sample_index_follows_distribution() {
        let mut rng = Prng::seed_from_u64(0);
        let mut counts = [0; 3];
        for _ in 0..10_000 {
            counts[sample_index(&[0.2, 0.0, 0.8], &mut rng)] += 1;
        }
        assert_eq!(counts[1], 0);
        assert!((1700..2300).contains(&counts[0]), "{:?}", counts);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::all_zero(&[0.0, 0.0])]
    #[case::negative(&[1.5, -0.5])]
    #[case::nan(&[f64::NAN, 1.0])]
    fn weighted_index_rejects_invalid_weights(#[case] distribution: &[f64]) {
        assert_eq!(
            weighted_index(distribution).unwrap_err(),
            BuildError::InvalidDistribution
        );
    }

    #[test]
    #[should_panic(expected = "action probabilities")]
    fn sample_index_panics_on_diverged_distribution() {
        let mut rng = Prng::seed_from_u64(0);
        sample_index(&[f64::NAN, f64::NAN], &mut rng);
    }

    #[test]
    fn config_builds_each_policy() {
        for config in [
            ValuePolicyConfig::Greedy,
            ValuePolicyConfig::EpsilonGreedy { epsilon: 0.1 },
            ValuePolicyConfig::SoftMax { temperature: 1.0 },
        ] {
            let mut policy = config.build(3).unwrap();
            policy.update_values(&[0.0, 2.0, 1.0]);
            assert_eq!(policy.best_action(), 1);
            let total: f64 = policy.distribution().iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_epsilon() {
        assert!(ValuePolicyConfig::EpsilonGreedy { epsilon: 1.5 }
            .build(3)
            .is_err());
    }
}
