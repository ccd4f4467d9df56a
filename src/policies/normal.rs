//! Gaussian action distribution
use super::PolicyDistribution;
use crate::envs::Action;
use crate::error::BuildError;
use crate::features::{DenseVector, SparseVector};
use crate::Prng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Smallest standard deviation; keeps the density and gradients finite.
const MIN_STDDEV: f64 = 1e-10;

/// Configuration of a [`NormalDistribution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalConfig {
    /// Mean when all parameters are zero.
    pub initial_mean: f64,
    /// Standard deviation when all parameters are zero.
    pub initial_stddev: f64,
    /// Multiply the mean gradient by the variance.
    ///
    /// Keeps the mean step size independent of the current standard deviation.
    pub scaled: bool,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            initial_mean: 0.0,
            initial_stddev: 1.0,
            scaled: true,
        }
    }
}

impl NormalConfig {
    /// Build a distribution over state features of the given dimension.
    pub fn build(&self, dimension: usize) -> Result<NormalDistribution, BuildError> {
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        if !(self.initial_stddev.is_finite() && self.initial_stddev > 0.0) {
            return Err(BuildError::InvalidStepSize {
                name: "initial_stddev",
                value: self.initial_stddev,
            });
        }
        Ok(NormalDistribution {
            config: *self,
            parameters: [DenseVector::zeros(dimension), DenseVector::zeros(dimension)],
            mean: self.initial_mean,
            stddev: self.initial_stddev,
        })
    }
}

/// Continuous action distribution `N(μ(s), σ(s)²)`.
///
/// `μ(s) = μ₀ + u_μ · x(s)` and `σ(s) = σ₀ exp(u_σ · x(s))`.
/// Two parameter groups: `[u_μ, u_σ]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalDistribution {
    config: NormalConfig,
    parameters: [DenseVector; 2],
    mean: f64,
    stddev: f64,
}

impl NormalDistribution {
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    pub const fn stddev(&self) -> f64 {
        self.stddev
    }
}

impl PolicyDistribution for NormalDistribution {
    fn update(&mut self, features: &[SparseVector]) {
        assert_eq!(features.len(), 1, "expected a single state feature vector");
        let x = &features[0];
        self.mean = self.config.initial_mean + self.parameters[0].dot(x);
        self.stddev =
            (self.config.initial_stddev * self.parameters[1].dot(x).exp()).max(MIN_STDDEV);
    }

    fn probability(&self, action: &Action) -> f64 {
        let z = (action.value() - self.mean) / self.stddev;
        (-0.5 * z * z).exp() / (self.stddev * (2.0 * PI).sqrt())
    }

    fn sample(&self, rng: &mut Prng) -> Action {
        let z: f64 = rng.sample(StandardNormal);
        Action::Continuous(self.mean + self.stddev * z)
    }

    fn best_action(&self) -> Action {
        Action::Continuous(self.mean)
    }

    fn grad_log(&self, features: &[SparseVector], action: &Action, grads: &mut [SparseVector]) {
        let x = &features[0];
        let diff = action.value() - self.mean;
        let variance = self.stddev * self.stddev;
        let mean_step = if self.config.scaled {
            diff
        } else {
            diff / variance
        };
        let stddev_step = diff * diff / variance - 1.0;

        grads[0].set(x);
        grads[0].scale(mean_step);
        grads[1].set(x);
        grads[1].scale(stddev_step);
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
    use rand::SeedableRng;
    use rstest::rstest;

    fn state() -> Vec<SparseVector> {
        vec![SparseVector::from_entries(4, [(0, 1.0), (3, 1.0)])]
    }

    #[test]
    fn initial_distribution() {
        let mut policy = NormalConfig::default().build(4).unwrap();
        policy.update(&state());
        assert_eq!(policy.mean(), 0.0);
        assert_eq!(policy.stddev(), 1.0);
        let density = policy.probability(&Action::Continuous(0.0));
        assert!((density - 1.0 / (2.0 * PI).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn parameters_shift_mean_and_scale() {
        let mut policy = NormalConfig::default().build(4).unwrap();
        policy.parameters_mut()[0].set_entry(0, 0.25);
        policy.parameters_mut()[1].set_entry(3, 2f64.ln());
        policy.update(&state());
        assert_eq!(policy.mean(), 0.25);
        assert!((policy.stddev() - 2.0).abs() < 1e-12);
        assert_eq!(policy.best_action(), Action::Continuous(0.25));
    }

    #[test]
    fn samples_center_on_mean() {
        let mut policy = NormalConfig {
            initial_mean: 3.0,
            initial_stddev: 0.5,
            scaled: false,
        }
        .build(4)
        .unwrap();
        policy.update(&state());
        let mut rng = Prng::seed_from_u64(0);
        let n = 10_000;
        let mean = (0..n)
            .map(|_| policy.sample(&mut rng).value())
            .sum::<f64>()
            / n as f64;
        assert!((mean - 3.0).abs() < 0.05);
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn grad_log_matches_finite_difference(#[case] scaled: bool) {
        let features = state();
        let mut policy = NormalConfig {
            scaled,
            ..NormalConfig::default()
        }
        .build(4)
        .unwrap();
        policy.parameters_mut()[0].set_entry(0, 0.3);
        policy.parameters_mut()[1].set_entry(0, -0.2);
        policy.update(&features);
        let action = Action::Continuous(1.1);
        let mut grads = vec![SparseVector::new(4), SparseVector::new(4)];
        policy.grad_log(&features, &action, &mut grads);

        let log_p = policy.probability(&action).ln();
        let eps = 1e-7;
        let mut shifted = policy.clone();
        shifted.parameters_mut()[1].set_entry(3, eps);
        shifted.update(&features);
        let numeric = (shifted.probability(&action).ln() - log_p) / eps;
        assert!((numeric - grads[1].get(3)).abs() < 1e-4);

        let mut shifted = policy.clone();
        shifted.parameters_mut()[0].set_entry(3, eps);
        shifted.update(&features);
        let numeric = (shifted.probability(&action).ln() - log_p) / eps;
        let expected = if scaled {
            numeric * policy.stddev() * policy.stddev()
        } else {
            numeric
        };
        assert!((expected - grads[0].get(3)).abs() < 1e-4);
    }
}
