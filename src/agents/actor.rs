//! Policy-gradient actor
use crate::envs::Action;
use crate::error::{check_dimension, check_step_size, check_unit_interval, BuildError};
use crate::features::SparseVector;
use crate::policies::PolicyDistribution;
use crate::traces::{Trace, Traces};
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use crate::Prng;
use serde::{Deserialize, Serialize};

/// Configuration of an [`Actor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Step size of the policy parameters
    pub alpha_u: f64,
    /// Discount factor
    pub gamma: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            alpha_u: 0.01,
            gamma: 0.99,
            lambda: 0.3,
        }
    }
}

impl ActorConfig {
    /// Build an actor for `policy` with one trace per policy parameter group.
    pub fn build<D, T>(&self, policy: D, mut traces: Traces<T>) -> Result<Actor<D, T>, BuildError>
    where
        D: PolicyDistribution,
        T: Trace,
    {
        let groups = policy.parameters();
        if traces.len() != groups.len() {
            return Err(BuildError::TraceCount {
                expected: groups.len(),
                found: traces.len(),
            });
        }
        for (trace, u) in traces.iter().zip(groups) {
            check_dimension("actor trace", u.dimension(), trace.dimension())?;
        }
        traces.clear();
        let grads = groups
            .iter()
            .map(|u| SparseVector::new(u.dimension()))
            .collect();
        Ok(Actor {
            alpha_u: check_step_size("alpha_u", self.alpha_u)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            policy,
            traces,
            grads,
        })
    }
}

/// Actor(λ): follows the policy gradient estimated with a critic's TD error.
///
/// Each parameter group `u` has its own trace of score-function gradients
/// `e ← ρ(γλe + ∇ log π(a|s))` and moves by `α_u δ e`.
/// On-policy actors use `ρ = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor<D, T> {
    alpha_u: f64,
    gamma: f64,
    lambda: f64,
    policy: D,
    traces: Traces<T>,
    grads: Vec<SparseVector>,
}

impl<D: PolicyDistribution, T: Trace> Actor<D, T> {
    pub const fn policy(&self) -> &D {
        &self.policy
    }

    /// Dimension of the action features expected by the policy.
    pub fn dimension(&self) -> usize {
        self.policy.parameters()[0].dimension()
    }

    /// Start a new episode.
    pub fn initialize(&mut self) {
        self.traces.clear();
    }

    /// Set the policy distribution to the state with action features `features`.
    pub fn update_policy(&mut self, features: &[SparseVector]) {
        self.policy.update(features);
    }

    pub fn sample(&self, rng: &mut Prng) -> Action {
        self.policy.sample(rng)
    }

    pub fn best_action(&self) -> Action {
        self.policy.best_action()
    }

    pub fn probability(&self, action: &Action) -> f64 {
        self.policy.probability(action)
    }

    /// Policy gradient step for `action` taken in the state with features `features`.
    ///
    /// * `delta` - The critic's TD error for the transition.
    /// * `rho` - Importance sampling ratio of `action`.
    pub fn update(&mut self, features: &[SparseVector], action: &Action, delta: f64, rho: f64) {
        self.policy.update(features);
        self.policy.grad_log(features, action, &mut self.grads);
        self.traces.update(self.gamma * self.lambda, &self.grads);
        if rho != 1.0 {
            self.traces.decay(rho);
        }
        for (u, e) in self
            .policy
            .parameters_mut()
            .iter_mut()
            .zip(self.traces.iter())
        {
            u.add_scaled(self.alpha_u * delta, e.vect());
            u.assert_finite_on(e.vect(), "Actor");
        }
    }

    /// Zero all policy parameters and clear traces.
    pub fn reset(&mut self) {
        for u in self.policy.parameters_mut() {
            u.fill(0.0);
        }
        self.traces.clear();
    }
}

impl<D: PolicyDistribution, T: Trace> Persist for Actor<D, T> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        for u in self.policy.parameters() {
            checkpoint.push_vector(u);
        }
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        for u in self.policy.parameters_mut() {
            reader.load_vector(u)?;
        }
        self.traces.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{BoltzmannDistribution, NormalConfig};
    use crate::traces::AccumulatingTrace;

    fn action_features() -> Vec<SparseVector> {
        (0..2)
            .map(|a| SparseVector::from_entries(4, [(2 * a, 1.0), (2 * a + 1, 1.0)]))
            .collect()
    }

    fn boltzmann_actor(lambda: f64) -> Actor<BoltzmannDistribution, AccumulatingTrace> {
        ActorConfig {
            alpha_u: 0.5,
            gamma: 1.0,
            lambda,
        }
        .build(
            BoltzmannDistribution::new(4, 2).unwrap(),
            Traces::new(vec![AccumulatingTrace::new(4)]),
        )
        .unwrap()
    }

    #[test]
    fn positive_error_reinforces_action() {
        let features = action_features();
        let mut actor = boltzmann_actor(0.0);
        actor.update(&features, &Action::Discrete(1), 1.0, 1.0);
        actor.update_policy(&features);
        assert!(actor.probability(&Action::Discrete(1)) > 0.5);
        assert_eq!(actor.best_action(), Action::Discrete(1));
    }

    #[test]
    fn ratio_scales_the_step() {
        let features = action_features();
        let mut on = boltzmann_actor(0.0);
        let mut off = boltzmann_actor(0.0);
        on.update(&features, &Action::Discrete(0), 1.0, 1.0);
        off.update(&features, &Action::Discrete(0), 1.0, 2.0);
        for i in 0..4 {
            let a = on.policy().parameters()[0].get(i);
            let b = off.policy().parameters()[0].get(i);
            assert!((2.0 * a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn trace_count_must_match_parameter_groups() {
        let result = ActorConfig::default().build(
            NormalConfig::default().build(4).unwrap(),
            Traces::new(vec![AccumulatingTrace::new(4)]),
        );
        assert_eq!(
            result.unwrap_err(),
            BuildError::TraceCount {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn trace_dimension_must_match() {
        let result = ActorConfig::default().build(
            BoltzmannDistribution::new(4, 2).unwrap(),
            Traces::new(vec![AccumulatingTrace::new(5)]),
        );
        assert!(matches!(
            result,
            Err(BuildError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn checkpoint_restores_parameters() {
        let features = action_features();
        let mut actor = boltzmann_actor(0.5);
        actor.update(&features, &Action::Discrete(1), 0.7, 1.0);
        let mut restored = boltzmann_actor(0.5);
        restored.restore(actor.checkpoint()).unwrap();
        assert_eq!(restored.policy().parameters(), actor.policy().parameters());
    }
}
