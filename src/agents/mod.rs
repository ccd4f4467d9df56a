//! Control learners: agents that act in an environment and learn from the outcome.
//!
//! Every control learner combines a projector of observations into features,
//! one or more [TD learners](crate::learners) and an action selection policy.
mod actor;
mod actor_critic;
mod gq;
mod offpac;
mod sarsa;

pub use actor::{Actor, ActorConfig};
pub use actor_critic::{ActorCritic, AverageRewardActorCritic};
pub use gq::{GqOnPolicyControl, GreedyGq};
pub use offpac::OffPac;
pub use sarsa::{ExpectedSarsaControl, SarsaControl};

use crate::envs::{Action, Successor};
use crate::features::{DenseVector, SparseVector};
use crate::projectors::StateActionProjector;
use crate::utils::save::Persist;
use crate::Prng;

/// Description of an environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<'a> {
    /// The initial observation.
    pub observation: &'a [f64],
    /// The action taken from the initial observation.
    pub action: Action,
    /// The resulting reward.
    pub reward: f64,
    /// The resulting successor state.
    pub next: Successor<&'a [f64]>,
}

impl<'a> Step<'a> {
    /// The observation to bootstrap from; `None` if the successor is terminal.
    ///
    /// An interrupted episode still bootstraps from its last observation.
    pub fn next_observation(&self) -> Option<&'a [f64]> {
        match self.next {
            Successor::Continue(o) | Successor::Interrupt(o) => Some(o),
            Successor::Terminate => None,
        }
    }

    pub fn episode_done(&self) -> bool {
        !matches!(self.next, Successor::Continue(_))
    }
}

/// A learning agent for control.
///
/// Must be driven sequentially: [`initialize`](ControlLearner::initialize) at the start of
/// each episode followed by one [`step`](ControlLearner::step) per transition, each taking
/// the action returned by the previous call.
pub trait ControlLearner: Persist {
    /// Start an episode at `observation` and choose the first action.
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action;

    /// Learn from a transition and choose the next action.
    ///
    /// # Returns
    /// The action to take from the successor observation; `None` if the episode is done.
    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action>;

    /// The action this learner would take at `observation` without learning.
    ///
    /// Value-based learners act with their behavior policy (or greedily for off-policy
    /// control); actor-critics take the most likely action of their policy.
    fn propose_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action;

    /// Estimated value of an observation.
    fn compute_value_function(&mut self, observation: &[f64]) -> f64;

    /// Forget everything learned: zero all weights and clear traces.
    fn reset(&mut self);
}

impl<T: ControlLearner + ?Sized> ControlLearner for Box<T> {
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        T::initialize(self, observation, rng)
    }
    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        T::step(self, step, rng)
    }
    fn propose_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        T::propose_action(self, observation, rng)
    }
    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        T::compute_value_function(self, observation)
    }
    fn reset(&mut self) {
        T::reset(self)
    }
}

/// The features and values of every action in one state.
#[derive(Debug, Clone, PartialEq)]
struct ActionValues {
    features: Vec<SparseVector>,
    values: Vec<f64>,
}

impl ActionValues {
    fn new<S: StateActionProjector>(expander: &S) -> Self {
        Self {
            features: expander.action_buffers(),
            values: vec![0.0; expander.num_actions()],
        }
    }

    /// Project every action at `observation` and evaluate each with `weights`.
    fn evaluate<S: StateActionProjector>(
        &mut self,
        expander: &S,
        observation: &[f64],
        weights: &DenseVector,
    ) -> &[f64] {
        expander.project_actions(Some(observation), &mut self.features);
        for (value, phi) in self.values.iter_mut().zip(&self.features) {
            *value = weights.dot(phi);
        }
        &self.values
    }

    /// Largest action value of the last evaluation.
    fn max_value(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_next_observation() {
        let obs = [1.0, 2.0];
        let next = [3.0];
        let mut step = Step {
            observation: &obs,
            action: Action::Discrete(0),
            reward: -1.0,
            next: Successor::Continue(&next),
        };
        assert_eq!(step.next_observation(), Some(&next[..]));
        assert!(!step.episode_done());

        step.next = Successor::Interrupt(&next);
        assert_eq!(step.next_observation(), Some(&next[..]));
        assert!(step.episode_done());

        step.next = Successor::Terminate;
        assert_eq!(step.next_observation(), None);
        assert!(step.episode_done());
    }
}
