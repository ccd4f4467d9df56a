//! Off-policy actor-critic
use super::{Actor, ControlLearner, Step};
use crate::envs::{Action, Successor};
use crate::error::{check_dimension, BuildError};
use crate::features::SparseVector;
use crate::learners::OffPolicyTd;
use crate::policies::{DiscretePolicy, PolicyDistribution, RandomPolicy};
use crate::projectors::{Projector, StateActionProjector};
use crate::traces::Trace;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use crate::Prng;

/// Off-PAC: off-policy actor-critic.
///
/// Acts with a fixed behavior policy while a gradient-TD critic evaluates the actor's
/// (target) policy. Both the critic and actor updates are weighted by the importance
/// sampling ratio `π(a|s) / b(a|s)`.
/// See "Off-policy actor-critic" by Degris, White & Sutton (2012).
#[derive(Debug, Clone, PartialEq)]
pub struct OffPac<S, C, D, T> {
    expander: S,
    critic: C,
    actor: Actor<D, T>,
    behavior: RandomPolicy,
    x_t: SparseVector,
    x_tp1: SparseVector,
    phi: Vec<SparseVector>,
}

impl<S, C, D, T> OffPac<S, C, D, T>
where
    S: StateActionProjector,
    C: OffPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    pub fn new(
        expander: S,
        critic: C,
        actor: Actor<D, T>,
        behavior: RandomPolicy,
    ) -> Result<Self, BuildError> {
        let state_dimension = expander.projector().dimension();
        check_dimension("critic", state_dimension, critic.dimension())?;
        check_dimension("actor", expander.dimension(), actor.dimension())?;
        check_dimension(
            "behavior policy actions",
            expander.num_actions(),
            behavior.num_actions(),
        )?;
        if !behavior.has_full_support() {
            return Err(BuildError::PartialBehaviorSupport);
        }
        Ok(Self {
            x_t: SparseVector::new(state_dimension),
            x_tp1: SparseVector::new(state_dimension),
            phi: expander.action_buffers(),
            expander,
            critic,
            actor,
            behavior,
        })
    }

    pub const fn critic(&self) -> &C {
        &self.critic
    }

    pub const fn actor(&self) -> &Actor<D, T> {
        &self.actor
    }

    fn update_target(&mut self, observation: &[f64]) {
        self.expander
            .project_actions(Some(observation), &mut self.phi);
        self.actor.update_policy(&self.phi);
    }
}

impl<S, C, D, T> ControlLearner for OffPac<S, C, D, T>
where
    S: StateActionProjector,
    C: OffPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    fn initialize(&mut self, _: &[f64], rng: &mut Prng) -> Action {
        self.critic.initialize();
        self.actor.initialize();
        Action::Discrete(self.behavior.sample(rng))
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        self.update_target(step.observation);
        let pi_t = self.actor.probability(&step.action);
        let b_t = self.behavior.probability(step.action.index());
        let rho = pi_t / b_t;

        let projector = self.expander.projector();
        projector.project_into(Some(step.observation), &mut self.x_t);
        projector.project_into(step.next_observation(), &mut self.x_tp1);
        let delta = self
            .critic
            .update(&self.x_t, &self.x_tp1, rho, step.reward, 0.0);
        self.actor.update(&self.phi, &step.action, delta, rho);

        match step.next {
            Successor::Continue(_) => Some(Action::Discrete(self.behavior.sample(rng))),
            _ => None,
        }
    }

    /// The most likely action of the target policy.
    fn propose_action(&mut self, observation: &[f64], _: &mut Prng) -> Action {
        self.update_target(observation);
        self.actor.best_action()
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.expander
            .projector()
            .project_into(Some(observation), &mut self.x_t);
        self.critic.predict(&self.x_t)
    }

    fn reset(&mut self) {
        self.critic.reset();
        self.actor.reset();
    }
}

impl<S, C, D, T> Persist for OffPac<S, C, D, T>
where
    C: Persist,
    D: PolicyDistribution,
    T: Trace,
{
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.critic.save_into(checkpoint);
        self.actor.save_into(checkpoint);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.critic.load_from(reader)?;
        self.actor.load_from(reader)
    }
}
