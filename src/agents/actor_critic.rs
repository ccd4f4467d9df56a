//! On-policy actor-critic control
use super::{Actor, ControlLearner, Step};
use crate::envs::{Action, Successor};
use crate::error::{check_dimension, check_step_size, BuildError};
use crate::features::SparseVector;
use crate::learners::OnPolicyTd;
use crate::policies::PolicyDistribution;
use crate::projectors::{Projector, StateActionProjector};
use crate::traces::Trace;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use crate::Prng;

/// Actor-critic with a TD critic over state features.
///
/// The critic learns state values from the projector underlying the expander;
/// the actor's policy is defined over the expander's state-action features.
/// Continuous action policies use an expander with a single action slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorCritic<S, C, D, T> {
    expander: S,
    critic: C,
    actor: Actor<D, T>,
    x_t: SparseVector,
    x_tp1: SparseVector,
    phi: Vec<SparseVector>,
}

impl<S, C, D, T> ActorCritic<S, C, D, T>
where
    S: StateActionProjector,
    C: OnPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    pub fn new(expander: S, critic: C, actor: Actor<D, T>) -> Result<Self, BuildError> {
        let state_dimension = expander.projector().dimension();
        check_dimension("critic", state_dimension, critic.dimension())?;
        check_dimension("actor", expander.dimension(), actor.dimension())?;
        Ok(Self {
            x_t: SparseVector::new(state_dimension),
            x_tp1: SparseVector::new(state_dimension),
            phi: expander.action_buffers(),
            expander,
            critic,
            actor,
        })
    }

    pub const fn critic(&self) -> &C {
        &self.critic
    }

    pub const fn actor(&self) -> &Actor<D, T> {
        &self.actor
    }

    /// Update the critic on a transition with the given reward.
    ///
    /// # Returns
    /// The TD error.
    fn update_critic(&mut self, step: &Step, reward: f64) -> f64 {
        let projector = self.expander.projector();
        projector.project_into(Some(step.observation), &mut self.x_t);
        projector.project_into(step.next_observation(), &mut self.x_tp1);
        self.critic.update(&self.x_t, &self.x_tp1, reward)
    }

    /// Update the actor with the critic's TD error and choose the next action.
    fn update_actor(&mut self, step: &Step, delta: f64, rng: &mut Prng) -> Option<Action> {
        self.expander
            .project_actions(Some(step.observation), &mut self.phi);
        self.actor.update(&self.phi, &step.action, delta, 1.0);
        match step.next {
            Successor::Continue(observation) => Some(self.sample_action(observation, rng)),
            _ => None,
        }
    }

    fn update_policy(&mut self, observation: &[f64]) {
        self.expander
            .project_actions(Some(observation), &mut self.phi);
        self.actor.update_policy(&self.phi);
    }

    fn sample_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.update_policy(observation);
        self.actor.sample(rng)
    }

    fn state_value(&mut self, observation: &[f64]) -> f64 {
        self.expander
            .projector()
            .project_into(Some(observation), &mut self.x_t);
        self.critic.predict(&self.x_t)
    }
}

impl<S, C, D, T> ControlLearner for ActorCritic<S, C, D, T>
where
    S: StateActionProjector,
    C: OnPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.critic.initialize();
        self.actor.initialize();
        self.sample_action(observation, rng)
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        let delta = self.update_critic(step, step.reward);
        self.update_actor(step, delta, rng)
    }

    /// The most likely action of the policy.
    fn propose_action(&mut self, observation: &[f64], _: &mut Prng) -> Action {
        self.update_policy(observation);
        self.actor.best_action()
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.state_value(observation)
    }

    fn reset(&mut self) {
        self.critic.reset();
        self.actor.reset();
    }
}

impl<S, C, D, T> Persist for ActorCritic<S, C, D, T>
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

/// Actor-critic for continuing tasks using the differential reward.
///
/// Keeps a running estimate `ρ̄` of the average reward, learns from `r − ρ̄`
/// and moves the estimate by `α_r δ` after each critic update.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageRewardActorCritic<S, C, D, T> {
    inner: ActorCritic<S, C, D, T>,
    alpha_r: f64,
    average_reward: f64,
}

impl<S, C, D, T> AverageRewardActorCritic<S, C, D, T>
where
    S: StateActionProjector,
    C: OnPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    /// Wrap an actor-critic; `alpha_r` is the step size of the average reward estimate.
    pub fn new(inner: ActorCritic<S, C, D, T>, alpha_r: f64) -> Result<Self, BuildError> {
        Ok(Self {
            inner,
            alpha_r: check_step_size("alpha_r", alpha_r)?,
            average_reward: 0.0,
        })
    }

    pub const fn average_reward(&self) -> f64 {
        self.average_reward
    }

    pub const fn inner(&self) -> &ActorCritic<S, C, D, T> {
        &self.inner
    }
}

impl<S, C, D, T> ControlLearner for AverageRewardActorCritic<S, C, D, T>
where
    S: StateActionProjector,
    C: OnPolicyTd,
    D: PolicyDistribution,
    T: Trace,
{
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.inner.initialize(observation, rng)
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        let delta = self
            .inner
            .update_critic(step, step.reward - self.average_reward);
        self.average_reward += self.alpha_r * delta;
        self.inner.update_actor(step, delta, rng)
    }

    fn propose_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.inner.propose_action(observation, rng)
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.inner.compute_value_function(observation)
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.average_reward = 0.0;
    }
}

impl<S, C, D, T> Persist for AverageRewardActorCritic<S, C, D, T>
where
    C: Persist,
    D: PolicyDistribution,
    T: Trace,
{
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.inner.save_into(checkpoint);
        checkpoint.push_scalar(self.average_reward);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.inner.load_from(reader)?;
        self.average_reward = reader.load_scalar()?;
        Ok(())
    }
}
