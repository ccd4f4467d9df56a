//! GQ control
use super::{ActionValues, ControlLearner, Step};
use crate::envs::Action;
use crate::error::{check_dimension, BuildError};
use crate::features::{expected_features, SparseVector};
use crate::learners::OffPolicyTd;
use crate::policies::{DiscretePolicy, Greedy};
use crate::projectors::StateActionProjector;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use crate::Prng;

/// GQ(λ) used on-policy: the acting policy is also the target policy.
///
/// Equivalent to expected Sarsa with a gradient correction.
#[derive(Debug, Clone, PartialEq)]
pub struct GqOnPolicyControl<S, L, P> {
    expander: S,
    learner: L,
    policy: P,
    actions: ActionValues,
    phi_t: SparseVector,
    phi_bar_tp1: SparseVector,
}

impl<S, L, P> GqOnPolicyControl<S, L, P>
where
    S: StateActionProjector,
    L: OffPolicyTd,
    P: DiscretePolicy,
{
    pub fn new(expander: S, learner: L, policy: P) -> Result<Self, BuildError> {
        check_dimension("learner", expander.dimension(), learner.dimension())?;
        check_dimension("policy actions", expander.num_actions(), policy.num_actions())?;
        Ok(Self {
            actions: ActionValues::new(&expander),
            phi_t: SparseVector::new(expander.dimension()),
            phi_bar_tp1: SparseVector::new(expander.dimension()),
            expander,
            learner,
            policy,
        })
    }

    pub const fn learner(&self) -> &L {
        &self.learner
    }

    pub fn action_values(&mut self, observation: &[f64]) -> &[f64] {
        self.actions
            .evaluate(&self.expander, observation, self.learner.weights())
    }

    fn update_policy(&mut self, observation: &[f64]) {
        let values = self
            .actions
            .evaluate(&self.expander, observation, self.learner.weights());
        self.policy.update_values(values);
    }
}

impl<S, L, P> ControlLearner for GqOnPolicyControl<S, L, P>
where
    S: StateActionProjector,
    L: OffPolicyTd,
    P: DiscretePolicy,
{
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.learner.initialize();
        self.propose_action(observation, rng)
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        self.expander.project_action(
            Some(step.observation),
            step.action.index(),
            &mut self.phi_t,
        );
        let next_action = match step.next_observation() {
            Some(observation) => {
                self.update_policy(observation);
                expected_features(
                    self.policy.distribution(),
                    &self.actions.features,
                    &mut self.phi_bar_tp1,
                );
                Some(self.policy.sample(rng))
            }
            None => {
                self.phi_bar_tp1.clear();
                None
            }
        };
        self.learner
            .update(&self.phi_t, &self.phi_bar_tp1, 1.0, step.reward, 0.0);

        if step.episode_done() {
            None
        } else {
            next_action.map(Action::Discrete)
        }
    }

    fn propose_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.update_policy(observation);
        Action::Discrete(self.policy.sample(rng))
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.action_values(observation);
        self.actions.max_value()
    }

    fn reset(&mut self) {
        self.learner.reset();
    }
}

impl<S, L: Persist, P> Persist for GqOnPolicyControl<S, L, P> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.learner.save_into(checkpoint)
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.learner.load_from(reader)
    }
}

/// Greedy-GQ: off-policy control towards the greedy policy.
///
/// Acts with a behavior policy while learning the action values of the policy that is
/// greedy with respect to those same values.
/// See "Toward off-policy learning control with function approximation"
/// by Maei et al. (2010).
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyGq<S, L, B> {
    expander: S,
    learner: L,
    behavior: B,
    target: Greedy,
    actions: ActionValues,
    phi_t: SparseVector,
    phi_bar_tp1: SparseVector,
}

impl<S, L, B> GreedyGq<S, L, B>
where
    S: StateActionProjector,
    L: OffPolicyTd,
    B: DiscretePolicy,
{
    pub fn new(expander: S, learner: L, behavior: B) -> Result<Self, BuildError> {
        check_dimension("learner", expander.dimension(), learner.dimension())?;
        check_dimension(
            "behavior policy actions",
            expander.num_actions(),
            behavior.num_actions(),
        )?;
        if !behavior.has_full_support() {
            return Err(BuildError::PartialBehaviorSupport);
        }
        Ok(Self {
            target: Greedy::new(expander.num_actions())?,
            actions: ActionValues::new(&expander),
            phi_t: SparseVector::new(expander.dimension()),
            phi_bar_tp1: SparseVector::new(expander.dimension()),
            expander,
            learner,
            behavior,
        })
    }

    pub const fn learner(&self) -> &L {
        &self.learner
    }

    pub fn action_values(&mut self, observation: &[f64]) -> &[f64] {
        self.actions
            .evaluate(&self.expander, observation, self.learner.weights())
    }

    /// Evaluate the actions at `observation` and update both policies.
    fn update_policies(&mut self, observation: &[f64]) {
        let values = self
            .actions
            .evaluate(&self.expander, observation, self.learner.weights());
        self.target.update_values(values);
        self.behavior.update_values(values);
    }
}

impl<S, L, B> ControlLearner for GreedyGq<S, L, B>
where
    S: StateActionProjector,
    L: OffPolicyTd,
    B: DiscretePolicy,
{
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.learner.initialize();
        self.update_policies(observation);
        Action::Discrete(self.behavior.sample(rng))
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        let a_t = step.action.index();
        self.update_policies(step.observation);
        let behavior_probability = self.behavior.probability(a_t);
        assert!(
            behavior_probability > 0.0,
            "behavior policy assigns zero probability to action {}",
            a_t
        );
        let rho = self.target.probability(a_t) / behavior_probability;
        self.phi_t.set(&self.actions.features[a_t]);

        let next_action = match step.next_observation() {
            Some(observation) => {
                self.update_policies(observation);
                expected_features(
                    self.target.distribution(),
                    &self.actions.features,
                    &mut self.phi_bar_tp1,
                );
                Some(self.behavior.sample(rng))
            }
            None => {
                self.phi_bar_tp1.clear();
                None
            }
        };
        self.learner
            .update(&self.phi_t, &self.phi_bar_tp1, rho, step.reward, 0.0);

        if step.episode_done() {
            None
        } else {
            next_action.map(Action::Discrete)
        }
    }

    /// The greedy action.
    fn propose_action(&mut self, observation: &[f64], _: &mut Prng) -> Action {
        self.update_policies(observation);
        Action::Discrete(self.target.best_action())
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.action_values(observation);
        self.actions.max_value()
    }

    fn reset(&mut self) {
        self.learner.reset();
    }
}

impl<S, L: Persist, B> Persist for GreedyGq<S, L, B> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.learner.save_into(checkpoint)
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.learner.load_from(reader)
    }
}
