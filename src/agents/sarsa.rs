//! Sarsa control
use super::{ActionValues, ControlLearner, Step};
use crate::envs::Action;
use crate::error::{check_dimension, BuildError};
use crate::features::{expected_features, SparseVector};
use crate::learners::OnPolicyTd;
use crate::policies::DiscretePolicy;
use crate::projectors::StateActionProjector;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use crate::Prng;

/// Sarsa(λ) control.
///
/// Learns the action values of the acting policy. The next action is chosen
/// before the update and bootstraps the update target `Q(s', a')`.
#[derive(Debug, Clone, PartialEq)]
pub struct SarsaControl<S, L, P> {
    expander: S,
    learner: L,
    policy: P,
    actions: ActionValues,
    phi_t: SparseVector,
    terminal: SparseVector,
}

impl<S, L, P> SarsaControl<S, L, P>
where
    S: StateActionProjector,
    L: OnPolicyTd,
    P: DiscretePolicy,
{
    pub fn new(expander: S, learner: L, policy: P) -> Result<Self, BuildError> {
        check_dimension("learner", expander.dimension(), learner.dimension())?;
        check_dimension("policy actions", expander.num_actions(), policy.num_actions())?;
        Ok(Self {
            actions: ActionValues::new(&expander),
            phi_t: SparseVector::new(expander.dimension()),
            terminal: SparseVector::new(expander.dimension()),
            expander,
            learner,
            policy,
        })
    }

    pub const fn learner(&self) -> &L {
        &self.learner
    }

    /// Estimated value of every action at `observation`.
    pub fn action_values(&mut self, observation: &[f64]) -> &[f64] {
        self.actions
            .evaluate(&self.expander, observation, self.learner.weights())
    }

    fn choose(&mut self, observation: &[f64], rng: &mut Prng) -> usize {
        let values = self
            .actions
            .evaluate(&self.expander, observation, self.learner.weights());
        self.policy.update_values(values);
        self.policy.sample(rng)
    }
}

impl<S, L, P> ControlLearner for SarsaControl<S, L, P>
where
    S: StateActionProjector,
    L: OnPolicyTd,
    P: DiscretePolicy,
{
    fn initialize(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        self.learner.initialize();
        Action::Discrete(self.choose(observation, rng))
    }

    fn step(&mut self, step: &Step, rng: &mut Prng) -> Option<Action> {
        self.expander.project_action(
            Some(step.observation),
            step.action.index(),
            &mut self.phi_t,
        );
        let next_action = step
            .next_observation()
            .map(|observation| self.choose(observation, rng));
        let phi_tp1 = match next_action {
            Some(a) => &self.actions.features[a],
            None => &self.terminal,
        };
        self.learner.update(&self.phi_t, phi_tp1, step.reward);

        if step.episode_done() {
            None
        } else {
            next_action.map(Action::Discrete)
        }
    }

    fn propose_action(&mut self, observation: &[f64], rng: &mut Prng) -> Action {
        Action::Discrete(self.choose(observation, rng))
    }

    fn compute_value_function(&mut self, observation: &[f64]) -> f64 {
        self.action_values(observation);
        self.actions.max_value()
    }

    fn reset(&mut self) {
        self.learner.reset();
    }
}

impl<S, L: Persist, P> Persist for SarsaControl<S, L, P> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.learner.save_into(checkpoint)
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.learner.load_from(reader)
    }
}

/// Expected Sarsa(λ) control.
///
/// Bootstraps from the expected next state-action features under the acting policy
/// instead of those of the sampled next action.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedSarsaControl<S, L, P> {
    expander: S,
    learner: L,
    policy: P,
    actions: ActionValues,
    phi_t: SparseVector,
    phi_bar_tp1: SparseVector,
}

impl<S, L, P> ExpectedSarsaControl<S, L, P>
where
    S: StateActionProjector,
    L: OnPolicyTd,
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

impl<S, L, P> ControlLearner for ExpectedSarsaControl<S, L, P>
where
    S: StateActionProjector,
    L: OnPolicyTd,
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
            .update(&self.phi_t, &self.phi_bar_tp1, step.reward);

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

impl<S, L: Persist, P> Persist for ExpectedSarsaControl<S, L, P> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        self.learner.save_into(checkpoint)
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        self.learner.load_from(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{corridor_tiles, train};
    use super::*;
    use crate::envs::{Corridor, Environment, Successor};
    use crate::features::DenseVector;
    use crate::learners::{SarsaConfig, TdLambdaConfig};
    use crate::policies::{EpsilonGreedy, Greedy, SoftMax};
    use crate::projectors::{TabularAction, TileCoder};
    use crate::traces::ReplacingTrace;
    use rand::SeedableRng;

    type Expander = TabularAction<TileCoder>;

    fn expander(corridor: &Corridor) -> Expander {
        TabularAction::new(corridor_tiles(corridor, 1), 2, false).unwrap()
    }

    fn sarsa(
        corridor: &Corridor,
    ) -> SarsaControl<Expander, crate::learners::Sarsa<ReplacingTrace>, EpsilonGreedy> {
        let expander = expander(corridor);
        let learner = SarsaConfig {
            alpha: 0.5 / expander.vector_norm(),
            gamma: corridor.discount_factor(),
            lambda: 0.3,
        }
        .build(ReplacingTrace::new(expander.dimension()))
        .unwrap();
        SarsaControl::new(expander, learner, EpsilonGreedy::new(2, 0.1).unwrap()).unwrap()
    }

    fn prefers_right<F: FnMut(&[f64]) -> Vec<f64>>(corridor: &Corridor, mut values: F) {
        for position in 0..corridor.length - 1 {
            let q = values(&[position as f64]);
            assert!(q[1] > q[0], "position {}: {:?}", position, q);
        }
    }

    #[test]
    fn sarsa_learns_corridor() {
        let mut env = Corridor::new(6);
        let mut control = sarsa(&env);
        let mut rng = Prng::seed_from_u64(1);
        train(&mut env, &mut control, 300, 200, &mut rng);
        prefers_right(&env, |obs| control.action_values(obs).to_vec());
    }

    #[test]
    fn expected_sarsa_learns_corridor() {
        let mut env = Corridor::new(6);
        let expander = expander(&env);
        let learner = TdLambdaConfig {
            alpha: 0.5,
            gamma: 0.9,
            lambda: 0.1,
        }
        .build(ReplacingTrace::new(expander.dimension()))
        .unwrap();
        let mut control =
            ExpectedSarsaControl::new(expander, learner, EpsilonGreedy::new(2, 0.1).unwrap())
                .unwrap();
        let mut rng = Prng::seed_from_u64(2);
        train(&mut env, &mut control, 300, 200, &mut rng);
        prefers_right(&env, |obs| control.action_values(obs).to_vec());
    }

    /// Fixed weights that record the TD error of each update without learning.
    #[derive(Debug, Clone, PartialEq)]
    struct FrozenTd {
        gamma: f64,
        v: DenseVector,
        deltas: Vec<f64>,
    }

    impl OnPolicyTd for FrozenTd {
        fn dimension(&self) -> usize {
            self.v.dimension()
        }

        fn initialize(&mut self) {}

        fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
            let delta = reward + self.gamma * self.v.dot(x_tp1) - self.v.dot(x_t);
            self.deltas.push(delta);
            delta
        }

        fn weights(&self) -> &DenseVector {
            &self.v
        }

        fn reset(&mut self) {}
    }

    impl Persist for FrozenTd {
        fn save_into(&self, checkpoint: &mut Checkpoint) {
            checkpoint.push_vector(&self.v);
        }

        fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
            reader.load_vector(&mut self.v)
        }
    }

    #[test]
    fn expected_sarsa_bootstraps_from_policy_expectation() {
        let env = Corridor::new(6);
        let expander = expander(&env);
        let learner = FrozenTd {
            gamma: 0.9,
            v: DenseVector::from_vec((1..=expander.dimension()).map(|i| 0.1 * i as f64).collect()),
            deltas: Vec::new(),
        };
        let policy = SoftMax::new(2, 1.0).unwrap();
        let mut control = ExpectedSarsaControl::new(expander, learner, policy).unwrap();
        let mut rng = Prng::seed_from_u64(0);
        control.initialize(&[1.0], &mut rng);
        let step = Step {
            observation: &[1.0],
            action: Action::Discrete(0),
            reward: -1.0,
            next: Successor::Continue(&[2.0]),
        };
        assert!(control.step(&step, &mut rng).is_some());

        let q_t = control.action_values(&[1.0])[0];
        let q_next = control.action_values(&[2.0]).to_vec();
        assert!((q_next[1] - q_next[0]).abs() > 0.1, "{:?}", q_next);
        let norm: f64 = q_next.iter().map(|q| q.exp()).sum();
        let expectation: f64 = q_next.iter().map(|q| q.exp() / norm * q).sum();

        let deltas = &control.learner().deltas;
        assert_eq!(deltas.len(), 1);
        let expected = -1.0 + 0.9 * expectation - q_t;
        assert!((deltas[0] - expected).abs() < 1e-12, "{} != {}", deltas[0], expected);
        // Neither sampled next action gives the same target
        for q in &q_next {
            assert!((deltas[0] - (-1.0 + 0.9 * q - q_t)).abs() > 0.05);
        }
    }

    #[test]
    fn terminal_step_ends_episode() {
        let env = Corridor::new(2);
        let mut control = sarsa(&env);
        let mut rng = Prng::seed_from_u64(0);
        control.initialize(&[0.0], &mut rng);
        let step = Step {
            observation: &[0.0],
            action: Action::Discrete(1),
            reward: -1.0,
            next: Successor::Terminate,
        };
        assert_eq!(control.step(&step, &mut rng), None);
        // Q(0, right) moved towards -1 by α
        let q = control.action_values(&[0.0]).to_vec();
        assert_eq!(q, vec![0.0, -0.5]);
    }

    #[test]
    fn greedy_proposal_follows_values() {
        let env = Corridor::new(3);
        let expander = expander(&env);
        let learner = SarsaConfig {
            alpha: 1.0,
            gamma: 0.9,
            lambda: 0.0,
        }
        .build(ReplacingTrace::new(expander.dimension()))
        .unwrap();
        let mut control = SarsaControl::new(expander, learner, Greedy::new(2).unwrap()).unwrap();
        let mut rng = Prng::seed_from_u64(0);
        let step = Step {
            observation: &[0.0],
            action: Action::Discrete(0),
            reward: -1.0,
            next: Successor::Continue(&[0.0]),
        };
        // Action 0 now looks worse than the untried action 1
        control.initialize(&[0.0], &mut rng);
        assert_eq!(control.step(&step, &mut rng), Some(Action::Discrete(0)));
        assert_eq!(control.propose_action(&[0.0], &mut rng), Action::Discrete(1));
        assert_eq!(control.compute_value_function(&[0.0]), 0.0);
    }

    #[test]
    fn mismatched_policy() {
        let env = Corridor::new(3);
        let expander = expander(&env);
        let learner = SarsaConfig::default()
            .build(ReplacingTrace::new(expander.dimension()))
            .unwrap();
        assert!(matches!(
            SarsaControl::new(expander, learner, Greedy::new(3).unwrap()),
            Err(BuildError::DimensionMismatch { .. })
        ));
    }
}
