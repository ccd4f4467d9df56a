//! On-policy TD learners
use super::OnPolicyTd;
use crate::error::{check_step_size, check_unit_interval, BuildError};
use crate::features::{DenseVector, SparseVector};
use crate::traces::{Trace, DEFAULT_THRESHOLD};
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use serde::{Deserialize, Serialize};

/// Configuration of a [`Td`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdConfig {
    /// Step size
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
}

impl Default for TdConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.99,
        }
    }
}

impl TdConfig {
    pub fn build(&self, dimension: usize) -> Result<Td, BuildError> {
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        Ok(Td {
            alpha: check_step_size("alpha", self.alpha)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            v: DenseVector::zeros(dimension),
        })
    }
}

/// One-step TD learning, TD(0).
#[derive(Debug, Clone, PartialEq)]
pub struct Td {
    alpha: f64,
    gamma: f64,
    v: DenseVector,
}

impl OnPolicyTd for Td {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {}

    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        if x_t.is_empty() {
            return 0.0;
        }
        let delta = reward + self.gamma * self.v.dot(x_tp1) - self.v.dot(x_t);
        self.v.add_scaled(self.alpha * delta, x_t);
        self.v.assert_finite_on(x_t, "Td");
        delta
    }

    fn weights(&self) -> &DenseVector {
        &self.v
    }

    fn reset(&mut self) {
        self.v.fill(0.0);
    }
}

impl Persist for Td {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        checkpoint.push_vector(&self.v);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        reader.load_vector(&mut self.v)
    }
}

/// Configuration of a [`TdLambda`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLambdaConfig {
    /// Step size
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for TdLambdaConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.99,
            lambda: 0.3,
        }
    }
}

impl TdLambdaConfig {
    /// Build a learner using the given (empty) trace; the trace sets the dimension.
    pub fn build<T: Trace>(&self, mut trace: T) -> Result<TdLambda<T>, BuildError> {
        if trace.dimension() == 0 {
            return Err(BuildError::ZeroDimension);
        }
        trace.clear();
        Ok(TdLambda {
            alpha: check_step_size("alpha", self.alpha)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            v: DenseVector::zeros(trace.dimension()),
            e: trace,
        })
    }
}

/// TD(λ) with an eligibility trace.
///
/// `δ = r + γ v·x' − v·x`, `e ← γλe + x`, `v ← v + αδe`.
#[derive(Debug, Clone, PartialEq)]
pub struct TdLambda<T> {
    alpha: f64,
    gamma: f64,
    lambda: f64,
    v: DenseVector,
    e: T,
}

/// Sarsa(λ): TD(λ) over state-action features.
pub type Sarsa<T> = TdLambda<T>;
pub type SarsaConfig = TdLambdaConfig;

impl<T: Trace> TdLambda<T> {
    pub fn trace(&self) -> &T {
        &self.e
    }
}

impl<T: Trace> OnPolicyTd for TdLambda<T> {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
    }

    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        if x_t.is_empty() {
            self.initialize();
            return 0.0;
        }
        let delta = reward + self.gamma * self.v.dot(x_tp1) - self.v.dot(x_t);
        self.e.update(self.gamma * self.lambda, x_t);
        self.v.add_scaled(self.alpha * delta, self.e.vect());
        self.v.assert_finite_on(self.e.vect(), "TdLambda");
        if x_tp1.is_empty() {
            self.e.clear();
        }
        delta
    }

    fn weights(&self) -> &DenseVector {
        &self.v
    }

    fn reset(&mut self) {
        self.v.fill(0.0);
        self.e.clear();
    }
}

impl<T: Trace> Persist for TdLambda<T> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        checkpoint.push_vector(&self.v);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        reader.load_vector(&mut self.v)?;
        self.e.clear();
        Ok(())
    }
}

/// Configuration of a [`TdLambdaAlphaBound`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLambdaAlphaBoundConfig {
    /// Initial (and largest) step size
    pub initial_alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for TdLambdaAlphaBoundConfig {
    fn default() -> Self {
        Self {
            initial_alpha: 1.0,
            gamma: 0.99,
            lambda: 0.3,
        }
    }
}

impl TdLambdaAlphaBoundConfig {
    pub fn build<T: Trace>(&self, mut trace: T) -> Result<TdLambdaAlphaBound<T>, BuildError> {
        if trace.dimension() == 0 {
            return Err(BuildError::ZeroDimension);
        }
        trace.clear();
        Ok(TdLambdaAlphaBound {
            alpha: check_step_size("initial_alpha", self.initial_alpha)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            v: DenseVector::zeros(trace.dimension()),
            e: trace,
        })
    }
}

/// TD(λ) with an automatically decreasing step size.
///
/// The step size is bounded by `1 / |e · (γx' − x)|` so that an update never overshoots
/// the target, following "Adaptive step-size for online temporal difference learning"
/// by Dabney & Barto (2012).
#[derive(Debug, Clone, PartialEq)]
pub struct TdLambdaAlphaBound<T> {
    alpha: f64,
    gamma: f64,
    lambda: f64,
    v: DenseVector,
    e: T,
}

impl<T> TdLambdaAlphaBound<T> {
    /// The current step size.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl<T: Trace> OnPolicyTd for TdLambdaAlphaBound<T> {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
    }

    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        if x_t.is_empty() {
            self.initialize();
            return 0.0;
        }
        let delta = reward + self.gamma * self.v.dot(x_tp1) - self.v.dot(x_t);
        self.e.update(self.gamma * self.lambda, x_t);
        let e = self.e.vect();
        let b = (self.gamma * e.dot(x_tp1) - e.dot(x_t)).abs();
        if b > 0.0 {
            self.alpha = self.alpha.min(1.0 / b);
        }
        self.v.add_scaled(self.alpha * delta, e);
        self.v.assert_finite_on(e, "TdLambdaAlphaBound");
        if x_tp1.is_empty() {
            self.e.clear();
        }
        delta
    }

    fn weights(&self) -> &DenseVector {
        &self.v
    }

    fn reset(&mut self) {
        self.v.fill(0.0);
        self.e.clear();
    }
}

impl<T: Trace> Persist for TdLambdaAlphaBound<T> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        checkpoint.push_vector(&self.v);
        checkpoint.push_scalar(self.alpha);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        let v = reader.read_vector(self.v.dimension())?;
        self.alpha = reader.load_scalar()?;
        self.v.assign(&v);
        self.e.clear();
        Ok(())
    }
}

/// Configuration of a [`TdLambdaTrue`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLambdaTrueConfig {
    /// Step size
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for TdLambdaTrueConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.99,
            lambda: 0.3,
        }
    }
}

impl TdLambdaTrueConfig {
    pub fn build(&self, dimension: usize) -> Result<TdLambdaTrue, BuildError> {
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        Ok(TdLambdaTrue {
            alpha: check_step_size("alpha", self.alpha)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            v: DenseVector::zeros(dimension),
            e: SparseVector::new(dimension),
            v_old: 0.0,
        })
    }
}

/// True online TD(λ) with a dutch trace.
///
/// From "True online temporal-difference learning" by van Seijen et al. (2016).
/// Exactly matches the forward view of TD(λ) at every time step.
#[derive(Debug, Clone, PartialEq)]
pub struct TdLambdaTrue {
    alpha: f64,
    gamma: f64,
    lambda: f64,
    v: DenseVector,
    /// Dutch trace
    e: SparseVector,
    /// Value of the current state before the last weight update.
    v_old: f64,
}

impl OnPolicyTd for TdLambdaTrue {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
        self.v_old = 0.0;
    }

    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        if x_t.is_empty() {
            self.initialize();
            return 0.0;
        }
        let v_t = self.v.dot(x_t);
        let v_tp1 = self.v.dot(x_tp1);
        let delta = reward + self.gamma * v_tp1 - v_t;

        let decay = self.gamma * self.lambda;
        let correction = 1.0 - self.alpha * decay * self.e.dot(x_t);
        self.e.scale(decay);
        self.e.remove_below(DEFAULT_THRESHOLD);
        self.e.add_scaled(correction, x_t);

        self.v
            .add_scaled(self.alpha * (delta + v_t - self.v_old), &self.e);
        self.v.add_scaled(-self.alpha * (v_t - self.v_old), x_t);
        self.v.assert_finite_on(&self.e, "TdLambdaTrue");
        self.v.assert_finite_on(x_t, "TdLambdaTrue");

        self.v_old = v_tp1;
        if x_tp1.is_empty() {
            self.initialize();
        }
        delta
    }

    fn weights(&self) -> &DenseVector {
        &self.v
    }

    fn reset(&mut self) {
        self.v.fill(0.0);
        self.initialize();
    }
}

impl Persist for TdLambdaTrue {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        checkpoint.push_vector(&self.v);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        reader.load_vector(&mut self.v)?;
        self.initialize();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::random_transition;
    use super::*;
    use crate::traces::{AccumulatingTrace, ReplacingTrace};
    use crate::Prng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn unit(dimension: usize, index: usize) -> SparseVector {
        SparseVector::from_entries(dimension, [(index, 1.0)])
    }

    fn learners(dimension: usize, lambda: f64) -> Vec<Box<dyn OnPolicyTd>> {
        let gamma = 0.9;
        let alpha = 0.1;
        vec![
            Box::new(TdConfig { alpha, gamma }.build(dimension).unwrap()),
            Box::new(
                TdLambdaConfig {
                    alpha,
                    gamma,
                    lambda,
                }
                .build(AccumulatingTrace::new(dimension))
                .unwrap(),
            ),
            Box::new(
                TdLambdaConfig {
                    alpha,
                    gamma,
                    lambda,
                }
                .build(ReplacingTrace::new(dimension))
                .unwrap(),
            ),
            Box::new(
                TdLambdaAlphaBoundConfig {
                    initial_alpha: 1.0,
                    gamma,
                    lambda,
                }
                .build(AccumulatingTrace::new(dimension))
                .unwrap(),
            ),
            Box::new(
                TdLambdaTrueConfig {
                    alpha,
                    gamma,
                    lambda,
                }
                .build(dimension)
                .unwrap(),
            ),
        ]
    }

    #[test]
    fn td_error_and_step() {
        let mut td = TdConfig {
            alpha: 0.5,
            gamma: 0.9,
        }
        .build(3)
        .unwrap();
        let delta = td.update(&unit(3, 0), &unit(3, 1), 1.0);
        assert_eq!(delta, 1.0);
        assert_eq!(td.weights().get(0), 0.5);
        let delta = td.update(&unit(3, 1), &unit(3, 0), 0.0);
        assert_eq!(delta, 0.9 * 0.5);
    }

    #[test]
    fn lambda_propagates_to_earlier_states() {
        let mut td = TdLambdaConfig {
            alpha: 0.5,
            gamma: 1.0,
            lambda: 0.5,
        }
        .build(AccumulatingTrace::new(3))
        .unwrap();
        td.update(&unit(3, 0), &unit(3, 1), 0.0);
        td.update(&unit(3, 1), &SparseVector::new(3), 1.0);
        assert_eq!(td.weights().get(1), 0.5);
        assert_eq!(td.weights().get(0), 0.25);
        assert!(td.trace().vect().is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.5)]
    #[case(0.9)]
    fn terminal_bootstraps_from_zero(#[case] lambda: f64) {
        for mut learner in learners(4, lambda) {
            learner.reset();
            let delta = learner.update(&unit(4, 2), &SparseVector::new(4), 1.0);
            assert_eq!(delta, 1.0);
            assert!(learner.predict(&unit(4, 2)) > 0.0);
            assert_eq!(learner.predict(&unit(4, 3)), 0.0);
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.9)]
    fn empty_start_only_initializes(#[case] lambda: f64) {
        for mut learner in learners(4, lambda) {
            let delta = learner.update(&SparseVector::new(4), &unit(4, 1), 5.0);
            assert_eq!(delta, 0.0);
            assert!(learner.weights().is_finite());
            assert_eq!(learner.weights().to_vec(), vec![0.0; 4]);
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.5)]
    #[case(1.0)]
    fn weights_stay_finite(#[case] lambda: f64) {
        let dimension = 64;
        let mut rng = Prng::seed_from_u64(7);
        let gamma = 0.9;
        let mut learners: Vec<Box<dyn OnPolicyTd>> = vec![
            Box::new(
                TdLambdaConfig {
                    alpha: 0.1 / 8.0,
                    gamma,
                    lambda,
                }
                .build(ReplacingTrace::new(dimension))
                .unwrap(),
            ),
            Box::new(
                TdLambdaTrueConfig {
                    alpha: 0.1 / 8.0,
                    gamma,
                    lambda,
                }
                .build(dimension)
                .unwrap(),
            ),
        ];
        for _ in 0..100_000 {
            let (x_t, x_tp1, reward) = random_transition(&mut rng, dimension, 8);
            for learner in &mut learners {
                learner.update(&x_t, &x_tp1, reward);
            }
        }
        for learner in &learners {
            assert!(learner.weights().is_finite());
        }
    }

    #[test]
    fn alpha_bound_decreases_step_size() {
        let mut td = TdLambdaAlphaBoundConfig::default()
            .build(AccumulatingTrace::new(4))
            .unwrap();
        let x = SparseVector::from_entries(4, [(0, 1.0), (1, 1.0), (2, 1.0)]);
        td.update(&x, &SparseVector::new(4), 1.0);
        assert!((td.alpha() - 1.0 / 3.0).abs() < 1e-12);
        // A bounded step lands exactly on the target
        assert!((td.predict(&x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn true_online_matches_td_for_lambda_zero() {
        let config = TdLambdaTrueConfig {
            alpha: 0.1,
            gamma: 0.9,
            lambda: 0.0,
        };
        let mut true_online = config.build(5).unwrap();
        let mut td = TdConfig {
            alpha: 0.1,
            gamma: 0.9,
        }
        .build(5)
        .unwrap();
        let states = [0, 1, 2, 1, 3, 4];
        for pair in states.windows(2) {
            let (x_t, x_tp1) = (unit(5, pair[0]), unit(5, pair[1]));
            let a = true_online.update(&x_t, &x_tp1, 0.5);
            let b = td.update(&x_t, &x_tp1, 0.5);
            assert!((a - b).abs() < 1e-12);
        }
        for (a, b) in true_online
            .weights()
            .to_vec()
            .iter()
            .zip(td.weights().to_vec())
        {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            TdLambdaConfig {
                lambda: 1.5,
                ..TdLambdaConfig::default()
            }
            .build(AccumulatingTrace::new(3))
            .unwrap_err(),
            BuildError::OutOfUnitInterval {
                name: "lambda",
                value: 1.5
            }
        );
        assert!(TdConfig::default().build(0).is_err());
        assert!(TdConfig {
            alpha: -1.0,
            ..TdConfig::default()
        }
        .build(3)
        .is_err());
    }

    #[test]
    fn checkpoint_round_trip() {
        let mut td = TdLambdaConfig::default()
            .build(AccumulatingTrace::new(3))
            .unwrap();
        td.update(&unit(3, 0), &unit(3, 1), 1.0);
        let checkpoint = td.checkpoint();
        let mut restored = TdLambdaConfig::default()
            .build(AccumulatingTrace::new(3))
            .unwrap();
        restored.restore(checkpoint).unwrap();
        assert_eq!(restored.weights(), td.weights());
        assert!(restored.trace().vect().is_empty());
    }
}
