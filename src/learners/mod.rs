//! Linear temporal-difference learners.
//!
//! Each learner owns a weight vector and (usually) an eligibility trace.
//! An empty feature vector marks a terminal state: an update towards a terminal state
//! bootstraps from zero and then clears the trace. An update from an empty vector
//! only re-initializes the learner.
//!
//! Any update that makes a touched weight non-finite panics.
mod gq;
mod gtd;
mod td;

pub use gq::{Gq, GqConfig};
pub use gtd::{GtdLambda, GtdLambdaConfig};
pub use td::{
    Sarsa, SarsaConfig, Td, TdConfig, TdLambda, TdLambdaAlphaBound, TdLambdaAlphaBoundConfig,
    TdLambdaConfig, TdLambdaTrue, TdLambdaTrueConfig,
};

use crate::features::{DenseVector, SparseVector};
use crate::utils::save::Persist;

/// On-policy prediction: learns `V(s) ≈ v · x(s)` for the policy generating the data.
///
/// Sarsa is the same update applied to state-action features.
pub trait OnPolicyTd: Persist {
    /// Dimension of the weight and feature vectors.
    fn dimension(&self) -> usize;

    /// Start a new episode: clear eligibility traces.
    fn initialize(&mut self);

    /// Learn from a transition `x_t → x_tp1` with reward `reward`.
    ///
    /// # Returns
    /// The TD error `δ`.
    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64;

    /// Predicted value of a feature vector.
    fn predict(&self, x: &SparseVector) -> f64 {
        self.weights().dot(x)
    }

    fn weights(&self) -> &DenseVector;

    /// Zero all weights and clear traces.
    fn reset(&mut self);
}

impl<T: OnPolicyTd + ?Sized> OnPolicyTd for Box<T> {
    fn dimension(&self) -> usize {
        T::dimension(self)
    }
    fn initialize(&mut self) {
        T::initialize(self)
    }
    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        T::update(self, x_t, x_tp1, reward)
    }
    fn predict(&self, x: &SparseVector) -> f64 {
        T::predict(self, x)
    }
    fn weights(&self) -> &DenseVector {
        T::weights(self)
    }
    fn reset(&mut self) {
        T::reset(self)
    }
}

/// Off-policy prediction with importance sampling corrections.
pub trait OffPolicyTd: Persist {
    fn dimension(&self) -> usize;

    /// Start a new episode: clear eligibility traces.
    fn initialize(&mut self);

    /// Learn from a transition.
    ///
    /// * `rho` - importance sampling ratio `π(a_t|s_t) / b(a_t|s_t)` of the action taken.
    /// * `z` - terminal (outcome) reward, weighted by the termination probability `1 − γ`.
    ///
    /// # Returns
    /// The TD error `δ`.
    fn update(
        &mut self,
        x_t: &SparseVector,
        x_tp1: &SparseVector,
        rho: f64,
        reward: f64,
        z: f64,
    ) -> f64;

    fn predict(&self, x: &SparseVector) -> f64 {
        self.weights().dot(x)
    }

    fn weights(&self) -> &DenseVector;

    /// Zero all weights and clear traces.
    fn reset(&mut self);
}

impl<T: OffPolicyTd + ?Sized> OffPolicyTd for Box<T> {
    fn dimension(&self) -> usize {
        T::dimension(self)
    }
    fn initialize(&mut self) {
        T::initialize(self)
    }
    fn update(
        &mut self,
        x_t: &SparseVector,
        x_tp1: &SparseVector,
        rho: f64,
        reward: f64,
        z: f64,
    ) -> f64 {
        T::update(self, x_t, x_tp1, rho, reward, z)
    }
    fn predict(&self, x: &SparseVector) -> f64 {
        T::predict(self, x)
    }
    fn weights(&self) -> &DenseVector {
        T::weights(self)
    }
    fn reset(&mut self) {
        T::reset(self)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Synthetic transitions for learner tests.
    use crate::features::SparseVector;
    use crate::Prng;
    use rand::Rng;

    /// A random transition with `active` unit features per state and reward in `[-1, 1]`.
    ///
    /// About one transition in 20 is terminal.
    pub fn random_transition(
        rng: &mut Prng,
        dimension: usize,
        active: usize,
    ) -> (SparseVector, SparseVector, f64) {
        let mut state = || {
            SparseVector::from_entries(
                dimension,
                (0..active).map(|_| (rng.gen_range(0..dimension), 1.0)),
            )
        };
        let x_t = state();
        let x_tp1 = state();
        let reward = rng.gen_range(-1.0..=1.0);
        if rng.gen_bool(0.05) {
            (x_t, SparseVector::new(dimension), reward)
        } else {
            (x_t, x_tp1, reward)
        }
    }
}
