//! Gradient temporal-difference prediction
use super::{OffPolicyTd, OnPolicyTd};
use crate::error::{check_step_size, check_unit_interval, BuildError};
use crate::features::{DenseVector, SparseVector};
use crate::traces::Trace;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use serde::{Deserialize, Serialize};

/// Configuration of a [`GtdLambda`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GtdLambdaConfig {
    /// Step size of the primary weights
    pub alpha_v: f64,
    /// Step size of the auxiliary weights
    pub alpha_w: f64,
    /// Discount factor
    pub gamma: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for GtdLambdaConfig {
    fn default() -> Self {
        Self {
            alpha_v: 0.05,
            alpha_w: 0.0001,
            gamma: 0.99,
            lambda: 0.4,
        }
    }
}

impl GtdLambdaConfig {
    pub fn build<T: Trace>(&self, mut trace: T) -> Result<GtdLambda<T>, BuildError> {
        let dimension = trace.dimension();
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        trace.clear();
        Ok(GtdLambda {
            alpha_v: check_step_size("alpha_v", self.alpha_v)?,
            alpha_w: check_step_size("alpha_w", self.alpha_w)?,
            gamma: check_unit_interval("gamma", self.gamma)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            v: DenseVector::zeros(dimension),
            w: DenseVector::zeros(dimension),
            e: trace,
        })
    }
}

/// GTD(λ): off-policy TD with gradient correction.
///
/// Keeps an auxiliary weight vector `w` estimating the expected TD error given the
/// features, on a separate timescale from the value weights `v`.
/// See "GQ(λ): A general gradient algorithm for temporal-difference prediction learning
/// with eligibility traces" by Maei & Sutton (2010).
///
/// Used on-policy, the importance sampling ratio is 1 and the outcome reward 0.
#[derive(Debug, Clone, PartialEq)]
pub struct GtdLambda<T> {
    alpha_v: f64,
    alpha_w: f64,
    gamma: f64,
    lambda: f64,
    v: DenseVector,
    w: DenseVector,
    e: T,
}

impl<T> GtdLambda<T> {
    /// The auxiliary (secondary) weights.
    pub const fn auxiliary_weights(&self) -> &DenseVector {
        &self.w
    }
}

impl<T: Trace> OffPolicyTd for GtdLambda<T> {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
    }

    fn update(
        &mut self,
        x_t: &SparseVector,
        x_tp1: &SparseVector,
        rho: f64,
        reward: f64,
        z: f64,
    ) -> f64 {
        if x_t.is_empty() {
            self.e.clear();
            return 0.0;
        }
        let delta = reward + (1.0 - self.gamma) * z + self.gamma * self.v.dot(x_tp1)
            - self.v.dot(x_t);
        self.e.update(self.gamma * self.lambda, x_t);
        self.e.decay(rho);
        let e = self.e.vect();

        let w_dot_e = self.w.dot(e);
        let w_dot_x = self.w.dot(x_t);
        self.v.add_scaled(self.alpha_v * delta, e);
        self.v.add_scaled(
            -self.alpha_v * self.gamma * (1.0 - self.lambda) * w_dot_e,
            x_tp1,
        );
        self.w.add_scaled(self.alpha_w * delta, e);
        self.w.add_scaled(-self.alpha_w * w_dot_x, x_t);

        self.v.assert_finite_on(e, "GtdLambda");
        self.v.assert_finite_on(x_tp1, "GtdLambda");
        self.w.assert_finite_on(e, "GtdLambda");
        self.w.assert_finite_on(x_t, "GtdLambda");
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
        self.w.fill(0.0);
        self.e.clear();
    }
}

impl<T: Trace> OnPolicyTd for GtdLambda<T> {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
    }

    fn update(&mut self, x_t: &SparseVector, x_tp1: &SparseVector, reward: f64) -> f64 {
        OffPolicyTd::update(self, x_t, x_tp1, 1.0, reward, 0.0)
    }

    fn weights(&self) -> &DenseVector {
        &self.v
    }

    fn reset(&mut self) {
        OffPolicyTd::reset(self)
    }
}

impl<T: Trace> Persist for GtdLambda<T> {
    fn save_into(&self, checkpoint: &mut Checkpoint) {
        checkpoint.push_vector(&self.v);
        checkpoint.push_vector(&self.w);
    }

    fn load_from(&mut self, reader: &mut CheckpointReader) -> Result<(), CheckpointError> {
        let v = reader.read_vector(self.v.dimension())?;
        let w = reader.read_vector(self.w.dimension())?;
        self.v.assign(&v);
        self.w.assign(&w);
        self.e.clear();
        Ok(())
    }
}
