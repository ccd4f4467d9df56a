//! GQ(λ) action-value learning
use super::OffPolicyTd;
use crate::error::{check_step_size, check_unit_interval, BuildError};
use crate::features::{DenseVector, SparseVector};
use crate::traces::Trace;
use crate::utils::save::{Checkpoint, CheckpointError, CheckpointReader, Persist};
use serde::{Deserialize, Serialize};

/// Configuration of a [`Gq`] learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GqConfig {
    /// Step size of the primary weights
    pub alpha_v: f64,
    /// Step size of the auxiliary weights
    pub alpha_w: f64,
    /// Termination probability; the discount factor is `1 − β`.
    pub beta: f64,
    /// Trace decay
    pub lambda: f64,
}

impl Default for GqConfig {
    fn default() -> Self {
        Self {
            alpha_v: 0.1,
            alpha_w: 0.0001,
            beta: 0.01,
            lambda: 0.4,
        }
    }
}

impl GqConfig {
    pub fn build<T: Trace>(&self, mut trace: T) -> Result<Gq<T>, BuildError> {
        let dimension = trace.dimension();
        if dimension == 0 {
            return Err(BuildError::ZeroDimension);
        }
        trace.clear();
        Ok(Gq {
            alpha_v: check_step_size("alpha_v", self.alpha_v)?,
            alpha_w: check_step_size("alpha_w", self.alpha_w)?,
            beta: check_unit_interval("beta", self.beta)?,
            lambda: check_unit_interval("lambda", self.lambda)?,
            v: DenseVector::zeros(dimension),
            w: DenseVector::zeros(dimension),
            e: trace,
        })
    }
}

/// GQ(λ) over state-action features.
///
/// The next features `φ̄'` passed to [`OffPolicyTd::update`] are the expectation of the
/// next state-action features under the target policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Gq<T> {
    alpha_v: f64,
    alpha_w: f64,
    beta: f64,
    lambda: f64,
    v: DenseVector,
    w: DenseVector,
    e: T,
}

impl<T> Gq<T> {
    pub const fn auxiliary_weights(&self) -> &DenseVector {
        &self.w
    }
}

impl<T: Trace> OffPolicyTd for Gq<T> {
    fn dimension(&self) -> usize {
        self.v.dimension()
    }

    fn initialize(&mut self) {
        self.e.clear();
    }

    fn update(
        &mut self,
        phi_t: &SparseVector,
        phi_bar_tp1: &SparseVector,
        rho: f64,
        reward: f64,
        z: f64,
    ) -> f64 {
        if phi_t.is_empty() {
            self.e.clear();
            return 0.0;
        }
        let continuation = 1.0 - self.beta;
        let delta = reward + self.beta * z + continuation * self.v.dot(phi_bar_tp1)
            - self.v.dot(phi_t);
        self.e.update(continuation * self.lambda * rho, phi_t);
        let e = self.e.vect();

        let e_dot_w = self.w.dot(e);
        let w_dot_phi = self.w.dot(phi_t);
        self.v.add_scaled(self.alpha_v * delta, e);
        self.v.add_scaled(
            -self.alpha_v * continuation * (1.0 - self.lambda) * e_dot_w,
            phi_bar_tp1,
        );
        self.w.add_scaled(self.alpha_w * delta, e);
        self.w.add_scaled(-self.alpha_w * w_dot_phi, phi_t);

        self.v.assert_finite_on(e, "Gq");
        self.v.assert_finite_on(phi_bar_tp1, "Gq");
        self.w.assert_finite_on(e, "Gq");
        if phi_bar_tp1.is_empty() {
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

impl<T: Trace> Persist for Gq<T> {
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
