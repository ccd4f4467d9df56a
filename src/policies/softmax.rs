//! Softmax over action values
use super::DiscretePolicy;
use crate::error::BuildError;

/// Selects actions with probability proportional to `exp(Q(s, a) / temperature)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftMax {
    temperature: f64,
    distribution: Vec<f64>,
}

impl SoftMax {
    pub fn new(num_actions: usize, temperature: f64) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(BuildError::InvalidStepSize {
                name: "temperature",
                value: temperature,
            });
        }
        Ok(Self {
            temperature,
            distribution: vec![1.0 / num_actions as f64; num_actions],
        })
    }
}

impl DiscretePolicy for SoftMax {
    fn num_actions(&self) -> usize {
        self.distribution.len()
    }

    fn update_values(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.distribution.len());
        softmax_into(values, self.temperature, &mut self.distribution);
    }

    fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    fn has_full_support(&self) -> bool {
        true
    }
}

/// `out[i] = exp(values[i] / temperature) / Σ_j exp(values[j] / temperature)`.
///
/// The maximum is subtracted before exponentiation so large values do not overflow.
pub(super) fn softmax_into(values: &[f64], temperature: f64, out: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (p, v) in out.iter_mut().zip(values) {
        *p = ((v - max) / temperature).exp();
        total += *p;
    }
    out.iter_mut().for_each(|p| *p /= total);
}
