//! Error types
use crate::utils::save::CheckpointError;
use thiserror::Error;

/// Error from the linear RL crate.
#[derive(Error, Debug)]
pub enum RLError {
    #[error("error building learner")]
    Build(#[from] BuildError),
    #[error("checkpoint error")]
    Checkpoint(#[from] CheckpointError),
}

/// Invalid configuration detected while constructing a component.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("{name} must be in [0, 1], got {value}")]
    OutOfUnitInterval { name: &'static str, value: f64 },
    #[error("step size {name} must be finite and non-negative, got {value}")]
    InvalidStepSize { name: &'static str, value: f64 },
    #[error("dimension must be positive")]
    ZeroDimension,
    #[error("{what} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid tile coder: {0}")]
    InvalidTiling(String),
    #[error("action set must not be empty")]
    EmptyActionSet,
    #[error("expected {expected} traces (one per policy parameter group), got {found}")]
    TraceCount { expected: usize, found: usize },
    #[error("action probabilities must be non-negative and sum to 1")]
    InvalidDistribution,
    #[error("behavior policy must give every action positive probability")]
    PartialBehaviorSupport,
}

/// Check that a discount, trace decay or probability parameter lies in `[0, 1]`.
pub fn check_unit_interval(name: &'static str, value: f64) -> Result<f64, BuildError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(BuildError::OutOfUnitInterval { name, value })
    }
}

/// Check that a learning rate is finite and non-negative.
pub fn check_step_size(name: &'static str, value: f64) -> Result<f64, BuildError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(BuildError::InvalidStepSize { name, value })
    }
}

/// Check that a component has the dimension its collaborator expects.
pub fn check_dimension(
    what: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), BuildError> {
    if expected == found {
        Ok(())
    } else {
        Err(BuildError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_bounds() {
        assert_eq!(check_unit_interval("gamma", 0.0), Ok(0.0));
        assert_eq!(check_unit_interval("gamma", 1.0), Ok(1.0));
        assert!(check_unit_interval("gamma", 1.01).is_err());
        assert!(check_unit_interval("lambda", -0.1).is_err());
        assert!(check_unit_interval("lambda", f64::NAN).is_err());
    }

    #[test]
    fn step_size_rejects_nan() {
        assert!(check_step_size("alpha", f64::NAN).is_err());
        assert!(check_step_size("alpha", -1e-3).is_err());
        assert_eq!(check_step_size("alpha", 0.0), Ok(0.0));
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = check_dimension("trace", 10, 12).unwrap_err();
        assert_eq!(err.to_string(), "trace has dimension 12, expected 10");
    }
}
