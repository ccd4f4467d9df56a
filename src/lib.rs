//! Online reinforcement learning with linear function approximation.
//!
//! Observations are projected onto sparse binary features by tile coding
//! ([`projectors`]), learners ([`learners`]) keep linear weights updated by temporal-difference
//! rules with eligibility traces ([`traces`]), and control agents ([`agents`]) combine them with
//! action-selection policies ([`policies`]). A [`Simulator`] drives episodes of an
//! [`Environment`].
#![warn(clippy::cast_lossless)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::for_kv_map)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)]
pub mod agents;
pub mod cli;
pub mod envs;
mod error;
pub mod features;
pub mod learners;
pub mod logging;
pub mod policies;
pub mod projectors;
pub mod simulation;
pub mod traces;
pub mod utils;

pub use agents::{ControlLearner, Step};
pub use envs::{Action, Environment, Successor};
pub use error::{BuildError, RLError};
pub use learners::{OffPolicyTd, OnPolicyTd};
pub use simulation::Simulator;
pub use utils::save::{CheckpointError, Persist};

/// Pseudo-random number generator used throughout the crate.
pub type Prng = rand_chacha::ChaCha8Rng;
