//! Projection of raw observations into sparse feature vectors.
//!
//! Every projector reports a fixed [`dimension`](Projector::dimension) and the norm of any
//! non-terminal output, [`vector_norm`](Projector::vector_norm).
//! The norm convention is L1: binary features each contribute 1, so the norm is the number
//! of active features. Learning rates are commonly divided by it.
mod state_action;
mod tiles;

pub use state_action::{StateActionTilings, TabularAction};
pub use tiles::{hash_coordinates, TileCoder, TileCoderConfig};

use crate::features::SparseVector;

/// Maps an observation to a sparse feature vector.
pub trait Projector {
    /// Dimension of every output vector.
    fn dimension(&self) -> usize;

    /// L1 norm of every non-terminal output.
    fn vector_norm(&self) -> f64;

    /// Number of distinct tags accepted by [`Projector::project_tagged`].
    fn tag_capacity(&self) -> usize {
        1
    }

    /// Project an observation jointly with an integer tag into `features`.
    ///
    /// `None` denotes a terminal observation and produces an empty vector.
    /// The previous content of `features` is discarded.
    fn project_tagged(&self, observation: Option<&[f64]>, tag: usize, features: &mut SparseVector);

    /// Project an observation into `features`; `None` produces an empty vector.
    fn project_into(&self, observation: Option<&[f64]>, features: &mut SparseVector) {
        self.project_tagged(observation, 0, features)
    }

    /// Project an observation into a newly allocated vector.
    fn project(&self, observation: Option<&[f64]>) -> SparseVector {
        let mut features = SparseVector::new(self.dimension());
        self.project_into(observation, &mut features);
        features
    }
}

impl<P: Projector + ?Sized> Projector for Box<P> {
    fn dimension(&self) -> usize {
        P::dimension(self)
    }
    fn vector_norm(&self) -> f64 {
        P::vector_norm(self)
    }
    fn tag_capacity(&self) -> usize {
        P::tag_capacity(self)
    }
    fn project_tagged(&self, observation: Option<&[f64]>, tag: usize, features: &mut SparseVector) {
        P::project_tagged(self, observation, tag, features)
    }
}

/// Maps an observation and a discrete action to state-action features.
///
/// Learners are agnostic to the expansion strategy: `dimension` and `vector_norm`
/// have the same meaning as for [`Projector`].
pub trait StateActionProjector {
    type Projector: Projector;

    /// The underlying state projector.
    fn projector(&self) -> &Self::Projector;

    /// Number of discrete actions. Continuous action policies use a single slot.
    fn num_actions(&self) -> usize;

    fn dimension(&self) -> usize;

    /// L1 norm of every non-terminal output.
    fn vector_norm(&self) -> f64;

    /// Features of one observation-action pair. `None` produces an empty vector.
    fn project_action(
        &self,
        observation: Option<&[f64]>,
        action: usize,
        features: &mut SparseVector,
    );

    /// Features for every action, written into `features[action]`.
    fn project_actions(&self, observation: Option<&[f64]>, features: &mut [SparseVector]) {
        assert_eq!(features.len(), self.num_actions());
        for (action, phi) in features.iter_mut().enumerate() {
            self.project_action(observation, action, phi);
        }
    }

    /// Allocate one feature vector per action.
    fn action_buffers(&self) -> Vec<SparseVector> {
        (0..self.num_actions())
            .map(|_| SparseVector::new(self.dimension()))
            .collect()
    }
}
