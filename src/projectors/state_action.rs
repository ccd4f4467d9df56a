//! State-action feature expansion
use super::{Projector, StateActionProjector};
use crate::error::BuildError;
use crate::features::SparseVector;

/// Tabular expansion: one disjoint block of state features per action.
///
/// The state features are copied into the block of the chosen action.
/// Optionally a leading block always holds the state features so that
/// generalization across actions is possible.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularAction<P> {
    projector: P,
    num_actions: usize,
    include_state_features: bool,
}

impl<P: Projector> TabularAction<P> {
    pub fn new(
        projector: P,
        num_actions: usize,
        include_state_features: bool,
    ) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        Ok(Self {
            projector,
            num_actions,
            include_state_features,
        })
    }

    /// Number of leading blocks holding action-independent features.
    const fn shared_blocks(&self) -> usize {
        if self.include_state_features {
            1
        } else {
            0
        }
    }
}

impl<P: Projector> StateActionProjector for TabularAction<P> {
    type Projector = P;

    fn projector(&self) -> &P {
        &self.projector
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn dimension(&self) -> usize {
        self.projector.dimension() * (self.num_actions + self.shared_blocks())
    }

    fn vector_norm(&self) -> f64 {
        self.projector.vector_norm() * (1 + self.shared_blocks()) as f64
    }

    fn project_action(
        &self,
        observation: Option<&[f64]>,
        action: usize,
        features: &mut SparseVector,
    ) {
        assert!(action < self.num_actions, "action {} out of range", action);
        debug_assert_eq!(features.dimension(), self.dimension());
        // State features occupy the leading indices of the output; relocate them afterwards.
        self.projector.project_into(observation, features);
        let offset = (self.shared_blocks() + action) * self.projector.dimension();
        if offset > 0 {
            features.shift_entries(offset, self.include_state_features);
        }
    }
}

/// Tiling expansion: the action is tiled jointly with the observation.
///
/// The output has the dimension of the projector, with no growth in the number of actions.
#[derive(Debug, Clone, PartialEq)]
pub struct StateActionTilings<P> {
    projector: P,
    num_actions: usize,
}

impl<P: Projector> StateActionTilings<P> {
    /// Fails if the projector cannot distinguish `num_actions` tags.
    pub fn new(projector: P, num_actions: usize) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        if projector.tag_capacity() < num_actions {
            return Err(BuildError::DimensionMismatch {
                what: "projector tag capacity",
                expected: num_actions,
                found: projector.tag_capacity(),
            });
        }
        Ok(Self {
            projector,
            num_actions,
        })
    }
}

impl<P: Projector> StateActionProjector for StateActionTilings<P> {
    type Projector = P;

    fn projector(&self) -> &P {
        &self.projector
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn dimension(&self) -> usize {
        self.projector.dimension()
    }

    fn vector_norm(&self) -> f64 {
        self.projector.vector_norm()
    }

    fn project_action(
        &self,
        observation: Option<&[f64]>,
        action: usize,
        features: &mut SparseVector,
    ) {
        assert!(action < self.num_actions, "action {} out of range", action);
        self.projector.project_tagged(observation, action, features);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{TileCoder, TileCoderConfig};
    use super::*;
    use crate::Prng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn coder(memory_size: Option<usize>, num_tags: usize) -> TileCoder {
        TileCoderConfig {
            num_tilings: 8,
            resolution: 6,
            memory_size,
            include_bias: true,
            num_tags,
        }
        .build(vec![(0.0, 1.0), (-1.0, 1.0)])
        .unwrap()
    }

    fn check_norms<S: StateActionProjector>(expander: &S) {
        let mut rng = Prng::seed_from_u64(3);
        let mut buffers = expander.action_buffers();
        for _ in 0..100 {
            let obs = [rng.gen_range(0.0..1.0), rng.gen_range(-1.0..1.0)];
            expander.project_actions(Some(&obs), &mut buffers);
            for phi in &buffers {
                assert_eq!(phi.dimension(), expander.dimension());
                assert_eq!(phi.l1_norm(), expander.vector_norm());
            }
        }
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn tabular_norm_matches(#[case] include_state: bool) {
        check_norms(&TabularAction::new(coder(None, 1), 3, include_state).unwrap());
    }

    #[rstest]
    #[case::grid(None)]
    #[case::hashed(Some(4096))]
    fn tilings_norm_matches(#[case] memory_size: Option<usize>) {
        check_norms(&StateActionTilings::new(coder(memory_size, 3), 3).unwrap());
    }

    #[test]
    fn tabular_blocks_are_disjoint() {
        let expander = TabularAction::new(coder(None, 1), 3, false).unwrap();
        let block = expander.projector().dimension();
        assert_eq!(expander.dimension(), 3 * block);
        let mut buffers = expander.action_buffers();
        expander.project_actions(Some(&[0.4, 0.2]), &mut buffers);
        for (action, phi) in buffers.iter().enumerate() {
            assert!(phi
                .indices()
                .iter()
                .all(|&i| i / block == action));
        }
        assert_eq!(buffers[0].dot(&buffers[2]), 0.0);
    }

    #[test]
    fn tabular_shared_block_holds_state() {
        let expander = TabularAction::new(coder(None, 1), 2, true).unwrap();
        let state = expander.projector().project(Some(&[0.4, 0.2]));
        let mut phi = SparseVector::new(expander.dimension());
        expander.project_action(Some(&[0.4, 0.2]), 1, &mut phi);
        for (index, value) in state.iter() {
            assert_eq!(phi.get(index), value);
            assert_eq!(phi.get(index + 2 * state.dimension()), value);
        }
    }

    #[test]
    fn terminal_expands_to_empty() {
        let expander = StateActionTilings::new(coder(Some(100), 1), 2).unwrap();
        let mut phi = SparseVector::new(expander.dimension());
        expander.project_action(None, 1, &mut phi);
        assert!(phi.is_empty());
    }

    #[test]
    fn grid_tilings_need_enough_tags() {
        assert!(StateActionTilings::new(coder(None, 2), 3).is_err());
        assert!(StateActionTilings::new(coder(Some(100), 1), 3).is_ok());
    }

    #[test]
    fn empty_action_set_is_invalid() {
        assert_eq!(
            TabularAction::new(coder(None, 1), 0, false),
            Err(BuildError::EmptyActionSet)
        );
    }
}
