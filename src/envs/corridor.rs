//! Corridor environment
use super::{Action, ActionSpace, Environment, Successor};
use crate::Prng;
use serde::{Deserialize, Serialize};

/// Corridor Environment
///
/// A deterministic line of `length` cells with the agent starting in cell 0
/// and the goal in the last cell.
/// * Action 0 moves left; the first cell is a wall.
/// * Action 1 moves right.
///
/// Every step has reward -1 and reaching the goal ends the episode,
/// so the optimal policy moves right `length - 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corridor {
    pub length: usize,
    position: usize,
}

impl Corridor {
    /// # Panics
    /// If `length < 2`.
    pub fn new(length: usize) -> Self {
        assert!(length >= 2, "corridor needs a start and a goal cell");
        Self {
            length,
            position: 0,
        }
    }

    pub const fn position(&self) -> usize {
        self.position
    }
}

impl Default for Corridor {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Environment for Corridor {
    fn observation_ranges(&self) -> Vec<(f64, f64)> {
        vec![(0.0, (self.length - 1) as f64)]
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(2)
    }

    fn discount_factor(&self) -> f64 {
        0.9
    }

    fn reset(&mut self, _: &mut Prng) -> Vec<f64> {
        self.position = 0;
        vec![0.0]
    }

    fn step(&mut self, action: &Action, _: &mut Prng) -> (Successor<Vec<f64>>, f64) {
        self.position = match action.index() {
            0 => self.position.saturating_sub(1),
            1 => self.position + 1,
            a => panic!("invalid corridor action {}", a),
        };
        let successor = if self.position + 1 == self.length {
            Successor::Terminate
        } else {
            Successor::Continue(vec![self.position as f64])
        };
        (successor, -1.0)
    }
}
