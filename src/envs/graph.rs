//! Finite state graph environments with known value functions.
use super::{Action, ActionSpace, Environment, Successor};
use crate::features::{DenseVector, SparseVector};
use crate::projectors::Projector;
use crate::Prng;

/// Outcome of taking an action in a graph state.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    /// Next state; `None` is the absorbing terminal state.
    next: Option<usize>,
    reward: f64,
}

/// A deterministic finite state graph with an absorbing terminal state.
///
/// Observations are `[state index]`. Pair with [`StateIndicator`] for tabular features.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteStateGraph {
    /// `edges[state][action]`
    edges: Vec<Vec<Edge>>,
    initial_state: usize,
    discount_factor: f64,
    state: usize,
}

impl FiniteStateGraph {
    /// Random walk over 5 states with the agent starting in the middle state.
    ///
    /// Action 0 moves left and action 1 moves right. Leaving either end terminates the
    /// episode; leaving on the right has reward 1, every other step has reward 0.
    /// Discount factor 0.9.
    pub fn random_walk() -> Self {
        let num_states: usize = 5;
        let edges = (0..num_states)
            .map(|s| {
                let left = Edge {
                    next: s.checked_sub(1),
                    reward: 0.0,
                };
                let right = if s + 1 == num_states {
                    Edge {
                        next: None,
                        reward: 1.0,
                    }
                } else {
                    Edge {
                        next: Some(s + 1),
                        reward: 0.0,
                    }
                };
                vec![left, right]
            })
            .collect();
        Self::new(edges, num_states / 2, 0.9)
    }

    /// Line of 4 states traversed left to right with a single action and reward 1 per step.
    ///
    /// Discount factor 0.9.
    pub fn line_problem() -> Self {
        let num_states: usize = 4;
        let edges = (0..num_states)
            .map(|s| {
                vec![Edge {
                    next: Some(s + 1).filter(|&n| n < num_states),
                    reward: 1.0,
                }]
            })
            .collect();
        Self::new(edges, 0, 0.9)
    }

    fn new(edges: Vec<Vec<Edge>>, initial_state: usize, discount_factor: f64) -> Self {
        Self {
            edges,
            initial_state,
            discount_factor,
            state: initial_state,
        }
    }

    /// Number of non-terminal states.
    pub fn num_states(&self) -> usize {
        self.edges.len()
    }

    pub fn num_actions(&self) -> usize {
        self.edges[0].len()
    }

    /// Tabular state features.
    pub fn features(&self) -> StateIndicator {
        StateIndicator {
            num_states: self.num_states(),
        }
    }

    /// Expected discounted return from each non-terminal state when acting with the given
    /// action probabilities in every state.
    pub fn expected_discounted_solution(&self, policy: &[f64]) -> Vec<f64> {
        assert_eq!(policy.len(), self.num_actions());
        let gamma = self.discount_factor;
        let mut values = vec![0.0; self.num_states()];
        for _ in 0..100_000 {
            let updated: Vec<f64> = self
                .edges
                .iter()
                .map(|edges| {
                    edges
                        .iter()
                        .zip(policy)
                        .map(|(edge, p)| {
                            let next_value = edge.next.map_or(0.0, |n| values[n]);
                            p * (edge.reward + gamma * next_value)
                        })
                        .sum::<f64>()
                })
                .collect();
            let change = max_abs_difference(&updated, &values);
            values = updated;
            if change < 1e-12 {
                break;
            }
        }
        values
    }
}

/// Largest absolute difference between a solution and learned weights.
pub fn distance_to_solution(solution: &[f64], weights: &DenseVector) -> f64 {
    max_abs_difference(solution, &weights.to_vec())
}

fn max_abs_difference(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

impl Environment for FiniteStateGraph {
    fn observation_ranges(&self) -> Vec<(f64, f64)> {
        vec![(0.0, (self.num_states() - 1) as f64)]
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.num_actions())
    }

    fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    fn reset(&mut self, _: &mut Prng) -> Vec<f64> {
        self.state = self.initial_state;
        vec![self.state as f64]
    }

    fn step(&mut self, action: &Action, _: &mut Prng) -> (Successor<Vec<f64>>, f64) {
        let edge = self.edges[self.state][action.index()];
        let successor = match edge.next {
            Some(next) => {
                self.state = next;
                Successor::Continue(vec![next as f64])
            }
            None => Successor::Terminate,
        };
        (successor, edge.reward)
    }
}

/// One unit feature per graph state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateIndicator {
    num_states: usize,
}

impl Projector for StateIndicator {
    fn dimension(&self) -> usize {
        self.num_states
    }

    fn vector_norm(&self) -> f64 {
        1.0
    }

    fn project_tagged(&self, observation: Option<&[f64]>, tag: usize, features: &mut SparseVector) {
        assert_eq!(tag, 0, "state indicator features are untagged");
        features.clear();
        if let Some(observation) = observation {
            features.set_entry(observation[0] as usize, 1.0);
        }
    }
}
