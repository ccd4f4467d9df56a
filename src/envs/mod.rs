//! Reinforcement learning environments
mod corridor;
pub mod graph;
mod mountain_car;

pub use corridor::Corridor;
pub use graph::{FiniteStateGraph, StateIndicator};
pub use mountain_car::{MountainCar, MountainCarConfig, Throttle};

use crate::Prng;
use serde::{Deserialize, Serialize};

/// An action taken in an environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Index into a finite action set.
    Discrete(usize),
    /// A real-valued action.
    Continuous(f64),
}

impl Action {
    /// The index of a discrete action.
    ///
    /// # Panics
    /// If the action is continuous.
    pub fn index(&self) -> usize {
        match self {
            Self::Discrete(index) => *index,
            Self::Continuous(value) => panic!("expected a discrete action, got {}", value),
        }
    }

    /// The value of a continuous action.
    ///
    /// # Panics
    /// If the action is discrete.
    pub fn value(&self) -> f64 {
        match self {
            Self::Continuous(value) => *value,
            Self::Discrete(index) => panic!("expected a continuous action, got #{}", index),
        }
    }
}

/// The set of actions accepted by an environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActionSpace {
    /// Actions `0..n`.
    Discrete(usize),
    /// Actions in the closed interval `[low, high]`.
    Continuous { low: f64, high: f64 },
}

impl ActionSpace {
    /// Number of discrete actions; continuous spaces count as a single action slot.
    pub const fn num_actions(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
            Self::Continuous { .. } => 1,
        }
    }

    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (Self::Discrete(n), Action::Discrete(a)) => a < n,
            (Self::Continuous { low, high }, Action::Continuous(a)) => low <= a && a <= high,
            _ => false,
        }
    }
}

/// The successor state or observation of an environment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Successor<O> {
    /// The episode continues from the given state.
    Continue(O),
    /// The episode ends in a terminal state. All future rewards are zero.
    Terminate,
    /// The episode is interrupted (for example by a step limit).
    ///
    /// The given state is not terminal and still has a value.
    Interrupt(O),
}

impl<O> Successor<O> {
    /// Whether this successor ends the episode.
    pub const fn episode_done(&self) -> bool {
        !matches!(self, Self::Continue(_))
    }

    /// The successor state, if not terminal.
    pub const fn state(&self) -> Option<&O> {
        match self {
            Self::Continue(o) | Self::Interrupt(o) => Some(o),
            Self::Terminate => None,
        }
    }

    /// The successor state if the episode continues.
    #[allow(clippy::missing_const_for_fn)] // not const with a destructor
    pub fn into_continue(self) -> Option<O> {
        match self {
            Self::Continue(o) => Some(o),
            _ => None,
        }
    }

    /// End the episode here: a continuing successor becomes interrupted.
    #[allow(clippy::missing_const_for_fn)] // not const with a destructor
    pub fn into_interrupt(self) -> Self {
        match self {
            Self::Continue(o) => Self::Interrupt(o),
            other => other,
        }
    }

    pub fn map<U, F: FnOnce(O) -> U>(self, f: F) -> Successor<U> {
        match self {
            Self::Continue(o) => Successor::Continue(f(o)),
            Self::Terminate => Successor::Terminate,
            Self::Interrupt(o) => Successor::Interrupt(f(o)),
        }
    }

    pub const fn as_ref(&self) -> Successor<&O> {
        match self {
            Self::Continue(o) => Successor::Continue(o),
            Self::Terminate => Successor::Terminate,
            Self::Interrupt(o) => Successor::Interrupt(o),
        }
    }
}

/// A reinforcement learning environment with internal state.
///
/// Observations are real vectors bounded by [`Environment::observation_ranges`].
pub trait Environment {
    /// Lower and upper bound of each observation variable.
    fn observation_ranges(&self) -> Vec<(f64, f64)>;

    fn action_space(&self) -> ActionSpace;

    /// A discount factor applied to future rewards. A value in `[0, 1]`.
    fn discount_factor(&self) -> f64;

    /// Start a new episode, returning the initial observation.
    fn reset(&mut self, rng: &mut Prng) -> Vec<f64>;

    /// Take a step in the environment.
    ///
    /// This may panic if called before [`Environment::reset`]
    /// or after a step that ended the episode.
    ///
    /// # Returns
    /// * `successor`: The resulting observation, unless terminal.
    /// * `reward`: The reward for this transition.
    fn step(&mut self, action: &Action, rng: &mut Prng) -> (Successor<Vec<f64>>, f64);
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn observation_ranges(&self) -> Vec<(f64, f64)> {
        E::observation_ranges(self)
    }
    fn action_space(&self) -> ActionSpace {
        E::action_space(self)
    }
    fn discount_factor(&self) -> f64 {
        E::discount_factor(self)
    }
    fn reset(&mut self, rng: &mut Prng) -> Vec<f64> {
        E::reset(self, rng)
    }
    fn step(&mut self, action: &Action, rng: &mut Prng) -> (Successor<Vec<f64>>, f64) {
        E::step(self, action, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_accessors() {
        let s = Successor::Continue(3);
        assert!(!s.episode_done());
        assert_eq!(s.state(), Some(&3));
        assert_eq!(s.map(|x| x * 2), Successor::Continue(6));
        assert_eq!(Successor::Interrupt(1).into_continue(), None);
        assert!(Successor::<u8>::Terminate.episode_done());
        assert_eq!(Successor::<u8>::Terminate.state(), None);
    }

    #[test]
    fn action_space_contains() {
        assert!(ActionSpace::Discrete(3).contains(&Action::Discrete(2)));
        assert!(!ActionSpace::Discrete(3).contains(&Action::Discrete(3)));
        let space = ActionSpace::Continuous {
            low: -1.0,
            high: 1.0,
        };
        assert!(space.contains(&Action::Continuous(0.5)));
        assert!(!space.contains(&Action::Discrete(0)));
        assert_eq!(space.num_actions(), 1);
    }
}
