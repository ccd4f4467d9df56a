//! Mountain car environment
use super::{Action, ActionSpace, Environment, Successor};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

const MIN_POSITION: f64 = -1.2;
const MAX_POSITION: f64 = 0.6;
const MAX_VELOCITY: f64 = 0.07;
const GOAL_POSITION: f64 = 0.5;

/// Throttle actuation of the [`MountainCar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Throttle {
    /// Actions `0, 1, 2` apply throttle `-1, 0, 1`.
    Discrete,
    /// Throttle in `[-1, 1]`; values outside are clamped.
    Continuous,
}

/// Configuration for the [`MountainCar`] environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountainCarConfig {
    pub throttle: Throttle,
    pub discount_factor: f64,
}

impl Default for MountainCarConfig {
    fn default() -> Self {
        Self {
            throttle: Throttle::Discrete,
            discount_factor: 0.99,
        }
    }
}

impl MountainCarConfig {
    pub const fn build(&self) -> MountainCar {
        MountainCar {
            config: *self,
            position: -0.5,
            velocity: 0.0,
        }
    }
}

/// Mountain car environment
///
/// An under-powered car in a valley must rock back and forth to reach the goal on the right
/// hill. Observations are `[position, velocity]` and every step has reward -1.
///
/// Described in "Efficient memory-based learning for robot control" by Moore (1990),
/// with the dynamics of Sutton & Barto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountainCar {
    config: MountainCarConfig,
    position: f64,
    velocity: f64,
}

impl Default for MountainCar {
    fn default() -> Self {
        MountainCarConfig::default().build()
    }
}

impl MountainCar {
    pub const fn position(&self) -> f64 {
        self.position
    }

    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    fn throttle(&self, action: &Action) -> f64 {
        match (self.config.throttle, action) {
            (Throttle::Discrete, Action::Discrete(a)) => {
                assert!(*a < 3, "invalid mountain car action {}", a);
                *a as f64 - 1.0
            }
            (Throttle::Continuous, Action::Continuous(a)) => a.clamp(-1.0, 1.0),
            (_, a) => panic!("action {:?} does not match {:?} throttle", a, self.config.throttle),
        }
    }
}

impl Environment for MountainCar {
    fn observation_ranges(&self) -> Vec<(f64, f64)> {
        vec![(MIN_POSITION, MAX_POSITION), (-MAX_VELOCITY, MAX_VELOCITY)]
    }

    fn action_space(&self) -> ActionSpace {
        match self.config.throttle {
            Throttle::Discrete => ActionSpace::Discrete(3),
            Throttle::Continuous => ActionSpace::Continuous {
                low: -1.0,
                high: 1.0,
            },
        }
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }

    fn reset(&mut self, rng: &mut Prng) -> Vec<f64> {
        self.position = Uniform::new(-0.6, -0.4).sample(rng);
        self.velocity = 0.0;
        vec![self.position, self.velocity]
    }

    fn step(&mut self, action: &Action, _: &mut Prng) -> (Successor<Vec<f64>>, f64) {
        let throttle = self.throttle(action);
        self.velocity = (self.velocity + 0.001 * throttle - 0.0025 * (3.0 * self.position).cos())
            .clamp(-MAX_VELOCITY, MAX_VELOCITY);
        self.position = (self.position + self.velocity).clamp(MIN_POSITION, MAX_POSITION);
        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            self.velocity = 0.0;
        }
        let successor = if self.position >= GOAL_POSITION {
            Successor::Terminate
        } else {
            Successor::Continue(vec![self.position, self.velocity])
        };
        (successor, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn reset_starts_in_valley() {
        let mut env = MountainCar::default();
        let mut rng = Prng::seed_from_u64(0);
        let obs = env.reset(&mut rng);
        assert!((-0.6..-0.4).contains(&obs[0]));
        assert_eq!(obs[1], 0.0);
    }

    #[test]
    fn observations_stay_in_range() {
        let mut env = MountainCar::default();
        let mut rng = Prng::seed_from_u64(0);
        env.reset(&mut rng);
        let ranges = env.observation_ranges();
        for i in 0..1000 {
            let (successor, reward) = env.step(&Action::Discrete(i % 3), &mut rng);
            assert_eq!(reward, -1.0);
            match successor {
                Successor::Continue(obs) => {
                    for (x, (low, high)) in obs.iter().zip(&ranges) {
                        assert!(low <= x && x <= high);
                    }
                }
                _ => break,
            }
        }
    }

    #[test]
    fn energy_pumping_reaches_goal() {
        let mut env = MountainCar::default();
        let mut rng = Prng::seed_from_u64(0);
        env.reset(&mut rng);
        let mut done = false;
        for _ in 0..1000 {
            // Accelerate in the direction of motion
            let action = if env.velocity() >= 0.0 { 2 } else { 0 };
            let (successor, _) = env.step(&Action::Discrete(action), &mut rng);
            if successor.episode_done() {
                done = true;
                break;
            }
        }
        assert!(done);
    }

    #[test]
    fn continuous_throttle_is_clamped() {
        let mut env = MountainCarConfig {
            throttle: Throttle::Continuous,
            ..MountainCarConfig::default()
        }
        .build();
        let mut rng = Prng::seed_from_u64(0);
        env.reset(&mut rng);
        let mut other = env;
        env.step(&Action::Continuous(5.0), &mut rng);
        other.step(&Action::Continuous(1.0), &mut rng);
        assert_eq!(env, other);
    }

    #[test]
    #[should_panic]
    fn mismatched_action_panics() {
        let mut env = MountainCar::default();
        let mut rng = Prng::seed_from_u64(0);
        env.reset(&mut rng);
        env.step(&Action::Continuous(0.0), &mut rng);
    }
}
