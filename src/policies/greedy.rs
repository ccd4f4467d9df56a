//! Greedy and epsilon-greedy policies
use super::{argmax, DiscretePolicy};
use crate::error::{check_unit_interval, BuildError};

/// Always selects the action with the largest value. Ties go to the lowest index.
#[derive(Debug, Clone, PartialEq)]
pub struct Greedy {
    distribution: Vec<f64>,
}

impl Greedy {
    pub fn new(num_actions: usize) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        let mut distribution = vec![0.0; num_actions];
        distribution[0] = 1.0;
        Ok(Self { distribution })
    }
}

impl DiscretePolicy for Greedy {
    fn num_actions(&self) -> usize {
        self.distribution.len()
    }

    fn update_values(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.distribution.len());
        let best = argmax(values);
        self.distribution.fill(0.0);
        self.distribution[best] = 1.0;
    }

    fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    fn has_full_support(&self) -> bool {
        self.distribution.len() == 1
    }
}

/// Selects a uniformly random action with probability ε, and the greedy action otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
    distribution: Vec<f64>,
}

impl EpsilonGreedy {
    pub fn new(num_actions: usize, epsilon: f64) -> Result<Self, BuildError> {
        if num_actions == 0 {
            return Err(BuildError::EmptyActionSet);
        }
        let epsilon = check_unit_interval("epsilon", epsilon)?;
        let mut policy = Self {
            epsilon,
            distribution: vec![0.0; num_actions],
        };
        policy.update_values(&vec![0.0; num_actions]);
        Ok(policy)
    }

    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl DiscretePolicy for EpsilonGreedy {
    fn num_actions(&self) -> usize {
        self.distribution.len()
    }

    fn update_values(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.distribution.len());
        let explore = self.epsilon / self.distribution.len() as f64;
        self.distribution.fill(explore);
        self.distribution[argmax(values)] += 1.0 - self.epsilon;
    }

    fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    fn has_full_support(&self) -> bool {
        self.epsilon > 0.0 || self.distribution.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prng;
    use rand::SeedableRng;

    #[test]
    fn greedy_is_one_hot() {
        let mut policy = Greedy::new(3).unwrap();
        policy.update_values(&[1.0, 5.0, 5.0]);
        assert_eq!(policy.distribution(), &[0.0, 1.0, 0.0]);
        let mut rng = Prng::seed_from_u64(0);
        assert!((0..100).all(|_| policy.sample(&mut rng) == 1));
    }

    #[test]
    fn epsilon_greedy_distribution() {
        let mut policy = EpsilonGreedy::new(4, 0.2).unwrap();
        policy.update_values(&[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(policy.probability(0), 0.05);
        assert!((policy.probability(2) - 0.85).abs() < 1e-12);
        assert_eq!(policy.best_action(), 2);
    }

    #[test]
    fn epsilon_greedy_explores() {
        let mut policy = EpsilonGreedy::new(2, 0.5).unwrap();
        policy.update_values(&[1.0, 0.0]);
        let mut rng = Prng::seed_from_u64(1);
        let explored = (0..1000).filter(|_| policy.sample(&mut rng) == 1).count();
        assert!((180..320).contains(&explored), "{}", explored);
    }

    #[test]
    fn support() {
        assert!(!Greedy::new(2).unwrap().has_full_support());
        assert!(Greedy::new(1).unwrap().has_full_support());
        assert!(!EpsilonGreedy::new(2, 0.0).unwrap().has_full_support());
        assert!(EpsilonGreedy::new(2, 0.01).unwrap().has_full_support());
    }

    #[test]
    fn empty_action_set() {
        assert_eq!(Greedy::new(0), Err(BuildError::EmptyActionSet));
    }
}
