//! Agent-environment simulation
mod summary;

pub use summary::{EpisodeSummary, RunSummary};

use crate::agents::{ControlLearner, Step};
use crate::envs::{Environment, Successor};
use crate::logging::{LogError, StatsLogger};
use crate::utils::save::CheckpointError;
use crate::Prng;
use log::{debug, info, warn};
use ndarray::{ArrayD, Dimension, IxDyn};
use ndarray_stats::QuantileExt;
use rand::SeedableRng;
use std::path::Path;

/// Runs a control learner in an environment.
///
/// Each episode starts with [`ControlLearner::initialize`] and feeds every transition to
/// [`ControlLearner::step`] until the episode terminates or the step limit interrupts it.
/// The learner keeps its weights between runs unless configured with
/// [`Simulator::with_reset_between_runs`].
#[derive(Debug)]
pub struct Simulator<E, L, G = ()> {
    env: E,
    learner: L,
    logger: G,
    rng: Prng,
    reset_between_runs: bool,
}

impl<E, L> Simulator<E, L>
where
    E: Environment,
    L: ControlLearner,
{
    /// Simulator without a statistics logger.
    pub fn unlogged(env: E, learner: L, seed: u64) -> Self {
        Self::new(env, learner, (), seed)
    }
}

impl<E, L, G> Simulator<E, L, G>
where
    E: Environment,
    L: ControlLearner,
    G: StatsLogger,
{
    pub fn new(env: E, learner: L, logger: G, seed: u64) -> Self {
        Self {
            env,
            learner,
            logger,
            rng: Prng::seed_from_u64(seed),
            reset_between_runs: false,
        }
    }

    /// Reset the learner weights before every run after the first.
    #[must_use]
    pub fn with_reset_between_runs(mut self, reset: bool) -> Self {
        self.reset_between_runs = reset;
        self
    }

    pub const fn env(&self) -> &E {
        &self.env
    }

    pub const fn learner(&self) -> &L {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut L {
        &mut self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    /// Run a single episode.
    ///
    /// # Args
    /// * `max_steps` - Interrupt the episode after this many steps; 0 means no limit.
    /// * `learning` - Whether to update the learner. Otherwise the learner acts
    ///   with [`ControlLearner::propose_action`] and is left unchanged.
    pub fn run_episode(&mut self, max_steps: u64, learning: bool) -> EpisodeSummary {
        let mut summary = EpisodeSummary::default();
        let mut observation = self.env.reset(&mut self.rng);
        let mut action = if learning {
            self.learner.initialize(&observation, &mut self.rng)
        } else {
            self.learner.propose_action(&observation, &mut self.rng)
        };
        loop {
            let (next, reward) = self.env.step(&action, &mut self.rng);
            summary.steps += 1;
            summary.reward += reward;
            let next = if summary.steps == max_steps {
                next.into_interrupt()
            } else {
                next
            };
            summary.terminated = matches!(next, Successor::Terminate);

            let next_action = if learning {
                let step = Step {
                    observation: &observation,
                    action,
                    reward,
                    next: next.as_ref().map(Vec::as_slice),
                };
                self.learner.step(&step, &mut self.rng)
            } else {
                next.state()
                    .map(|o| self.learner.propose_action(o, &mut self.rng))
            };

            match (next, next_action) {
                (Successor::Continue(o), Some(a)) => {
                    observation = o;
                    action = a;
                }
                _ => break,
            }
        }
        summary
    }

    fn run_episodes(&mut self, num_episodes: usize, max_steps: u64, learning: bool) -> RunSummary {
        (0..num_episodes)
            .map(|episode| {
                let summary = self.run_episode(max_steps, learning);
                debug!(
                    "episode {}: {} steps, reward {}",
                    episode, summary.steps, summary.reward
                );
                if learning {
                    self.log_episode(&summary);
                }
                summary
            })
            .collect()
    }

    fn log_episode(&mut self, summary: &EpisodeSummary) {
        if let Err(err) = try_log_episode(&mut self.logger, summary) {
            warn!("{}", err);
        }
    }

    /// Train for `num_runs` runs of `max_episodes` episodes each.
    pub fn run(&mut self, num_runs: usize, max_episodes: usize, max_steps: u64) -> Vec<RunSummary> {
        (0..num_runs)
            .map(|run| self.train_run(run, max_episodes, max_steps))
            .collect()
    }

    /// Like [`Simulator::run`] but persists the learner to `path` after every run.
    pub fn run_with_checkpoint(
        &mut self,
        num_runs: usize,
        max_episodes: usize,
        max_steps: u64,
        path: &Path,
    ) -> Result<Vec<RunSummary>, CheckpointError> {
        (0..num_runs)
            .map(|run| {
                let summary = self.train_run(run, max_episodes, max_steps);
                self.learner.persist(path)?;
                info!("run {}: saved checkpoint {}", run, path.display());
                Ok(summary)
            })
            .collect()
    }

    fn train_run(&mut self, run: usize, max_episodes: usize, max_steps: u64) -> RunSummary {
        if run > 0 && self.reset_between_runs {
            self.learner.reset();
        }
        let summary = self.run_episodes(max_episodes, max_steps, true);
        self.logger.flush();
        info!(
            "run {}: {} episodes, mean length {:.1}, mean reward {:.2}",
            run,
            summary.num_episodes(),
            summary.mean_steps(),
            summary.mean_reward()
        );
        summary
    }

    /// Evaluate the learner's current policy without learning.
    pub fn test(&mut self, num_episodes: usize, max_steps: u64) -> RunSummary {
        let summary = self.run_episodes(num_episodes, max_steps, false);
        info!(
            "test: {} episodes, mean length {:.1}, mean reward {:.2}",
            summary.num_episodes(),
            summary.mean_steps(),
            summary.mean_reward()
        );
        summary
    }

    /// Sample the learned value function on a grid over the observation space.
    ///
    /// The grid has `resolution` cells along each observation variable and
    /// each value is taken at the centre of its cell.
    pub fn compute_value_function(&mut self, resolution: usize) -> ArrayD<f64> {
        let ranges = self.env.observation_ranges();
        let shape = IxDyn(&vec![resolution; ranges.len()]);
        let learner = &mut self.learner;
        let mut observation = vec![0.0; ranges.len()];
        let values = ArrayD::from_shape_fn(shape, |index: IxDyn| {
            for ((x, &(low, high)), &i) in observation
                .iter_mut()
                .zip(&ranges)
                .zip(index.slice())
            {
                *x = low + (i as f64 + 0.5) * (high - low) / resolution as f64;
            }
            learner.compute_value_function(&observation)
        });
        if let (Ok(min), Ok(max)) = (values.min(), values.max()) {
            debug!("value function in [{}, {}]", min, max);
        }
        values
    }
}

fn try_log_episode<G: StatsLogger>(
    logger: &mut G,
    summary: &EpisodeSummary,
) -> Result<(), LogError> {
    logger.log_scalar("episode_steps", summary.steps as f64)?;
    logger.log_scalar("episode_reward", summary.reward)?;
    logger.log_counter_increment("episodes", 1)
}
