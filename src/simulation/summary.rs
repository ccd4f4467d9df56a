use std::fmt;
use std::iter::FromIterator;

/// Summary of a single episode.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub steps: u64,
    pub reward: f64,
    /// Whether the episode reached a terminal state (rather than the step limit).
    pub terminated: bool,
}

/// Summary of the episodes of one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub episodes: Vec<EpisodeSummary>,
}

impl RunSummary {
    pub fn num_episodes(&self) -> usize {
        self.episodes.len()
    }

    pub fn num_steps(&self) -> u64 {
        self.episodes.iter().map(|e| e.steps).sum()
    }

    pub fn num_terminated(&self) -> usize {
        self.episodes.iter().filter(|e| e.terminated).count()
    }

    /// Mean episode length; NaN if there are no episodes.
    pub fn mean_steps(&self) -> f64 {
        self.num_steps() as f64 / self.num_episodes() as f64
    }

    /// Mean episode reward; NaN if there are no episodes.
    pub fn mean_reward(&self) -> f64 {
        self.episodes.iter().map(|e| e.reward).sum::<f64>() / self.num_episodes() as f64
    }

    /// The last episode, if any.
    pub fn last(&self) -> Option<&EpisodeSummary> {
        self.episodes.last()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "num_episodes:   {}", self.num_episodes())?;
        writeln!(f, "num_steps:      {}", self.num_steps())?;
        writeln!(f, "num_terminated: {}", self.num_terminated())?;
        writeln!(f, "ep_reward_mean: {}", self.mean_reward())?;
        writeln!(f, "ep_length_mean: {}", self.mean_steps())?;
        Ok(())
    }
}

impl FromIterator<EpisodeSummary> for RunSummary {
    fn from_iter<I>(episodes: I) -> Self
    where
        I: IntoIterator<Item = EpisodeSummary>,
    {
        Self {
            episodes: episodes.into_iter().collect(),
        }
    }
}
