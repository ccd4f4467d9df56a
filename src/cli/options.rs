//! Command-line options
use super::agent::AgentType;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    author,
    about,
    after_help = "Step sizes follow the agent; tile coding options apply to every agent."
)]
pub struct Options {
    /// Agent type
    #[arg(value_enum)]
    pub agent: AgentType,

    /// Number of independent training runs
    #[arg(long, default_value_t = 1, help_heading = "SIMULATION OPTIONS")]
    pub runs: usize,

    /// Number of training episodes per run
    #[arg(long, default_value_t = 500, help_heading = "SIMULATION OPTIONS")]
    pub episodes: usize,

    /// Maximum number of steps per episode (0 for no limit)
    #[arg(long, default_value_t = 300, help_heading = "SIMULATION OPTIONS")]
    pub steps: u64,

    /// Reset the learner between runs
    #[arg(long, help_heading = "SIMULATION OPTIONS")]
    pub reset_between_runs: bool,

    /// Random seed
    #[arg(long, default_value_t = 0, help_heading = "SIMULATION OPTIONS")]
    pub seed: u64,

    /// Number of evaluation episodes after training
    #[arg(long, default_value_t = 0, help_heading = "SIMULATION OPTIONS")]
    pub eval_episodes: usize,

    /// Maximum number of steps per evaluation episode
    #[arg(long, default_value_t = 5000, help_heading = "SIMULATION OPTIONS")]
    pub eval_steps: u64,

    /// Save the learner here after every run and reload it before evaluation
    #[arg(long, help_heading = "SIMULATION OPTIONS")]
    pub checkpoint: Option<PathBuf>,

    /// Print the value function on a grid with this many cells per variable
    #[arg(long, help_heading = "SIMULATION OPTIONS")]
    pub value_resolution: Option<usize>,

    /// Hashed tile memory size (0 for an exact grid). Defaults depend on the agent.
    #[arg(long, help_heading = "TILE CODING OPTIONS")]
    pub memory_size: Option<usize>,

    /// Number of tilings
    #[arg(long, default_value_t = 10, help_heading = "TILE CODING OPTIONS")]
    pub tilings: usize,

    /// Tiles per observation variable in each tiling
    #[arg(long, default_value_t = 10, help_heading = "TILE CODING OPTIONS")]
    pub resolution: usize,
}
