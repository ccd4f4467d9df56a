//! Command-line interface
mod agent;
mod options;

pub use agent::{build_agent, build_env, AgentType};
pub use options::Options;

use crate::error::RLError;
use crate::logging::DisplayLogger;
use crate::simulation::Simulator;
use crate::utils::save::Persist;
use log::info;
use std::time::Duration;

/// Train and evaluate the agent described by `opts` on mountain car.
pub fn run(opts: &Options) -> Result<(), RLError> {
    let env = build_env(opts);
    let agent = build_agent(opts, &env)?;
    info!("agent: {}", opts.agent);

    let logger = DisplayLogger::new(Duration::from_secs(1));
    let mut sim = Simulator::new(env, agent, logger, opts.seed)
        .with_reset_between_runs(opts.reset_between_runs);
    let summaries = match &opts.checkpoint {
        Some(path) => sim.run_with_checkpoint(opts.runs, opts.episodes, opts.steps, path)?,
        None => sim.run(opts.runs, opts.episodes, opts.steps),
    };
    if let Some(last) = summaries.last() {
        println!("{}", last);
    }

    if let Some(resolution) = opts.value_resolution {
        println!("{:.2}", sim.compute_value_function(resolution));
    }

    if opts.eval_episodes > 0 {
        if let Some(path) = &opts.checkpoint {
            let learner = sim.learner_mut();
            learner.reset();
            learner.resurrect(path)?;
        }
        println!("{}", sim.test(opts.eval_episodes, opts.eval_steps));
    }
    Ok(())
}
