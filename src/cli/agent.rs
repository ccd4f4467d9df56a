use super::Options;
use crate::agents::{
    ActorConfig, ActorCritic, AverageRewardActorCritic, ControlLearner, ExpectedSarsaControl,
    GqOnPolicyControl, GreedyGq, OffPac, SarsaControl,
};
use crate::envs::{Environment, MountainCar, MountainCarConfig, Throttle};
use crate::error::BuildError;
use crate::learners::{GqConfig, GtdLambdaConfig, SarsaConfig, TdLambda, TdLambdaConfig};
use crate::policies::{BoltzmannDistribution, EpsilonGreedy, NormalConfig, RandomPolicy};
use crate::projectors::{
    Projector, StateActionProjector, StateActionTilings, TabularAction, TileCoder,
    TileCoderConfig,
};
use crate::traces::{AccumulatingTrace, ReplacingTrace, Traces};
use clap::ValueEnum;
use std::fmt;

/// Agent name
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentType {
    /// Sarsa(λ) on hashed state-action tilings
    Sarsa,
    /// Sarsa(λ) with one block of grid tiles per action
    SarsaTabular,
    ExpectedSarsa,
    /// GQ(λ) evaluating its own ε-greedy policy
    GqOnPolicy,
    /// Greedy-GQ(λ) learning the greedy policy from random behavior
    GreedyGq,
    /// Boltzmann actor with a TD(λ) critic
    ActorCritic,
    ActorCriticTabular,
    /// Gaussian actor with continuous throttle, relative to the average reward
    AverageRewardActorCritic,
    /// Off-policy actor-critic from random behavior
    OffPac,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

impl AgentType {
    /// Default hashed memory size; `None` uses an exact tile grid.
    const fn default_memory_size(self) -> Option<usize> {
        match self {
            Self::SarsaTabular => None,
            Self::ActorCriticTabular => Some(1000),
            Self::GreedyGq | Self::OffPac => Some(1_000_000),
            _ => Some(10_000),
        }
    }

    /// Actor-critic agents tile the state without a bias feature.
    const fn include_bias(self) -> bool {
        !matches!(
            self,
            Self::ActorCritic | Self::ActorCriticTabular | Self::AverageRewardActorCritic
        )
    }

    /// Whether the action is tiled jointly with the state, one tag per action.
    ///
    /// Tabular expansions copy the state features into a block per action instead.
    const fn tiles_actions(self) -> bool {
        !matches!(
            self,
            Self::SarsaTabular | Self::ActorCriticTabular | Self::AverageRewardActorCritic
        )
    }

    const fn throttle(self) -> Throttle {
        match self {
            Self::AverageRewardActorCritic => Throttle::Continuous,
            _ => Throttle::Discrete,
        }
    }
}

/// Build the mountain car environment for the selected agent.
pub fn build_env(opts: &Options) -> MountainCar {
    MountainCarConfig {
        throttle: opts.agent.throttle(),
        ..MountainCarConfig::default()
    }
    .build()
}

fn tile_coder(opts: &Options, env: &MountainCar) -> Result<TileCoder, BuildError> {
    let memory_size = match opts.memory_size {
        Some(0) => None,
        Some(size) => Some(size),
        None => opts.agent.default_memory_size(),
    };
    TileCoderConfig {
        num_tilings: opts.tilings,
        resolution: opts.resolution,
        memory_size,
        include_bias: opts.agent.include_bias(),
        num_tags: if opts.agent.tiles_actions() {
            env.action_space().num_actions()
        } else {
            1
        },
    }
    .build(env.observation_ranges())
}

/// Build the selected control learner for `env`.
///
/// Step sizes are divided by the norm of the feature vectors they multiply.
pub fn build_agent(
    opts: &Options,
    env: &MountainCar,
) -> Result<Box<dyn ControlLearner>, BuildError> {
    let coder = tile_coder(opts, env)?;
    let num_actions = env.action_space().num_actions();
    let gamma = env.discount_factor();
    let epsilon = 0.01;

    let agent: Box<dyn ControlLearner> = match opts.agent {
        AgentType::Sarsa => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            let learner = SarsaConfig {
                alpha: 0.15 / expander.vector_norm(),
                gamma,
                lambda: 0.3,
            }
            .build(ReplacingTrace::new(expander.dimension()))?;
            let policy = EpsilonGreedy::new(num_actions, epsilon)?;
            Box::new(SarsaControl::new(expander, learner, policy)?)
        }
        AgentType::SarsaTabular => {
            let expander = TabularAction::new(coder, num_actions, true)?;
            let learner = SarsaConfig {
                alpha: 0.15 / expander.vector_norm(),
                gamma,
                lambda: 0.3,
            }
            .build(ReplacingTrace::new(expander.dimension()))?;
            let policy = EpsilonGreedy::new(num_actions, epsilon)?;
            Box::new(SarsaControl::new(expander, learner, policy)?)
        }
        AgentType::ExpectedSarsa => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            let learner = SarsaConfig {
                alpha: 0.2 / expander.vector_norm(),
                gamma,
                lambda: 0.1,
            }
            .build(ReplacingTrace::new(expander.dimension()))?;
            let policy = EpsilonGreedy::new(num_actions, epsilon)?;
            Box::new(ExpectedSarsaControl::new(expander, learner, policy)?)
        }
        AgentType::GqOnPolicy => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            let learner = GqConfig {
                alpha_v: 0.05 / expander.vector_norm(),
                alpha_w: 0.0,
                beta: 0.1,
                lambda: 0.1,
            }
            .build(AccumulatingTrace::new(expander.dimension()))?;
            let policy = EpsilonGreedy::new(num_actions, epsilon)?;
            Box::new(GqOnPolicyControl::new(expander, learner, policy)?)
        }
        AgentType::GreedyGq => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            let norm = expander.vector_norm();
            let learner = GqConfig {
                alpha_v: 0.1 / norm,
                alpha_w: 0.0001 / norm,
                beta: 1.0 - gamma,
                lambda: 0.4,
            }
            .build(AccumulatingTrace::new(expander.dimension()))?;
            let behavior = RandomPolicy::uniform(num_actions)?;
            Box::new(GreedyGq::new(expander, learner, behavior)?)
        }
        AgentType::ActorCritic => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            Box::new(boltzmann_actor_critic(expander, gamma)?)
        }
        AgentType::ActorCriticTabular => {
            let expander = TabularAction::new(coder, num_actions, false)?;
            Box::new(boltzmann_actor_critic(expander, gamma)?)
        }
        AgentType::AverageRewardActorCritic => {
            let expander = TabularAction::new(coder, 1, false)?;
            let norm = expander.projector().vector_norm();
            let critic = TdLambdaConfig {
                alpha: 0.1 / norm,
                gamma,
                lambda: 0.4,
            }
            .build(ReplacingTrace::new(expander.projector().dimension()))?;
            let dimension = expander.dimension();
            let actor = ActorConfig {
                alpha_u: 0.001 / norm,
                gamma,
                lambda: 0.4,
            }
            .build(
                NormalConfig::default().build(dimension)?,
                Traces::new(vec![
                    ReplacingTrace::new(dimension),
                    ReplacingTrace::new(dimension),
                ]),
            )?;
            let inner = ActorCritic::new(expander, critic, actor)?;
            Box::new(AverageRewardActorCritic::new(inner, 0.01 / norm)?)
        }
        AgentType::OffPac => {
            let expander = StateActionTilings::new(coder, num_actions)?;
            let norm = expander.projector().vector_norm();
            let critic = GtdLambdaConfig {
                alpha_v: 0.05 / norm,
                alpha_w: 0.0001 / norm,
                gamma,
                lambda: 0.4,
            }
            .build(AccumulatingTrace::new(expander.projector().dimension()))?;
            let dimension = expander.dimension();
            let actor = ActorConfig {
                alpha_u: 1.0 / norm,
                gamma,
                lambda: 0.4,
            }
            .build(
                BoltzmannDistribution::new(dimension, num_actions)?,
                Traces::new(vec![AccumulatingTrace::new(dimension)]),
            )?;
            let behavior = RandomPolicy::uniform(num_actions)?;
            Box::new(OffPac::new(expander, critic, actor, behavior)?)
        }
    };
    Ok(agent)
}

type BoltzmannActorCritic<S> =
    ActorCritic<S, TdLambda<ReplacingTrace>, BoltzmannDistribution, ReplacingTrace>;

fn boltzmann_actor_critic<S>(expander: S, gamma: f64) -> Result<BoltzmannActorCritic<S>, BuildError>
where
    S: StateActionProjector,
{
    let norm = expander.projector().vector_norm();
    let critic = TdLambdaConfig {
        alpha: 0.1 / norm,
        gamma,
        lambda: 0.3,
    }
    .build(ReplacingTrace::new(expander.projector().dimension()))?;
    let dimension = expander.dimension();
    let actor = ActorConfig {
        alpha_u: 0.01 / norm,
        gamma,
        lambda: 0.3,
    }
    .build(
        BoltzmannDistribution::new(dimension, expander.num_actions())?,
        Traces::new(vec![ReplacingTrace::new(dimension)]),
    )?;
    ActorCritic::new(expander, critic, actor)
}
