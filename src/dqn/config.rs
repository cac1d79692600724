//! Configuration of DQN agent.
use super::explorer::{DqnExplorer, EpsilonGreedy};
use crate::{
    error::BrambleError,
    search::{ParamSet, ParamValue},
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

/// Constructs [`Dqn`](super::Dqn).
///
/// Unknown keys in a serialized configuration are rejected when
/// deserializing; sampled parameters are applied with
/// [`DqnConfig::apply`], which rejects unknown names as well.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DqnConfig {
    /// The number of training episodes of one `fit` call.
    pub n_episodes: usize,

    /// Maximum number of steps per episode.
    pub horizon: usize,

    /// Batch size of an optimization step.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Learning rate of the Q-network.
    pub learning_rate: f64,

    /// Width of the hidden layer of the Q-network.
    pub hidden_dim: usize,

    /// Capacity of the replay buffer.
    pub replay_capacity: usize,

    /// Minimum number of stored transitions before optimization starts.
    pub min_transitions_warmup: usize,

    /// Interval of target network updates, in optimization steps.
    pub soft_update_interval: usize,

    /// Soft update coefficient.
    pub tau: f64,

    /// Exploration strategy.
    pub explorer: DqnExplorer,

    /// If true, the agent tries to hold a deep copy of the environment.
    #[serde(default = "default_true")]
    pub copy_env: bool,

    /// If true, the held environment is reseeded at construction.
    #[serde(default = "default_true")]
    pub reseed_env: bool,

    /// Seed of the agent (networks, replay sampling, exploration).
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DqnConfig {
    /// Constructs DQN configuration with default parameters.
    fn default() -> Self {
        Self {
            n_episodes: 10,
            horizon: 200,
            batch_size: 32,
            discount_factor: 0.99,
            learning_rate: 1e-3,
            hidden_dim: 64,
            replay_capacity: 10_000,
            min_transitions_warmup: 100,
            soft_update_interval: 1,
            tau: 0.005,
            explorer: DqnExplorer::EpsilonGreedy(EpsilonGreedy::new()),
            copy_env: true,
            reseed_env: true,
            seed: 42,
        }
    }
}

impl DqnConfig {
    /// Sets the number of training episodes per `fit`.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum number of steps per episode.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Width of the hidden layer of the Q-network.
    pub fn hidden_dim(mut self, v: usize) -> Self {
        self.hidden_dim = v;
        self
    }

    /// Capacity of the replay buffer.
    pub fn replay_capacity(mut self, v: usize) -> Self {
        self.replay_capacity = v;
        self
    }

    /// Interval before starting optimization.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets target update interval.
    pub fn soft_update_interval(mut self, v: usize) -> Self {
        self.soft_update_interval = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: DqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Whether to deep copy the environment at construction.
    pub fn copy_env(mut self, v: bool) -> Self {
        self.copy_env = v;
        self
    }

    /// Whether to reseed the environment at construction.
    pub fn reseed_env(mut self, v: bool) -> Self {
        self.reseed_env = v;
        self
    }

    /// Seed of the agent.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {}", path_.to_string_lossy());
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {}", path_.to_string_lossy());
        Ok(())
    }

    /// Overwrites fields from sampled parameters.
    ///
    /// Fails with [`BrambleError::UnknownParams`] when a name is not a
    /// configuration parameter of this agent (or its value has the wrong
    /// type), before anything is trained.
    pub fn apply(&mut self, params: &ParamSet) -> Result<()> {
        let mut unknown = Vec::new();
        for (name, value) in params {
            match (name.as_str(), value) {
                ("n_episodes", ParamValue::Int(v)) => self.n_episodes = *v as usize,
                ("horizon", ParamValue::Int(v)) => self.horizon = *v as usize,
                ("batch_size", ParamValue::Int(v)) => self.batch_size = *v as usize,
                ("discount_factor", ParamValue::Float(v)) => self.discount_factor = *v,
                ("learning_rate", ParamValue::Float(v)) => self.learning_rate = *v,
                ("hidden_dim", ParamValue::Int(v)) => self.hidden_dim = *v as usize,
                ("replay_capacity", ParamValue::Int(v)) => self.replay_capacity = *v as usize,
                ("min_transitions_warmup", ParamValue::Int(v)) => {
                    self.min_transitions_warmup = *v as usize
                }
                ("soft_update_interval", ParamValue::Int(v)) => {
                    self.soft_update_interval = *v as usize
                }
                ("tau", ParamValue::Float(v)) => self.tau = *v,
                ("seed", ParamValue::Int(v)) => self.seed = *v as u64,
                _ => unknown.push(name.clone()),
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(BrambleError::UnknownParams(unknown).into())
        }
    }
}
