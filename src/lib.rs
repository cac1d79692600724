#![warn(missing_docs)]
//! A library for reinforcement learning agents.
//!
//! The core of the library is the [`Agent`] lifecycle contract: an agent
//! is bound to one environment (holding a private deep copy when the
//! environment supports duplication), trained with [`Agent::fit`] and
//! queried with [`Agent::policy`]. Attaching a writer logs the agent's
//! configuration as a "Hyperparameters" table; the
//! [`Agent::sample_parameters`] hook connects agents to the random
//! hyperparameter search in [`search`].
//!
//! [`dqn`] provides a concrete deep-Q-learning agent with pluggable
//! exploration-bonus estimators ([`bonus`]), backed by a small `ndarray`
//! multilayer perceptron ([`mlp`]).
pub mod bonus;
pub mod envs;
pub mod error;
pub mod mlp;
pub mod record;
pub mod replay;
pub mod search;
pub mod space;
pub mod util;

mod base;
pub use base::{
    describe_config, Act, Agent, AgentCore, BindOptions, Env, EnvHandle, Obs, SharedEnv, Step,
};

pub mod dqn;
pub use dqn::{Dqn, DqnConfig};
