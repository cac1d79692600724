//! Core functionalities.
mod agent;
mod env;
use std::fmt::Debug;

pub use agent::{describe_config, Agent, AgentCore, BindOptions, EnvHandle, SharedEnv};
pub use env::{Env, Step};

/// An observation of an environment.
pub trait Obs: Clone + Debug {}

impl Obs for Vec<f32> {}

/// An action on an environment.
pub trait Act: Clone + Debug {}

impl Act for usize {}
