//! Environment.
use super::{Act, Obs};
use crate::space::{BoxSpace, DiscreteSpace};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Besides the usual `reset`/`step` interface, environments declare two
/// optional capabilities that agents probe at construction time:
/// [`reseed`](Env::reseed) and [`try_clone`](Env::try_clone). Both default
/// to "unsupported"; agents degrade gracefully when they are absent.
pub trait Env {
    /// Configuration of the environment.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: u64) -> Result<Self>
    where
        Self: Sized;

    /// The observation space of the environment.
    fn observation_space(&self) -> BoxSpace;

    /// The action space of the environment.
    fn action_space(&self) -> DiscreteSpace;

    /// Resets the environment, returning the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step.
    fn step(&mut self, act: &Self::Act) -> Step<Self>
    where
        Self: Sized;

    /// Reseeds the random number generator of the environment.
    ///
    /// Returns `false` if the environment does not support seeding.
    fn reseed(&mut self, seed: u64) -> bool {
        let _ = seed;
        false
    }

    /// Deeply duplicates the environment.
    ///
    /// Returns `None` if the environment cannot be duplicated.
    fn try_clone(&self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// Result of an environment step: the next observation, the reward and
/// the episode-end flags.
pub struct Step<E: Env> {
    /// Observation after the step.
    pub obs: E::Obs,

    /// Reward of the step.
    pub reward: f32,

    /// Flag denoting if the episode reached a terminal state.
    pub is_terminated: bool,

    /// Flag denoting if the episode was cut off, e.g. by a step limit.
    pub is_truncated: bool,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: E::Obs, reward: f32, is_terminated: bool, is_truncated: bool) -> Self {
        Step {
            obs,
            reward,
            is_terminated,
            is_truncated,
        }
    }

    /// Terminated or truncated.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
