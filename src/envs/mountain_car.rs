//! The classic mountain car task.
use crate::{
    base::{Env, Step},
    space::{BoxSpace, DiscreteSpace},
};
use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};

const MIN_POSITION: f32 = -1.2;
const MAX_POSITION: f32 = 0.6;
const MAX_SPEED: f32 = 0.07;
const GOAL_POSITION: f32 = 0.5;
const FORCE: f32 = 0.001;
const GRAVITY: f32 = 0.0025;

/// Mountain car with three discrete actions (push left, no push, push
/// right). Observations are `[position, velocity]`; the reward is -1 per
/// step and an episode terminates at the goal position.
///
/// The environment supports seeding and duplication.
#[derive(Clone, Debug)]
pub struct MountainCar {
    position: f32,
    velocity: f32,
    rng: SmallRng,
}

impl MountainCar {
    /// Constructs the environment with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            position: -0.5,
            velocity: 0.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The current `(position, velocity)` pair.
    pub fn state(&self) -> (f32, f32) {
        (self.position, self.velocity)
    }

    fn obs(&self) -> Vec<f32> {
        vec![self.position, self.velocity]
    }
}

impl Env for MountainCar {
    type Config = ();
    type Obs = Vec<f32>;
    type Act = usize;

    fn build(_config: &Self::Config, seed: u64) -> Result<Self> {
        Ok(Self::new(seed))
    }

    fn observation_space(&self) -> BoxSpace {
        BoxSpace::new(
            vec![MIN_POSITION, -MAX_SPEED],
            vec![MAX_POSITION, MAX_SPEED],
        )
    }

    fn action_space(&self) -> DiscreteSpace {
        DiscreteSpace::new(3)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.position = self.rng.gen_range(-0.6..-0.4);
        self.velocity = 0.0;
        Ok(self.obs())
    }

    fn step(&mut self, act: &Self::Act) -> Step<Self> {
        let force = (*act as f32 - 1.0) * FORCE;
        self.velocity += force - (3.0 * self.position).cos() * GRAVITY;
        self.velocity = self.velocity.clamp(-MAX_SPEED, MAX_SPEED);
        self.position = (self.position + self.velocity).clamp(MIN_POSITION, MAX_POSITION);
        if self.position <= MIN_POSITION && self.velocity < 0.0 {
            self.velocity = 0.0;
        }

        let is_terminated = self.position >= GOAL_POSITION;
        Step::new(self.obs(), -1.0, is_terminated, false)
    }

    fn reseed(&mut self, seed: u64) -> bool {
        self.rng = SmallRng::seed_from_u64(seed);
        true
    }

    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}
