//! Exploration-bonus estimators.
//!
//! A bonus estimator supplies an auxiliary reward signal that pushes the
//! agent toward rarely visited parts of the state space. Estimators are
//! injected into agents as opaque dependencies via [`BonusEstimatorFn`].
mod counter;
mod rnd;

pub use counter::DiscretizationCounter;
pub use rnd::RandomNetworkDistillation;

use crate::space::{BoxSpace, DiscreteSpace};

/// Supplies auxiliary reward signals from visited transitions.
pub trait BonusEstimator {
    /// Accounts for a visit of the given observation/action pair.
    fn update(&mut self, obs: &[f32], act: usize);

    /// Exploration bonus of the given observation/action pair.
    fn bonus(&mut self, obs: &[f32], act: usize) -> f32;
}

/// Factory creating a bonus estimator for the spaces of an environment.
pub type BonusEstimatorFn = Box<dyn Fn(&BoxSpace, &DiscreteSpace) -> Box<dyn BonusEstimator>>;
