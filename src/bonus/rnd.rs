use super::BonusEstimator;
use crate::{
    mlp::{Mlp, MlpConfig},
    space::{BoxSpace, DiscreteSpace},
};
use ndarray::Array2;
use rand::{rngs::SmallRng, SeedableRng};

/// Random network distillation.
///
/// A fixed, randomly initialized target network embeds observations; a
/// predictor network of the same shape is trained toward the target's
/// output on every visit. The prediction error is the bonus: it shrinks
/// for observations seen often and stays large for novel ones.
pub struct RandomNetworkDistillation {
    target: Mlp,
    predictor: Mlp,
    learning_rate: f32,
    scale: f32,
}

impl RandomNetworkDistillation {
    /// Constructs an estimator with default embedding size and learning rate.
    pub fn new(observation_space: &BoxSpace, action_space: &DiscreteSpace) -> Self {
        Self::with_params(observation_space, action_space, 16, 0.01, 1.0, 42)
    }

    /// Constructs an estimator with explicit parameters.
    pub fn with_params(
        observation_space: &BoxSpace,
        _action_space: &DiscreteSpace,
        embed_dim: usize,
        learning_rate: f32,
        scale: f32,
        seed: u64,
    ) -> Self {
        let config = MlpConfig::new(observation_space.dim(), vec![32], embed_dim);
        let mut rng = SmallRng::seed_from_u64(seed);
        let target = Mlp::build(&config, &mut rng);
        let predictor = Mlp::build(&config, &mut rng);
        Self {
            target,
            predictor,
            learning_rate,
            scale,
        }
    }

    fn prediction_error(&self, x: &Array2<f32>) -> f32 {
        let diff = self.predictor.forward(x) - &self.target.forward(x);
        diff.mapv(|v| v * v).mean().unwrap_or(0.0)
    }
}

impl BonusEstimator for RandomNetworkDistillation {
    fn update(&mut self, obs: &[f32], _act: usize) {
        let x = Array2::from_shape_fn((1, obs.len()), |(_, j)| obs[j]);
        let pred = self.predictor.forward(&x);
        let tgt = self.target.forward(&x);
        let n = pred.len() as f32;
        let grad = (pred - tgt) * (2.0 / n);
        self.predictor.backward_step(&x, &grad, self.learning_rate);
    }

    fn bonus(&mut self, obs: &[f32], _act: usize) -> f32 {
        let x = Array2::from_shape_fn((1, obs.len()), |(_, j)| obs[j]);
        self.scale * self.prediction_error(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_shrinks_for_visited_observations() {
        let obs_space = BoxSpace::new(vec![-1.0, -1.0], vec![1.0, 1.0]);
        let act_space = DiscreteSpace::new(2);
        let mut rnd = RandomNetworkDistillation::new(&obs_space, &act_space);

        let obs = [0.4, -0.3];
        let before = rnd.bonus(&obs, 0);
        for _ in 0..200 {
            rnd.update(&obs, 0);
        }
        let after = rnd.bonus(&obs, 0);
        assert!(after < before, "before={}, after={}", before, after);
    }
}
