use super::BonusEstimator;
use crate::space::{BoxSpace, DiscreteSpace};

/// Visit counter on an online discretization of the observation space.
///
/// Representative points are created lazily: an observation farther than
/// `min_dist` from every known representative becomes a new one. The
/// bonus of a pair decays with the visit count of the nearest
/// representative, `scale / sqrt(n)`.
pub struct DiscretizationCounter {
    reprs: Vec<Vec<f32>>,
    counts: Vec<Vec<u64>>,
    obs_dim: usize,
    n_actions: usize,
    min_dist: f32,
    scale: f32,
}

impl DiscretizationCounter {
    /// Constructs a counter for the given spaces.
    pub fn new(
        observation_space: &BoxSpace,
        action_space: &DiscreteSpace,
        min_dist: f32,
        scale: f32,
    ) -> Self {
        assert!(min_dist > 0.0, "min_dist must be positive");
        Self {
            reprs: Vec::new(),
            counts: Vec::new(),
            obs_dim: observation_space.dim(),
            n_actions: action_space.n(),
            min_dist,
            scale,
        }
    }

    /// The number of representative points created so far.
    pub fn n_representatives(&self) -> usize {
        self.reprs.len()
    }

    fn nearest(&self, obs: &[f32]) -> Option<(usize, f32)> {
        self.reprs
            .iter()
            .enumerate()
            .map(|(ix, r)| {
                let d2: f32 = r.iter().zip(obs.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                (ix, d2.sqrt())
            })
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn representative_of(&mut self, obs: &[f32]) -> usize {
        match self.nearest(obs) {
            Some((ix, dist)) if dist <= self.min_dist => ix,
            _ => {
                self.reprs.push(obs.to_vec());
                self.counts.push(vec![0; self.n_actions]);
                self.reprs.len() - 1
            }
        }
    }
}

impl BonusEstimator for DiscretizationCounter {
    fn update(&mut self, obs: &[f32], act: usize) {
        debug_assert_eq!(obs.len(), self.obs_dim);
        let ix = self.representative_of(obs);
        self.counts[ix][act] += 1;
    }

    fn bonus(&mut self, obs: &[f32], act: usize) -> f32 {
        match self.nearest(obs) {
            Some((ix, dist)) if dist <= self.min_dist => {
                let n = self.counts[ix][act];
                if n == 0 {
                    self.scale
                } else {
                    self.scale / (n as f32).sqrt()
                }
            }
            _ => self.scale,
        }
    }
}
