//! Replay buffer of environment transitions.
use anyhow::{ensure, Result};
use ndarray::Array2;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// A single transition `(o_t, a_t, o_t+1, r_t, done)` with a flat
/// observation and a discrete action.
#[derive(Clone, Debug)]
pub struct Transition {
    /// Observation before the step.
    pub obs: Vec<f32>,

    /// Action taken.
    pub act: usize,

    /// Observation after the step.
    pub next_obs: Vec<f32>,

    /// Reward of the step, including any exploration bonus.
    pub reward: f32,

    /// Terminal-state flag.
    pub is_done: bool,
}

/// A batch of transitions sampled from a [`ReplayBuffer`].
pub struct TransitionBatch {
    /// Observations, row per transition.
    pub obs: Array2<f32>,

    /// Actions.
    pub act: Vec<usize>,

    /// Next observations, row per transition.
    pub next_obs: Array2<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Terminal flags, 1.0 for terminal transitions.
    pub is_done: Vec<f32>,
}

/// Ring buffer of transitions with uniform sampling.
pub struct ReplayBuffer {
    capacity: usize,
    i: usize,
    buf: Vec<Transition>,
    rng: SmallRng,
}

impl ReplayBuffer {
    /// Constructs a buffer of the given capacity.
    pub fn new(capacity: usize, seed: u64) -> Self {
        assert!(capacity > 0, "Replay buffer capacity must be positive");
        Self {
            capacity,
            i: 0,
            buf: Vec::with_capacity(capacity),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Pushes a transition, overwriting the oldest one when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buf.len() < self.capacity {
            self.buf.push(transition);
        } else {
            self.buf[self.i] = transition;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Samples a batch of transitions uniformly, with replacement.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch> {
        ensure!(!self.buf.is_empty(), "Cannot sample from an empty buffer");
        ensure!(size > 0, "Batch size must be positive");

        let obs_dim = self.buf[0].obs.len();
        let ixs: Vec<usize> = (0..size)
            .map(|_| self.rng.gen_range(0..self.buf.len()))
            .collect();

        let obs = Array2::from_shape_fn((size, obs_dim), |(i, j)| self.buf[ixs[i]].obs[j]);
        let next_obs =
            Array2::from_shape_fn((size, obs_dim), |(i, j)| self.buf[ixs[i]].next_obs[j]);
        let act = ixs.iter().map(|&ix| self.buf[ix].act).collect();
        let reward = ixs.iter().map(|&ix| self.buf[ix].reward).collect();
        let is_done = ixs
            .iter()
            .map(|&ix| if self.buf[ix].is_done { 1.0 } else { 0.0 })
            .collect();

        Ok(TransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(v: f32) -> Transition {
        Transition {
            obs: vec![v, v],
            act: 0,
            next_obs: vec![v + 1.0, v + 1.0],
            reward: v,
            is_done: false,
        }
    }

    #[test]
    fn test_capacity_is_respected() {
        let mut buffer = ReplayBuffer::new(3, 0);
        for i in 0..5 {
            buffer.push(transition(i as f32));
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_batch_shapes() {
        let mut buffer = ReplayBuffer::new(10, 0);
        assert!(buffer.batch(4).is_err());
        for i in 0..6 {
            buffer.push(transition(i as f32));
        }
        let batch = buffer.batch(4).unwrap();
        assert_eq!(batch.obs.dim(), (4, 2));
        assert_eq!(batch.next_obs.dim(), (4, 2));
        assert_eq!(batch.act.len(), 4);
        assert_eq!(batch.reward.len(), 4);
        assert_eq!(batch.is_done.len(), 4);
    }
}
