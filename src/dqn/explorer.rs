//! Exploration strategies of DQN.
use rand::{distributions::WeightedIndex, prelude::Distribution, rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

pub(crate) fn argmax(q: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in q.iter().enumerate() {
        if *v > q[best] {
            best = i;
        }
    }
    best
}

/// Explorers for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DqnExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl DqnExplorer {
    /// Takes an action based on action values.
    pub fn action(&mut self, q: &[f32], rng: &mut SmallRng) -> usize {
        match self {
            DqnExplorer::Softmax(softmax) => softmax.action(q, rng),
            DqnExplorer::EpsilonGreedy(egreedy) => egreedy.action(q, rng),
        }
    }
}

/// Softmax explorer for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {}

#[allow(clippy::new_without_default)]
impl Softmax {
    /// Constructs softmax explorer.
    pub fn new() -> Self {
        Self {}
    }

    /// Takes an action based on action values.
    pub fn action(&mut self, q: &[f32], rng: &mut SmallRng) -> usize {
        let max = q.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let weights: Vec<f32> = q.iter().map(|v| (v - max).exp()).collect();
        WeightedIndex::new(&weights).unwrap().sample(rng)
    }
}

/// Epsilon-greedy explorer for DQN.
///
/// The epsilon value anneals linearly from `eps_start` to `eps_final`
/// over `final_step` calls.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// The number of taken actions so far.
    pub n_opts: usize,

    /// Epsilon at the first step.
    pub eps_start: f64,

    /// Epsilon at `final_step` and after.
    pub eps_final: f64,

    /// The annealing length in steps.
    pub final_step: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }

    /// Constructs epsilon-greedy explorer with the given annealing length.
    pub fn with_final_step(final_step: usize) -> DqnExplorer {
        DqnExplorer::EpsilonGreedy(Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step,
        })
    }

    /// Takes an action based on action values.
    pub fn action(&mut self, q: &[f32], rng: &mut SmallRng) -> usize {
        let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
        let eps = (self.eps_start - d * self.n_opts as f64).max(self.eps_final);
        self.n_opts += 1;

        if rng.gen::<f64>() < eps {
            rng.gen_range(0..q.len())
        } else {
            argmax(q)
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(self, v: f64) -> Self {
        let mut s = self;
        s.eps_final = v;
        s
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(self, v: f64) -> Self {
        let mut s = self;
        s.eps_start = v;
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_actions_are_in_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        let q = [0.1, -0.5, 0.3];

        let mut egreedy = EpsilonGreedy::new();
        let mut softmax = Softmax::new();
        for _ in 0..100 {
            assert!(egreedy.action(&q, &mut rng) < 3);
            assert!(softmax.action(&q, &mut rng) < 3);
        }
    }

    #[test]
    fn test_epsilon_greedy_becomes_greedy() {
        let mut rng = SmallRng::seed_from_u64(0);
        let q = [0.1, -0.5, 0.3];

        // annealed to eps_final = 0.0: always the argmax
        let mut egreedy = EpsilonGreedy::new().eps_final(0.0);
        egreedy.n_opts = egreedy.final_step;
        for _ in 0..10 {
            assert_eq!(egreedy.action(&q, &mut rng), 2);
        }
    }

    #[test]
    fn test_argmax_ties_resolve_to_first() {
        assert_eq!(argmax(&[1.0, 1.0, 0.5]), 0);
    }
}
