//! Observation and action spaces.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A box in `R^n`, bounded element-wise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl BoxSpace {
    /// Constructs a box space from element-wise bounds.
    ///
    /// Panics if the bounds have different dimensions.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        assert_eq!(
            low.len(),
            high.len(),
            "Bounds of a box space must have the same dimension"
        );
        Self { low, high }
    }

    /// Dimension of the space.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Lower bounds.
    pub fn low(&self) -> &[f32] {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &[f32] {
        &self.high
    }

    /// Samples an element uniformly.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<f32> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(&l, &h)| rng.gen_range(l..=h))
            .collect()
    }

    /// Returns if the given point is inside the bounds.
    pub fn contains(&self, x: &[f32]) -> bool {
        x.len() == self.dim()
            && x.iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(&v, (&l, &h))| l <= v && v <= h)
    }
}

/// The set `{0, 1, .., n-1}` of discrete actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteSpace {
    n: usize,
}

impl DiscreteSpace {
    /// Constructs a discrete space with `n` elements.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "A discrete space must have at least one element");
        Self { n }
    }

    /// Number of elements.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Samples an element uniformly.
    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        rng.gen_range(0..self.n)
    }

    /// Returns if the given element is in the space.
    pub fn contains(&self, a: usize) -> bool {
        a < self.n
    }
}
