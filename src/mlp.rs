//! Multilayer perceptron with ReLU activation function.
//!
//! Small and dependency-light on purpose: plain `ndarray` matrices with
//! stochastic gradient descent, enough for the value networks of the
//! agents in this crate.
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

/// Shape of an [`Mlp`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Input dimension.
    pub in_dim: usize,

    /// Dimensions of the hidden layers.
    pub units: Vec<usize>,

    /// Output dimension.
    pub out_dim: usize,
}

impl MlpConfig {
    /// Constructs a shape description.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
        }
    }
}

/// Multilayer perceptron, ReLU on hidden layers, linear output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mlp {
    /// Weights of layers, `(in, out)` shaped.
    ws: Vec<Array2<f32>>,

    /// Biases of layers.
    bs: Vec<Array1<f32>>,
}

impl Mlp {
    /// Builds an MLP with uniform Xavier-initialized weights.
    pub fn build(config: &MlpConfig, rng: &mut SmallRng) -> Self {
        let mut dims = vec![config.in_dim];
        dims.extend(config.units.iter().copied());
        dims.push(config.out_dim);

        let mut ws = Vec::with_capacity(dims.len() - 1);
        let mut bs = Vec::with_capacity(dims.len() - 1);
        for pair in dims.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let limit = (6.0 / (n_in + n_out) as f32).sqrt();
            ws.push(Array2::from_shape_fn((n_in, n_out), |_| {
                rng.gen_range(-limit..limit)
            }));
            bs.push(Array1::zeros(n_out));
        }

        Self { ws, bs }
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.bs.last().map(|b| b.len()).unwrap_or(0)
    }

    /// Forward pass of a batch of rows.
    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        let n_layers = self.ws.len();
        let mut x = x.clone();
        for i in 0..n_layers {
            x = x.dot(&self.ws[i]) + &self.bs[i];
            if i != n_layers - 1 {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }

    /// Forward pass of a single input.
    pub fn forward1(&self, x: &Array1<f32>) -> Array1<f32> {
        let n_layers = self.ws.len();
        let mut x = x.clone();
        for i in 0..n_layers {
            x = x.dot(&self.ws[i]) + &self.bs[i];
            if i != n_layers - 1 {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }

    /// One SGD step on the given input batch.
    ///
    /// `grad_out` is the gradient of the loss with respect to the network
    /// output, row per batch element.
    pub fn backward_step(&mut self, x: &Array2<f32>, grad_out: &Array2<f32>, learning_rate: f32) {
        let n_layers = self.ws.len();

        // Forward pass, keeping the output of every layer.
        let mut acts: Vec<Array2<f32>> = Vec::with_capacity(n_layers + 1);
        acts.push(x.clone());
        for i in 0..n_layers {
            let mut a = acts[i].dot(&self.ws[i]) + &self.bs[i];
            if i != n_layers - 1 {
                a.mapv_inplace(|v| v.max(0.0));
            }
            acts.push(a);
        }

        let mut g = grad_out.clone();
        for i in (0..n_layers).rev() {
            if i != n_layers - 1 {
                let mask = acts[i + 1].mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
                g = &g * &mask;
            }
            let grad_w = acts[i].t().dot(&g);
            let grad_b = g.sum_axis(Axis(0));
            g = g.dot(&self.ws[i].t());
            self.ws[i] = &self.ws[i] - &(grad_w * learning_rate);
            self.bs[i] = &self.bs[i] - &(grad_b * learning_rate);
        }
    }

    /// Moves the parameters toward those of `other`:
    /// `w = tau * w_other + (1 - tau) * w`.
    pub fn track(&mut self, other: &Mlp, tau: f32) {
        for (w, w_src) in self.ws.iter_mut().zip(other.ws.iter()) {
            w.zip_mut_with(w_src, |a, &b| *a = tau * b + (1.0 - tau) * *a);
        }
        for (b, b_src) in self.bs.iter_mut().zip(other.bs.iter()) {
            b.zip_mut_with(b_src, |a, &v| *a = tau * v + (1.0 - tau) * *a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn mlp() -> Mlp {
        let mut rng = SmallRng::seed_from_u64(0);
        Mlp::build(&MlpConfig::new(2, vec![8], 3), &mut rng)
    }

    #[test]
    fn test_forward_shapes() {
        let mlp = mlp();
        let x = Array2::zeros((5, 2));
        assert_eq!(mlp.forward(&x).dim(), (5, 3));
        assert_eq!(mlp.forward1(&Array1::zeros(2)).len(), 3);
        assert_eq!(mlp.out_dim(), 3);
    }

    #[test]
    fn test_sgd_reduces_regression_loss() {
        let mut mlp = mlp();
        let x = Array2::from_shape_vec((4, 2), vec![0., 0., 0., 1., 1., 0., 1., 1.]).unwrap();
        let y = Array2::from_shape_vec(
            (4, 3),
            vec![0., 0., 1., 0., 1., 0., 1., 0., 0., 1., 1., 1.],
        )
        .unwrap();

        let loss = |m: &Mlp| {
            let d = m.forward(&x) - &y;
            d.mapv(|v| v * v).sum() / 4.0
        };

        let before = loss(&mlp);
        for _ in 0..200 {
            let grad = (mlp.forward(&x) - &y) * (2.0 / 4.0);
            mlp.backward_step(&x, &grad, 0.05);
        }
        let after = loss(&mlp);
        assert!(after < before * 0.5, "before={}, after={}", before, after);
    }

    #[test]
    fn test_track_moves_parameters() {
        let mut a = mlp();
        let mut rng = SmallRng::seed_from_u64(1);
        let b = Mlp::build(&MlpConfig::new(2, vec![8], 3), &mut rng);

        a.track(&b, 1.0);
        let x = Array1::from(vec![0.3, -0.2]);
        let ya = a.forward1(&x);
        let yb = b.forward1(&x);
        for (u, v) in ya.iter().zip(yb.iter()) {
            assert!((u - v).abs() < 1e-6);
        }
    }
}
