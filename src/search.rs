//! Hyperparameter search.
//!
//! [`Trial`] is the sampling context handed to
//! [`Agent::sample_parameters`](crate::Agent::sample_parameters); every
//! suggestion is recorded into its [`ParamSet`]. [`RandomSearch`] is a
//! simple maximizing driver over such trials.
use anyhow::{anyhow, Result};
use chrono::Local;
use log::info;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::{collections::BTreeMap, fmt};

/// A sampled hyperparameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A floating-point value.
    Float(f64),

    /// An integer value.
    Int(i64),

    /// A categorical value.
    Str(String),

    /// A boolean value.
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Mapping from configuration parameter names to sampled values.
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Sampling context of a single evaluation in a hyperparameter search.
pub struct Trial {
    id: usize,
    rng: SmallRng,
    params: ParamSet,
}

impl Trial {
    /// Constructs a trial with the given identifier and seed.
    pub fn new(id: usize, seed: u64) -> Self {
        Self {
            id,
            rng: SmallRng::seed_from_u64(seed),
            params: ParamSet::new(),
        }
    }

    /// Identifier of the trial within its study.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Samples uniformly from `[low, high)` and records the value.
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let v = self.rng.gen_range(low..high);
        self.params.insert(name.to_string(), ParamValue::Float(v));
        v
    }

    /// Samples log-uniformly from `[low, high)` and records the value.
    pub fn suggest_log_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let v = self.rng.gen_range(low.ln()..high.ln()).exp();
        self.params.insert(name.to_string(), ParamValue::Float(v));
        v
    }

    /// Samples uniformly from `[low, high]` and records the value.
    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> i64 {
        let v = self.rng.gen_range(low..=high);
        self.params.insert(name.to_string(), ParamValue::Int(v));
        v
    }

    /// Samples one of the given choices and records the value.
    pub fn suggest_categorical(&mut self, name: &str, choices: &[&str]) -> String {
        let v = choices[self.rng.gen_range(0..choices.len())].to_string();
        self.params
            .insert(name.to_string(), ParamValue::Str(v.clone()));
        v
    }

    /// The values sampled so far.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }
}

/// Summary of a finished search.
#[derive(Debug)]
pub struct Study {
    /// Identifier of the study, derived from its start time.
    pub identifier: String,

    /// Parameters of the best trial.
    pub best_params: ParamSet,

    /// Objective value of the best trial.
    pub best_value: f32,

    /// Number of trials that were run.
    pub n_trials: usize,
}

/// Random hyperparameter search, maximizing an objective over trials.
pub struct RandomSearch {
    n_trials: usize,
    seed: u64,
}

impl RandomSearch {
    /// Constructs a search running `n_trials` objective evaluations.
    pub fn new(n_trials: usize) -> Self {
        Self { n_trials, seed: 42 }
    }

    /// Seed of the search.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Runs the search, keeping the trial with the highest objective value.
    pub fn optimize<F>(&self, mut objective: F) -> Result<Study>
    where
        F: FnMut(&mut Trial) -> Result<f32>,
    {
        let identifier = format!("study_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut best: Option<(ParamSet, f32)> = None;

        for id in 0..self.n_trials {
            let mut trial = Trial::new(id, rng.gen());
            let value = objective(&mut trial)?;
            info!(
                "[{}] Trial {}: value = {}, params = {:?}",
                identifier,
                id,
                value,
                trial.params()
            );
            if best.as_ref().map_or(true, |(_, b)| value > *b) {
                best = Some((trial.params().clone(), value));
            }
        }

        let (best_params, best_value) =
            best.ok_or_else(|| anyhow!("A study needs at least one trial"))?;
        info!(
            "[{}] Best value: {}, params: {:?}",
            identifier, best_value, best_params
        );

        Ok(Study {
            identifier,
            best_params,
            best_value,
            n_trials: self.n_trials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_respect_bounds_and_are_recorded() {
        let mut trial = Trial::new(0, 1);
        for i in 0..50 {
            let f = trial.suggest_float(&format!("f{}", i), -1.0, 1.0);
            assert!((-1.0..1.0).contains(&f));
            let l = trial.suggest_log_float(&format!("l{}", i), 1e-4, 1e-1);
            assert!((1e-4..1e-1).contains(&l));
            let n = trial.suggest_int(&format!("n{}", i), 2, 5);
            assert!((2..=5).contains(&n));
        }
        let c = trial.suggest_categorical("c", &["a", "b"]);
        assert!(c == "a" || c == "b");
        assert_eq!(trial.params().len(), 151);
    }

    #[test]
    fn test_random_search_keeps_best_trial() {
        let study = RandomSearch::new(10)
            .seed(7)
            .optimize(|trial| {
                let x = trial.suggest_float("x", 0.0, 1.0);
                Ok(-(x as f32 - 0.5).abs())
            })
            .unwrap();
        assert_eq!(study.n_trials, 10);
        match study.best_params.get("x") {
            Some(ParamValue::Float(x)) => assert!((x - 0.5).abs() < 0.5),
            other => panic!("unexpected best params: {:?}", other),
        }
        assert!(study.best_value <= 0.0);
    }

    #[test]
    fn test_empty_study_fails() {
        assert!(RandomSearch::new(0).optimize(|_| Ok(0.0)).is_err());
    }
}
