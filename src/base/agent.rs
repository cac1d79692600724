//! Agent.
use super::Env;
use crate::{
    error::BrambleError,
    record::{Record, RecordValue, Recorder},
    search::{ParamSet, Trial},
};
use anyhow::Result;
use log::warn;
use serde::Serialize;
use std::{cell::RefCell, path::Path, rc::Rc};

/// A shared handle to an environment.
///
/// This layer is single-threaded by design; a shared environment makes no
/// mutual-exclusion guarantee beyond `RefCell`'s borrow checking.
pub type SharedEnv<E> = Rc<RefCell<E>>;

/// The environment held by an agent.
///
/// `Owned` is a private duplicate with no shared state; `Shared` is the
/// fallback when duplication was not possible or not requested.
pub enum EnvHandle<E> {
    /// A private copy, owned exclusively by the agent.
    Owned(RefCell<E>),

    /// A handle shared with the caller (and possibly other agents).
    Shared(SharedEnv<E>),
}

impl<E> EnvHandle<E> {
    /// Returns if the agent holds a private copy.
    pub fn is_owned(&self) -> bool {
        matches!(self, EnvHandle::Owned(_))
    }

    /// Runs a closure against the environment.
    pub fn with<T>(&self, f: impl FnOnce(&mut E) -> T) -> T {
        match self {
            EnvHandle::Owned(env) => f(&mut env.borrow_mut()),
            EnvHandle::Shared(env) => f(&mut env.borrow_mut()),
        }
    }
}

/// Options for binding an agent to an environment.
#[derive(Clone, Debug)]
pub struct BindOptions {
    copy_env: bool,
    reseed_env: bool,
    seed: u64,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            copy_env: true,
            reseed_env: true,
            seed: 42,
        }
    }
}

impl BindOptions {
    /// If true, the agent tries to hold a deep copy of the environment.
    pub fn copy_env(mut self, v: bool) -> Self {
        self.copy_env = v;
        self
    }

    /// If true, the held environment is reseeded after binding.
    pub fn reseed_env(mut self, v: bool) -> Self {
        self.reseed_env = v;
        self
    }

    /// Seed used when reseeding the environment.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

/// State common to all agents: the bound environment and an optional
/// writer for run metadata.
pub struct AgentCore<E: Env> {
    env: EnvHandle<E>,
    writer: Option<Box<dyn Recorder>>,
}

impl<E: Env> AgentCore<E> {
    /// Binds an environment.
    ///
    /// With `copy_env`, the agent attempts a deep duplication of the
    /// environment via [`Env::try_clone`]; when duplication is not
    /// possible, a warning is logged and the original handle is shared
    /// instead. Either way binding succeeds and the agent holds a usable
    /// environment. With `reseed_env`, the held environment is reseeded,
    /// if it supports seeding.
    pub fn bind(env: &SharedEnv<E>, options: &BindOptions) -> Self {
        let env = if options.copy_env {
            match env.borrow().try_clone() {
                Some(copy) => EnvHandle::Owned(RefCell::new(copy)),
                None => {
                    warn!("[Agent] Not possible to deepcopy env, sharing the original");
                    EnvHandle::Shared(Rc::clone(env))
                }
            }
        } else {
            EnvHandle::Shared(Rc::clone(env))
        };

        let core = Self { env, writer: None };

        if options.reseed_env {
            let reseeded = core.env.with(|env| env.reseed(options.seed));
            if !reseeded {
                warn!("[Agent] Not possible to reseed env, reseed() is not supported");
            }
        }

        core
    }

    /// Runs a closure against the held environment.
    pub fn env<T>(&self, f: impl FnOnce(&mut E) -> T) -> T {
        self.env.with(f)
    }

    /// Returns if the agent holds a private copy of the environment.
    pub fn holds_private_env(&self) -> bool {
        self.env.is_owned()
    }

    /// Attaches a writer; `None` detaches and is otherwise a no-op.
    ///
    /// When a writer is given, exactly one "Hyperparameters" markdown
    /// table is emitted, listing the given configuration snapshot.
    pub fn attach_writer(
        &mut self,
        writer: Option<Box<dyn Recorder>>,
        hyperparams: &[(String, String)],
    ) {
        self.writer = writer;

        if let Some(writer) = self.writer.as_mut() {
            let mut table = String::from("| Parameter | Value |\n|-------|-------|");
            for (key, value) in hyperparams {
                table.push_str(&format!("\n| {} | {} |", key, value));
            }
            let mut record = Record::empty();
            record.insert("Hyperparameters", RecordValue::String(table));
            writer.write(record);
        }
    }

    /// Returns if a writer is attached.
    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// Writes a record to the attached writer, if any.
    pub fn write(&mut self, record: Record) {
        if let Some(writer) = self.writer.as_mut() {
            writer.write(record);
        }
    }
}

/// Enumerates the fields of a configuration as name/value strings.
///
/// The snapshot is taken from the serialized form of the configuration,
/// so it does not depend on field access and cannot fail for values that
/// were never stored on the agent.
pub fn describe_config<T: Serialize>(config: &T) -> Vec<(String, String)> {
    match serde_yaml::to_value(config) {
        Ok(serde_yaml::Value::Mapping(map)) => map
            .iter()
            .map(|(k, v)| (yaml_to_string(k), yaml_to_string(v)))
            .collect(),
        Ok(value) => vec![("config".to_string(), yaml_to_string(&value))],
        Err(_) => Vec::new(),
    }
}

fn yaml_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => "None".to_string(),
        serde_yaml::Value::Bool(v) => v.to_string(),
        serde_yaml::Value::Number(v) => v.to_string(),
        serde_yaml::Value::String(v) => v.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_start_matches("---")
            .trim()
            .replace('\n', " "),
    }
}

/// Represents a policy-learning entity bound to one environment.
///
/// `fit` and `policy` are the required capabilities. The remaining
/// operations have defaults: `reset` does nothing, while `save`, `load`
/// and `sample_parameters` report [`BrambleError::Unsupported`].
///
/// The base contract does not enforce any ordering between `fit` and
/// `policy`; concrete agents may interleave them freely.
pub trait Agent<E: Env> {
    /// Agent identifier.
    fn name(&self) -> &str {
        ""
    }

    /// The common agent state.
    fn core(&self) -> &AgentCore<E>;

    /// The common agent state, mutable.
    fn core_mut(&mut self) -> &mut AgentCore<E>;

    /// Configuration snapshot used for hyperparameter logging.
    ///
    /// Typically implemented with [`describe_config`] on the agent's
    /// configuration struct.
    fn hyperparameters(&self) -> Vec<(String, String)>;

    /// Trains the agent on the bound environment.
    ///
    /// Returns a record with useful information about the run.
    fn fit(&mut self) -> Result<Record>;

    /// Returns an action, given an observation.
    fn policy(&mut self, obs: &E::Obs) -> Result<E::Act>;

    /// Puts the agent back in its default setup.
    fn reset(&mut self) {}

    /// Saves the agent in the given directory.
    fn save(&self, path: &Path) -> Result<()> {
        let _ = path;
        Err(BrambleError::Unsupported("save").into())
    }

    /// Loads the agent from the given directory.
    fn load(&mut self, path: &Path) -> Result<()> {
        let _ = path;
        Err(BrambleError::Unsupported("load").into())
    }

    /// Attaches a writer; see [`AgentCore::attach_writer`].
    fn set_writer(&mut self, writer: Option<Box<dyn Recorder>>) {
        let hyperparams = self.hyperparameters();
        self.core_mut().attach_writer(writer, &hyperparams);
    }

    /// Samples hyperparameters for the agent configuration.
    ///
    /// Only parameter names accepted by the configuration are valid keys
    /// of the returned mapping.
    fn sample_parameters(trial: &mut Trial) -> Result<ParamSet>
    where
        Self: Sized,
    {
        let _ = trial;
        Err(BrambleError::Unsupported("sample_parameters").into())
    }
}
