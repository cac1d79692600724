//! Deep Q-learning agent.
use super::{config::DqnConfig, explorer::argmax, DqnExplorer};
use crate::{
    base::{describe_config, Agent, AgentCore, BindOptions, Env, SharedEnv},
    bonus::{BonusEstimator, BonusEstimatorFn},
    mlp::{Mlp, MlpConfig},
    record::{Record, RecordValue},
    replay::{ReplayBuffer, Transition, TransitionBatch},
    search::{ParamSet, Trial},
};
use anyhow::Result;
use chrono::Local;
use log::info;
use ndarray::{Array1, Array2};
use rand::{rngs::SmallRng, SeedableRng};
use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

/// Deep Q-learning agent with an optional exploration bonus.
///
/// The agent owns a Q-network with a soft-updated target copy and a
/// uniform replay buffer. `fit` runs a fixed number of episodes on the
/// bound environment; `policy` is the greedy action of the current
/// Q-network. An exploration-bonus estimator can be injected with
/// [`Dqn::with_bonus_estimator`]; its signal is added to the environment
/// reward of stored transitions.
pub struct Dqn<E>
where
    E: Env<Obs = Vec<f32>, Act = usize>,
{
    core: AgentCore<E>,
    config: DqnConfig,
    qnet: Mlp,
    qnet_tgt: Mlp,
    replay_buffer: ReplayBuffer,
    explorer: DqnExplorer,
    bonus_fn: Option<BonusEstimatorFn>,
    bonus: Option<Box<dyn BonusEstimator>>,
    soft_update_counter: usize,
    n_opts: usize,
    rng: SmallRng,
}

impl<E> Dqn<E>
where
    E: Env<Obs = Vec<f32>, Act = usize>,
{
    /// Agent identifier.
    pub const NAME: &'static str = "DQN";

    /// Builds a DQN agent bound to the given environment.
    pub fn build(env: &SharedEnv<E>, config: DqnConfig) -> Self {
        let options = BindOptions::default()
            .copy_env(config.copy_env)
            .reseed_env(config.reseed_env)
            .seed(config.seed);
        let core = AgentCore::bind(env, &options);

        let (obs_dim, n_actions) =
            core.env(|env| (env.observation_space().dim(), env.action_space().n()));
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let model_config = MlpConfig::new(obs_dim, vec![config.hidden_dim], n_actions);
        let qnet = Mlp::build(&model_config, &mut rng);
        let qnet_tgt = qnet.clone();
        let replay_buffer = ReplayBuffer::new(config.replay_capacity, config.seed);
        let explorer = config.explorer.clone();

        Self {
            core,
            config,
            qnet,
            qnet_tgt,
            replay_buffer,
            explorer,
            bonus_fn: None,
            bonus: None,
            soft_update_counter: 0,
            n_opts: 0,
            rng,
        }
    }

    /// Builds the agent with the configuration in the YAML file of the given path.
    pub fn build_from_path(env: &SharedEnv<E>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::build(env, DqnConfig::load(path)?))
    }

    /// Injects an exploration-bonus estimator factory.
    ///
    /// The factory receives the observation and action spaces of the
    /// bound environment. It is invoked now and again on
    /// [`reset`](Agent::reset), so the estimator starts fresh with the
    /// rest of the agent.
    pub fn with_bonus_estimator(mut self, f: BonusEstimatorFn) -> Self {
        let bonus = self
            .core
            .env(|env| f(&env.observation_space(), &env.action_space()));
        self.bonus_fn = Some(f);
        self.bonus = Some(bonus);
        self
    }

    /// The number of optimization steps done so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn opt(&mut self) -> Result<f32> {
        let TransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_done,
        } = self.replay_buffer.batch(self.config.batch_size)?;
        let batch_size = obs.nrows();

        let q = self.qnet.forward(&obs);
        let q_next = self.qnet_tgt.forward(&next_obs);

        let mut grad = Array2::zeros(q.raw_dim());
        let mut loss = 0f32;
        for i in 0..batch_size {
            let max_next = q_next
                .row(i)
                .iter()
                .cloned()
                .fold(f32::NEG_INFINITY, f32::max);
            let tgt =
                reward[i] + (1.0 - is_done[i]) * self.config.discount_factor as f32 * max_next;
            let err = q[[i, act[i]]] - tgt;
            loss += err * err;
            grad[[i, act[i]]] = 2.0 * err / batch_size as f32;
        }

        self.qnet
            .backward_step(&obs, &grad, self.config.learning_rate as f32);

        self.soft_update_counter += 1;
        if self.soft_update_counter == self.config.soft_update_interval {
            self.soft_update_counter = 0;
            self.qnet_tgt.track(&self.qnet, self.config.tau as f32);
        }
        self.n_opts += 1;

        Ok(loss / batch_size as f32)
    }

    /// Runs one episode; returns its return, mean loss and length.
    fn run_episode(&mut self) -> Result<(f32, f32, usize)> {
        let mut obs = self.core.env(|env| env.reset())?;
        let mut episode_return = 0f32;
        let mut losses = Vec::new();
        let mut steps = 0;

        for _ in 0..self.config.horizon {
            let q = self.qnet.forward1(&Array1::from(obs.clone())).to_vec();
            let act = self.explorer.action(&q, &mut self.rng);
            let step = self.core.env(|env| env.step(&act));
            steps += 1;
            episode_return += step.reward;

            let mut reward = step.reward;
            if let Some(bonus) = self.bonus.as_mut() {
                bonus.update(&obs, act);
                reward += bonus.bonus(&obs, act);
            }

            self.replay_buffer.push(Transition {
                obs,
                act,
                next_obs: step.obs.clone(),
                reward,
                is_done: step.is_terminated,
            });
            obs = step.obs;

            if self.replay_buffer.len() >= self.config.min_transitions_warmup {
                losses.push(self.opt()?);
            }

            if step.is_terminated || step.is_truncated {
                break;
            }
        }

        let mean_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f32>() / losses.len() as f32
        };
        Ok((episode_return, mean_loss, steps))
    }
}

impl<E> Agent<E> for Dqn<E>
where
    E: Env<Obs = Vec<f32>, Act = usize>,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn core(&self) -> &AgentCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore<E> {
        &mut self.core
    }

    fn hyperparameters(&self) -> Vec<(String, String)> {
        describe_config(&self.config)
    }

    fn fit(&mut self) -> Result<Record> {
        let mut returns = Vec::with_capacity(self.config.n_episodes);
        let mut losses = Vec::with_capacity(self.config.n_episodes);

        for episode in 0..self.config.n_episodes {
            let (episode_return, mean_loss, steps) = self.run_episode()?;
            returns.push(episode_return);
            losses.push(mean_loss);

            let mut record = Record::empty();
            record.insert("episode", RecordValue::Scalar(episode as f32));
            record.insert("episode_return", RecordValue::Scalar(episode_return));
            record.insert("episode_steps", RecordValue::Scalar(steps as f32));
            self.core.write(record);
        }

        info!(
            "[{}] Finished fit of {} episodes, {} optimization steps",
            Self::NAME,
            self.config.n_episodes,
            self.n_opts
        );

        let mean_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f32>() / losses.len() as f32
        };
        let mut record = Record::empty();
        record.insert(
            "n_episodes",
            RecordValue::Scalar(self.config.n_episodes as f32),
        );
        record.insert("episode_returns", RecordValue::Array1(returns));
        record.insert("mean_loss", RecordValue::Scalar(mean_loss));
        record.insert("datetime", RecordValue::DateTime(Local::now()));
        Ok(record)
    }

    fn policy(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let q = self.qnet.forward1(&Array1::from(obs.clone())).to_vec();
        Ok(argmax(&q))
    }

    /// Rebuilds the networks, the replay buffer, the explorer and the
    /// bonus estimator from the stored configuration.
    fn reset(&mut self) {
        let (obs_dim, n_actions) = self
            .core
            .env(|env| (env.observation_space().dim(), env.action_space().n()));
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let model_config = MlpConfig::new(obs_dim, vec![self.config.hidden_dim], n_actions);

        self.qnet = Mlp::build(&model_config, &mut rng);
        self.qnet_tgt = self.qnet.clone();
        self.replay_buffer = ReplayBuffer::new(self.config.replay_capacity, self.config.seed);
        self.explorer = self.config.explorer.clone();
        self.soft_update_counter = 0;
        self.n_opts = 0;
        self.rng = rng;

        if let Some(f) = self.bonus_fn.as_ref() {
            self.bonus = Some(
                self.core
                    .env(|env| f(&env.observation_space(), &env.action_space())),
            );
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        bincode::serialize_into(File::create(path.join("qnet.bincode"))?, &self.qnet)?;
        bincode::serialize_into(File::create(path.join("qnet_tgt.bincode"))?, &self.qnet_tgt)?;
        info!("[{}] Saved the model in {}", Self::NAME, path.display());
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.qnet =
            bincode::deserialize_from(BufReader::new(File::open(path.join("qnet.bincode"))?))?;
        self.qnet_tgt =
            bincode::deserialize_from(BufReader::new(File::open(path.join("qnet_tgt.bincode"))?))?;
        info!("[{}] Loaded the model from {}", Self::NAME, path.display());
        Ok(())
    }

    fn sample_parameters(trial: &mut Trial) -> Result<ParamSet> {
        trial.suggest_log_float("learning_rate", 1e-4, 1e-1);
        trial.suggest_int("batch_size", 16, 128);
        trial.suggest_float("discount_factor", 0.9, 0.999);
        trial.suggest_float("tau", 0.001, 0.05);
        Ok(trial.params().clone())
    }
}
