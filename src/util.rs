//! Utilities for interaction of agents and environments.
use crate::base::{Agent, Env};
use anyhow::Result;

/// Runs evaluation episodes of the agent's greedy policy on the given
/// environment and returns the cumulative reward of each episode.
///
/// The environment is driven directly, not through the agent's held
/// environment, so evaluation does not disturb training state.
pub fn eval<E, A>(env: &mut E, agent: &mut A, n_episodes: usize, horizon: usize) -> Result<Vec<f32>>
where
    E: Env,
    A: Agent<E>,
{
    let mut returns = Vec::with_capacity(n_episodes);
    for _ in 0..n_episodes {
        let mut obs = env.reset()?;
        let mut episode_return = 0f32;
        for _ in 0..horizon {
            let act = agent.policy(&obs)?;
            let step = env.step(&act);
            episode_return += step.reward;
            let done = step.is_done();
            obs = step.obs;
            if done {
                break;
            }
        }
        returns.push(episode_return);
    }
    Ok(returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        base::{AgentCore, BindOptions, SharedEnv, Step},
        record::Record,
        space::{BoxSpace, DiscreteSpace},
    };
    use std::{cell::RefCell, rc::Rc};

    /// Terminates after `limit` steps, paying -1 per step.
    struct ShortEnv {
        t: usize,
        limit: usize,
    }

    impl Env for ShortEnv {
        type Config = usize;
        type Obs = Vec<f32>;
        type Act = usize;

        fn build(config: &Self::Config, _seed: u64) -> Result<Self> {
            Ok(Self {
                t: 0,
                limit: *config,
            })
        }

        fn observation_space(&self) -> BoxSpace {
            BoxSpace::new(vec![0.0], vec![f32::MAX])
        }

        fn action_space(&self) -> DiscreteSpace {
            DiscreteSpace::new(2)
        }

        fn reset(&mut self) -> Result<Self::Obs> {
            self.t = 0;
            Ok(vec![0.0])
        }

        fn step(&mut self, _act: &Self::Act) -> Step<Self> {
            self.t += 1;
            Step::new(vec![self.t as f32], -1.0, self.t >= self.limit, false)
        }
    }

    struct ConstantAgent {
        core: AgentCore<ShortEnv>,
    }

    impl Agent<ShortEnv> for ConstantAgent {
        fn core(&self) -> &AgentCore<ShortEnv> {
            &self.core
        }

        fn core_mut(&mut self) -> &mut AgentCore<ShortEnv> {
            &mut self.core
        }

        fn hyperparameters(&self) -> Vec<(String, String)> {
            Vec::new()
        }

        fn fit(&mut self) -> Result<Record> {
            Ok(Record::empty())
        }

        fn policy(&mut self, _obs: &Vec<f32>) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_eval_returns_per_episode_and_stops_at_termination() {
        let env: SharedEnv<ShortEnv> = Rc::new(RefCell::new(ShortEnv::build(&3, 0).unwrap()));
        let mut agent = ConstantAgent {
            core: AgentCore::bind(&env, &BindOptions::default()),
        };

        // terminal state is reached before the horizon
        let mut eval_env = ShortEnv::build(&3, 0).unwrap();
        let returns = eval(&mut eval_env, &mut agent, 2, 100).unwrap();
        assert_eq!(returns, vec![-3.0, -3.0]);

        // the horizon cuts off episodes that never terminate
        let mut eval_env = ShortEnv::build(&1000, 0).unwrap();
        let returns = eval(&mut eval_env, &mut agent, 1, 5).unwrap();
        assert_eq!(returns, vec![-5.0]);
    }
}
