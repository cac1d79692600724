//! Regression tests of the DQN agent on mountain car.
use bramble::{
    bonus::{DiscretizationCounter, RandomNetworkDistillation},
    dqn::EpsilonGreedy,
    envs::MountainCar,
    record::{Record, RecordValue, Recorder},
    util::eval,
    Agent, Dqn, DqnConfig, Env, SharedEnv,
};
use rand::{rngs::SmallRng, SeedableRng};
use std::{cell::RefCell, rc::Rc};
use tempdir::TempDir;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create_env() -> SharedEnv<MountainCar> {
    Rc::new(RefCell::new(MountainCar::new(0)))
}

fn create_config(n_episodes: usize) -> DqnConfig {
    DqnConfig::default()
        .n_episodes(n_episodes)
        .horizon(64)
        .batch_size(8)
        .min_transitions_warmup(16)
        .hidden_dim(16)
        .explorer(EpsilonGreedy::with_final_step(1000))
}

#[test]
fn test_dqn_agent() {
    init();
    let env = create_env();
    let mut agent = Dqn::build(&env, create_config(2)).with_bonus_estimator(Box::new(
        |observation_space, action_space| {
            Box::new(DiscretizationCounter::new(
                observation_space,
                action_space,
                0.25,
                1.0,
            ))
        },
    ));

    let record = agent.fit().unwrap();
    assert_eq!(record.get_array1("episode_returns").unwrap().len(), 2);
    assert_eq!(record.get_scalar("n_episodes").unwrap(), 2.0);

    let mut rng = SmallRng::seed_from_u64(0);
    let obs = env.borrow().observation_space().sample(&mut rng);
    let act = agent.policy(&obs).unwrap();
    assert!(env.borrow().action_space().contains(act));
}

#[test]
fn test_dqn_agent_rnd() {
    init();
    let env = create_env();
    let mut agent = Dqn::build(&env, create_config(2)).with_bonus_estimator(Box::new(
        |observation_space, action_space| {
            Box::new(RandomNetworkDistillation::new(
                observation_space,
                action_space,
            ))
        },
    ));

    agent.fit().unwrap();

    let mut rng = SmallRng::seed_from_u64(1);
    let obs = env.borrow().observation_space().sample(&mut rng);
    let act = agent.policy(&obs).unwrap();
    assert!(env.borrow().action_space().contains(act));
}

#[test]
fn test_dqn_holds_private_env_copy() {
    init();
    let env = create_env();
    let state_before = env.borrow().state();
    let mut agent = Dqn::build(&env, create_config(1));
    assert!(agent.core().holds_private_env());
    agent.fit().unwrap();
    assert_eq!(env.borrow().state(), state_before);
}

/// A recorder that shares its buffer with the test.
#[derive(Clone, Default)]
struct SharedRecorder(Rc<RefCell<Vec<Record>>>);

impl Recorder for SharedRecorder {
    fn write(&mut self, record: Record) {
        self.0.borrow_mut().push(record);
    }
}

#[test]
fn test_dqn_writer_receives_hyperparameters_and_episodes() {
    init();
    let env = create_env();
    let mut agent = Dqn::build(&env, create_config(2));

    let recorder = SharedRecorder::default();
    agent.set_writer(Some(Box::new(recorder.clone())));
    agent.fit().unwrap();

    let records = recorder.0.borrow();
    let n_tables = records
        .iter()
        .filter(|r| matches!(r.get("Hyperparameters"), Some(RecordValue::String(_))))
        .count();
    assert_eq!(n_tables, 1);
    let episodes: Vec<f32> = records
        .iter()
        .filter_map(|r| r.get_scalar("episode").ok())
        .collect();
    assert_eq!(episodes, vec![0.0, 1.0]);
}

#[test]
fn test_dqn_save_load_roundtrip() {
    init();
    let env = create_env();
    let mut agent = Dqn::build(&env, create_config(1));
    agent.fit().unwrap();

    let dir = TempDir::new("dqn_model").unwrap();
    agent.save(dir.path()).unwrap();

    let mut restored = Dqn::build(&env, create_config(1).seed(99));
    restored.load(dir.path()).unwrap();

    let mut rng = SmallRng::seed_from_u64(2);
    for _ in 0..10 {
        let obs = env.borrow().observation_space().sample(&mut rng);
        assert_eq!(
            agent.policy(&obs).unwrap(),
            restored.policy(&obs).unwrap()
        );
    }
}

#[test]
fn test_dqn_reset_restores_initial_policy() {
    init();
    let env = create_env();
    let mut fresh = Dqn::build(&env, create_config(1));
    let mut trained = Dqn::build(&env, create_config(1));
    trained.fit().unwrap();
    trained.reset();

    // after reset, the networks match a freshly built agent with the same seed
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..10 {
        let obs = env.borrow().observation_space().sample(&mut rng);
        assert_eq!(fresh.policy(&obs).unwrap(), trained.policy(&obs).unwrap());
    }
}

#[test]
fn test_dqn_random_search() {
    init();
    let env = create_env();

    let study = bramble::search::RandomSearch::new(2)
        .seed(11)
        .optimize(|trial| {
            let params = <Dqn<MountainCar> as Agent<MountainCar>>::sample_parameters(trial)?;
            let mut config = create_config(1);
            config.apply(&params)?;
            let mut agent = Dqn::build(&env, config);
            agent.fit()?;
            let mut eval_env = MountainCar::new(100);
            let returns = eval(&mut eval_env, &mut agent, 2, 64)?;
            Ok(returns.iter().sum::<f32>() / returns.len() as f32)
        })
        .unwrap();

    assert_eq!(study.n_trials, 2);
    assert!(study.best_params.contains_key("learning_rate"));
    assert!(study.best_value.is_finite());
}
