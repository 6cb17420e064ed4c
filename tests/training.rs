use ml_achtung::ai::{DqnAgent, DqnConfig, DqnNetworkConfig, DqnPolicy, QValueModel};
use ml_achtung::checkpoint::{CheckpointManager, CheckpointManagerConfig};
use ml_achtung::game::{Action, ArenaConfig};
use ml_achtung::players::{Player, RandomPlayer};
use ml_achtung::training::{Trainer, TrainerConfig, TrainingEnv, TrainingMetrics};

fn small_agent() -> DqnAgent {
    let config = DqnConfig {
        batch_size: 2,
        min_replay_size: 4,
        replay_capacity: 128,
        target_update_interval: 8,
        ..Default::default()
    };
    DqnAgent::with_network(config, DqnNetworkConfig::new().with_hidden(16))
}

fn small_trainer() -> TrainerConfig {
    TrainerConfig {
        num_sessions: 2,
        episodes_per_session: 2,
        base_arena: 24,
        arena_growth: 0,
        max_arena: 24,
        max_decisions_per_episode: 30,
        eval_interval: 0,
        ..Default::default()
    }
}

#[test]
fn stepping_a_dead_learner_is_a_no_op() {
    let players: Vec<Box<dyn Player>> = vec![
        Box::new(RandomPlayer::with_seed(1)),
        Box::new(RandomPlayer::with_seed(2)),
    ];
    let mut env = TrainingEnv::with_seed(ArenaConfig::new(30, 30), players, 0, 6).unwrap();
    env.reset();

    let mut steps = 0;
    while !env.step(Action::Left, 0).done {
        steps += 1;
        assert!(steps < 10_000);
    }
    let ticks = env.env().ticks();
    let result = env.step(Action::Straight, 0);
    assert!(result.done);
    assert!(result.observation.is_none());
    assert_eq!(result.reward, 0.0);
    assert_eq!(env.env().ticks(), ticks);
}

#[test]
fn training_resumes_from_the_latest_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_config = CheckpointManagerConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let mut agent = small_agent();
    let mut metrics = TrainingMetrics::new();
    let trainer = Trainer::new(small_trainer(), ArenaConfig::default())
        .with_checkpoints(CheckpointManager::new(checkpoint_config.clone()).unwrap());
    trainer.train(&mut agent, 0, &mut metrics).unwrap();

    let manager = CheckpointManager::new(checkpoint_config.clone()).unwrap();
    let latest = manager.load_latest().unwrap();
    assert_eq!(latest.metadata.session, 1);
    assert_eq!(latest.rewards, metrics.reward_history());
    assert_eq!(manager.list_sessions().unwrap().len(), 2);

    // The stored network answers exactly like the live one.
    let env_players: Vec<Box<dyn Player>> = vec![
        Box::new(RandomPlayer::with_seed(3)),
        Box::new(RandomPlayer::with_seed(4)),
    ];
    let mut env = TrainingEnv::with_seed(ArenaConfig::new(24, 24), env_players, 0, 9).unwrap();
    let obs = env.reset();
    let stored = DqnPolicy::load_from_dir(&latest.path).unwrap();
    let live = agent.policy();
    let (a, b) = (stored.q_values(&obs), live.q_values(&obs));
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-5, "{a:?} vs {b:?}");
    }

    let mut resumed = small_agent();
    resumed.load_from_dir(&latest.path).unwrap();
    resumed.restore_training_state(&latest.training_state);
    assert_eq!(resumed.episode_count(), agent.episode_count());
    assert_eq!(resumed.epsilon(), agent.epsilon());

    let mut metrics = TrainingMetrics::with_history(latest.rewards);
    let trainer = Trainer::new(small_trainer(), ArenaConfig::default())
        .with_checkpoints(CheckpointManager::new(checkpoint_config.clone()).unwrap());
    trainer
        .train(&mut resumed, latest.metadata.session + 1, &mut metrics)
        .unwrap();
    let latest = manager.load_latest().unwrap();
    assert_eq!(latest.metadata.session, 3);
    assert_eq!(latest.rewards.len(), 8);
    assert_eq!(latest.training_state.episode_count, 8);
}
