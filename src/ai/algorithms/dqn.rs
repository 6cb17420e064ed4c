use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::ai::model::QValueModel;
use crate::ai::networks::{DqnNetwork, DqnNetworkConfig};
use crate::ai::observation::{encode_observation, encode_observations_batch, Observation};
use crate::checkpoint::DqnTrainingState;
use crate::error::CheckpointError;
use crate::game::Action;
use crate::players::best_actions;
use crate::training::replay_buffer::{ReplayBuffer, Transition};

pub type InferBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferBackend>;

/// File names inside a weights directory.
const Q_NETWORK_FILE: &str = "q_network";
const TARGET_NETWORK_FILE: &str = "target_network";
const ARCHITECTURE_FILE: &str = "architecture.json";

/// DQN hyperparameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay_episodes: usize,
    pub target_update_interval: usize,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub min_replay_size: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay_episodes: 500,
            target_update_interval: 500,
            batch_size: 32,
            replay_capacity: 20_000,
            min_replay_size: 500,
        }
    }
}

/// DQN learner with online + target networks, replay buffer, and Adam optimizer.
pub struct DqnAgent {
    q_network: DqnNetwork<TrainBackend>,
    target_network: DqnNetwork<InferBackend>,
    optimizer: OptimizerAdaptor<Adam, DqnNetwork<TrainBackend>, TrainBackend>,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    network_config: DqnNetworkConfig,
    device: <TrainBackend as Backend>::Device,
    epsilon: f32,
    step_count: usize,
    episode_count: usize,
    last_loss: f32,
    rng: StdRng,
}

impl DqnAgent {
    pub fn new(config: DqnConfig) -> Self {
        Self::with_network(config, DqnNetworkConfig::new())
    }

    pub fn with_network(config: DqnConfig, network_config: DqnNetworkConfig) -> Self {
        let device = Default::default();
        let q_network: DqnNetwork<TrainBackend> = network_config.init(&device);
        let target_network = q_network.valid();

        DqnAgent {
            q_network,
            target_network,
            optimizer: AdamConfig::new().init(),
            replay_buffer: ReplayBuffer::new(config.replay_capacity),
            epsilon: config.epsilon_start,
            config,
            network_config,
            device,
            step_count: 0,
            episode_count: 0,
            last_loss: 0.0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Epsilon-greedy when training, greedy otherwise.
    pub fn select_action(&mut self, obs: &Observation, training: bool) -> Action {
        if training && self.rng.random_range(0.0..1.0) < self.epsilon {
            return Action::ALL[self.rng.random_range(0..Action::COUNT)];
        }
        let values = q_values_of(&self.q_network.valid(), obs, &self.device);
        greedy(&values, &mut self.rng)
    }

    /// Store a transition and run one gradient step once the buffer is warm.
    /// Returns the loss when a step was taken.
    pub fn observe(&mut self, transition: Transition) -> Option<f32> {
        self.replay_buffer.push(transition);
        let threshold = self.config.min_replay_size.max(self.config.batch_size);
        if self.replay_buffer.len() >= threshold {
            let loss = self.train_step();
            self.last_loss = loss;
            Some(loss)
        } else {
            None
        }
    }

    /// Mark an episode as finished and decay epsilon.
    pub fn end_episode(&mut self) {
        self.episode_count += 1;
        self.decay_epsilon();
    }

    /// Forget every stored transition. Needed whenever observation sizes change.
    pub fn clear_replay(&mut self) {
        self.replay_buffer.clear();
    }

    /// Frozen inference copy of the online network.
    pub fn policy(&self) -> DqnPolicy {
        DqnPolicy {
            network: self.q_network.valid(),
            device: self.device.clone(),
        }
    }

    /// Perform one gradient update step from the replay buffer.
    fn train_step(&mut self) -> f32 {
        let batch = self.replay_buffer.sample(self.config.batch_size);
        let batch_size = batch.len();

        let observations: Vec<Observation> = batch.iter().map(|t| t.observation.clone()).collect();
        // Terminal transitions have no successor; their own observation fills
        // the slot and the bootstrap term is masked out below.
        let next_observations: Vec<Observation> = batch
            .iter()
            .map(|t| {
                t.next_observation
                    .clone()
                    .unwrap_or_else(|| t.observation.clone())
            })
            .collect();

        // Q(s, .) on the online network: [B, 3]
        let (images, headings) =
            encode_observations_batch::<TrainBackend>(&observations, &self.device);
        let q_all = self.q_network.forward(images, headings);

        let mut action_mask = vec![0.0f32; batch_size * Action::COUNT];
        for (i, t) in batch.iter().enumerate() {
            action_mask[i * Action::COUNT + t.action.index()] = 1.0;
        }
        let action_mask = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(action_mask.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, Action::COUNT as i32]);
        let q_taken = (q_all * action_mask).sum_dim(1);

        // Bootstrapped targets from the target network, no gradient.
        let (next_images, next_headings) =
            encode_observations_batch::<InferBackend>(&next_observations, &self.device);
        let next_q: Vec<f32> = self
            .target_network
            .forward(next_images, next_headings)
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction");

        let targets: Vec<f32> = batch
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if t.done {
                    t.reward
                } else {
                    let row = &next_q[i * Action::COUNT..(i + 1) * Action::COUNT];
                    let max_q = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    t.reward + self.config.gamma * max_q
                }
            })
            .collect();
        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(targets.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, 1]);

        let diff = q_taken - targets;
        let loss = (diff.clone() * diff).mean();
        let loss_val: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss tensor extraction")[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.step_count += 1;
        if self.step_count % self.config.target_update_interval == 0 {
            self.target_network = self.q_network.valid();
        }

        loss_val
    }

    /// Decay epsilon linearly over configured episodes.
    fn decay_epsilon(&mut self) {
        if self.config.epsilon_decay_episodes == 0 {
            self.epsilon = self.config.epsilon_end;
            return;
        }
        let progress =
            (self.episode_count as f32 / self.config.epsilon_decay_episodes as f32).min(1.0);
        self.epsilon = self.config.epsilon_start
            + (self.config.epsilon_end - self.config.epsilon_start) * progress;
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy evaluation).
    pub fn set_epsilon(&mut self, eps: f32) {
        self.epsilon = eps;
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn last_loss(&self) -> f32 {
        self.last_loss
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn network_config(&self) -> &DqnNetworkConfig {
        &self.network_config
    }

    /// Save both networks and the architecture descriptor to a directory.
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        self.network_config.save(dir.join(ARCHITECTURE_FILE))?;
        self.q_network
            .valid()
            .save_file(dir.join(Q_NETWORK_FILE), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
        self.target_network
            .clone()
            .save_file(dir.join(TARGET_NETWORK_FILE), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
        Ok(())
    }

    /// Load both networks from a directory written by [`DqnAgent::save_to_dir`].
    /// The stored architecture replaces the current one.
    pub fn load_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        let network_config = load_architecture(dir)?;

        self.q_network = network_config
            .init::<TrainBackend>(&self.device)
            .load_file(dir.join(Q_NETWORK_FILE), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        self.target_network = network_config
            .init::<InferBackend>(&self.device)
            .load_file(dir.join(TARGET_NETWORK_FILE), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        self.network_config = network_config;
        self.optimizer = AdamConfig::new().init();
        Ok(())
    }

    /// Export current training state for checkpointing.
    pub fn training_state(&self) -> DqnTrainingState {
        DqnTrainingState {
            epsilon: self.epsilon,
            step_count: self.step_count,
            episode_count: self.episode_count,
            config: self.config.clone(),
        }
    }

    /// Restore training state from a checkpoint. The replay buffer is rebuilt
    /// empty if its capacity changed.
    pub fn restore_training_state(&mut self, state: &DqnTrainingState) {
        self.epsilon = state.epsilon;
        self.step_count = state.step_count;
        self.episode_count = state.episode_count;
        if state.config.replay_capacity != self.config.replay_capacity {
            self.replay_buffer = ReplayBuffer::new(state.config.replay_capacity);
        }
        self.config = state.config.clone();
    }
}

/// Inference-only Q-network, used by neural players and self-play opponents.
#[derive(Debug, Clone)]
pub struct DqnPolicy {
    network: DqnNetwork<InferBackend>,
    device: <InferBackend as Backend>::Device,
}

impl DqnPolicy {
    /// Load the online network from a weights directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CheckpointError> {
        let device = Default::default();
        let network = load_architecture(dir)?
            .init::<InferBackend>(&device)
            .load_file(dir.join(Q_NETWORK_FILE), &DefaultRecorder::default(), &device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        Ok(DqnPolicy { network, device })
    }
}

impl QValueModel for DqnPolicy {
    fn q_values(&self, obs: &Observation) -> [f32; Action::COUNT] {
        q_values_of(&self.network, obs, &self.device)
    }
}

fn load_architecture(dir: &Path) -> Result<DqnNetworkConfig, CheckpointError> {
    let path = dir.join(ARCHITECTURE_FILE);
    DqnNetworkConfig::load(&path).map_err(|e| CheckpointError::ModelLoad(format!(
        "{}: {e}",
        path.display()
    )))
}

fn q_values_of(
    network: &DqnNetwork<InferBackend>,
    obs: &Observation,
    device: &<InferBackend as Backend>::Device,
) -> [f32; Action::COUNT] {
    let (image, heading) = encode_observation::<InferBackend>(obs, device);
    let values: Vec<f32> = network
        .forward(image, heading)
        .into_data()
        .to_vec()
        .expect("f32 tensor data extraction");
    let mut out = [0.0; Action::COUNT];
    out.copy_from_slice(&values[..Action::COUNT]);
    out
}

/// Highest-valued action, ties broken at random like [`crate::players::NeuralPlayer`].
fn greedy(values: &[f32; Action::COUNT], rng: &mut StdRng) -> Action {
    best_actions(values).choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(size: usize, heading: f64) -> Observation {
        let mut pixels = vec![0u8; 3 * size * size];
        pixels[size + 3] = 255;
        Observation {
            width: size,
            height: size,
            pixels,
            heading,
        }
    }

    fn transition(size: usize, done: bool) -> Transition {
        Transition {
            observation: observation(size, 0.0),
            action: Action::Left,
            reward: 1.0,
            next_observation: (!done).then(|| observation(size, 0.1)),
            done,
        }
    }

    fn small_config() -> DqnConfig {
        DqnConfig {
            batch_size: 2,
            min_replay_size: 4,
            target_update_interval: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_greedy_breaks_ties_at_random() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(greedy(&[0.0, 2.0, 1.0], &mut rng), Action::Left);
        assert_eq!(greedy(&[-1.0, -3.0, 0.5], &mut rng), Action::Straight);

        let mut seen = [false; Action::COUNT];
        for _ in 0..200 {
            seen[greedy(&[1.0, 1.0, 1.0], &mut rng).index()] = true;
        }
        assert_eq!(seen, [true; Action::COUNT]);

        for _ in 0..50 {
            let action = greedy(&[2.0, 0.0, 2.0], &mut rng);
            assert_ne!(action, Action::Left);
        }
    }

    #[test]
    fn test_select_action_greedy_is_stable() {
        let mut agent = DqnAgent::new(DqnConfig::default());
        agent.set_epsilon(0.0);
        let obs = observation(16, 0.3);
        let first = agent.select_action(&obs, true);
        for _ in 0..5 {
            assert_eq!(agent.select_action(&obs, false), first);
        }
    }

    #[test]
    fn test_observe_trains_once_warm() {
        let mut agent = DqnAgent::new(small_config());
        for _ in 0..3 {
            assert!(agent.observe(transition(16, false)).is_none());
        }
        let loss = agent.observe(transition(16, true));
        assert!(loss.is_some_and(f32::is_finite));
        assert_eq!(agent.step_count(), 1);
        agent.observe(transition(16, false));
        assert_eq!(agent.step_count(), 2);
    }

    #[test]
    fn test_clear_replay() {
        let mut agent = DqnAgent::new(small_config());
        agent.observe(transition(16, false));
        agent.observe(transition(16, false));
        assert_eq!(agent.replay_len(), 2);
        agent.clear_replay();
        assert_eq!(agent.replay_len(), 0);
    }

    #[test]
    fn test_epsilon_decay() {
        let mut agent = DqnAgent::new(DqnConfig {
            epsilon_start: 1.0,
            epsilon_end: 0.1,
            epsilon_decay_episodes: 100,
            ..Default::default()
        });
        for _ in 0..50 {
            agent.end_episode();
        }
        let expected = 1.0 + (0.1 - 1.0) * 0.5;
        assert!((agent.epsilon() - expected).abs() < 1e-5);

        for _ in 0..100 {
            agent.end_episode();
        }
        assert!((agent.epsilon() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_epsilon_decay_zero_episodes() {
        let mut agent = DqnAgent::new(DqnConfig {
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay_episodes: 0,
            ..Default::default()
        });
        agent.end_episode();
        assert!((agent.epsilon() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_policy_matches_agent() {
        let mut agent = DqnAgent::new(DqnConfig::default());
        agent.set_epsilon(0.0);
        let obs = observation(16, 1.2);
        let policy = agent.policy();
        let best = best_actions(&policy.q_values(&obs));
        assert!(best.contains(&agent.select_action(&obs, false)));
    }

    #[test]
    fn test_training_state_roundtrip() {
        let mut agent = DqnAgent::new(DqnConfig {
            learning_rate: 0.01,
            gamma: 0.9,
            ..Default::default()
        });
        agent.set_epsilon(0.42);
        let state = agent.training_state();

        let mut restored = DqnAgent::new(DqnConfig::default());
        restored.restore_training_state(&state);
        assert!((restored.epsilon() - 0.42).abs() < 1e-6);
        assert_eq!(restored.config().gamma, 0.9);
        assert_eq!(restored.config().learning_rate, 0.01);
    }

    #[test]
    fn test_save_and_load_weights() {
        let dir = tempfile::tempdir().unwrap();
        let agent = DqnAgent::new(DqnConfig::default());
        agent.save_to_dir(dir.path()).unwrap();
        assert!(dir.path().join("q_network.mpk").exists());
        assert!(dir.path().join("target_network.mpk").exists());
        assert!(dir.path().join("architecture.json").exists());

        let obs = observation(16, 0.7);
        let expected = agent.policy().q_values(&obs);

        let policy = DqnPolicy::load_from_dir(dir.path()).unwrap();
        assert_eq!(policy.q_values(&obs), expected);

        let mut other = DqnAgent::new(DqnConfig::default());
        other.load_from_dir(dir.path()).unwrap();
        assert_eq!(other.policy().q_values(&obs), expected);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DqnPolicy::load_from_dir(&dir.path().join("nope")).is_err());
    }
}
