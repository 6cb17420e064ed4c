use serde::{Deserialize, Serialize};

use crate::ai::DqnConfig;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Mean total reward per episode in the session just finished.
    pub mean_reward: f32,
    /// Mean number of learner decisions per episode.
    pub mean_decisions: f32,
    /// Share of evaluation rounds the learner outlived every opponent, if evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survival_rate: Option<f32>,
    pub current_loss: f32,
    pub training_steps: usize,
    pub episodes: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub session: usize,
    pub timestamp: u64,
    pub algorithm: String,
    pub arena_width: usize,
    pub arena_height: usize,
    pub metrics: CheckpointMetrics,
}

/// DQN training state written to training_state.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnTrainingState {
    pub epsilon: f32,
    pub step_count: usize,
    pub episode_count: usize,
    pub config: DqnConfig,
}
