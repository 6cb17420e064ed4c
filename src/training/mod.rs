//! Training infrastructure: the `reset` / `step` arena wrapper, replay
//! buffer, metrics collection and the session-based DQN trainer.

pub mod environment;
pub mod metrics;
pub mod replay_buffer;
pub mod trainer;

pub use environment::{StepResult, TrainingEnv, SURVIVAL_REWARD};
pub use metrics::{EpisodeResult, TrainingMetrics};
pub use replay_buffer::{ReplayBuffer, Transition};
pub use trainer::{EvalReport, Trainer, TrainerConfig, TrainingSummary};
