use std::time::Instant;

use tracing::{debug, info, warn};

use crate::ai::DqnAgent;
use crate::checkpoint::{CheckpointManager, CheckpointMetadata, CheckpointMetrics};
use crate::error::{ArenaError, TrainingError};
use crate::game::ArenaConfig;
use crate::players::{NeuralPlayer, Player, PlayerFactory, PlayerKind};
use crate::training::environment::TrainingEnv;
use crate::training::metrics::{EpisodeResult, TimingMetrics, TrainingMetrics};
use crate::training::replay_buffer::Transition;

/// Slot the learner always occupies.
pub const LEARNER: usize = 0;
/// Slot that receives the self-play snapshot.
const SNAPSHOT_SLOT: usize = 1;

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_sessions: usize,
    pub episodes_per_session: usize,
    /// Total players in the arena, learner included.
    pub num_players: usize,
    /// Controller for every non-learner slot.
    pub opponent: PlayerKind,
    /// Replace slot 1 with a frozen copy of the previous session's network.
    pub self_play: bool,
    /// Side length of the arena in the first session.
    pub base_arena: usize,
    pub arena_growth: usize,
    /// Sessions between two growth steps.
    pub grow_every: usize,
    pub max_arena: usize,
    /// Episodes end here even if the learner is still alive.
    pub max_decisions_per_episode: u32,
    /// Episodes between progress log lines.
    pub log_interval: usize,
    /// Sessions between evaluations (0 disables them).
    pub eval_interval: usize,
    pub eval_episodes: usize,
    pub alpha_beta_depth: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_sessions: 1000,
            episodes_per_session: 20,
            num_players: 2,
            opponent: PlayerKind::Random,
            self_play: true,
            base_arena: 100,
            arena_growth: 50,
            grow_every: 200,
            max_arena: 250,
            max_decisions_per_episode: 5000,
            log_interval: 10,
            eval_interval: 10,
            eval_episodes: 20,
            alpha_beta_depth: 2,
        }
    }
}

impl TrainerConfig {
    /// Arena side length used in `session`.
    pub fn arena_size_for(&self, session: usize) -> usize {
        let steps = if self.grow_every == 0 {
            0
        } else {
            session / self.grow_every
        };
        (self.base_arena + self.arena_growth * steps).min(self.max_arena)
    }
}

/// Greedy evaluation against random opponents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    /// Share of rounds the learner survived (see [`Trainer::evaluate`]).
    pub survival_rate: f32,
    pub mean_decisions: f32,
}

/// What a call to [`Trainer::train`] got through.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub sessions: usize,
    pub episodes: usize,
    pub last_eval: Option<EvalReport>,
}

/// Session-based DQN trainer. The learner always sits in slot 0.
pub struct Trainer {
    config: TrainerConfig,
    arena: ArenaConfig,
    checkpoints: Option<CheckpointManager>,
}

impl Trainer {
    /// `arena` supplies every physical parameter except the size, which
    /// follows the session schedule.
    pub fn new(config: TrainerConfig, arena: ArenaConfig) -> Self {
        Trainer {
            config,
            arena,
            checkpoints: None,
        }
    }

    /// Save a checkpoint after every session.
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run `num_sessions` sessions starting at `first_session`. `metrics`
    /// carries the reward history of earlier sessions when resuming.
    pub fn train(
        &self,
        agent: &mut DqnAgent,
        first_session: usize,
        metrics: &mut TrainingMetrics,
    ) -> Result<TrainingSummary, TrainingError> {
        let size = self.config.arena_size_for(first_session);
        let mut env = TrainingEnv::new(
            self.arena_config(size),
            self.opponent_lineup()?,
            LEARNER,
        )?;
        let mut timing = TimingMetrics::new();
        let mut last_eval = None;
        let mut episodes = 0;

        info!(
            sessions = self.config.num_sessions,
            first_session,
            episodes_per_session = self.config.episodes_per_session,
            "starting DQN training"
        );

        let last_session = first_session + self.config.num_sessions;
        for session in first_session..last_session {
            let size = self.config.arena_size_for(session);
            if env.arena_size() != (size, size) {
                env.resize_arena(size, size)?;
                agent.clear_replay();
                info!(session, size, "arena resized, replay buffer cleared");
            }

            if self.config.self_play && session > 0 && env.env().num_players() > SNAPSHOT_SLOT {
                env.set_player(SNAPSHOT_SLOT, Box::new(NeuralPlayer::new(agent.policy())))?;
                debug!(session, "installed self-play snapshot");
            }

            let session_start = metrics.total_episodes();
            for _ in 0..self.config.episodes_per_session {
                let started = Instant::now();
                let result = self.play_episode(&mut env, agent, metrics);
                timing.record_episode_time(started.elapsed());
                metrics.record_episode(result);
                agent.end_episode();
                episodes += 1;

                if self.config.log_interval > 0 && episodes % self.config.log_interval == 0 {
                    let window = self.config.log_interval;
                    info!(
                        session,
                        episode = agent.episode_count(),
                        epsilon = format_args!("{:.3}", agent.epsilon()),
                        loss = format_args!("{:.4}", metrics.average_loss(window)),
                        mean_reward = format_args!("{:.1}", metrics.mean_reward(window)),
                        eps_per_sec = format_args!("{:.1}", timing.episodes_per_sec()),
                        "training progress"
                    );
                }
            }
            let session_episodes = metrics.total_episodes() - session_start;

            let eval_due = self.config.eval_interval > 0
                && (session + 1 - first_session) % self.config.eval_interval == 0;
            let eval = if eval_due {
                let report = self.evaluate(agent, size)?;
                info!(
                    session,
                    survival_rate = format_args!("{:.1}%", report.survival_rate * 100.0),
                    mean_decisions = format_args!("{:.1}", report.mean_decisions),
                    "evaluation vs random"
                );
                last_eval = Some(report);
                Some(report)
            } else {
                None
            };

            if let Some(manager) = &self.checkpoints {
                let metadata = CheckpointMetadata {
                    session,
                    timestamp: 0,
                    algorithm: "DQN".to_string(),
                    arena_width: size,
                    arena_height: size,
                    metrics: CheckpointMetrics {
                        mean_reward: metrics.mean_reward(session_episodes),
                        mean_decisions: metrics.mean_decisions(session_episodes),
                        survival_rate: eval.map(|e| e.survival_rate),
                        current_loss: agent.last_loss(),
                        training_steps: agent.step_count(),
                        episodes: agent.episode_count(),
                    },
                };
                let started = Instant::now();
                if let Err(e) = manager.save_session(agent, &metadata, metrics.reward_history()) {
                    warn!(session, error = %e, "checkpoint failed");
                }
                timing.record_overhead(started.elapsed());
            }
            timing.reset_window();
        }

        info!(episodes, "training complete");
        Ok(TrainingSummary {
            sessions: self.config.num_sessions,
            episodes,
            last_eval,
        })
    }

    /// One epsilon-greedy episode for the learner. Every decision is
    /// stored and may trigger a gradient step.
    fn play_episode(
        &self,
        env: &mut TrainingEnv,
        agent: &mut DqnAgent,
        metrics: &mut TrainingMetrics,
    ) -> EpisodeResult {
        let mut observation = env.reset();
        let mut total_reward = 0.0;
        let mut decisions = 0;

        loop {
            let action = agent.select_action(&observation, true);
            let step = env.step(action, LEARNER);
            total_reward += step.reward;
            decisions += 1;

            let transition = Transition {
                observation,
                action,
                reward: step.reward,
                next_observation: step.observation.clone(),
                done: step.done,
            };
            if let Some(loss) = agent.observe(transition) {
                metrics.record_update(loss);
            }

            let capped = decisions >= self.config.max_decisions_per_episode;
            match step.observation {
                Some(next) if !step.done && !capped => observation = next,
                _ => break,
            }
        }

        EpisodeResult {
            total_reward,
            decisions,
            survived: env.env().is_alive(LEARNER),
        }
    }

    /// Greedy rounds against random opponents on a `size` x `size` arena.
    /// Exploration and replay are left untouched.
    ///
    /// A round counts as survived when the learner outlives every opponent,
    /// or, alone in the arena, when it is still alive at the decision cap.
    pub fn evaluate(&self, agent: &mut DqnAgent, size: usize) -> Result<EvalReport, TrainingError> {
        let factory = PlayerFactory::new(self.config.alpha_beta_depth);
        let kinds = vec![PlayerKind::Random; self.config.num_players];
        let lineup = factory.lineup(&kinds)?;
        let mut env = TrainingEnv::new(self.arena_config(size), lineup.players, LEARNER)?;
        let solo = self.config.num_players == 1;

        let rounds = self.config.eval_episodes.max(1);
        let mut survived = 0;
        let mut total_decisions = 0u64;
        for _ in 0..rounds {
            let mut observation = env.reset();
            let mut decisions = 0;
            let won = loop {
                let action = agent.select_action(&observation, false);
                let step = env.step(action, LEARNER);
                decisions += 1;
                let next = match step.observation {
                    Some(next) if !step.done => next,
                    _ => break false,
                };
                if !solo && !env.opponents_alive(LEARNER) {
                    break true;
                }
                if decisions >= self.config.max_decisions_per_episode {
                    break solo;
                }
                observation = next;
            };
            if won {
                survived += 1;
            }
            total_decisions += u64::from(decisions);
        }

        Ok(EvalReport {
            survival_rate: survived as f32 / rounds as f32,
            mean_decisions: total_decisions as f32 / rounds as f32,
        })
    }

    fn arena_config(&self, size: usize) -> ArenaConfig {
        ArenaConfig {
            width: size,
            height: size,
            ..self.arena.clone()
        }
    }

    /// Opponents for the training arena. The learner's own slot gets a
    /// random controller that is never queried while the learner lives.
    fn opponent_lineup(&self) -> Result<Vec<Box<dyn Player>>, ArenaError> {
        if self.config.opponent == PlayerKind::Human || self.config.opponent == PlayerKind::Neural {
            return Err(ArenaError::InvalidConfig(format!(
                "training opponents can not be {}",
                self.config.opponent
            )));
        }
        let factory = PlayerFactory::new(self.config.alpha_beta_depth);
        let mut kinds = vec![self.config.opponent; self.config.num_players];
        kinds[LEARNER] = PlayerKind::Random;
        Ok(factory.lineup(&kinds)?.players)
    }
}
