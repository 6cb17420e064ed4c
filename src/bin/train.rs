#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ml_achtung::ai::DqnAgent;
use ml_achtung::checkpoint::CheckpointManager;
use ml_achtung::config::AppConfig;
use ml_achtung::training::{Trainer, TrainingMetrics};

/// Train a DQN player in the Achtung arena.
#[derive(Parser)]
#[command(name = "train", about = "Train a DQN player in the Achtung arena")]
struct Cli {
    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training sessions
    #[arg(long)]
    sessions: Option<usize>,

    /// Override number of episodes per session
    #[arg(long)]
    episodes_per_session: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(sessions) = cli.sessions {
        app_config.training.num_sessions = sessions;
    }
    if let Some(episodes) = cli.episodes_per_session {
        app_config.training.episodes_per_session = episodes;
    }
    if let Some(lr) = cli.lr {
        app_config.dqn.learning_rate = lr;
    }
    if let Some(dir) = cli.checkpoint_dir {
        app_config.checkpoint.checkpoint_dir = dir;
    }
    app_config.validate().context("validating configuration")?;

    let manager = CheckpointManager::new(app_config.checkpoint.clone()).with_context(|| {
        format!(
            "creating checkpoint directory {}",
            app_config.checkpoint.checkpoint_dir.display()
        )
    })?;

    let mut agent = DqnAgent::new(app_config.dqn.clone());
    let mut first_session = 0;
    let mut metrics = TrainingMetrics::new();
    if cli.resume {
        match manager.load_latest() {
            Ok(data) => {
                agent
                    .load_from_dir(&data.path)
                    .with_context(|| format!("loading weights from {}", data.path.display()))?;
                agent.restore_training_state(&data.training_state);
                first_session = data.metadata.session + 1;
                metrics = TrainingMetrics::with_history(data.rewards);
                info!(
                    session = data.metadata.session,
                    episodes = data.training_state.episode_count,
                    epsilon = data.training_state.epsilon,
                    "resumed from checkpoint"
                );
            }
            Err(e) => warn!(error = %e, "no checkpoint to resume from, starting fresh"),
        }
    }

    let trainer = Trainer::new(app_config.training.clone(), app_config.arena.clone())
        .with_checkpoints(manager);
    let summary = trainer
        .train(&mut agent, first_session, &mut metrics)
        .context("training")?;

    match summary.last_eval {
        Some(eval) => info!(
            episodes = summary.episodes,
            survival_rate = format_args!("{:.1}%", eval.survival_rate * 100.0),
            mean_decisions = format_args!("{:.1}", eval.mean_decisions),
            "done"
        ),
        None => info!(episodes = summary.episodes, "done"),
    }
    Ok(())
}
