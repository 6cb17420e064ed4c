#![recursion_limit = "256"]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ml_achtung::ai::DqnPolicy;
use ml_achtung::config::AppConfig;
use ml_achtung::game::{AchtungEnv, EnvMode, EpisodeSummary, PlaySettings, Renderer, MAX_PLAYERS};
use ml_achtung::players::{HumanInput, PlayerFactory, PlayerKind};
use ml_achtung::ui::TerminalRenderer;

/// Play Achtung die Kurve in the terminal.
#[derive(Parser)]
#[command(name = "ml_achtung", about = "Play Achtung die Kurve in the terminal")]
struct Cli {
    /// Comma-separated lineup: human, random, alpha_beta, neural
    #[arg(long, value_delimiter = ',', default_value = "human,random")]
    players: Vec<PlayerKind>,

    /// Override the arena width
    #[arg(long)]
    width: Option<usize>,

    /// Override the arena height
    #[arg(long)]
    height: Option<usize>,

    /// Search depth of alpha-beta players
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Checkpoint directory holding the network for neural players
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of rounds to play
    #[arg(long, default_value_t = 1)]
    rounds: usize,

    /// Run without the terminal UI (bots only, as fast as possible)
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // The UI owns the terminal: warnings only unless RUST_LOG says otherwise.
    let default_level = if cli.headless { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.players.is_empty() || cli.players.len() > MAX_PLAYERS {
        bail!("expected 1 to {MAX_PLAYERS} players, got {}", cli.players.len());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(width) = cli.width {
        config.arena.width = width;
    }
    if let Some(height) = cli.height {
        config.arena.height = height;
    }
    config.arena.validate().context("validating arena size")?;

    let mut factory = PlayerFactory::new(cli.depth);
    if let Some(dir) = &cli.model {
        let policy = DqnPolicy::load_from_dir(dir)
            .with_context(|| format!("loading model from {}", dir.display()))?;
        factory = factory.with_model(Arc::new(policy));
    }
    let lineup = factory.lineup(&cli.players).context("building players")?;
    let humans: Vec<HumanInput> = lineup
        .human_inputs
        .iter()
        .map(|(_, input)| input.clone())
        .collect();
    if cli.headless && !humans.is_empty() {
        bail!("human players need the terminal UI; drop --headless");
    }

    let mut env = AchtungEnv::new(config.arena.clone(), lineup.players, EnvMode::Interactive)
        .context("creating arena")?;
    info!(
        players = ?cli.players,
        width = config.arena.width,
        height = config.arena.height,
        "starting"
    );

    let results = if cli.headless {
        let settings = PlaySettings {
            max_frames: config.play.max_frames,
            ..PlaySettings::headless()
        };
        let mut results = Vec::with_capacity(cli.rounds);
        for _ in 0..cli.rounds {
            results.push(env.play(None, &settings)?);
        }
        results
    } else {
        play_in_terminal(&mut env, &config.play, humans, cli.rounds)?
    };

    print_results(&env, &results);
    Ok(())
}

/// Play rounds with the terminal UI. The terminal is restored before this
/// returns, whatever the outcome.
fn play_in_terminal(
    env: &mut AchtungEnv,
    settings: &PlaySettings,
    humans: Vec<HumanInput>,
    rounds: usize,
) -> Result<Vec<EpisodeSummary>> {
    let mut renderer =
        TerminalRenderer::new("Achtung die Kurve", humans).context("setting up terminal")?;
    let mut results = Vec::with_capacity(rounds);
    for round in 1..=rounds {
        renderer.set_title(format!("Achtung die Kurve  |  round {round}/{rounds}"));
        let summary = env.play(Some(&mut renderer as &mut dyn Renderer), settings)?;
        let aborted = summary.aborted;
        results.push(summary);
        if aborted || renderer.wait_for_key(Duration::from_secs(3))? {
            break;
        }
    }
    Ok(results)
}

fn print_results(env: &AchtungEnv, results: &[EpisodeSummary]) {
    for (round, summary) in results.iter().enumerate() {
        let best = summary.decision_counts.iter().copied().max().unwrap_or(0);
        let leaders: Vec<&str> = summary
            .decision_counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == best)
            .map(|(id, _)| env.player_name(id))
            .collect();
        let status = if summary.aborted { " (aborted)" } else { "" };
        println!(
            "Round {}{}: lasted longest: {} | ticks {} | decisions {:?}",
            round + 1,
            status,
            leaders.join(", "),
            summary.ticks,
            summary.decision_counts
        );
    }
}
