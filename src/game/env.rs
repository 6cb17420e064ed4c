use std::f64::consts::PI;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::action::Action;
use super::board::{BACKGROUND, HEAD_COLOR};
use super::config::{ArenaConfig, PlaySettings};
use super::render::{FrameView, Phase, Renderer};
use super::rules::Rules;
use super::state::{rotated_palette, ArenaState, Position};
use crate::error::ArenaError;
use crate::players::{ActionContext, Player};

/// Maximum number of players in one arena.
pub const MAX_PLAYERS: usize = 4;

/// Whether the environment may drive an interactive round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Interactive,
    /// Driven step by step by a learner; `play` is refused.
    Training,
}

/// Explicit spawn point for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStart {
    pub position: Position,
    pub angle: f64,
}

/// Outcome of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSummary {
    /// Sampling boundaries each player reached alive.
    pub decision_counts: Vec<u32>,
    /// Players still alive when the round ended.
    pub survivors: Vec<usize>,
    pub ticks: u64,
    /// The round was stopped by a quit request or a frame cap.
    pub aborted: bool,
}

/// Trail blinking: a player draws for a random stretch, then leaves a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrawSchedule {
    draw_counter: u32,
    no_draw_counter: u32,
    draw_limit: u32,
    drawing: bool,
}

impl DrawSchedule {
    fn new(draw_limit: u32) -> Self {
        DrawSchedule {
            draw_counter: 0,
            no_draw_counter: 0,
            draw_limit,
            drawing: true,
        }
    }

    fn advance(&mut self, no_draw_time: u32, next_limit: impl FnOnce() -> u32) {
        self.draw_counter += 1;
        if self.draw_counter >= self.draw_limit {
            self.drawing = false;
            self.no_draw_counter += 1;
            if self.no_draw_counter > no_draw_time {
                *self = DrawSchedule::new(next_limit());
            }
        }
    }
}

/// The arena simulation and its frame loop.
///
/// Owns the players, every per-player board view and all per-episode state.
/// Everything except the configuration and the players is rebuilt by
/// [`AchtungEnv::reset`].
pub struct AchtungEnv {
    config: ArenaConfig,
    rules: Rules,
    mode: EnvMode,
    players: Vec<Box<dyn Player>>,
    states: Vec<ArenaState>,
    positions: Vec<Position>,
    angles: Vec<f64>,
    actions: Vec<Action>,
    alive: Vec<bool>,
    schedules: Vec<DrawSchedule>,
    trail_lengths: Vec<u64>,
    decision_counts: Vec<u32>,
    frame: u64,
    ticks: u64,
    phase: Phase,
    rng: StdRng,
}

/// Reject arenas smaller than `player` can handle.
fn check_fits(config: &ArenaConfig, player: &dyn Player) -> Result<(), ArenaError> {
    let side = player.min_arena_side();
    if config.width < side || config.height < side {
        return Err(ArenaError::InvalidConfig(format!(
            "{} players need an arena of at least {side}x{side}, got {}x{}",
            player.name(),
            config.width,
            config.height
        )));
    }
    Ok(())
}

impl AchtungEnv {
    /// Build and reset an environment seeded from the OS.
    pub fn new(
        config: ArenaConfig,
        players: Vec<Box<dyn Player>>,
        mode: EnvMode,
    ) -> Result<Self, ArenaError> {
        Self::build(config, players, mode, StdRng::from_os_rng())
    }

    /// Build and reset an environment with a reproducible spawn sequence.
    pub fn with_seed(
        config: ArenaConfig,
        players: Vec<Box<dyn Player>>,
        mode: EnvMode,
        seed: u64,
    ) -> Result<Self, ArenaError> {
        Self::build(config, players, mode, StdRng::seed_from_u64(seed))
    }

    fn build(
        config: ArenaConfig,
        players: Vec<Box<dyn Player>>,
        mode: EnvMode,
        rng: StdRng,
    ) -> Result<Self, ArenaError> {
        if players.is_empty() || players.len() > MAX_PLAYERS {
            return Err(ArenaError::InvalidPlayerCount(players.len()));
        }
        config.validate()?;
        for player in &players {
            check_fits(&config, player.as_ref())?;
        }

        let mut env = AchtungEnv {
            rules: Rules::from_config(&config),
            config,
            mode,
            players,
            states: Vec::new(),
            positions: Vec::new(),
            angles: Vec::new(),
            actions: Vec::new(),
            alive: Vec::new(),
            schedules: Vec::new(),
            trail_lengths: Vec::new(),
            decision_counts: Vec::new(),
            frame: 0,
            ticks: 0,
            phase: Phase::Init,
            rng,
        };
        env.reset();
        Ok(env)
    }

    // --- Episode lifecycle ---

    /// Start a new episode from random spawn points and headings.
    pub fn reset(&mut self) {
        let starts = self.random_starts();
        self.reset_from(&starts);
    }

    /// Start a new episode from explicit spawn points.
    pub fn reset_with_starts(&mut self, starts: &[PlayerStart]) -> Result<(), ArenaError> {
        if starts.len() != self.players.len() {
            return Err(ArenaError::StartCount {
                expected: self.players.len(),
                got: starts.len(),
            });
        }
        self.reset_from(starts);
        Ok(())
    }

    /// Change the arena size and start a new episode. Only ever between episodes.
    pub fn resize_arena(&mut self, width: usize, height: usize) -> Result<(), ArenaError> {
        let config = ArenaConfig {
            width,
            height,
            ..self.config.clone()
        };
        config.validate()?;
        for player in &self.players {
            check_fits(&config, player.as_ref())?;
        }
        self.config = config;
        self.reset();
        Ok(())
    }

    fn random_starts(&mut self) -> Vec<PlayerStart> {
        let (w, h) = (self.config.width, self.config.height);
        let (x_lo, x_hi) = spawn_interval(w, self.config.margin_factor);
        let (y_lo, y_hi) = spawn_interval(h, self.config.margin_factor);
        (0..self.players.len())
            .map(|_| PlayerStart {
                position: Position {
                    x: x_lo + self.rng.random::<f64>() * (x_hi - x_lo),
                    y: y_lo + self.rng.random::<f64>() * (y_hi - y_lo),
                },
                angle: self.rng.random_range(0..16u32) as f64 * (0.125 * PI),
            })
            .collect()
    }

    fn reset_from(&mut self, starts: &[PlayerStart]) {
        let n = self.players.len();
        let (w, h) = (self.config.width, self.config.height);

        self.positions = starts.iter().map(|s| s.position).collect();
        self.angles = starts.iter().map(|s| s.angle).collect();
        self.states = (0..n)
            .map(|owner| {
                ArenaState::new(
                    w,
                    h,
                    self.positions.clone(),
                    self.angles.clone(),
                    rotated_palette(owner, n),
                )
            })
            .collect();
        self.actions = vec![Action::Straight; n];
        self.alive = vec![true; n];
        self.schedules = (0..n)
            .map(|_| DrawSchedule::new(self.random_draw_limit()))
            .collect();
        self.trail_lengths = vec![0; n];
        self.decision_counts = vec![0; n];
        self.frame = 0;
        self.ticks = 0;
        self.phase = Phase::Init;

        // Heading markers only; trails start empty.
        for state in &mut self.states {
            for i in 0..n {
                let head = self.rules.head_position(self.positions[i], self.angles[i]);
                state
                    .board_mut()
                    .draw_circle(HEAD_COLOR, head.as_tuple(), self.rules.head_radius());
            }
        }
    }

    fn random_draw_limit(&mut self) -> u32 {
        self.rng
            .random_range(self.config.draw_limit_min..self.config.draw_limit_max)
    }

    // --- Frame loop ---

    /// Advance one frame: on a sampling boundary query every living player,
    /// then run exactly one tick.
    pub fn run_frame(&mut self) {
        if self.phase == Phase::Terminal {
            return;
        }
        self.phase = Phase::Running;
        if self.frame % self.config.action_sampling_rate as u64 == 0 {
            self.sample_actions(None);
            self.credit_decisions();
        }
        self.tick();
        self.frame += 1;
    }

    /// One decision interval driven from outside: `player_id` is assigned
    /// `action`, every other living player chooses its own, then
    /// `action_sampling_rate` ticks run.
    pub fn run_decision(&mut self, player_id: usize, action: Action) -> Result<(), ArenaError> {
        if !self.is_alive(player_id) {
            return Err(ArenaError::DeadPlayer(player_id));
        }
        self.phase = Phase::Running;
        self.actions[player_id] = action;
        self.sample_actions(Some(player_id));
        self.credit_decisions();
        for _ in 0..self.config.action_sampling_rate {
            self.tick();
            self.frame += 1;
        }
        Ok(())
    }

    /// Ask one living player for an action without applying it.
    pub fn query_action(&mut self, player_id: usize) -> Result<Action, ArenaError> {
        if !self.is_alive(player_id) {
            return Err(ArenaError::DeadPlayer(player_id));
        }
        let ctx = ActionContext {
            player_id,
            rules: &self.rules,
            alive: &self.alive,
        };
        Ok(self.players[player_id].get_action(&ctx, &self.states[player_id]))
    }

    fn sample_actions(&mut self, skip: Option<usize>) {
        for (i, player) in self.players.iter_mut().enumerate() {
            if !self.alive[i] || skip == Some(i) {
                continue;
            }
            let ctx = ActionContext {
                player_id: i,
                rules: &self.rules,
                alive: &self.alive,
            };
            self.actions[i] = player.get_action(&ctx, &self.states[i]);
        }
    }

    fn credit_decisions(&mut self) {
        for (count, &alive) in self.decision_counts.iter_mut().zip(&self.alive) {
            if alive {
                *count += 1;
            }
        }
    }

    /// Advance the world by one physics step for every living player.
    pub fn tick(&mut self) {
        let n = self.players.len();

        for i in 0..n {
            if self.alive[i] {
                self.angles[i] = self.rules.turn(self.angles[i], self.actions[i]);
            }
        }

        for i in 0..n {
            if self.alive[i] {
                self.positions[i] = self.rules.advance(self.positions[i], self.angles[i]);
            }
        }

        for i in 0..n {
            if self.alive[i]
                && self
                    .rules
                    .collides(self.positions[i], self.angles[i], &self.states[i])
            {
                self.alive[i] = false;
                debug!(player = i, tick = self.ticks, "player collided");
            }
        }

        let no_draw_time = self.config.no_draw_time;
        let (min, max) = (self.config.draw_limit_min, self.config.draw_limit_max);
        for schedule in &mut self.schedules {
            let rng = &mut self.rng;
            schedule.advance(no_draw_time, || rng.random_range(min..max));
        }

        self.refresh_states();
        self.ticks += 1;

        if self.phase != Phase::Terminal && self.num_alive() == 0 {
            self.phase = Phase::Terminal;
            debug!(ticks = self.ticks, "episode finished");
        }
    }

    /// Redraw every living player onto every board. Each board paints player
    /// `i` in its own palette color, so the owner always sees itself white.
    fn refresh_states(&mut self) {
        for i in 0..self.players.len() {
            if !self.alive[i] {
                continue;
            }
            let (position, angle) = (self.positions[i], self.angles[i]);
            let drawing = self.schedules[i].drawing;
            for state in &mut self.states {
                state.set_position(i, position);
                state.set_angle(i, angle);
                let color = if drawing { state.color(i) } else { BACKGROUND };
                self.rules.draw_player(state.board_mut(), position, angle, color);
            }
            if drawing {
                self.trail_lengths[i] += 1;
            }
        }
    }

    /// Wipe every board back to background.
    pub fn clear_boards(&mut self) {
        for state in &mut self.states {
            state.reset_arena();
        }
    }

    /// Run a full interactive round.
    ///
    /// With a renderer attached the round starts with an intro, frames are
    /// paced to `settings.frame_delay_ms`, and a quit request aborts at once.
    /// Without one the round runs as fast as possible.
    pub fn play(
        &mut self,
        mut renderer: Option<&mut dyn Renderer>,
        settings: &PlaySettings,
    ) -> Result<EpisodeSummary, ArenaError> {
        if self.mode == EnvMode::Training {
            return Err(ArenaError::IllegalState(
                "can not play in training mode; build the environment in interactive mode".into(),
            ));
        }
        if self.phase != Phase::Init {
            self.reset();
        }
        let frame_delay = Duration::from_millis(settings.frame_delay_ms);

        if let Some(r) = renderer.as_deref_mut() {
            self.phase = Phase::Intro;
            for _ in 0..settings.intro_frames {
                r.render(&self.frame_view())?;
                if r.poll_quit()? {
                    return Ok(self.summary(true));
                }
                std::thread::sleep(frame_delay);
            }
        }
        self.phase = Phase::Running;

        while !self.is_terminal() {
            if settings.max_frames.is_some_and(|max| self.frame >= max) {
                return Ok(self.summary(true));
            }
            let start = Instant::now();
            if self.frame < settings.tryout_ticks {
                self.clear_boards();
            }
            if let Some(r) = renderer.as_deref_mut() {
                if r.poll_quit()? {
                    return Ok(self.summary(true));
                }
            }

            self.run_frame();

            if let Some(r) = renderer.as_deref_mut() {
                r.render(&self.frame_view())?;
                if let Some(rest) = frame_delay.checked_sub(start.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }

        let summary = self.summary(false);
        info!(
            survivors = ?summary.survivors,
            ticks = summary.ticks,
            "round finished"
        );
        Ok(summary)
    }

    /// Snapshot of the round so far.
    pub fn summary(&self, aborted: bool) -> EpisodeSummary {
        EpisodeSummary {
            decision_counts: self.decision_counts.clone(),
            survivors: self.survivors(),
            ticks: self.ticks,
            aborted,
        }
    }

    /// Read-only view for renderers.
    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            phase: self.phase,
            board: self.states[0].board(),
            positions: &self.positions,
            angles: &self.angles,
            alive: &self.alive,
            colors: self.states[0].colors(),
            names: self.players.iter().map(|p| p.name()).collect(),
            decision_counts: &self.decision_counts,
            frame: self.frame,
        }
    }

    // --- Player management ---

    /// Swap the controller in slot `player_id`.
    pub fn set_player(
        &mut self,
        player_id: usize,
        player: Box<dyn Player>,
    ) -> Result<(), ArenaError> {
        check_fits(&self.config, player.as_ref())?;
        match self.players.get_mut(player_id) {
            Some(slot) => {
                *slot = player;
                Ok(())
            }
            None => Err(ArenaError::IllegalState(format!(
                "no player slot {player_id} in a {}-player arena",
                self.players.len()
            ))),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn mode(&self) -> EnvMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn player_name(&self, player_id: usize) -> &str {
        self.players[player_id].name()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Actions that the next tick will apply.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn alive(&self) -> &[bool] {
        &self.alive
    }

    pub fn is_alive(&self, player_id: usize) -> bool {
        self.alive.get(player_id).copied().unwrap_or(false)
    }

    pub fn num_alive(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    pub fn survivors(&self) -> Vec<usize> {
        (0..self.alive.len()).filter(|&i| self.alive[i]).collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    /// Board view owned by `player_id`.
    pub fn state(&self, player_id: usize) -> &ArenaState {
        &self.states[player_id]
    }

    pub fn states(&self) -> &[ArenaState] {
        &self.states
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks during which `player_id` left a visible trail.
    pub fn trail_length(&self, player_id: usize) -> u64 {
        self.trail_lengths[player_id]
    }

    pub fn decision_counts(&self) -> &[u32] {
        &self.decision_counts
    }

    /// Whether `player_id` is currently leaving a trail (false during a gap).
    pub fn is_drawing(&self, player_id: usize) -> bool {
        self.schedules[player_id].drawing
    }
}

/// Half-open spawn interval `[size / margin_factor, size - size / margin_factor)`.
fn spawn_interval(size: usize, margin_factor: usize) -> (f64, f64) {
    let margin = (size / margin_factor) as f64;
    (margin, size as f64 - margin)
}
