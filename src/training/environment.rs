use crate::ai::Observation;
use crate::error::ArenaError;
use crate::game::{AchtungEnv, Action, ArenaConfig, EnvMode};
use crate::players::Player;

/// Reward for every decision interval survived.
pub const SURVIVAL_REWARD: f32 = 1.0;

/// Outcome of one [`TrainingEnv::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// The player's view after the step. `None` if it was already dead.
    pub observation: Option<Observation>,
    pub reward: f32,
    /// The player is dead.
    pub done: bool,
}

impl StepResult {
    fn finished() -> Self {
        StepResult {
            observation: None,
            reward: 0.0,
            done: true,
        }
    }
}

/// `reset` / `step` wrapper around an [`AchtungEnv`] in training mode.
///
/// One player at a time is driven from outside; every other living player
/// keeps choosing its own actions.
pub struct TrainingEnv {
    env: AchtungEnv,
    learner: usize,
}

impl TrainingEnv {
    /// Wrap a fresh training-mode arena. `learner` is the slot whose
    /// observation [`TrainingEnv::reset`] returns.
    pub fn new(
        config: ArenaConfig,
        players: Vec<Box<dyn Player>>,
        learner: usize,
    ) -> Result<Self, ArenaError> {
        let env = AchtungEnv::new(config, players, EnvMode::Training)?;
        Self::wrap(env, learner)
    }

    pub fn with_seed(
        config: ArenaConfig,
        players: Vec<Box<dyn Player>>,
        learner: usize,
        seed: u64,
    ) -> Result<Self, ArenaError> {
        let env = AchtungEnv::with_seed(config, players, EnvMode::Training, seed)?;
        Self::wrap(env, learner)
    }

    fn wrap(env: AchtungEnv, learner: usize) -> Result<Self, ArenaError> {
        if learner >= env.num_players() {
            return Err(ArenaError::IllegalState(format!(
                "learner slot {learner} does not exist in a {}-player arena",
                env.num_players()
            )));
        }
        Ok(TrainingEnv { env, learner })
    }

    /// Start a new episode and return the learner's first observation.
    pub fn reset(&mut self) -> Observation {
        self.env.reset();
        self.observe(self.learner)
    }

    /// Drive `player_id` with `action` for one decision interval.
    ///
    /// Stepping a dead player changes nothing and reports it as done.
    pub fn step(&mut self, action: Action, player_id: usize) -> StepResult {
        match self.env.run_decision(player_id, action) {
            Err(_) => StepResult::finished(),
            Ok(()) => StepResult {
                observation: Some(self.observe(player_id)),
                reward: SURVIVAL_REWARD,
                done: !self.env.is_alive(player_id),
            },
        }
    }

    /// Current view of `player_id`.
    pub fn observe(&self, player_id: usize) -> Observation {
        Observation::from_state(self.env.state(player_id), player_id)
    }

    /// Change the arena size between episodes. Starts a new episode.
    pub fn resize_arena(&mut self, width: usize, height: usize) -> Result<(), ArenaError> {
        self.env.resize_arena(width, height)
    }

    /// Replace the controller in slot `player_id`.
    pub fn set_player(
        &mut self,
        player_id: usize,
        player: Box<dyn Player>,
    ) -> Result<(), ArenaError> {
        self.env.set_player(player_id, player)
    }

    pub fn learner(&self) -> usize {
        self.learner
    }

    pub fn arena_size(&self) -> (usize, usize) {
        (self.env.config().width, self.env.config().height)
    }

    /// Whether any player other than `player_id` is still alive.
    pub fn opponents_alive(&self, player_id: usize) -> bool {
        self.env
            .alive()
            .iter()
            .enumerate()
            .any(|(i, &alive)| alive && i != player_id)
    }

    pub fn env(&self) -> &AchtungEnv {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerStart, Position};
    use crate::players::RandomPlayer;

    fn random_players(n: usize) -> Vec<Box<dyn Player>> {
        (0..n)
            .map(|_| Box::new(RandomPlayer::with_seed(n as u64)) as Box<dyn Player>)
            .collect()
    }

    #[test]
    fn test_rejects_missing_learner_slot() {
        let result = TrainingEnv::new(ArenaConfig::default(), random_players(2), 2);
        assert!(matches!(result, Err(ArenaError::IllegalState(_))));
    }

    #[test]
    fn test_reset_returns_learner_view() {
        let mut env =
            TrainingEnv::with_seed(ArenaConfig::new(64, 48), random_players(2), 0, 9).unwrap();
        let obs = env.reset();
        assert_eq!(obs.dims(), (64, 48));
        assert_eq!(obs.heading, env.env().angles()[0]);
    }

    #[test]
    fn test_step_advances_one_decision_interval() {
        let config = ArenaConfig::new(200, 200);
        let rate = config.action_sampling_rate as u64;
        let mut env = TrainingEnv::new(config, random_players(1), 0).unwrap();
        env.reset();
        let result = env.step(Action::Straight, 0);
        assert_eq!(result.reward, SURVIVAL_REWARD);
        assert!(result.observation.is_some());
        assert_eq!(env.env().ticks(), rate);
    }

    #[test]
    fn test_step_reports_death() {
        let mut env = TrainingEnv::new(ArenaConfig::new(40, 40), random_players(1), 0).unwrap();
        // Three pixels from the right wall, facing it.
        let starts = [PlayerStart {
            position: Position::new(33.0, 20.0),
            angle: 0.0,
        }];
        env.env.reset_with_starts(&starts).unwrap();
        let result = env.step(Action::Straight, 0);
        assert!(result.done);
        assert_eq!(result.reward, SURVIVAL_REWARD);
        assert!(result.observation.is_some());

        let ticks = env.env().ticks();
        let after = env.step(Action::Left, 0);
        assert_eq!(after, StepResult::finished());
        assert_eq!(env.env().ticks(), ticks);
    }

    #[test]
    fn test_episode_terminates() {
        let mut env =
            TrainingEnv::with_seed(ArenaConfig::new(60, 60), random_players(2), 0, 4).unwrap();
        env.reset();
        let mut steps = 0;
        loop {
            let result = env.step(Action::Left, 0);
            steps += 1;
            if result.done {
                break;
            }
            assert!(steps < 10_000, "learner never died");
        }
        assert!(!env.env().is_alive(0));
    }

    #[test]
    fn test_resize_changes_observation_size() {
        let mut env = TrainingEnv::new(ArenaConfig::new(50, 50), random_players(2), 0).unwrap();
        env.resize_arena(80, 60).unwrap();
        assert_eq!(env.arena_size(), (80, 60));
        assert_eq!(env.reset().dims(), (80, 60));
    }

    #[test]
    fn test_set_player_swaps_controller() {
        let mut env = TrainingEnv::new(ArenaConfig::default(), random_players(2), 0).unwrap();
        env.set_player(1, Box::new(RandomPlayer::new())).unwrap();
        assert!(env.set_player(2, Box::new(RandomPlayer::new())).is_err());
    }
}
