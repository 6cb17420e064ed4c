use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::player::{ActionContext, Player};
use crate::game::{Action, ArenaState};

/// A player that steers uniformly at random.
pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        RandomPlayer {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomPlayer {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn get_action(&mut self, _ctx: &ActionContext<'_>, _state: &ArenaState) -> Action {
        Action::ALL[self.rng.random_range(0..Action::COUNT)]
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{rotated_palette, Position, Rules};

    fn sample_state() -> ArenaState {
        ArenaState::new(
            20,
            20,
            vec![Position::new(10.0, 10.0)],
            vec![0.0],
            rotated_palette(0, 1),
        )
    }

    #[test]
    fn test_random_player_covers_all_actions() {
        let mut player = RandomPlayer::with_seed(11);
        let rules = Rules::default();
        let alive = [true];
        let ctx = ActionContext {
            player_id: 0,
            rules: &rules,
            alive: &alive,
        };
        let state = sample_state();

        let mut seen = [false; Action::COUNT];
        for _ in 0..200 {
            seen[player.get_action(&ctx, &state).index()] = true;
        }
        assert_eq!(seen, [true; Action::COUNT]);
    }

    #[test]
    fn test_random_player_name() {
        assert_eq!(RandomPlayer::new().name(), "Random");
    }
}
