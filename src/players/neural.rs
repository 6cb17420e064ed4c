use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use super::player::{ActionContext, Player};
use crate::ai::{Observation, QValueModel, MIN_ARENA_SIDE};
use crate::game::{Action, ArenaState};

/// Plays the greedy action of a Q-value model, breaking ties at random.
pub struct NeuralPlayer<M: QValueModel> {
    model: M,
    rng: StdRng,
}

impl<M: QValueModel> NeuralPlayer<M> {
    pub fn new(model: M) -> Self {
        NeuralPlayer {
            model,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(model: M, seed: u64) -> Self {
        NeuralPlayer {
            model,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

/// Actions whose value equals the maximum. Never empty.
pub fn best_actions(values: &[f32; Action::COUNT]) -> Vec<Action> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let best: Vec<Action> = Action::ALL
        .into_iter()
        .filter(|a| values[a.index()] == max)
        .collect();
    if best.is_empty() {
        // All NaN.
        Action::ALL.to_vec()
    } else {
        best
    }
}

impl<M: QValueModel> Player for NeuralPlayer<M> {
    fn get_action(&mut self, ctx: &ActionContext<'_>, state: &ArenaState) -> Action {
        let obs = Observation::from_state(state, ctx.player_id);
        let values = self.model.q_values(&obs);
        best_actions(&values)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "Neural"
    }

    fn min_arena_side(&self) -> usize {
        MIN_ARENA_SIDE
    }
}
