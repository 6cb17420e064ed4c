use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

use super::player::{ActionContext, Player};
use crate::game::{Action, ArenaState, Rules};

/// Maximum number of joint opponent replies explored at each min ply.
pub const MAX_OPPONENT_REPLIES: usize = 3;

/// Scores a searched position from the point of view of `player_id`.
pub trait Evaluation {
    fn evaluate(&mut self, state: &ArenaState, player_id: usize) -> f64;
}

/// Placeholder evaluation: a uniform random value in `[0, 1)`.
pub struct RandomEvaluation {
    rng: StdRng,
}

impl RandomEvaluation {
    pub fn new() -> Self {
        RandomEvaluation {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RandomEvaluation {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluation for RandomEvaluation {
    fn evaluate(&mut self, _state: &ArenaState, _player_id: usize) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Depth-limited alpha-beta search.
///
/// The searching player maximizes. Every other living player is folded into
/// a single minimizing layer whose moves are a small random sample of the
/// opponents' joint actions. A branch ends when the depth runs out or the
/// searching player collides in the simulated state.
pub struct AlphaBetaPlayer {
    depth: usize,
    evaluation: Box<dyn Evaluation>,
    rng: StdRng,
}

impl AlphaBetaPlayer {
    pub fn new(depth: usize) -> Self {
        Self::with_evaluation(depth, Box::new(RandomEvaluation::new()))
    }

    pub fn with_evaluation(depth: usize, evaluation: Box<dyn Evaluation>) -> Self {
        AlphaBetaPlayer {
            depth,
            evaluation,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn alpha_beta(
        &mut self,
        ctx: &ActionContext<'_>,
        state: &ArenaState,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
    ) -> f64 {
        let me = ctx.player_id;
        if depth == 0 || ctx.rules.detect_collision(me, state) {
            return self.evaluation.evaluate(state, me);
        }

        if maximizing {
            let mut value = f64::NEG_INFINITY;
            for action in Action::ALL {
                let successor = ctx.rules.next_state(me, state, action);
                value = value.max(self.alpha_beta(ctx, &successor, depth - 1, alpha, beta, false));
                alpha = alpha.max(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        } else {
            let mut value = f64::INFINITY;
            for successor in self.opponent_replies(ctx, state) {
                value = value.min(self.alpha_beta(ctx, &successor, depth - 1, alpha, beta, true));
                beta = beta.min(value);
                if beta <= alpha {
                    break;
                }
            }
            value
        }
    }

    /// Successor states after a sample of joint opponent moves, with the
    /// living opponents applied in a freshly shuffled order.
    fn opponent_replies(&mut self, ctx: &ActionContext<'_>, state: &ArenaState) -> Vec<ArenaState> {
        let mut opponents = ctx.living_opponents();
        opponents.shuffle(&mut self.rng);

        let combos = joint_actions(opponents.len());
        let picks = MAX_OPPONENT_REPLIES.min(combos.len());
        index::sample(&mut self.rng, combos.len(), picks)
            .iter()
            .map(|i| apply_joint(ctx.rules, state, &opponents, &combos[i]))
            .collect()
    }
}

/// Every assignment of one action to each of `count` players. A single
/// empty assignment when `count` is zero.
fn joint_actions(count: usize) -> Vec<Vec<Action>> {
    let mut combos = vec![Vec::with_capacity(count)];
    for _ in 0..count {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                Action::ALL.into_iter().map(move |a| {
                    let mut next = prefix.clone();
                    next.push(a);
                    next
                })
            })
            .collect();
    }
    combos
}

fn apply_joint(
    rules: &Rules,
    state: &ArenaState,
    players: &[usize],
    actions: &[Action],
) -> ArenaState {
    let mut successor = state.clone();
    for (&player, &action) in players.iter().zip(actions) {
        successor = rules.next_state(player, &successor, action);
    }
    successor
}

impl Player for AlphaBetaPlayer {
    fn get_action(&mut self, ctx: &ActionContext<'_>, state: &ArenaState) -> Action {
        let mut best_action = Action::ALL[0];
        let mut best_value = f64::NEG_INFINITY;
        for action in Action::ALL {
            let successor = ctx.rules.next_state(ctx.player_id, state, action);
            let value = self.alpha_beta(
                ctx,
                &successor,
                self.depth,
                f64::NEG_INFINITY,
                f64::INFINITY,
                false,
            );
            if value > best_value {
                best_value = value;
                best_action = action;
            }
        }
        best_action
    }

    fn name(&self) -> &str {
        "AlphaBeta"
    }
}
