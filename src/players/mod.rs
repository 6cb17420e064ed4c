//! Controllers that steer a player: keyboard input, random, look-ahead
//! search and a learned Q-network.

mod alpha_beta;
mod factory;
mod human;
mod neural;
mod player;
mod random;

pub use alpha_beta::{AlphaBetaPlayer, Evaluation, RandomEvaluation, MAX_OPPONENT_REPLIES};
pub use factory::{Lineup, PlayerFactory, PlayerKind};
pub use human::{HumanInput, HumanPlayer};
pub use neural::{best_actions, NeuralPlayer};
pub use player::{ActionContext, Player};
pub use random::RandomPlayer;
