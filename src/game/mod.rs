//! Arena simulation: per-player pixel boards, movement and collision rules,
//! the trail-blinking schedule and the frame loop that drives a round.

mod action;
pub mod board;
mod config;
mod env;
mod render;
mod rules;
mod state;

pub use action::Action;
pub use board::{Board, Rgb, BACKGROUND, HEAD_COLOR, PALETTE};
pub use config::{ArenaConfig, PlaySettings};
pub use env::{AchtungEnv, EnvMode, EpisodeSummary, PlayerStart, MAX_PLAYERS};
pub use render::{FrameView, Phase, Renderer};
pub use rules::Rules;
pub use state::{rotated_palette, ArenaState, Position};
