use super::board::{Board, Rgb};
use super::state::Position;
use crate::error::ArenaError;

/// Lifecycle of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Freshly reset, nothing simulated yet.
    Init,
    /// Interactive countdown showing starting headings.
    Intro,
    Running,
    /// No player is alive.
    Terminal,
}

/// Read-only snapshot handed to a [`Renderer`] once per frame.
pub struct FrameView<'a> {
    pub phase: Phase,
    /// Spectator board, painted with the unrotated palette.
    pub board: &'a Board,
    pub positions: &'a [Position],
    pub angles: &'a [f64],
    pub alive: &'a [bool],
    pub colors: &'a [Rgb],
    pub names: Vec<&'a str>,
    pub decision_counts: &'a [u32],
    pub frame: u64,
}

/// Rendering and input collaborator for interactive play.
///
/// The simulation never depends on one being present.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, view: &FrameView<'_>) -> Result<(), ArenaError>;

    /// Drain pending input events. Returns `true` when the user asked to quit.
    fn poll_quit(&mut self) -> Result<bool, ArenaError>;
}
