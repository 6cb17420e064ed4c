use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::player::{ActionContext, Player};
use crate::game::{Action, ArenaState};

/// Shared steering state for a human player.
///
/// The keyboard side writes the currently held direction, the player reads
/// it whenever the environment samples actions. Cloning shares the handle.
#[derive(Debug, Clone)]
pub struct HumanInput {
    action: Arc<AtomicU8>,
}

impl HumanInput {
    pub fn new() -> Self {
        HumanInput {
            action: Arc::new(AtomicU8::new(Action::Straight.to_u8())),
        }
    }

    pub fn set(&self, action: Action) {
        self.action.store(action.to_u8(), Ordering::Relaxed);
    }

    pub fn get(&self) -> Action {
        Action::from_u8(self.action.load(Ordering::Relaxed))
    }

    /// Stop steering.
    pub fn release(&self) {
        self.set(Action::Straight);
    }
}

impl Default for HumanInput {
    fn default() -> Self {
        Self::new()
    }
}

/// A keyboard-controlled player.
pub struct HumanPlayer {
    input: HumanInput,
}

impl HumanPlayer {
    pub fn new(input: HumanInput) -> Self {
        HumanPlayer { input }
    }
}

impl Player for HumanPlayer {
    fn get_action(&mut self, _ctx: &ActionContext<'_>, _state: &ArenaState) -> Action {
        self.input.get()
    }

    fn name(&self) -> &str {
        "Human"
    }
}
