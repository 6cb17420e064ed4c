use crate::game::{Action, ArenaState, Rules};

/// Read-only information a player may consult while choosing an action.
///
/// Players never hold a reference to the environment; everything they may
/// look at is passed in here for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Slot of the player being asked.
    pub player_id: usize,
    pub rules: &'a Rules,
    pub alive: &'a [bool],
}

impl ActionContext<'_> {
    /// Slots of every other player that is still alive, in slot order.
    pub fn living_opponents(&self) -> Vec<usize> {
        self.alive
            .iter()
            .enumerate()
            .filter(|&(i, &alive)| alive && i != self.player_id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Universal interface for every controller in the arena.
pub trait Player {
    /// Choose the next steering action from this player's own board view.
    ///
    /// Only ever called for living players.
    fn get_action(&mut self, ctx: &ActionContext<'_>, state: &ArenaState) -> Action;

    /// Return the player's display name.
    fn name(&self) -> &str;

    /// Smallest arena width and height this player can play on.
    fn min_arena_side(&self) -> usize {
        1
    }
}
