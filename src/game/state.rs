use super::board::{Board, Rgb, PALETTE};

/// Continuous arena coordinate. `y` grows downward, matching board rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn as_tuple(self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Trail colors for the board owned by `owner` in an `n`-player game.
///
/// The base palette is rotated so that the owner always appears WHITE on
/// its own board: `colors[k] = PALETTE[(k - owner) mod n]`.
pub fn rotated_palette(owner: usize, n: usize) -> Vec<Rgb> {
    (0..n).map(|k| PALETTE[(k + n - owner % n) % n]).collect()
}

/// One player's view of the arena: a private board plus a copy of every
/// player's position and heading.
///
/// Cloning is a deep copy and is what the search player uses to build
/// hypothetical successors.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaState {
    board: Board,
    positions: Vec<Position>,
    angles: Vec<f64>,
    colors: Vec<Rgb>,
}

impl ArenaState {
    pub fn new(
        width: usize,
        height: usize,
        positions: Vec<Position>,
        angles: Vec<f64>,
        colors: Vec<Rgb>,
    ) -> Self {
        ArenaState {
            board: Board::new(width, height),
            positions,
            angles,
            colors,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn position(&self, player_id: usize) -> Position {
        self.positions[player_id]
    }

    pub fn angle(&self, player_id: usize) -> f64 {
        self.angles[player_id]
    }

    pub fn set_position(&mut self, player_id: usize, position: Position) {
        self.positions[player_id] = position;
    }

    pub fn set_angle(&mut self, player_id: usize, angle: f64) {
        self.angles[player_id] = angle;
    }

    /// Trail color of `player_id` as drawn on this board.
    pub fn color(&self, player_id: usize) -> Rgb {
        self.colors[player_id]
    }

    /// All trail colors on this board.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn num_players(&self) -> usize {
        self.positions.len()
    }

    /// Clear the board back to background.
    pub fn reset_arena(&mut self) {
        self.board.reset();
    }
}
