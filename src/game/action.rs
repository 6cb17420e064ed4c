/// A steering decision. The discrete encoding (`0`, `1`, `2`) is part of the
/// public interface shared with learning agents and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Turn clockwise (angle decreases).
    Right,
    /// Turn counter-clockwise (angle increases).
    Left,
    #[default]
    Straight,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Right, Action::Left, Action::Straight];
    pub const COUNT: usize = 3;

    /// Discrete index: Right = 0, Left = 1, Straight = 2.
    pub fn index(self) -> usize {
        match self {
            Action::Right => 0,
            Action::Left => 1,
            Action::Straight => 2,
        }
    }

    /// Inverse of [`Action::index`]. Returns `None` for indices outside `0..3`.
    pub fn from_index(idx: usize) -> Option<Action> {
        match idx {
            0 => Some(Action::Right),
            1 => Some(Action::Left),
            2 => Some(Action::Straight),
            _ => None,
        }
    }

    /// Get action name for display
    pub fn name(self) -> &'static str {
        match self {
            Action::Right => "Right",
            Action::Left => "Left",
            Action::Straight => "Straight",
        }
    }

    /// Encode as a single byte, used by lock-free input handles.
    pub(crate) fn to_u8(self) -> u8 {
        self.index() as u8
    }

    pub(crate) fn from_u8(value: u8) -> Action {
        Action::from_index(value as usize).unwrap_or_default()
    }
}
