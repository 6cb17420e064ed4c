use super::action::Action;
use super::board::{Board, Rgb, HEAD_COLOR};
use super::config::ArenaConfig;
use super::state::{ArenaState, Position};

/// Distance from a player's center to its head pixel, in player radii.
pub const HEAD_OFFSET_FACTOR: f64 = 1.5;

/// Kinematics, drawing and collision rules shared by the simulation and by
/// players that look ahead. Immutable for the lifetime of an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    speed: f64,
    d_theta: f64,
    player_radius: u8,
    head_radius: u8,
}

impl Rules {
    pub fn from_config(config: &ArenaConfig) -> Self {
        Rules {
            speed: config.speed,
            d_theta: config.d_theta,
            player_radius: config.player_radius,
            head_radius: config.head_radius,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn d_theta(&self) -> f64 {
        self.d_theta
    }

    pub fn player_radius(&self) -> u8 {
        self.player_radius
    }

    pub fn head_radius(&self) -> u8 {
        self.head_radius
    }

    /// Heading after applying `action` once. No wraparound.
    pub fn turn(&self, angle: f64, action: Action) -> f64 {
        match action {
            Action::Right => angle - self.d_theta,
            Action::Left => angle + self.d_theta,
            Action::Straight => angle,
        }
    }

    /// Position after one tick at heading `angle`. Screen `y` points down.
    pub fn advance(&self, position: Position, angle: f64) -> Position {
        Position {
            x: position.x + angle.cos() * self.speed,
            y: position.y - angle.sin() * self.speed,
        }
    }

    /// Point checked for collisions, `1.5 * player_radius` ahead of the center.
    pub fn head_position(&self, position: Position, angle: f64) -> Position {
        let reach = self.player_radius as f64 * HEAD_OFFSET_FACTOR;
        Position {
            x: position.x + angle.cos() * reach,
            y: position.y - angle.sin() * reach,
        }
    }

    /// Whether a player at `position` heading `angle` hits a wall or any
    /// trail color painted on `state`'s board.
    ///
    /// The player's own trail counts too. Whether the freshly drawn body is
    /// ever reached depends on the radius/speed ratio and is not special-cased.
    pub fn collides(&self, position: Position, angle: f64, state: &ArenaState) -> bool {
        let head = self.head_position(position, angle);
        let (x, y) = (head.x.round(), head.y.round());
        if x < 0.0 || y < 0.0 {
            return true;
        }
        match state.board().get_pixel(x as usize, y as usize) {
            None => true,
            Some(pixel) => state.colors().contains(&pixel),
        }
    }

    /// Collision check for `player_id` using the position and heading stored
    /// in `state`.
    pub fn detect_collision(&self, player_id: usize, state: &ArenaState) -> bool {
        self.collides(state.position(player_id), state.angle(player_id), state)
    }

    /// Paint a player's head marker and body disk onto `board`.
    pub fn draw_player(&self, board: &mut Board, position: Position, angle: f64, body_color: Rgb) {
        let head = self.head_position(position, angle);
        board.draw_circle(HEAD_COLOR, head.as_tuple(), self.head_radius);
        board.draw_circle(body_color, position.as_tuple(), self.player_radius);
    }

    /// Hypothetical successor of `state` where only `player_id` moves once
    /// with `action`. The input state is left untouched.
    pub fn next_state(&self, player_id: usize, state: &ArenaState, action: Action) -> ArenaState {
        let mut next = state.clone();
        let angle = self.turn(state.angle(player_id), action);
        let position = self.advance(state.position(player_id), angle);
        next.set_angle(player_id, angle);
        next.set_position(player_id, position);
        let color = next.color(player_id);
        self.draw_player(next.board_mut(), position, angle, color);
        next
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::from_config(&ArenaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{BACKGROUND, RED, WHITE};
    use crate::game::state::rotated_palette;
    use std::f64::consts::PI;

    fn empty_state(width: usize, height: usize, players: usize) -> ArenaState {
        ArenaState::new(
            width,
            height,
            vec![Position::new(10.0, 10.0); players],
            vec![0.0; players],
            rotated_palette(0, players),
        )
    }

    #[test]
    fn test_turn_is_exact() {
        let rules = Rules::default();
        for &theta in &[0.0, 1.0, -3.7, 42.0] {
            assert_eq!(rules.turn(theta, Action::Right), theta - rules.d_theta());
            assert_eq!(rules.turn(theta, Action::Left), theta + rules.d_theta());
            assert_eq!(rules.turn(theta, Action::Straight), theta);
        }
    }

    #[test]
    fn test_angle_is_not_wrapped() {
        let rules = Rules::default();
        let mut angle = 0.0;
        for _ in 0..100 {
            angle = rules.turn(angle, Action::Left);
        }
        assert!(angle > 2.0 * PI);
    }

    #[test]
    fn test_advance_matches_formula() {
        let rules = Rules::default();
        let start = Position::new(50.0, 50.0);
        for &theta in &[0.0, PI / 2.0, PI, 0.3, -1.2] {
            let next = rules.advance(start, theta);
            assert_eq!(next.x, 50.0 + theta.cos() * rules.speed());
            assert_eq!(next.y, 50.0 - theta.sin() * rules.speed());
        }
    }

    #[test]
    fn test_advance_up_decreases_y() {
        let rules = Rules::default();
        let next = rules.advance(Position::new(5.0, 5.0), PI / 2.0);
        assert!((next.x - 5.0).abs() < 1e-12);
        assert!((next.y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_head_position_offset() {
        let rules = Rules::default();
        let head = rules.head_position(Position::new(20.0, 20.0), 0.0);
        assert_eq!(head, Position::new(23.0, 20.0));
    }

    #[test]
    fn test_collision_with_wall() {
        let rules = Rules::default();
        let state = empty_state(20, 20, 1);
        assert!(rules.collides(Position::new(18.5, 10.0), 0.0, &state));
        assert!(rules.collides(Position::new(1.0, 10.0), PI, &state));
        assert!(!rules.collides(Position::new(10.0, 10.0), 0.0, &state));
    }

    #[test]
    fn test_collision_with_trail() {
        let rules = Rules::default();
        let mut state = empty_state(30, 30, 2);
        state.board_mut().draw_circle(RED, (13.0, 10.0), 1);
        assert!(rules.collides(Position::new(10.0, 10.0), 0.0, &state));
    }

    #[test]
    fn test_head_marker_is_not_an_obstacle() {
        let rules = Rules::default();
        let mut state = empty_state(30, 30, 1);
        state.board_mut().draw_circle(HEAD_COLOR, (13.0, 10.0), 1);
        assert!(!rules.collides(Position::new(10.0, 10.0), 0.0, &state));
    }

    #[test]
    fn test_own_trail_counts() {
        let rules = Rules::default();
        let mut state = empty_state(30, 30, 1);
        state.board_mut().draw_circle(WHITE, (13.0, 10.0), 1);
        assert!(rules.detect_collision(0, &state));
    }

    #[test]
    fn test_next_state_leaves_input_untouched() {
        let rules = Rules::default();
        let state = empty_state(30, 30, 2);
        let next = rules.next_state(1, &state, Action::Left);

        assert_eq!(state.board().count_color(BACKGROUND), 900);
        assert_eq!(state.angle(1), 0.0);

        assert_eq!(next.angle(1), rules.d_theta());
        assert_eq!(next.position(0), state.position(0));
        assert!(next.board().count_color(next.color(1)) > 0);
        assert!(next.board().count_color(HEAD_COLOR) > 0);
    }

    #[test]
    fn test_next_state_does_not_self_collide() {
        let rules = Rules::default();
        let mut state = empty_state(40, 40, 1);
        for _ in 0..10 {
            state = rules.next_state(0, &state, Action::Straight);
            assert!(!rules.detect_collision(0, &state));
        }
    }
}
