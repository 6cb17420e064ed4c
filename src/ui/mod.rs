//! Terminal front end: a ratatui arena view with a player status panel,
//! driven through the [`Renderer`](crate::game::Renderer) trait.

pub mod board_widget;
mod game_view;
mod terminal;

pub use game_view::heading_arrow;
pub use terminal::{InputRouter, KeyScheme, TerminalRenderer};
