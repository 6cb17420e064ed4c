use std::f64::consts::FRAC_PI_4;

use crate::game::{FrameView, Phase};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::board_widget::{render_board, to_color};

const STATUS_WIDTH: u16 = 28;
const ARROWS: [&str; 8] = ["→", "↗", "↑", "↖", "←", "↙", "↓", "↘"];

pub fn render(frame: &mut Frame, view: &FrameView<'_>, title: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Arena + status
            Constraint::Length(3), // Controls
        ])
        .split(frame.area());

    render_header(frame, view, title, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(STATUS_WIDTH)])
        .split(chunks[1]);
    let arena = Block::default().borders(Borders::ALL).title("Arena");
    let inner = arena.inner(body[0]);
    frame.render_widget(arena, body[0]);
    render_board(frame, view.board, inner);
    render_status(frame, view, body[1]);

    render_controls(frame, chunks[2]);
}

/// Arrow closest to `angle`. Screen y grows downwards, so positive angles
/// turn counter-clockwise.
pub fn heading_arrow(angle: f64) -> &'static str {
    let sector = (angle / FRAC_PI_4).round().rem_euclid(8.0) as usize;
    ARROWS[sector % 8]
}

fn render_header(frame: &mut Frame, view: &FrameView<'_>, title: &str, area: Rect) {
    let (status, color) = match view.phase {
        Phase::Init | Phase::Intro => ("Get ready".to_string(), Color::Yellow),
        Phase::Running => (format!("Frame {}", view.frame), Color::Green),
        Phase::Terminal => ("Round over".to_string(), Color::Red),
    };

    let header = Paragraph::new(status)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));

    frame.render_widget(header, area);
}

fn render_status(frame: &mut Frame, view: &FrameView<'_>, area: Rect) {
    let mut lines = Vec::new();
    for (i, name) in view.names.iter().enumerate() {
        let color = view.colors.get(i).copied().map(to_color).unwrap_or(Color::Gray);
        let state = if view.alive[i] {
            Span::styled("alive", Style::default().fg(Color::Green))
        } else {
            Span::styled("dead ", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(vec![
            Span::styled("\u{25a0} ", Style::default().fg(color)),
            Span::styled(
                format!("{name:<10}"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            state,
            Span::raw(format!(" {}", heading_arrow(view.angles[i]))),
        ]));
        lines.push(Line::from(format!(
            "  decisions: {}",
            view.decision_counts[i]
        )));
    }

    let status =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Players"));
    frame.render_widget(status, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let keys = "←/→ steer  ↑/↓ straight  |  A/D W/S second player  |  Q/Esc: Quit";
    let controls = Paragraph::new(keys)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}
