use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::error::ArenaError;
use crate::game::{Action, FrameView, Renderer};
use crate::players::HumanInput;

use super::game_view;

/// Keys steering one human player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    Arrows,
    Wasd,
}

impl KeyScheme {
    /// Schemes handed out to human players in slot order.
    pub const ALL: [KeyScheme; 2] = [KeyScheme::Arrows, KeyScheme::Wasd];

    pub fn action_for(self, code: KeyCode) -> Option<Action> {
        match (self, code) {
            (KeyScheme::Arrows, KeyCode::Left) => Some(Action::Left),
            (KeyScheme::Arrows, KeyCode::Right) => Some(Action::Right),
            (KeyScheme::Arrows, KeyCode::Up | KeyCode::Down) => Some(Action::Straight),
            (KeyScheme::Wasd, KeyCode::Char(c)) => match c.to_ascii_lowercase() {
                'a' => Some(Action::Left),
                'd' => Some(Action::Right),
                'w' | 's' => Some(Action::Straight),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Routes key events to human inputs.
///
/// A pressed direction is held until another key of the same scheme is
/// pressed, or until the key is released on terminals that report releases.
pub struct InputRouter {
    bindings: Vec<(KeyScheme, HumanInput)>,
}

impl InputRouter {
    /// Pair each input with a scheme. Inputs beyond the available schemes
    /// are rejected.
    pub fn new(inputs: Vec<HumanInput>) -> Result<Self, ArenaError> {
        if inputs.len() > KeyScheme::ALL.len() {
            return Err(ArenaError::InvalidConfig(format!(
                "at most {} human players can share a keyboard",
                KeyScheme::ALL.len()
            )));
        }
        Ok(InputRouter {
            bindings: KeyScheme::ALL.into_iter().zip(inputs).collect(),
        })
    }

    /// Apply one key event. Returns `true` on a quit request.
    pub fn handle(&self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Press
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        {
            return true;
        }
        for (scheme, input) in &self.bindings {
            if let Some(action) = scheme.action_for(key.code) {
                match key.kind {
                    KeyEventKind::Release if input.get() == action => input.release(),
                    KeyEventKind::Release => {}
                    _ => input.set(action),
                }
            }
        }
        false
    }
}

/// ratatui / crossterm renderer for interactive rounds.
///
/// Takes over the terminal on construction and restores it on drop.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input: InputRouter,
    title: String,
}

fn render_err(e: io::Error) -> ArenaError {
    ArenaError::Render(e.to_string())
}

impl TerminalRenderer {
    pub fn new(title: impl Into<String>, humans: Vec<HumanInput>) -> Result<Self, ArenaError> {
        let input = InputRouter::new(humans)?;
        enable_raw_mode().map_err(render_err)?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(render_err(e));
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(render_err(e));
            }
        };
        Ok(TerminalRenderer {
            terminal,
            input,
            title: title.into(),
        })
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Block until a key is pressed or `timeout` passes. Returns `true` on a
    /// quit request.
    pub fn wait_for_key(&mut self, timeout: Duration) -> Result<bool, ArenaError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !event::poll(remaining).map_err(render_err)? {
                return Ok(false);
            }
            if let Event::Key(key) = event::read().map_err(render_err)? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.input.handle(&key));
                }
            }
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &FrameView<'_>) -> Result<(), ArenaError> {
        let title = &self.title;
        self.terminal
            .draw(|f| game_view::render(f, view, title))
            .map_err(render_err)?;
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool, ArenaError> {
        while event::poll(Duration::ZERO).map_err(render_err)? {
            if let Event::Key(key) = event::read().map_err(render_err)? {
                if self.input.handle(&key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
