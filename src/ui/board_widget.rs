use crate::game::{Board, Rgb, BACKGROUND};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const HALF_BLOCK: &str = "\u{2580}";

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb[0], rgb[1], rgb[2])
}

/// Pixels per terminal column needed to fit `board` into `cols` x `rows`
/// cells, two pixel rows per cell.
pub fn scale_for(board: &Board, cols: u16, rows: u16) -> usize {
    let cols = usize::from(cols.max(1));
    let rows = usize::from(rows.max(1)) * 2;
    board.width().div_ceil(cols).max(board.height().div_ceil(rows)).max(1)
}

/// First non-background pixel in the `scale` x `scale` block at (x0, y0).
/// Keeps thin trails visible when the board is shrunk.
fn sample(board: &Board, x0: usize, y0: usize, scale: usize) -> Rgb {
    for y in y0..(y0 + scale).min(board.height()) {
        for x in x0..(x0 + scale).min(board.width()) {
            match board.get_pixel(x, y) {
                Some(color) if color != BACKGROUND => return color,
                _ => {}
            }
        }
    }
    BACKGROUND
}

/// Board as half-block text lines: the upper pixel row is the foreground,
/// the lower one the background of each cell.
pub fn board_lines(board: &Board, scale: usize) -> Vec<Line<'static>> {
    let cols = board.width().div_ceil(scale);
    let rows = board.height().div_ceil(scale * 2);
    (0..rows)
        .map(|row| {
            let spans: Vec<Span<'static>> = (0..cols)
                .map(|col| {
                    let x = col * scale;
                    let top = sample(board, x, row * 2 * scale, scale);
                    let bottom = sample(board, x, (row * 2 + 1) * scale, scale);
                    let style = Style::default().fg(to_color(top)).bg(to_color(bottom));
                    Span::styled(HALF_BLOCK, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Render the board, shrunk to fit `area` if needed.
pub fn render_board(frame: &mut Frame, board: &Board, area: Rect) {
    let scale = scale_for(board, area.width, area.height);
    frame.render_widget(Paragraph::new(board_lines(board, scale)), area);
}
