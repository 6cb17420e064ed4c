use std::sync::LazyLock;

/// One RGB pixel.
pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const RED: Rgb = [255, 0, 0];
pub const BLUE: Rgb = [0, 0, 255];
pub const YELLOW: Rgb = [255, 255, 0];
pub const GREEN: Rgb = [0, 255, 0];

/// Color of an empty arena pixel.
pub const BACKGROUND: Rgb = BLACK;
/// Color of the head marker drawn ahead of each player. Never a trail color.
pub const HEAD_COLOR: Rgb = GREEN;
/// Trail colors by player slot, before per-board rotation.
pub const PALETTE: [Rgb; 4] = [WHITE, RED, BLUE, YELLOW];

/// Largest disk radius with a precomputed pattern.
pub const MAX_RADIUS: u8 = 4;

/// Disk offsets for radii 1..=4, indexed by `radius - 1`.
static DISKS: LazyLock<[Vec<(i32, i32)>; MAX_RADIUS as usize]> =
    LazyLock::new(|| std::array::from_fn(|i| disk_offsets(i as i32 + 1)));

fn disk_offsets(radius: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Precomputed pixel offsets of a filled disk.
///
/// # Panics
/// If `radius` is outside `1..=4`.
pub fn disk(radius: u8) -> &'static [(i32, i32)] {
    assert!(
        (1..=MAX_RADIUS).contains(&radius),
        "disk radius must be in 1..={MAX_RADIUS}, got {radius}"
    );
    &DISKS[(radius - 1) as usize]
}

/// A `height x width` pixel grid. Row 0 is the top of the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Board {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the pixel at column `x`, row `y`, or `None` when out of bounds.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Paint the whole board with the background color.
    pub fn reset(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    /// Rasterize a disk of `radius` around a continuous `center`.
    ///
    /// Coordinates are rounded and then clamped into the board, so offsets past
    /// an edge pile up on the border row/column instead of being dropped.
    pub fn draw_circle(&mut self, color: Rgb, center: (f64, f64), radius: u8) {
        let max_x = self.width.saturating_sub(1) as f64;
        let max_y = self.height.saturating_sub(1) as f64;
        for &(dx, dy) in disk(radius) {
            let x = (center.0 + dx as f64).round().clamp(0.0, max_x) as usize;
            let y = (center.1 + dy as f64).round().clamp(0.0, max_y) as usize;
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Row-major view of all pixels.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Number of pixels equal to `color`.
    pub fn count_color(&self, color: Rgb) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }
}
