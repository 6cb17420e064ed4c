use serde::{Deserialize, Serialize};

use super::board::MAX_RADIUS;
use crate::error::ArenaError;

/// Physical parameters of an arena, fixed for the lifetime of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Arena width in pixels
    pub width: usize,
    /// Arena height in pixels
    pub height: usize,
    /// Radius of the drawn body disk (1..=4)
    pub player_radius: u8,
    /// Radius of the head marker disk (1..=4)
    pub head_radius: u8,
    /// Distance travelled per tick
    pub speed: f64,
    /// Heading change per turning tick, in radians
    pub d_theta: f64,
    /// Length of a trail gap, in ticks
    pub no_draw_time: u32,
    /// Inclusive lower bound of the random drawing stretch before a gap
    pub draw_limit_min: u32,
    /// Exclusive upper bound of the random drawing stretch before a gap
    pub draw_limit_max: u32,
    /// Ticks between two action queries
    pub action_sampling_rate: u32,
    /// Spawn points keep `size / margin_factor` pixels away from the walls
    pub margin_factor: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            width: 100,
            height: 100,
            player_radius: 2,
            head_radius: 1,
            speed: 1.0,
            d_theta: 0.1,
            no_draw_time: 8,
            draw_limit_min: 100,
            draw_limit_max: 300,
            action_sampling_rate: 4,
            margin_factor: 10,
        }
    }
}

impl ArenaConfig {
    /// Create a configuration with a custom arena size
    pub fn new(width: usize, height: usize) -> Self {
        ArenaConfig {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.width == 0 || self.height == 0 {
            return Err(ArenaError::InvalidConfig(
                "arena width and height must be > 0".into(),
            ));
        }
        if !(1..=MAX_RADIUS).contains(&self.player_radius) {
            return Err(ArenaError::InvalidConfig(format!(
                "player_radius must be in 1..={MAX_RADIUS}"
            )));
        }
        if !(1..=MAX_RADIUS).contains(&self.head_radius) {
            return Err(ArenaError::InvalidConfig(format!(
                "head_radius must be in 1..={MAX_RADIUS}"
            )));
        }
        if self.speed.is_nan() || self.speed <= 0.0 {
            return Err(ArenaError::InvalidConfig("speed must be > 0".into()));
        }
        if !self.d_theta.is_finite() {
            return Err(ArenaError::InvalidConfig("d_theta must be finite".into()));
        }
        if self.action_sampling_rate == 0 {
            return Err(ArenaError::InvalidConfig(
                "action_sampling_rate must be >= 1".into(),
            ));
        }
        if self.draw_limit_min == 0 || self.draw_limit_min >= self.draw_limit_max {
            return Err(ArenaError::InvalidConfig(
                "draw limits must satisfy 0 < draw_limit_min < draw_limit_max".into(),
            ));
        }
        if self.margin_factor < 2 {
            return Err(ArenaError::InvalidConfig(
                "margin_factor must be >= 2".into(),
            ));
        }
        Ok(())
    }
}

/// Pacing and presentation settings for interactive play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaySettings {
    /// Frames spent showing the starting headings before the round starts
    pub intro_frames: u32,
    /// Frames at the start of a round during which boards are wiped every frame
    pub tryout_ticks: u64,
    /// Target duration of one frame when a renderer is attached
    pub frame_delay_ms: u64,
    /// Optional hard cap on the number of frames in a round
    pub max_frames: Option<u64>,
}

impl Default for PlaySettings {
    fn default() -> Self {
        PlaySettings {
            intro_frames: 30,
            tryout_ticks: 20,
            frame_delay_ms: 30,
            max_frames: None,
        }
    }
}

impl PlaySettings {
    /// No intro, no tryout, no pacing. Used for headless rounds.
    pub fn headless() -> Self {
        PlaySettings {
            intro_frames: 0,
            tryout_ticks: 0,
            frame_delay_ms: 0,
            max_frames: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        ArenaConfig::default().validate().expect("default arena is valid");
    }

    #[test]
    fn test_custom_size() {
        let config = ArenaConfig::new(150, 80);
        assert_eq!(config.width, 150);
        assert_eq!(config.height, 80);
        assert_eq!(config.player_radius, 2);
    }

    #[test]
    fn test_rejects_radius_out_of_range() {
        let mut config = ArenaConfig::default();
        config.player_radius = 5;
        assert!(config.validate().is_err());
        config.player_radius = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_sampling_rate() {
        let mut config = ArenaConfig::default();
        config.action_sampling_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_draw_limits() {
        let mut config = ArenaConfig::default();
        config.draw_limit_min = 300;
        config.draw_limit_max = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let mut config = ArenaConfig::default();
        config.speed = 0.0;
        assert!(config.validate().is_err());
        config.speed = f64::NAN;
        assert!(config.validate().is_err());
    }
}
