use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::ArenaState;

/// Number of color channels in an observation.
pub const CHANNELS: usize = 3;

/// Number of heading features fed alongside the pixels: `[cos, sin]`.
pub const HEADING_FEATURES: usize = 2;

/// What a learner sees: its own board, channel-first, plus its heading.
///
/// Dimensions are fixed for an episode but change when the arena grows.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub width: usize,
    pub height: usize,
    /// `3 x height x width` bytes, channel-first.
    pub pixels: Vec<u8>,
    pub heading: f64,
}

impl Observation {
    /// Capture `player_id`'s view of the arena from its own board.
    pub fn from_state(state: &ArenaState, player_id: usize) -> Self {
        let board = state.board();
        let (width, height) = (board.width(), board.height());
        let plane = width * height;
        let mut pixels = vec![0u8; CHANNELS * plane];
        for (idx, rgb) in board.pixels().iter().enumerate() {
            for (c, &value) in rgb.iter().enumerate() {
                pixels[c * plane + idx] = value;
            }
        }
        Observation {
            width,
            height,
            pixels,
            heading: state.angle(player_id),
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn pixels_flat(&self) -> impl Iterator<Item = f32> + '_ {
        self.pixels.iter().map(|&p| p as f32 / 255.0)
    }

    fn heading_flat(&self) -> [f32; HEADING_FEATURES] {
        [self.heading.cos() as f32, self.heading.sin() as f32]
    }
}

/// Encode one observation as a `[1, 3, H, W]` image and a `[1, 2]` heading tensor.
pub fn encode_observation<B: Backend>(
    obs: &Observation,
    device: &B::Device,
) -> (Tensor<B, 4>, Tensor<B, 2>) {
    encode_observations_batch(std::slice::from_ref(obs), device)
}

/// Encode observations of identical size as `[batch, 3, H, W]` and `[batch, 2]`.
///
/// Panics if the batch mixes arena sizes.
pub fn encode_observations_batch<B: Backend>(
    batch: &[Observation],
    device: &B::Device,
) -> (Tensor<B, 4>, Tensor<B, 2>) {
    let (width, height) = batch[0].dims();
    assert!(
        batch.iter().all(|o| o.dims() == (width, height)),
        "observation batch mixes arena sizes"
    );

    let mut images = Vec::with_capacity(batch.len() * CHANNELS * width * height);
    let mut headings = Vec::with_capacity(batch.len() * HEADING_FEATURES);
    for obs in batch {
        images.extend(obs.pixels_flat());
        headings.extend_from_slice(&obs.heading_flat());
    }

    let n = batch.len() as i32;
    let images = Tensor::<B, 1>::from_data(TensorData::from(images.as_slice()), device).reshape([
        n,
        CHANNELS as i32,
        height as i32,
        width as i32,
    ]);
    let headings = Tensor::<B, 1>::from_data(TensorData::from(headings.as_slice()), device)
        .reshape([n, HEADING_FEATURES as i32]);
    (images, headings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{rotated_palette, Position, HEAD_COLOR, PALETTE};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample_state(width: usize, height: usize) -> ArenaState {
        let mut state = ArenaState::new(
            width,
            height,
            vec![Position::new(2.0, 1.0), Position::new(5.0, 5.0)],
            vec![0.5, 1.0],
            rotated_palette(0, 2),
        );
        state.board_mut().set_pixel(2, 1, PALETTE[0]);
        state.board_mut().set_pixel(0, 3, HEAD_COLOR);
        state
    }

    #[test]
    fn test_observation_is_channel_first() {
        let obs = Observation::from_state(&sample_state(6, 4), 0);
        assert_eq!(obs.dims(), (6, 4));
        assert_eq!(obs.pixels.len(), 3 * 6 * 4);
        assert_eq!(obs.heading, 0.5);

        let plane = 24;
        // White pixel at (2, 1): all channels set.
        for c in 0..3 {
            assert_eq!(obs.pixels[c * plane + 6 + 2], 255);
        }
        // Green head marker at (0, 3): only channel 1.
        assert_eq!(obs.pixels[3 * 6], 0);
        assert_eq!(obs.pixels[plane + 3 * 6], 255);
        assert_eq!(obs.pixels[2 * plane + 3 * 6], 0);
    }

    #[test]
    fn test_heading_comes_from_owner() {
        let obs = Observation::from_state(&sample_state(6, 4), 1);
        assert_eq!(obs.heading, 1.0);
    }

    #[test]
    fn test_encode_observation_shapes_and_range() {
        let device = Default::default();
        let obs = Observation::from_state(&sample_state(6, 4), 0);
        let (image, heading) = encode_observation::<TestBackend>(&obs, &device);
        assert_eq!(image.shape().dims, [1, 3, 4, 6]);
        assert_eq!(heading.shape().dims, [1, 2]);

        let data: Vec<f32> = image.into_data().to_vec().unwrap();
        assert!(data.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(data[6 + 2], 1.0);

        let h: Vec<f32> = heading.into_data().to_vec().unwrap();
        assert!((h[0] - 0.5f32.cos()).abs() < 1e-6);
        assert!((h[1] - 0.5f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_encode_batch() {
        let device = Default::default();
        let a = Observation::from_state(&sample_state(8, 5), 0);
        let b = Observation::from_state(&sample_state(8, 5), 1);
        let (images, headings) = encode_observations_batch::<TestBackend>(&[a, b], &device);
        assert_eq!(images.shape().dims, [2, 3, 5, 8]);
        assert_eq!(headings.shape().dims, [2, 2]);
    }

    #[test]
    #[should_panic(expected = "mixes arena sizes")]
    fn test_encode_batch_rejects_mixed_sizes() {
        let device = Default::default();
        let a = Observation::from_state(&sample_state(8, 5), 0);
        let b = Observation::from_state(&sample_state(6, 4), 0);
        let _ = encode_observations_batch::<TestBackend>(&[a, b], &device);
    }
}
