use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

use crate::ai::observation::{CHANNELS, HEADING_FEATURES};
use crate::game::Action;

/// Smallest arena side that survives the three 2x2 max-pool stages.
pub const MIN_ARENA_SIDE: usize = 8;

/// Q-network over a raw arena image plus the player's heading.
///
/// ```text
/// Image:   [batch, 3, H, W]
/// Conv1:   3 -> 8,   3x3 same, max-pool 2x2, ReLU
/// Conv2:   8 -> 16,  3x3 same, max-pool 2x2, ReLU
/// Conv3:   16 -> 32, 3x3 same, max-pool 2x2, ReLU
/// Pool:    adaptive average to 8x8, flatten => 2048
/// FC1:     2048 -> hidden
/// Heading: [batch, 2] -> hidden (no bias), added to FC1
/// ReLU, FC2: hidden -> hidden, ReLU, dropout
/// Out:     hidden -> 3 (Q-values for Right, Left, Straight)
/// ```
///
/// The adaptive pool makes the parameter count independent of the arena
/// size, so the same weights keep working while the arena grows. Arenas must
/// be at least [`MIN_ARENA_SIDE`] pixels on each side.
#[derive(Module, Debug)]
pub struct DqnNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    max_pool: MaxPool2d,
    adaptive_pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    heading: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    dropout: Dropout,
    relu: Relu,
}

/// Architecture descriptor, persisted next to the weights.
#[derive(Config, Debug)]
pub struct DqnNetworkConfig {
    #[config(default = 100)]
    pub hidden: usize,
    #[config(default = 8)]
    pub pooled_size: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl DqnNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DqnNetwork<B> {
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };
        let flattened = 32 * self.pooled_size * self.pooled_size;
        DqnNetwork {
            conv1: conv([CHANNELS, 8]),
            conv2: conv([8, 16]),
            conv3: conv([16, 32]),
            max_pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            adaptive_pool: AdaptiveAvgPool2dConfig::new([self.pooled_size, self.pooled_size])
                .init(),
            fc1: LinearConfig::new(flattened, self.hidden).init(device),
            heading: LinearConfig::new(HEADING_FEATURES, self.hidden)
                .with_bias(false)
                .init(device),
            fc2: LinearConfig::new(self.hidden, self.hidden).init(device),
            out: LinearConfig::new(self.hidden, Action::COUNT).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> DqnNetwork<B> {
    /// Forward pass: image [batch, 3, H, W] and heading [batch, 2] -> [batch, 3] Q-values.
    pub fn forward(&self, image: Tensor<B, 4>, heading: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.max_pool.forward(self.conv1.forward(image)));
        let x = self.relu.forward(self.max_pool.forward(self.conv2.forward(x)));
        let x = self.relu.forward(self.max_pool.forward(self.conv3.forward(x)));
        let x = self.adaptive_pool.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 3);

        let x = self.fc1.forward(x) + self.heading.forward(heading);
        let x = self.relu.forward(x);
        let x = self.relu.forward(self.fc2.forward(x));
        let x = self.dropout.forward(x);
        self.out.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_network_output_shape() {
        let device = Default::default();
        let network = DqnNetworkConfig::new().init::<TestBackend>(&device);

        let image = Tensor::zeros([2, 3, 32, 32], &device);
        let heading = Tensor::zeros([2, 2], &device);
        let output = network.forward(image, heading);
        assert_eq!(output.shape().dims, [2, 3]);
    }

    #[test]
    fn test_network_accepts_any_arena_size() {
        let device = Default::default();
        let network = DqnNetworkConfig::new().init::<TestBackend>(&device);

        for (h, w) in [(64, 64), (40, 72)] {
            let image = Tensor::zeros([1, 3, h, w], &device);
            let heading = Tensor::zeros([1, 2], &device);
            assert_eq!(network.forward(image, heading).shape().dims, [1, 3]);
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = DqnNetworkConfig::new();
        assert_eq!(config.hidden, 100);
        assert_eq!(config.pooled_size, 8);
        assert_eq!(config.dropout, 0.5);
    }
}
