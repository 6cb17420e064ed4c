mod dqn_network;

pub use dqn_network::{DqnNetwork, DqnNetworkConfig, MIN_ARENA_SIDE};
