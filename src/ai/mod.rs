//! Learning side: observation encoding, the Q-network, and the DQN learner.

pub mod algorithms;
mod model;
pub mod networks;
pub mod observation;

pub use algorithms::{DqnAgent, DqnConfig, DqnPolicy};
pub use model::QValueModel;
pub use networks::{DqnNetwork, DqnNetworkConfig, MIN_ARENA_SIDE};
pub use observation::Observation;
