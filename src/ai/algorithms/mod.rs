mod dqn;

pub use dqn::{DqnAgent, DqnConfig, DqnPolicy, InferBackend, TrainBackend};
