//! # ML Achtung
//!
//! An "Achtung, die Kurve!" light-cycle arena for one to four players, with
//! hand-written and learned controllers. Every player sees its own pixel
//! board in which it is drawn white; the learned player is a deep Q-network
//! trained with the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`]: Boards, rules, per-player arena state and the environment loop
//! - [`players`]: Human, random, alpha-beta and neural controllers
//! - [`ai`]: Observation encoding, the Q-network and the DQN learner
//! - [`training`]: `reset`/`step` wrapper, replay buffer, metrics, session trainer
//! - [`checkpoint`]: Session checkpoints with pruning and a `latest` link
//! - [`ui`]: Terminal renderer and keyboard input
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod players;
pub mod training;
pub mod ui;
