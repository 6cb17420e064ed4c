use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::alpha_beta::AlphaBetaPlayer;
use super::human::{HumanInput, HumanPlayer};
use super::neural::NeuralPlayer;
use super::player::Player;
use super::random::RandomPlayer;
use crate::ai::QValueModel;
use crate::error::ArenaError;

/// Controller variants that can be named in configuration or on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Human,
    Random,
    AlphaBeta,
    Neural,
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "h" => Ok(PlayerKind::Human),
            "random" | "r" => Ok(PlayerKind::Random),
            "alpha_beta" | "alphabeta" | "ab" => Ok(PlayerKind::AlphaBeta),
            "neural" | "dqn" | "d" => Ok(PlayerKind::Neural),
            other => Err(format!(
                "unknown player '{other}' (expected human, random, alpha_beta or neural)"
            )),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerKind::Human => "human",
            PlayerKind::Random => "random",
            PlayerKind::AlphaBeta => "alpha_beta",
            PlayerKind::Neural => "neural",
        };
        f.write_str(name)
    }
}

/// Players built from a list of kinds, plus the input handles of every
/// human among them in slot order.
pub struct Lineup {
    pub players: Vec<Box<dyn Player>>,
    pub human_inputs: Vec<(usize, HumanInput)>,
}

/// Builds players from [`PlayerKind`]s.
pub struct PlayerFactory {
    alpha_beta_depth: usize,
    model: Option<Arc<dyn QValueModel>>,
}

impl PlayerFactory {
    pub fn new(alpha_beta_depth: usize) -> Self {
        PlayerFactory {
            alpha_beta_depth,
            model: None,
        }
    }

    /// Model shared by every neural player this factory creates.
    pub fn with_model(mut self, model: Arc<dyn QValueModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Build one player. Humans get a fresh input handle, returned alongside.
    pub fn create(
        &self,
        kind: PlayerKind,
    ) -> Result<(Box<dyn Player>, Option<HumanInput>), ArenaError> {
        let player: Box<dyn Player> = match kind {
            PlayerKind::Human => {
                let input = HumanInput::new();
                let player: Box<dyn Player> = Box::new(HumanPlayer::new(input.clone()));
                return Ok((player, Some(input)));
            }
            PlayerKind::Random => Box::new(RandomPlayer::new()),
            PlayerKind::AlphaBeta => Box::new(AlphaBetaPlayer::new(self.alpha_beta_depth)),
            PlayerKind::Neural => {
                let model = self.model.clone().ok_or_else(|| {
                    ArenaError::InvalidConfig(
                        "a neural player needs a trained model (pass --model)".into(),
                    )
                })?;
                Box::new(NeuralPlayer::new(model))
            }
        };
        Ok((player, None))
    }

    pub fn lineup(&self, kinds: &[PlayerKind]) -> Result<Lineup, ArenaError> {
        let mut players = Vec::with_capacity(kinds.len());
        let mut human_inputs = Vec::new();
        for (slot, &kind) in kinds.iter().enumerate() {
            let (player, input) = self.create(kind)?;
            players.push(player);
            if let Some(input) = input {
                human_inputs.push((slot, input));
            }
        }
        Ok(Lineup {
            players,
            human_inputs,
        })
    }
}
