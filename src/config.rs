use std::path::Path;

use tracing::warn;

use crate::ai::{DqnConfig, MIN_ARENA_SIDE};
use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;
use crate::game::{ArenaConfig, PlaySettings, MAX_PLAYERS};
use crate::training::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub arena: ArenaConfig,
    pub play: PlaySettings,
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena
            .validate()
            .map_err(|e| ConfigError::Validation(format!("arena: {e}")))?;

        if self.dqn.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "dqn.learning_rate must be > 0".into(),
            ));
        }
        if self.dqn.batch_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.batch_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.gamma) {
            return Err(ConfigError::Validation(
                "dqn.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_start) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_end) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_end must be in [0, 1]".into(),
            ));
        }
        if self.dqn.epsilon_end > self.dqn.epsilon_start {
            return Err(ConfigError::Validation(
                "dqn.epsilon_end must be <= dqn.epsilon_start".into(),
            ));
        }
        if self.dqn.target_update_interval == 0 {
            return Err(ConfigError::Validation(
                "dqn.target_update_interval must be > 0".into(),
            ));
        }
        if self.dqn.replay_capacity < self.dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.replay_capacity must be >= dqn.batch_size".into(),
            ));
        }
        if self.dqn.min_replay_size < self.dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.min_replay_size must be >= dqn.batch_size".into(),
            ));
        }

        let training = &self.training;
        if training.num_sessions == 0 {
            return Err(ConfigError::Validation(
                "training.num_sessions must be > 0".into(),
            ));
        }
        if training.episodes_per_session == 0 {
            return Err(ConfigError::Validation(
                "training.episodes_per_session must be > 0".into(),
            ));
        }
        if !(1..=MAX_PLAYERS).contains(&training.num_players) {
            return Err(ConfigError::Validation(format!(
                "training.num_players must be in 1..={MAX_PLAYERS}"
            )));
        }
        if training.base_arena < MIN_ARENA_SIDE {
            return Err(ConfigError::Validation(format!(
                "training.base_arena must be >= {MIN_ARENA_SIDE}"
            )));
        }
        if training.max_arena < training.base_arena {
            return Err(ConfigError::Validation(
                "training.max_arena must be >= training.base_arena".into(),
            ));
        }
        if training.max_decisions_per_episode == 0 {
            return Err(ConfigError::Validation(
                "training.max_decisions_per_episode must be > 0".into(),
            ));
        }
        if training.eval_interval > 0 && training.eval_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.eval_episodes must be > 0 when evaluation is enabled".into(),
            ));
        }

        if self.checkpoint.keep_last_n == 0 {
            return Err(ConfigError::Validation(
                "checkpoint.keep_last_n must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::PlayerKind;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[arena]
width = 150

[training]
opponent = "alpha_beta"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.arena.width, 150);
        assert_eq!(config.arena.height, 100);
        assert_eq!(config.training.opponent, PlayerKind::AlphaBeta);
        assert!((config.dqn.gamma - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(config.arena, default.arena);
        assert_eq!(config.training, default.training);
        assert_eq!(config.checkpoint, default.checkpoint);
    }

    #[test]
    fn test_validation_rejects_bad_arena() {
        let mut config = AppConfig::default();
        config.arena.player_radius = 9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("arena"));
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.dqn.learning_rate = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_gamma() {
        let mut config = AppConfig::default();
        config.dqn.gamma = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_epsilon_end_gt_start() {
        let mut config = AppConfig::default();
        config.dqn.epsilon_start = 0.1;
        config.dqn.epsilon_end = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_min_replay_lt_batch() {
        let mut config = AppConfig::default();
        config.dqn.min_replay_size = 10;
        config.dqn.batch_size = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_player_counts() {
        let mut config = AppConfig::default();
        config.training.num_players = 0;
        assert!(config.validate().is_err());
        config.training.num_players = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_tiny_or_shrinking_arena() {
        let mut config = AppConfig::default();
        config.training.base_arena = 4;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.max_arena = config.training.base_arena - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_sessions() {
        let mut config = AppConfig::default();
        config.training.num_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training, TrainerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
num_sessions = 12

[play]
max_frames = 500
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.num_sessions, 12);
        assert_eq!(config.play.max_frames, Some(500));
        assert!((config.dqn.learning_rate - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[dqn]\nbatch_size = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}
