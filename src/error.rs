use std::path::PathBuf;

/// Errors raised by the arena and its environment loop.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("can not play with {0} players (expected 1 to 4)")]
    InvalidPlayerCount(usize),

    #[error("invalid arena configuration: {0}")]
    InvalidConfig(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("player {0} is not alive")]
    DeadPlayer(usize),

    #[error("expected {expected} starting positions, got {got}")]
    StartCount { expected: usize, got: usize },

    #[error("renderer failure: {0}")]
    Render(String),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("no checkpoint for session {session} in {dir}")]
    SessionNotFound { session: usize, dir: PathBuf },

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("arena error: {0}")]
    Arena(#[from] ArenaError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
