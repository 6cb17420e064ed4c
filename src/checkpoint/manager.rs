use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::ai::DqnAgent;
use crate::checkpoint::metadata::{CheckpointMetadata, DqnTrainingState};
use crate::error::CheckpointError;

const METADATA_FILE: &str = "metadata.json";
const TRAINING_STATE_FILE: &str = "training_state.json";
const REWARDS_FILE: &str = "rewards.json";
const LATEST_LINK: &str = "latest";
const SESSION_PREFIX: &str = "session_";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 2,
        }
    }
}

/// Everything stored for one session except the weights, which are loaded
/// straight from `path` by the agent.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
    pub training_state: DqnTrainingState,
    /// Total reward of every episode played so far, in order.
    pub rewards: Vec<f32>,
}

/// Manages saving, loading, listing, and pruning session checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn dir(&self) -> &Path {
        &self.config.checkpoint_dir
    }

    /// Directory that holds (or would hold) the given session.
    pub fn session_dir(&self, session: usize) -> PathBuf {
        self.config.checkpoint_dir.join(session_dir_name(session))
    }

    /// Write weights, architecture, training state, metadata and reward
    /// history for the session in `metadata`, then move `latest` to it.
    pub fn save_session(
        &self,
        agent: &DqnAgent,
        metadata: &CheckpointMetadata,
        rewards: &[f32],
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = session_dir_name(metadata.session);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{dir_name}.tmp"));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        agent.save_to_dir(&tmp_dir)?;
        fs::write(
            tmp_dir.join(TRAINING_STATE_FILE),
            serde_json::to_string_pretty(&agent.training_state())?,
        )?;
        let metadata = CheckpointMetadata {
            timestamp: now_secs(),
            ..metadata.clone()
        };
        fs::write(tmp_dir.join(METADATA_FILE), serde_json::to_string_pretty(&metadata)?)?;
        fs::write(tmp_dir.join(REWARDS_FILE), serde_json::to_string(rewards)?)?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest_symlink(&dir_name)?;
        self.prune_old_sessions()?;

        info!(session = metadata.session, path = %final_dir.display(), "checkpoint saved");
        Ok(final_dir)
    }

    /// Load the non-weight data of a stored session.
    pub fn load_session(&self, session: usize) -> Result<CheckpointData, CheckpointError> {
        let dir = self.session_dir(session);
        if !dir.is_dir() {
            return Err(CheckpointError::SessionNotFound {
                session,
                dir: self.config.checkpoint_dir.clone(),
            });
        }
        load_checkpoint(&dir)
    }

    /// Load whatever session `latest` points to.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let latest_link = self.config.checkpoint_dir.join(LATEST_LINK);
        if !latest_link.exists() {
            return Err(CheckpointError::NoLatestSymlink(
                self.config.checkpoint_dir.clone(),
            ));
        }
        let resolved = fs::read_link(&latest_link)?;
        let target = if resolved.is_relative() {
            self.config.checkpoint_dir.join(resolved)
        } else {
            resolved
        };
        load_checkpoint(&target)
    }

    /// List all stored sessions sorted by session index (ascending).
    pub fn list_sessions(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() || path.is_symlink() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with(SESSION_PREFIX) || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata: CheckpointMetadata = read_json(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.session);
        Ok(results)
    }

    /// Keep the union of the last N sessions and the best N by mean reward.
    fn prune_old_sessions(&self) -> Result<(), CheckpointError> {
        let sessions = self.list_sessions()?;
        if sessions.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = sessions.len();
        let mut keep: HashSet<usize> =
            (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_reward: Vec<(usize, f32)> = sessions
            .iter()
            .enumerate()
            .map(|(i, (_, m))| (i, m.metrics.mean_reward))
            .collect();
        by_reward.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        keep.extend(by_reward.iter().take(self.config.keep_best_n).map(|(i, _)| *i));

        for (i, (path, meta)) in sessions.iter().enumerate() {
            if !keep.contains(&i) {
                debug!(session = meta.session, "pruning checkpoint");
                fs::remove_dir_all(path)?;
            }
        }
        Ok(())
    }

    /// Point the `latest` symlink at the given session directory name.
    fn update_latest_symlink(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.checkpoint_dir.join(LATEST_LINK);
        if link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        Ok(())
    }
}

fn session_dir_name(session: usize) -> String {
    format!("{SESSION_PREFIX}{session:05}")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn load_checkpoint(dir: &Path) -> Result<CheckpointData, CheckpointError> {
    let rewards_path = dir.join(REWARDS_FILE);
    let rewards = if rewards_path.exists() {
        read_json(&rewards_path)?
    } else {
        Vec::new()
    };
    Ok(CheckpointData {
        path: dir.to_path_buf(),
        metadata: read_json(&dir.join(METADATA_FILE))?,
        training_state: read_json(&dir.join(TRAINING_STATE_FILE))?,
        rewards,
    })
}
