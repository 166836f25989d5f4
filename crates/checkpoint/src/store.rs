use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use quorum_common::{ConversationState, QuorumError, Result};
use tokio::sync::RwLock;
use tracing::debug;

/// Persistence for per-thread conversation state. Saved after every node
/// so an interrupted turn can be resumed from the last completed step.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the state for a thread, or `None` if the thread is new.
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>>;

    /// Persist the state for a thread, replacing any previous checkpoint.
    async fn save(&self, thread_id: &str, state: &ConversationState) -> Result<()>;
}

/// One JSON file per thread under a base directory.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Map a thread id to a filename, replacing anything that could
    /// escape the base directory.
    fn path_for(&self, thread_id: &str) -> PathBuf {
        let sanitized: String = thread_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{sanitized}.json"))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        let path = self.path_for(thread_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(QuorumError::Checkpoint(format!(
                    "Failed to read checkpoint {}: {e}",
                    path.display()
                )));
            }
        };

        let state = serde_json::from_slice(&bytes).map_err(|e| {
            QuorumError::Checkpoint(format!(
                "Corrupt checkpoint {}: {e}",
                path.display()
            ))
        })?;

        debug!(thread_id = %thread_id, "Loaded checkpoint");
        Ok(Some(state))
    }

    async fn save(&self, thread_id: &str, state: &ConversationState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            QuorumError::Checkpoint(format!(
                "Failed to create checkpoint dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(thread_id);
        let json = serde_json::to_vec_pretty(state)?;

        // Write to a sibling temp file first so a crash mid-write never
        // leaves a truncated checkpoint behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(|e| {
            QuorumError::Checkpoint(format!("Failed to write checkpoint {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            QuorumError::Checkpoint(format!(
                "Failed to commit checkpoint {}: {e}",
                path.display()
            ))
        })?;

        debug!(thread_id = %thread_id, messages = state.messages.len(), "Saved checkpoint");
        Ok(())
    }
}

/// Keeps checkpoints in a map. Used by tests and useful for ephemeral
/// deployments.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.states.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, state: &ConversationState) -> Result<()> {
        self.states
            .write()
            .await
            .insert(thread_id.to_string(), state.clone());
        Ok(())
    }
}
