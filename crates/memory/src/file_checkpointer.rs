//! File-based checkpointer: one JSON document per thread.
//!
//! Storage location: `~/.ragwise/threads/<hex(sha256(thread_id))>.json`
//!
//! Thread ids are opaque, unbounded strings supplied by callers, so file
//! names are a fixed-width digest of the id. The raw id is stored inside
//! the document. Writes go to a temporary file first and are renamed into
//! place.

use async_trait::async_trait;
use ragwise_core::error::MemoryError;
use ragwise_core::memory::CheckpointStore;
use ragwise_core::message::Message;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const EXTENSION: &str = "json";

/// On-disk layout of one thread.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    thread_id: String,
    messages: Vec<Message>,
}

/// A directory of per-thread JSON checkpoints.
pub struct FileCheckpointer {
    dir: PathBuf,
    // Serializes writers against readers of the same directory.
    lock: RwLock<()>,
}

impl FileCheckpointer {
    /// Create a checkpointer rooted at `dir`. The directory is created on
    /// first write.
    pub fn new(dir: PathBuf) -> Self {
        debug!(dir = %dir.display(), "File checkpointer ready");
        Self {
            dir,
            lock: RwLock::new(()),
        }
    }

    fn path_for(&self, thread_id: &str) -> PathBuf {
        let digest = Sha256::digest(thread_id.as_bytes());
        self.dir.join(format!("{}.{EXTENSION}", hex::encode(digest)))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointer {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Vec<Message>>, MemoryError> {
        let _guard = self.lock.read().await;
        let path = self.path_for(thread_id);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read checkpoint {}: {e}",
                    path.display()
                )));
            }
        };

        match serde_json::from_str::<Checkpoint>(&content) {
            Ok(checkpoint) if checkpoint.thread_id == thread_id => Ok(Some(checkpoint.messages)),
            Ok(checkpoint) => {
                warn!(thread_id, stored = %checkpoint.thread_id, "Checkpoint belongs to another thread");
                Err(MemoryError::Corrupted(thread_id.to_string()))
            }
            Err(e) => {
                warn!(thread_id, error = %e, "Checkpoint file is corrupted");
                Err(MemoryError::Corrupted(thread_id.to_string()))
            }
        }
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<(), MemoryError> {
        let _guard = self.lock.write().await;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create checkpoint directory: {e}"))
        })?;

        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            messages: messages.to_vec(),
        };
        let content = serde_json::to_string(&checkpoint)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize checkpoint: {e}")))?;

        let path = self.path_for(thread_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write checkpoint: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to commit checkpoint: {e}")))?;

        debug!(thread_id, count = messages.len(), "Checkpoint saved");
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), MemoryError> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(self.path_for(thread_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to remove checkpoint: {e}"
            ))),
        }
    }
}
