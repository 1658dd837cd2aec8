//! In-memory checkpointer: the default for tests and ephemeral servers.

use async_trait::async_trait;
use ragwise_core::error::MemoryError;
use ragwise_core::memory::CheckpointStore;
use ragwise_core::message::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread histories held in a map; lost on restart.
pub struct InMemoryCheckpointer {
    threads: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Vec<Message>>, MemoryError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<(), MemoryError> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), MemoryError> {
        self.threads.write().await.remove(thread_id);
        Ok(())
    }
}
