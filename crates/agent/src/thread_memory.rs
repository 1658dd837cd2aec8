//! Thread memory: the read/clear view over the checkpoint store.

use ragwise_core::memory::CheckpointStore;
use ragwise_core::message::Message;
use std::sync::Arc;
use tracing::warn;

/// Per-thread history access that never fails loudly.
#[derive(Clone)]
pub struct ThreadMemory {
    store: Arc<dyn CheckpointStore>,
}

impl ThreadMemory {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Messages of a thread in order; empty when unknown or unreadable.
    pub async fn get(&self, thread_id: &str) -> Vec<Message> {
        match self.store.load(thread_id).await {
            Ok(messages) => messages.unwrap_or_default(),
            Err(e) => {
                warn!(thread_id, error = %e, "Failed to load thread history");
                Vec::new()
            }
        }
    }

    /// Drop a thread's history. `false` when the store refused.
    pub async fn clear(&self, thread_id: &str) -> bool {
        match self.store.clear(thread_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(thread_id, error = %e, "Failed to clear thread history");
                false
            }
        }
    }
}
