//! Checkpoint store: persistence of per-thread conversation history.
//!
//! The conversation graph loads a thread's messages before a turn and
//! writes the final state back once the turn reaches its terminal node.

use crate::error::MemoryError;
use crate::message::Message;
use async_trait::async_trait;

/// The core CheckpointStore trait.
///
/// Implementations: in-memory (default), JSON files on disk.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Load the saved messages of a thread, or `None` if it was never saved.
    async fn load(&self, thread_id: &str) -> std::result::Result<Option<Vec<Message>>, MemoryError>;

    /// Replace the saved messages of a thread.
    async fn save(&self, thread_id: &str, messages: &[Message]) -> std::result::Result<(), MemoryError>;

    /// Drop all messages of a thread. Clearing an unknown thread succeeds.
    async fn clear(&self, thread_id: &str) -> std::result::Result<(), MemoryError>;
}
