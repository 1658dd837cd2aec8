//! Checkpoint store implementations for Ragwise.
//!
//! A checkpoint is the full message list of one thread, written back by the
//! conversation graph after every completed turn.

pub mod file_checkpointer;
pub mod in_memory;

pub use file_checkpointer::FileCheckpointer;
pub use in_memory::InMemoryCheckpointer;
