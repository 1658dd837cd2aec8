//! # Ragwise Core
//!
//! Domain types, traits, and error definitions for the Ragwise retrieval
//! agent. This crate has **no framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in
//! their respective crates:
//! - [`Provider`]: the language model (`ragwise-providers`)
//! - [`VectorIndex`]: the embedding store (`ragwise-retrieval`)
//! - [`CheckpointStore`]: thread history persistence (`ragwise-memory`)
//! - [`Tool`]: functions the model may call (`ragwise-tools`)

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::CheckpointStore;
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use retrieval::{Department, DocType, FilterSet, RetrievedPassage, SecurityLevel, VectorIndex};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
