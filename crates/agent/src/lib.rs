//! The retrieval orchestration engine: the heart of Ragwise.
//!
//! Every turn walks a small graph:
//!
//! 1. **Classify** the latest user message (chit-chat or knowledge question)
//! 2. **Route**: answer directly, or bind one retrieval tool (filtered when
//!    the question names a department, document type, year or security level)
//! 3. **Retrieve**: execute the tool calls the model asked for
//! 4. **Generate**: rank the retrieved passages into a bounded context and
//!    answer under the enterprise system prompt
//!
//! [`RagEngine`] wraps the graph with thread memory, input validation and
//! a de-duplicated event stream.

pub mod classifier;
pub mod context;
pub mod dedup;
pub mod engine;
pub mod graph;
pub mod prompt;
pub mod stream_event;
pub mod thread_memory;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{needs_retrieval, needs_retrieval_text};
pub use context::select_context;
pub use dedup::StreamDeduplicator;
pub use engine::{ERROR_REPLY, InputError, NO_RESPONSE_REPLY, RagEngine, validate_message};
pub use graph::{ConversationGraph, Decoding, GraphSettings, GraphState, Node};
pub use stream_event::{StreamEvent, StreamStatus};
pub use thread_memory::ThreadMemory;
