//! Turn-level streaming events.
//!
//! `StreamEvent` is what the engine pushes while a turn runs; the gateway
//! forwards each one as an SSE `data:` line.

use serde::{Deserialize, Serialize};

/// Progress markers sent as `status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// The turn has started.
    Thinking,
    /// A retrieval tool ran.
    SearchingKnowledgeBase,
    /// The turn finished and the thread was saved.
    Complete,
}

/// Events emitted by the engine during a streamed turn.
///
/// Wire protocol:
/// - `status`: progress marker (`thinking`, `searching_knowledge_base`, `complete`)
/// - `content`: a de-duplicated assistant message body
/// - `error`: the turn failed; no further events follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status { status: StreamStatus },
    Content { content: String },
    Error { error: String },
}

impl StreamEvent {
    pub fn status(status: StreamStatus) -> Self {
        Self::Status { status }
    }

    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Content { .. } => "content",
            Self::Error { .. } => "error",
        }
    }

    /// Whether no events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Error { .. }
                | Self::Status {
                    status: StreamStatus::Complete
                }
        )
    }
}
