//! Event and metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribution and ordering metadata carried by every event.
///
/// `event_id` is monotonic per Runtime; `scope_seq` is a secondary sequence
/// number local to the emitting call scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    /// Name of the invocation that emitted the event (the direct caller).
    pub invocation_name: String,
    /// Call depth of the emitting frame (root entry is 0).
    pub depth: usize,
    /// Runtime-wide monotonic event id.
    pub event_id: u64,
    /// Per-scope sequence number.
    pub scope_seq: u64,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl EventMeta {
    /// Create metadata for an event.
    #[must_use]
    pub fn new(invocation_name: impl Into<String>, depth: usize, event_id: u64, scope_seq: u64) -> Self {
        Self {
            invocation_name: invocation_name.into(),
            depth,
            event_id,
            scope_seq,
            timestamp: Utc::now(),
        }
    }
}

/// A typed event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// The prompt handed to a worker at turn start.
    UserMessage {
        /// Attribution metadata.
        meta: EventMeta,
        /// Prompt text.
        prompt: String,
    },
    /// Partial assistant text (emitted only at verbosity >= 2).
    TextDelta {
        /// Attribution metadata.
        meta: EventMeta,
        /// Text fragment.
        delta: String,
    },
    /// A tool call is about to be dispatched.
    ToolCall {
        /// Attribution metadata.
        meta: EventMeta,
        /// Tool name.
        tool_name: String,
        /// Run-local monotonic call id.
        call_id: u64,
        /// Rendered arguments, truncated.
        args: String,
    },
    /// A tool call finished.
    ToolResult {
        /// Attribution metadata.
        meta: EventMeta,
        /// Tool name.
        tool_name: String,
        /// Run-local monotonic call id (matches the `ToolCall` event).
        call_id: u64,
        /// Rendered result, truncated head and tail.
        result: String,
        /// Wall-clock duration of the call in milliseconds.
        duration_ms: u64,
        /// Whether the result is an error.
        is_error: bool,
    },
    /// Free-form progress message.
    Status {
        /// Attribution metadata.
        meta: EventMeta,
        /// Status text.
        message: String,
    },
    /// An error surfaced during the run.
    Error {
        /// Attribution metadata.
        meta: EventMeta,
        /// Error kind (stable machine-readable label).
        kind: String,
        /// Human-readable message.
        message: String,
    },
}

impl RuntimeEvent {
    /// Stable type label for logging and filtering.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UserMessage { .. } => "user_message",
            Self::TextDelta { .. } => "text_delta",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Status { .. } => "status",
            Self::Error { .. } => "error",
        }
    }

    /// The attribution metadata carried by the event.
    #[must_use]
    pub fn meta(&self) -> &EventMeta {
        match self {
            Self::UserMessage { meta, .. }
            | Self::TextDelta { meta, .. }
            | Self::ToolCall { meta, .. }
            | Self::ToolResult { meta, .. }
            | Self::Status { meta, .. }
            | Self::Error { meta, .. } => meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_labels() {
        let meta = EventMeta::new("greeter", 0, 1, 0);
        let event = RuntimeEvent::UserMessage {
            meta,
            prompt: "hi".to_string(),
        };
        assert_eq!(event.event_type(), "user_message");
        assert_eq!(event.meta().invocation_name, "greeter");
    }

    #[test]
    fn test_event_serialization() {
        let event = RuntimeEvent::ToolCall {
            meta: EventMeta::new("rec", 2, 7, 3),
            tool_name: "shell".to_string(),
            call_id: 4,
            args: "{\"command\":\"ls\"}".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"tool_call\""));
        let back: RuntimeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meta().depth, 2);
    }
}
