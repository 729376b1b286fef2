#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! LLM provider boundary for the tandem workflow runtime.
//!
//! The execution core never talks to a concrete model API. Everything it
//! needs from a language model goes through the [`LlmProvider`] trait:
//! conversation messages in, streamed or whole responses (text, tool calls,
//! usage) out. Harnesses plug in real transports; tests plug in scripted
//! mocks; entry functions that need no model at all get [`NullModel`].

mod error;
mod null;
mod provider;
mod types;

pub use error::{LlmError, LlmResult};
pub use null::NullModel;
pub use provider::{LlmProvider, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason,
    StreamEvent, ToolCall, ToolCallResult, Usage,
};
