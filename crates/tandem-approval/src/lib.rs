#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Approval protocol for the tandem workflow runtime.
//!
//! Every LLM-initiated action passes through this crate before it runs:
//! a per-tool policy check (blocked / pre-approved), a session decision
//! cache, and finally the pluggable [`ApprovalHandler`] callback supplied by
//! the harness. Decisions remembered for the session are cached per Runtime,
//! keyed by `(tool_name, canonical(payload))` — never process-wide.

mod broker;
mod canonical;
mod error;
mod handler;
mod memory;
mod policy;
mod request;

pub use broker::{ApprovalBroker, Authorization};
pub use canonical::canonical_json;
pub use error::{ApprovalError, ApprovalResult};
pub use handler::ApprovalHandler;
pub use memory::ApprovalMemory;
pub use policy::{ApprovalConfig, ApprovalMode, HookDecision, ToolPolicy};
pub use request::{ApprovalDecision, ApprovalRequest, Presentation, PresentationKind, Remember};
