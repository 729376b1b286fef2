//! The pluggable decision callback.

use async_trait::async_trait;

use crate::request::{ApprovalDecision, ApprovalRequest};

/// Trait for harnesses that present approval requests to a user.
///
/// The runtime never imports a concrete UI; whatever fronts the run (CLI
/// prompt, TUI dialog, test script) implements this and is injected through
/// the runtime configuration.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Present a request and return the decision.
    async fn decide(&self, request: ApprovalRequest) -> ApprovalDecision;
}
