//! Scripted approval handler.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tandem_approval::{ApprovalDecision, ApprovalHandler, ApprovalRequest};

/// Approval handler that replays queued decisions and records every request
/// it saw.
///
/// When the queue is empty the default decision applies (deny, unless
/// overridden).
#[derive(Debug)]
pub struct ScriptedHandler {
    queue: Mutex<VecDeque<ApprovalDecision>>,
    default: ApprovalDecision,
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl ScriptedHandler {
    /// Create a handler that denies by default.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            default: ApprovalDecision::deny("no scripted decision"),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Create a handler with a default decision.
    #[must_use]
    pub fn with_default(default: ApprovalDecision) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            default,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a decision.
    pub fn push(&self, decision: ApprovalDecision) {
        if let Ok(mut guard) = self.queue.lock() {
            guard.push_back(decision);
        }
    }

    /// Requests presented so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of times the handler was consulted.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|g| g.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ApprovalHandler for ScriptedHandler {
    async fn decide(&self, request: ApprovalRequest) -> ApprovalDecision {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
        self.queue
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front())
            .unwrap_or_else(|| self.default.clone())
    }
}
