//! Per-tool policy attributes and approval modes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request::ApprovalDecision;

/// How a Runtime resolves gated tool calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Ask the registered handler for each gated call.
    #[default]
    Prompt,
    /// Approve every call without consulting the handler.
    ApproveAll,
    /// Deny every call without consulting the handler.
    RejectAll,
}

/// Static policy attributes for one tool on a toolset instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicy {
    /// The tool may never run; blocked wins over pre-approval.
    #[serde(default)]
    pub blocked: bool,
    /// The tool runs without consulting the handler.
    #[serde(default)]
    pub pre_approved: bool,
}

impl ToolPolicy {
    /// Policy that blocks the tool outright.
    #[must_use]
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            pre_approved: false,
        }
    }

    /// Policy that skips the approval callback.
    #[must_use]
    pub fn pre_approved() -> Self {
        Self {
            blocked: false,
            pre_approved: true,
        }
    }
}

/// Per-tool policy map carried by a toolset instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalConfig {
    policies: HashMap<String, ToolPolicy>,
}

impl ApprovalConfig {
    /// Create an empty config (every tool requires approval).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for a tool.
    #[must_use]
    pub fn with_policy(mut self, tool_name: impl Into<String>, policy: ToolPolicy) -> Self {
        self.policies.insert(tool_name.into(), policy);
        self
    }

    /// Mark a tool pre-approved.
    #[must_use]
    pub fn pre_approve(self, tool_name: impl Into<String>) -> Self {
        self.with_policy(tool_name, ToolPolicy::pre_approved())
    }

    /// Mark a tool blocked.
    #[must_use]
    pub fn block(self, tool_name: impl Into<String>) -> Self {
        self.with_policy(tool_name, ToolPolicy::blocked())
    }

    /// Look up the policy for a tool.
    #[must_use]
    pub fn get(&self, tool_name: &str) -> Option<ToolPolicy> {
        self.policies.get(tool_name).copied()
    }

    /// Merge another config into this one; existing entries win.
    pub fn absorb(&mut self, other: &ApprovalConfig) {
        for (name, policy) in &other.policies {
            self.policies.entry(name.clone()).or_insert(*policy);
        }
    }

    /// Whether no policies are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Verdict from a toolset's `needs_approval` hook.
///
/// The hook has highest precedence in policy resolution; `None` from the
/// hook means "no opinion" and resolution falls through to the static
/// policy attributes.
#[derive(Debug, Clone)]
pub enum HookDecision {
    /// No approval needed for this call.
    Exempt,
    /// Approval required regardless of static policy.
    Require,
    /// The hook decides directly (not cached).
    Decide(ApprovalDecision),
}
