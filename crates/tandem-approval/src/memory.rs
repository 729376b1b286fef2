//! Session-scoped cache of approval decisions.

use std::collections::HashMap;
use std::sync::RwLock;
use serde_json::Value;
use tracing::warn;

use crate::canonical::canonical_json;
use crate::request::{ApprovalDecision, Remember};

/// Per-Runtime memo of approval decisions.
///
/// Keyed by `(tool_name, canonical(payload))`. Only decisions with
/// `remember = session` are stored. The cache lives on one Runtime and dies
/// with it; it is never shared across Runtimes.
#[derive(Debug, Default)]
pub struct ApprovalMemory {
    decisions: RwLock<HashMap<(String, String), ApprovalDecision>>,
}

impl ApprovalMemory {
    /// Create an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached decision for `(tool_name, payload)`.
    #[must_use]
    pub fn lookup(&self, tool_name: &str, payload: &Value) -> Option<ApprovalDecision> {
        let key = (tool_name.to_string(), canonical_json(payload));
        let guard = self.decisions.read().unwrap_or_else(|e| {
            warn!("approval memory lock poisoned, recovering");
            e.into_inner()
        });
        guard.get(&key).cloned()
    }

    /// Store a decision if it asks to be remembered for the session.
    pub fn record(&self, tool_name: &str, payload: &Value, decision: &ApprovalDecision) {
        if decision.remember != Remember::Session {
            return;
        }
        let key = (tool_name.to_string(), canonical_json(payload));
        let mut guard = self.decisions.write().unwrap_or_else(|e| {
            warn!("approval memory lock poisoned, recovering");
            e.into_inner()
        });
        guard.insert(key, decision.clone());
    }

    /// Number of cached decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_decisions_are_cached() {
        let memory = ApprovalMemory::new();
        let payload = json!({"command": "echo hi"});

        memory.record("shell", &payload, &ApprovalDecision::approve_session());
        let hit = memory.lookup("shell", &payload).unwrap();
        assert!(hit.approved);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_one_shot_decisions_are_not_cached() {
        let memory = ApprovalMemory::new();
        memory.record("shell", &json!({}), &ApprovalDecision::approve());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_lookup_ignores_key_order() {
        let memory = ApprovalMemory::new();
        let stored: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let probed: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();

        memory.record("fs", &stored, &ApprovalDecision::approve_session());
        assert!(memory.lookup("fs", &probed).is_some());
    }

    #[test]
    fn test_denials_can_be_remembered() {
        let memory = ApprovalMemory::new();
        let decision = ApprovalDecision::deny("no").with_remember(Remember::Session);
        memory.record("shell", &json!({}), &decision);
        let hit = memory.lookup("shell", &json!({})).unwrap();
        assert!(!hit.approved);
    }
}
