//! Approval request and decision types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A request for a decision on a gated tool call.
///
/// Contains everything the harness needs to present an informed choice:
/// the tool, a human-readable description, the raw payload, and an optional
/// rendering hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Name of the tool (or worker) being called.
    pub tool_name: String,
    /// Human-readable description of the action.
    pub description: String,
    /// The call arguments.
    pub payload: Value,
    /// Optional rendering hint for the harness.
    pub presentation: Option<Presentation>,
}

impl ApprovalRequest {
    /// Create a request with no presentation hint.
    pub fn new(tool_name: impl Into<String>, description: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            description: description.into(),
            payload,
            presentation: None,
        }
    }

    /// Attach a presentation hint.
    #[must_use]
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = Some(presentation);
        self
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tool_name, self.description)
    }
}

/// How the harness should render an approval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Rendering kind.
    pub kind: PresentationKind,
    /// Content to render.
    pub content: String,
    /// Syntax-highlight language, when meaningful.
    pub language: Option<String>,
}

impl Presentation {
    /// Create a presentation hint.
    pub fn new(kind: PresentationKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            language: None,
        }
    }

    /// Set the highlight language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Rendering kinds a harness may special-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationKind {
    /// Plain text.
    Text,
    /// Unified diff.
    Diff,
    /// File contents.
    FileContent,
    /// Shell command.
    Command,
    /// Structured payload (render as JSON).
    Structured,
}

/// The decision made on an approval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether the action may proceed.
    pub approved: bool,
    /// Optional note from the decider (denial reason, caveat).
    pub note: Option<String>,
    /// How long the decision should be remembered.
    #[serde(default)]
    pub remember: Remember,
}

impl ApprovalDecision {
    /// A one-shot approval.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            approved: true,
            note: None,
            remember: Remember::Never,
        }
    }

    /// An approval remembered for the rest of the session.
    #[must_use]
    pub fn approve_session() -> Self {
        Self {
            approved: true,
            note: None,
            remember: Remember::Session,
        }
    }

    /// A denial with a reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            note: Some(reason.into()),
            remember: Remember::Never,
        }
    }

    /// Set the remember scope.
    #[must_use]
    pub fn with_remember(mut self, remember: Remember) -> Self {
        self.remember = remember;
        self
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.approved { "approved" } else { "denied" };
        match (&self.note, self.remember) {
            (Some(note), Remember::Session) => write!(f, "{verdict} (session): {note}"),
            (Some(note), Remember::Never) => write!(f, "{verdict}: {note}"),
            (None, Remember::Session) => write!(f, "{verdict} (session)"),
            (None, Remember::Never) => write!(f, "{verdict}"),
        }
    }
}

/// How long an approval decision is remembered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remember {
    /// Decision applies to this call only.
    #[default]
    Never,
    /// Decision is cached for the rest of the Runtime session.
    Session,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_display() {
        let request = ApprovalRequest::new("shell", "Run a shell command", serde_json::json!({"command": "ls"}));
        assert_eq!(request.to_string(), "shell: Run a shell command");
        assert!(request.presentation.is_none());
    }

    #[test]
    fn test_request_with_presentation() {
        let request = ApprovalRequest::new("shell", "Run a shell command", serde_json::json!({}))
            .with_presentation(Presentation::new(PresentationKind::Command, "ls -la").with_language("bash"));
        let p = request.presentation.unwrap();
        assert_eq!(p.kind, PresentationKind::Command);
        assert_eq!(p.language.as_deref(), Some("bash"));
    }

    #[test]
    fn test_decision_constructors() {
        assert!(ApprovalDecision::approve().approved);
        assert_eq!(ApprovalDecision::approve().remember, Remember::Never);
        assert_eq!(ApprovalDecision::approve_session().remember, Remember::Session);

        let denied = ApprovalDecision::deny("too risky");
        assert!(!denied.approved);
        assert_eq!(denied.note.as_deref(), Some("too risky"));
    }

    #[test]
    fn test_decision_serialization_roundtrip() {
        let decision = ApprovalDecision::approve_session();
        let json = serde_json::to_string(&decision).unwrap();
        let back: ApprovalDecision = serde_json::from_str(&json).unwrap();
        assert!(back.approved);
        assert_eq!(back.remember, Remember::Session);
    }

    #[test]
    fn test_remember_defaults_to_never() {
        let decision: ApprovalDecision = serde_json::from_str(r#"{"approved": true}"#).unwrap();
        assert_eq!(decision.remember, Remember::Never);
    }
}
