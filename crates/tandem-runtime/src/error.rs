//! Runtime error taxonomy.

use thiserror::Error;

use tandem_approval::ApprovalError;
use tandem_llm::LlmError;
use tandem_tools::ToolError;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by the execution core.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A spawn would push the call stack above the configured bound.
    #[error("maximum call depth exceeded: depth {depth} >= max_depth {max_depth}")]
    MaxDepthExceeded {
        /// The depth the spawn would have created.
        depth: usize,
        /// The configured bound.
        max_depth: usize,
    },

    /// A gated call was denied or blocked.
    #[error(transparent)]
    PermissionDenied(#[from] ApprovalError),

    /// A worker input did not match its input model. No coercion is ever
    /// attempted; a bare string never validates against a structured model.
    #[error("input validation failed for '{target}': {reason}")]
    InputValidation {
        /// The worker or entry the input was meant for.
        target: String,
        /// Why validation failed.
        reason: String,
    },

    /// A tool name resolved to nothing in the scope's tool plane.
    #[error("unknown tool '{name}'")]
    ToolNotFound {
        /// The unresolved tool name.
        name: String,
    },

    /// Operation on a closed call scope (programmer error).
    #[error("operation on a closed call scope")]
    ScopeClosed,

    /// An attachment read was denied or impossible; the turn fails before
    /// any model request.
    #[error("attachment '{path}' rejected: {reason}")]
    AttachmentDenied {
        /// The attachment path as referenced.
        path: String,
        /// Denial reason or read failure.
        reason: String,
    },

    /// A worker has no model and no environment fallback.
    #[error("no model resolved for worker '{worker}' (set model in frontmatter or TANDEM_MODEL)")]
    ModelUnresolved {
        /// The worker without a model.
        worker: String,
    },

    /// The provider boundary failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// A toolset failed to instantiate or execute outside the structured
    /// tool-result path.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl RuntimeError {
    /// Stable machine-readable kind label, used in error events and
    /// structured tool results.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MaxDepthExceeded { .. } => "max_depth_exceeded",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InputValidation { .. } => "input_validation",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ScopeClosed => "scope_closed",
            Self::AttachmentDenied { .. } => "attachment_denied",
            Self::ModelUnresolved { .. } => "model_unresolved",
            Self::Llm(_) => "llm",
            Self::Tool(_) => "external_io",
        }
    }
}
