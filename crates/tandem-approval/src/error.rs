//! Approval errors.

use thiserror::Error;

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Errors from the approval protocol.
#[derive(Debug, Clone, Error)]
pub enum ApprovalError {
    /// The call was denied by policy, cache, or handler.
    #[error("permission denied for '{tool_name}': {reason}")]
    Denied {
        /// The tool that was denied.
        tool_name: String,
        /// Why it was denied.
        reason: String,
    },

    /// The tool is statically blocked on its toolset.
    #[error("tool '{tool_name}' is blocked by toolset policy")]
    Blocked {
        /// The blocked tool.
        tool_name: String,
    },

    /// Prompt mode is active but no handler is registered.
    #[error("approval mode is 'prompt' but no approval handler is configured")]
    NoHandler,
}

impl ApprovalError {
    /// Stable machine-readable kind label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Denied { .. } | Self::Blocked { .. } => "permission_denied",
            Self::NoHandler => "no_handler",
        }
    }
}
