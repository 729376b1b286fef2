//! Tool execution errors.

use thiserror::Error;

/// Result type for tool execution.
pub type ToolResult<T = String> = Result<T, ToolError>;

/// Errors raised by tools and toolsets.
#[derive(Debug, Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Path not found.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Timeout.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// A toolset factory could not construct an instance.
    #[error("toolset '{name}' failed to instantiate: {reason}")]
    Instantiation {
        /// Toolset name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// Cleanup failed; collected by the scope, never masks the primary error.
    #[error("cleanup of toolset '{name}' failed: {reason}")]
    Cleanup {
        /// Toolset name.
        name: String,
        /// What went wrong.
        reason: String,
    },
}
