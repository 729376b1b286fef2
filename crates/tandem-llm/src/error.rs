//! Error types for the provider boundary.

use thiserror::Error;

/// Result type for provider operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors from an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider rejected the request.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// A streaming response broke mid-flight.
    #[error("streaming error: {0}")]
    Streaming(String),

    /// No provider is configured for the requested model.
    #[error("no provider configured for model '{model}'")]
    NoProvider {
        /// The model identifier that could not be served.
        model: String,
    },

    /// An LLM call reached a call frame that carries no model.
    #[error("entry function frames carry no model; LLM calls are not available here")]
    NoModel,
}
