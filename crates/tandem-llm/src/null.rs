//! The no-model sentinel used by entry function frames.

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::provider::{LlmProvider, StreamBox};
use crate::types::{LlmResponse, LlmToolDefinition, Message};

/// Sentinel provider for call frames that must never reach a model.
///
/// Entry functions run without an LLM; if anything in their call frame asks
/// for one, every method here fails with [`LlmError::NoModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullModel;

#[async_trait]
impl LlmProvider for NullModel {
    fn name(&self) -> &str {
        "null"
    }

    fn model(&self) -> &str {
        "null"
    }

    async fn stream(
        &self,
        _messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<StreamBox> {
        Err(LlmError::NoModel)
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<LlmResponse> {
        Err(LlmError::NoModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_model_rejects_calls() {
        let result = NullModel.complete(&[], &[], "").await;
        assert!(matches!(result, Err(LlmError::NoModel)));

        let result = NullModel.stream(&[], &[], "").await;
        assert!(result.is_err());
    }
}
