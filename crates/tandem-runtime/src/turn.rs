//! The worker agent loop: model request → tool dispatch → repeat.

use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use tandem_events::RuntimeEvent;
use tandem_llm::{
    ContentPart, LlmError, LlmProvider, LlmToolDefinition, Message, StreamEvent, ToolCall,
    ToolCallResult, Usage,
};

use crate::error::{RuntimeError, RuntimeResult};
use crate::input::WorkerInput;
use crate::scope::CallScope;
use crate::worker::Worker;

/// One model round: accumulated text, tool calls, and usage.
#[derive(Debug, Default)]
struct TurnStep {
    text: String,
    tool_calls: Vec<ToolCall>,
    usage: Usage,
}

impl CallScope {
    /// Run one worker turn: gate attachments, then loop the model until it
    /// answers without tool calls.
    pub(crate) async fn worker_turn(
        &mut self,
        worker: &Arc<Worker>,
        input: WorkerInput,
    ) -> RuntimeResult<Value> {
        let spec = input.prompt_spec();
        self.frame_mut().prompt = spec.text.clone();

        self.runtime().events().emit(RuntimeEvent::UserMessage {
            meta: self.plane().meta(),
            prompt: spec.text.clone(),
        });

        // Attachments are resolved and approved before any model request.
        let user_message = if spec.attachments.is_empty() {
            Message::user(&spec.text)
        } else {
            let mut parts = vec![ContentPart::Text {
                text: spec.text.clone(),
            }];
            parts.extend(self.plane().gate_attachments(&spec).await?);
            Message::user_parts(parts)
        };
        self.push_messages(&[user_message]);

        let model = self.frame().model.clone().ok_or(LlmError::NoModel)?;
        let provider = self.runtime().provider_for(Some(&model))?;
        let tools = self.plane().tool_definitions();
        let verbosity = self.runtime().config().verbosity;
        let surface_permission_errors = self
            .runtime()
            .config()
            .approval
            .return_permission_errors;

        loop {
            let step = if verbosity >= 2 {
                self.stream_step(provider.as_ref(), &tools, worker.instructions())
                    .await?
            } else {
                let response = provider
                    .complete(&self.frame().messages, &tools, worker.instructions())
                    .await?;
                TurnStep {
                    text: response.message.text().unwrap_or_default().to_string(),
                    tool_calls: response.tool_calls().to_vec(),
                    usage: response.usage,
                }
            };

            self.runtime().usage_collector().record(
                &self.frame().invocation_name,
                self.frame().depth,
                step.usage,
            );

            if !step.tool_calls.is_empty() {
                self.push_messages(&[Message::assistant_with_tools(step.tool_calls.clone())]);
                // Tool calls execute serially, in the order the model
                // emitted them.
                for call in &step.tool_calls {
                    let result = match self.plane().dispatch(call).await {
                        Ok(result) => result,
                        Err(e) => self.recover_tool_error(call, e, surface_permission_errors)?,
                    };
                    self.push_messages(&[Message::tool_result(result)]);
                }
                continue;
            }

            if !step.text.is_empty() {
                self.push_messages(&[Message::assistant(&step.text)]);
            }
            debug!(invocation = %self.frame().invocation_name, "worker turn complete");
            return Ok(Value::String(step.text));
        }
    }

    /// Drive the provider's streaming path for one round, emitting text
    /// delta events as they arrive.
    async fn stream_step(
        &self,
        provider: &dyn LlmProvider,
        tools: &[LlmToolDefinition],
        instructions: &str,
    ) -> RuntimeResult<TurnStep> {
        let mut stream = provider
            .stream(&self.frame().messages, tools, instructions)
            .await?;

        let mut step = TurnStep::default();
        let mut pending_args = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta(text) => {
                    self.runtime().events().emit(RuntimeEvent::TextDelta {
                        meta: self.plane().meta(),
                        delta: text.clone(),
                    });
                    step.text.push_str(&text);
                }
                StreamEvent::ToolCallStart { id, name } => {
                    step.tool_calls.push(ToolCall::new(id, name));
                    pending_args.clear();
                }
                StreamEvent::ToolCallDelta { args_delta, .. } => {
                    pending_args.push_str(&args_delta);
                }
                StreamEvent::ToolCallEnd { id } => {
                    if let Some(call) = step.tool_calls.iter_mut().find(|c| c.id == id)
                        && let Ok(args) = serde_json::from_str(&pending_args)
                    {
                        call.arguments = args;
                    }
                    pending_args.clear();
                }
                StreamEvent::Usage(usage) => {
                    step.usage.absorb(usage);
                }
                StreamEvent::Done => break,
                StreamEvent::Error(message) => {
                    error!(%message, "stream error");
                    return Err(LlmError::Streaming(message).into());
                }
            }
        }
        Ok(step)
    }

    /// Convert a dispatch error into a structured tool result where the
    /// contract allows the model to see it and try something else;
    /// propagate it otherwise.
    fn recover_tool_error(
        &self,
        call: &ToolCall,
        error: RuntimeError,
        surface_permission_errors: bool,
    ) -> RuntimeResult<ToolCallResult> {
        let recoverable = match &error {
            RuntimeError::PermissionDenied(_) | RuntimeError::MaxDepthExceeded { .. } => {
                surface_permission_errors
            }
            RuntimeError::ToolNotFound { .. } | RuntimeError::InputValidation { .. } => true,
            _ => false,
        };

        self.runtime().events().emit(RuntimeEvent::Error {
            meta: self.plane().meta(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });

        if recoverable {
            let body = serde_json::json!({
                "error": error.kind(),
                "message": error.to_string(),
            });
            Ok(ToolCallResult::error(&call.id, body.to_string()))
        } else {
            Err(error)
        }
    }
}
