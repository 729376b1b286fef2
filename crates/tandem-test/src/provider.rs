//! Scripted LLM provider.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tandem_llm::{
    LlmError, LlmProvider, LlmResponse, LlmResult, LlmToolDefinition, Message, StopReason,
    StreamBox, StreamEvent, ToolCall, Usage,
};
use tandem_runtime::{CredentialResolver, ProviderFactory};

/// One scripted model round.
#[derive(Debug, Clone, Default)]
pub struct MockTurn {
    /// Text the model "says".
    pub text: String,
    /// Tool calls the model emits.
    pub tool_calls: Vec<ToolCall>,
    /// Usage reported for the round.
    pub usage: Usage,
}

impl MockTurn {
    /// A text-only round with nominal usage.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            usage: Usage::new(10, 5),
        }
    }

    /// A round that emits tool calls.
    #[must_use]
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            text: String::new(),
            tool_calls: calls,
            usage: Usage::new(10, 5),
        }
    }

    /// Override the reported usage.
    #[must_use]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// A record of one request the provider served.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Messages at request time.
    pub messages: Vec<Message>,
    /// Advertised tool names.
    pub tool_names: Vec<String>,
    /// System prompt.
    pub system: String,
}

/// Deterministic provider that replays a queued script.
///
/// Uses `std::sync::Mutex` internally so builder methods work without a
/// runtime. An exhausted script fails the request — a test bug, surfaced
/// loudly.
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    script: Arc<Mutex<VecDeque<MockTurn>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProvider {
    /// Create a provider for `model` with an empty script.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a scripted round.
    #[must_use]
    pub fn with_turn(self, turn: MockTurn) -> Self {
        self.push_turn(turn);
        self
    }

    /// Queue a scripted round on an existing provider.
    pub fn push_turn(&self, turn: MockTurn) {
        if let Ok(mut guard) = self.script.lock() {
            guard.push_back(turn);
        }
    }

    /// Requests served so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Rounds remaining in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|g| g.len()).unwrap_or(0)
    }

    fn next_turn(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<MockTurn> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(RecordedRequest {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
                system: system.to_string(),
            });
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front())
            .ok_or_else(|| LlmError::RequestFailed("mock script exhausted".to_string()))
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox> {
        let turn = self.next_turn(messages, tools, system)?;
        let mut events: Vec<LlmResult<StreamEvent>> = Vec::new();
        if !turn.text.is_empty() {
            // Split the text to exercise delta accumulation.
            let midpoint = turn.text.len().div_euclid(2);
            let midpoint = (0..=midpoint)
                .rev()
                .find(|&i| turn.text.is_char_boundary(i))
                .unwrap_or(0);
            let (head, tail) = turn.text.split_at(midpoint);
            if !head.is_empty() {
                events.push(Ok(StreamEvent::TextDelta(head.to_string())));
            }
            if !tail.is_empty() {
                events.push(Ok(StreamEvent::TextDelta(tail.to_string())));
            }
        }
        for call in &turn.tool_calls {
            events.push(Ok(StreamEvent::ToolCallStart {
                id: call.id.clone(),
                name: call.name.clone(),
            }));
            events.push(Ok(StreamEvent::ToolCallDelta {
                id: call.id.clone(),
                args_delta: call.arguments.to_string(),
            }));
            events.push(Ok(StreamEvent::ToolCallEnd {
                id: call.id.clone(),
            }));
        }
        events.push(Ok(StreamEvent::Usage(turn.usage)));
        events.push(Ok(StreamEvent::Done));
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse> {
        let turn = self.next_turn(messages, tools, system)?;
        let (message, stop_reason) = if turn.tool_calls.is_empty() {
            (Message::assistant(&turn.text), StopReason::EndTurn)
        } else {
            (
                Message::assistant_with_tools(turn.tool_calls.clone()),
                StopReason::ToolUse,
            )
        };
        Ok(LlmResponse {
            message,
            stop_reason,
            usage: turn.usage,
        })
    }
}

/// Provider factory that hands out one shared [`MockProvider`] for every
/// model. Records whether a credential resolver was supplied.
pub struct MockProviderFactory {
    provider: MockProvider,
    saw_credentials: Mutex<bool>,
}

impl MockProviderFactory {
    /// Wrap a mock provider.
    #[must_use]
    pub fn new(provider: MockProvider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            saw_credentials: Mutex::new(false),
        })
    }

    /// Whether `create` was ever handed a credential resolver.
    #[must_use]
    pub fn saw_credentials(&self) -> bool {
        self.saw_credentials.lock().map(|g| *g).unwrap_or(false)
    }
}

impl ProviderFactory for MockProviderFactory {
    fn create(
        &self,
        _model: &str,
        credentials: Option<&dyn CredentialResolver>,
    ) -> LlmResult<Arc<dyn LlmProvider>> {
        if credentials.is_some()
            && let Ok(mut guard) = self.saw_credentials.lock()
        {
            *guard = true;
        }
        Ok(Arc::new(self.provider.clone()))
    }
}
