//! Call scopes and frames: the atomic unit of lifecycle.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use tandem_llm::{Message, ToolCall, ToolCallResult};

use crate::entry::Entry;
use crate::error::{RuntimeError, RuntimeResult};
use crate::facade::CallRuntime;
use crate::input::WorkerInput;
use crate::plane::ToolPlane;
use crate::runtime::Runtime;

/// Per-invocation state owned by a call scope.
#[derive(Debug)]
pub struct CallFrame {
    /// Stack height from the root entry; the root is 0.
    pub depth: usize,
    /// Name attributed to events from this call.
    pub invocation_name: String,
    /// Resolved model for this call; `None` for entry function frames.
    pub model: Option<String>,
    /// This call's conversation, in model order.
    pub messages: Vec<Message>,
    /// The last turn's prompt text. Observability only; never read by tools.
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Active,
    Closed,
}

/// The owner of one invocation: its toolsets, messages, and cleanup.
///
/// A scope is created `Active`, runs one or more turns, and must be closed.
/// Close is idempotent and runs every toolset's cleanup in reverse
/// instantiation order, on success and failure alike. Operations on a
/// closed scope fail with [`RuntimeError::ScopeClosed`].
pub struct CallScope {
    runtime: Arc<Runtime>,
    entry: Entry,
    frame: CallFrame,
    plane: Arc<ToolPlane>,
    state: ScopeState,
}

impl CallScope {
    /// Open a scope for `entry` at `depth`.
    ///
    /// The depth bound is checked first, before any toolset is
    /// instantiated.
    pub(crate) async fn open(
        runtime: Arc<Runtime>,
        entry: Entry,
        depth: usize,
        invocation_name: Option<String>,
        model: Option<String>,
        message_history: Option<Vec<Message>>,
    ) -> RuntimeResult<Self> {
        let max_depth = runtime.config().max_depth;
        if depth >= max_depth {
            return Err(RuntimeError::MaxDepthExceeded { depth, max_depth });
        }

        let invocation_name = invocation_name.unwrap_or_else(|| entry.name().to_string());
        let plane = ToolPlane::build(
            Arc::clone(&runtime),
            entry.toolset_refs(),
            invocation_name.clone(),
            depth,
        )
        .await?;

        // Model precedence: the runtime-wide override, then the per-spawn
        // request, then the worker's resolved model. Function frames carry
        // no model at all.
        let model = match &entry {
            Entry::Worker(worker) => Some(
                runtime
                    .config()
                    .model_override
                    .clone()
                    .or(model)
                    .unwrap_or_else(|| worker.model().to_string()),
            ),
            Entry::Function(_) => None,
        };

        debug!(invocation = %invocation_name, depth, "call scope opened");
        Ok(Self {
            runtime,
            entry,
            frame: CallFrame {
                depth,
                invocation_name,
                model,
                messages: message_history.unwrap_or_default(),
                prompt: String::new(),
            },
            plane: Arc::new(plane),
            state: ScopeState::Active,
        })
    }

    /// The frame of this scope.
    #[must_use]
    pub fn frame(&self) -> &CallFrame {
        &self.frame
    }

    /// The entry this scope runs.
    #[must_use]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Whether the scope can still run turns.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }

    fn ensure_active(&self) -> RuntimeResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(RuntimeError::ScopeClosed)
        }
    }

    /// Run one turn. May be called repeatedly; each turn extends the
    /// frame's conversation and the runtime transcript.
    ///
    /// # Errors
    ///
    /// Fails on input validation, attachment denial, permission denial
    /// (when permission errors are not surfaced to the model), provider
    /// failures, and calls on a closed scope.
    pub fn run_turn<'a>(
        &'a mut self,
        input: WorkerInput,
    ) -> Pin<Box<dyn Future<Output = RuntimeResult<Value>> + Send + 'a>> {
        Box::pin(async move {
            self.ensure_active()?;
            let expected = self.entry.input_model().name().to_string();
            if input.model_name() != expected {
                return Err(RuntimeError::InputValidation {
                    target: self.entry.name().to_string(),
                    reason: format!(
                        "input was validated against model '{}', expected '{expected}'",
                        input.model_name()
                    ),
                });
            }

            match self.entry.clone() {
                Entry::Worker(worker) => self.worker_turn(&worker, input).await,
                Entry::Function(function) => {
                    let call_runtime =
                        CallRuntime::new(Arc::clone(&self.runtime), Arc::clone(&self.plane));
                    (function.func())(input, call_runtime).await
                }
            }
        })
    }

    /// Call a tool on this scope's plane by tool name.
    ///
    /// # Errors
    ///
    /// `ToolNotFound` when the name resolves to neither a toolset tool nor
    /// an in-scope worker; approval and validation errors as in the plane.
    pub async fn call_tool(&self, name: &str, args: Value) -> RuntimeResult<ToolCallResult> {
        self.ensure_active()?;
        let call = ToolCall::new(format!("direct-{}", self.runtime.next_call_id()), name)
            .with_arguments(args);
        self.plane.dispatch(&call).await
    }

    /// Spawn a child scope one depth level down. `model` overrides the
    /// child's model for this spawn; `invocation_name` overrides the name
    /// its events carry.
    ///
    /// # Errors
    ///
    /// `MaxDepthExceeded` before the child's toolsets are instantiated.
    pub async fn spawn_child(
        &self,
        entry: &Entry,
        model: Option<String>,
        invocation_name: Option<String>,
    ) -> RuntimeResult<CallScope> {
        self.ensure_active()?;
        CallScope::open(
            Arc::clone(&self.runtime),
            entry.clone(),
            self.frame.depth.saturating_add(1),
            invocation_name,
            model,
            None,
        )
        .await
    }

    /// Close the scope: run toolset cleanup in reverse order, exactly once.
    /// Idempotent. Cleanup failures are reported through the event sink and
    /// never surface as errors here.
    pub async fn close(&mut self) {
        if self.state == ScopeState::Closed {
            return;
        }
        self.state = ScopeState::Closed;
        self.plane.close().await;
        debug!(invocation = %self.frame.invocation_name, depth = self.frame.depth, "call scope closed");
    }

    /// Append messages to the frame and record them in the transcript.
    pub(crate) fn push_messages(&mut self, batch: &[Message]) {
        self.frame.messages.extend_from_slice(batch);
        self.runtime.message_accumulator().extend(
            &self.frame.invocation_name,
            self.frame.depth,
            batch,
        );
    }

    pub(crate) fn plane(&self) -> &Arc<ToolPlane> {
        &self.plane
    }

    pub(crate) fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub(crate) fn frame_mut(&mut self) -> &mut CallFrame {
        &mut self.frame
    }
}

impl Drop for CallScope {
    fn drop(&mut self) {
        if self.state == ScopeState::Active {
            warn!(
                invocation = %self.frame.invocation_name,
                "call scope dropped without close(); toolset cleanup skipped"
            );
        }
    }
}

impl std::fmt::Debug for CallScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallScope")
            .field("invocation", &self.frame.invocation_name)
            .field("depth", &self.frame.depth)
            .field("state", &self.state)
            .finish()
    }
}
