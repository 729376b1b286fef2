//! The tool plane: per-call toolset instantiation, approval wrapping, and
//! dispatch with event attribution.
//!
//! One plane is built per call scope. It instantiates the scope's declared
//! toolsets in order, resolves worker-as-tool references, and routes every
//! call — toolset tool or worker — through the approval broker before
//! anything executes. Cleanup runs in reverse instantiation order exactly
//! once, on success and failure alike.

use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::{debug, warn};

use tandem_approval::{ApprovalConfig, ApprovalRequest, Presentation, PresentationKind};
use tandem_events::{EventMeta, RuntimeEvent, truncate_args, truncate_result};
use tandem_llm::{ContentPart, LlmToolDefinition, ToolCall, ToolCallResult};
use tandem_tools::{
    AttachmentToolset, READ_ATTACHMENT_TOOL, Tool, Toolset, attachment_media_type,
};

use crate::entry::Entry;
use crate::error::{RuntimeError, RuntimeResult};
use crate::input::{PromptSpec, WorkerInput};
use crate::runtime::Runtime;
use crate::scope::CallScope;
use crate::worker::{ToolsetRef, Worker};

/// One instantiated toolset inside a plane, with its tool table and static
/// policy snapshot.
struct PlaneToolset {
    toolset: Arc<dyn Toolset>,
    tools: Vec<Arc<dyn Tool>>,
    config: ApprovalConfig,
}

impl PlaneToolset {
    fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }
}

/// The approval-wrapped tool surface of one call scope.
pub(crate) struct ToolPlane {
    runtime: Arc<Runtime>,
    invocation_name: String,
    depth: usize,
    toolsets: Vec<PlaneToolset>,
    workers: Vec<Arc<Worker>>,
    /// Merged static policies across all toolsets; consulted for
    /// worker-as-tool names, which belong to no single toolset.
    merged_policies: ApprovalConfig,
    gate: AttachmentToolset,
    gate_tool: Arc<dyn Tool>,
    scope_seq: AtomicU64,
    closed: AtomicBool,
}

impl ToolPlane {
    /// Instantiate the toolsets for one call, in declaration order.
    ///
    /// If any instantiation fails, the already-built instances are cleaned
    /// up in reverse order before the error is returned.
    pub(crate) async fn build(
        runtime: Arc<Runtime>,
        refs: &[ToolsetRef],
        invocation_name: String,
        depth: usize,
    ) -> RuntimeResult<Self> {
        let project_root = runtime.config().project_root.clone();
        let mut toolsets: Vec<PlaneToolset> = Vec::new();
        let mut workers: Vec<Arc<Worker>> = Vec::new();

        for reference in refs {
            match reference {
                ToolsetRef::Toolset(spec) => {
                    let instance = match runtime
                        .resolver()
                        .toolsets()
                        .instantiate(spec, &project_root)
                    {
                        Ok(instance) => instance,
                        Err(error) => {
                            Self::cleanup_toolsets(&mut toolsets).await;
                            return Err(error.into());
                        }
                    };
                    let tools = instance.tools();
                    let config = instance.approval_config();
                    toolsets.push(PlaneToolset {
                        toolset: instance,
                        tools,
                        config,
                    });
                }
                ToolsetRef::Worker(name) => {
                    let Some(worker) = runtime.resolver().worker(name).cloned() else {
                        Self::cleanup_toolsets(&mut toolsets).await;
                        return Err(RuntimeError::ToolNotFound { name: name.clone() });
                    };
                    workers.push(worker);
                }
            }
        }

        let mut merged_policies = ApprovalConfig::new();
        for plane_toolset in &toolsets {
            merged_policies.absorb(&plane_toolset.config);
        }

        let gate = AttachmentToolset::new(project_root);
        let gate_tool = gate
            .tools()
            .into_iter()
            .next()
            .ok_or_else(|| RuntimeError::ToolNotFound {
                name: READ_ATTACHMENT_TOOL.to_string(),
            })?;

        debug!(
            invocation = %invocation_name,
            depth,
            toolsets = toolsets.len(),
            worker_tools = workers.len(),
            "tool plane built"
        );

        Ok(Self {
            runtime,
            invocation_name,
            depth,
            toolsets,
            workers,
            merged_policies,
            gate,
            gate_tool,
            scope_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn invocation_name(&self) -> &str {
        &self.invocation_name
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Event metadata attributed to this plane's invocation.
    pub(crate) fn meta(&self) -> EventMeta {
        EventMeta::new(
            self.invocation_name.clone(),
            self.depth,
            self.runtime.events().next_event_id(),
            self.scope_seq.fetch_add(1, Ordering::Relaxed),
        )
    }

    /// Tool definitions advertised to the model: every toolset tool plus
    /// every in-scope worker, schema derived from its input model.
    pub(crate) fn tool_definitions(&self) -> Vec<LlmToolDefinition> {
        let mut definitions: Vec<LlmToolDefinition> = Vec::new();
        for plane_toolset in &self.toolsets {
            for tool in &plane_toolset.tools {
                definitions.push(
                    LlmToolDefinition::new(tool.name())
                        .with_description(tool.description())
                        .with_schema(tool.input_schema()),
                );
            }
        }
        for worker in &self.workers {
            let description = worker
                .description()
                .map_or_else(|| format!("Delegate a task to the '{}' worker.", worker.name()), str::to_string);
            definitions.push(
                LlmToolDefinition::new(worker.name())
                    .with_description(description)
                    .with_schema(worker.input_model().schema()),
            );
        }
        definitions
    }

    /// Dispatch one call through approval to a toolset tool or an in-scope
    /// worker.
    ///
    /// # Errors
    ///
    /// `ToolNotFound` when the name resolves to nothing; `PermissionDenied`
    /// when approval fails; `InputValidation` for worker-as-tool schema
    /// mismatches; `MaxDepthExceeded` when a worker spawn would exceed the
    /// depth bound. Tool *execution* failures are returned as structured
    /// error results, not errors.
    pub(crate) async fn dispatch(&self, call: &ToolCall) -> RuntimeResult<ToolCallResult> {
        for plane_toolset in &self.toolsets {
            if let Some(tool) = plane_toolset.tool(&call.name) {
                return self.dispatch_toolset_tool(plane_toolset, tool, call).await;
            }
        }
        if let Some(worker) = self.workers.iter().find(|w| w.name() == call.name) {
            let worker = Arc::clone(worker);
            return self.dispatch_worker(worker, call).await;
        }
        Err(RuntimeError::ToolNotFound {
            name: call.name.clone(),
        })
    }

    async fn dispatch_toolset_tool(
        &self,
        plane_toolset: &PlaneToolset,
        tool: &Arc<dyn Tool>,
        call: &ToolCall,
    ) -> RuntimeResult<ToolCallResult> {
        if let Err(reason) = check_required_args(&tool.input_schema(), &call.arguments) {
            return Ok(self.emit_call_pair(
                call,
                ToolCallResult::error(&call.id, format!("invalid arguments: {reason}")),
                0,
            ));
        }

        let hook = plane_toolset
            .toolset
            .needs_approval(&call.name, &call.arguments)
            .await;
        let policy = plane_toolset.config.get(&call.name);
        let request = self.request_for(tool.as_ref(), call);
        self.runtime.broker().authorize(policy, hook, &request).await?;

        let call_id = self.runtime.next_call_id();
        self.runtime.events().emit(RuntimeEvent::ToolCall {
            meta: self.meta(),
            tool_name: call.name.clone(),
            call_id,
            args: truncate_args(&call.arguments.to_string()),
        });

        let started = Instant::now();
        let result = match tool.execute(call.arguments.clone()).await {
            Ok(content) => ToolCallResult::success(&call.id, content),
            Err(error) => ToolCallResult::error(&call.id, error.to_string()),
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.runtime.events().emit(RuntimeEvent::ToolResult {
            meta: self.meta(),
            tool_name: call.name.clone(),
            call_id,
            result: truncate_result(&result.content),
            duration_ms,
            is_error: result.is_error,
        });
        Ok(result)
    }

    async fn dispatch_worker(
        &self,
        worker: Arc<Worker>,
        call: &ToolCall,
    ) -> RuntimeResult<ToolCallResult> {
        // Strict validation before approval; a bare string never coerces.
        let input = WorkerInput::new(Arc::clone(worker.input_model()), call.arguments.clone())?;

        let policy = self.merged_policies.get(worker.name());
        let description = worker
            .description()
            .map_or_else(|| format!("Invoke worker '{}'", worker.name()), str::to_string);
        let request = ApprovalRequest::new(worker.name(), description, call.arguments.clone())
            .with_presentation(Presentation::new(
                PresentationKind::Structured,
                call.arguments.to_string(),
            ));
        self.runtime.broker().authorize(policy, None, &request).await?;

        let call_id = self.runtime.next_call_id();
        self.runtime.events().emit(RuntimeEvent::ToolCall {
            meta: self.meta(),
            tool_name: worker.name().to_string(),
            call_id,
            args: truncate_args(&call.arguments.to_string()),
        });

        let started = Instant::now();
        // Depth is re-checked inside open(), before the child's toolsets
        // are instantiated.
        let mut child = CallScope::open(
            Arc::clone(&self.runtime),
            Entry::Worker(Arc::clone(&worker)),
            self.depth.saturating_add(1),
            None,
            None,
            None,
        )
        .await?;

        // run_turn is already boxed to break the async type cycle: dispatch →
        // child turn → dispatch.
        let outcome = child.run_turn(input).await;
        child.close().await;
        let output = outcome?;

        let content = match output {
            Value::String(text) => text,
            other => other.to_string(),
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = ToolCallResult::success(&call.id, content);

        self.runtime.events().emit(RuntimeEvent::ToolResult {
            meta: self.meta(),
            tool_name: worker.name().to_string(),
            call_id,
            result: truncate_result(&result.content),
            duration_ms,
            is_error: false,
        });
        Ok(result)
    }

    /// Gate and load the attachments of a prompt spec.
    ///
    /// Each reference resolves to an absolute path, is approved through the
    /// dedicated attachment read path (session-cached per path), and only
    /// then has its bytes loaded. Any denial or read failure fails the turn
    /// before a model request is made.
    pub(crate) async fn gate_attachments(
        &self,
        spec: &PromptSpec,
    ) -> RuntimeResult<Vec<ContentPart>> {
        let mut parts = Vec::new();
        for reference in &spec.attachments {
            let absolute =
                self.gate
                    .resolve(reference)
                    .map_err(|error| RuntimeError::AttachmentDenied {
                        path: reference.clone(),
                        reason: error.to_string(),
                    })?;
            let payload = serde_json::json!({ "path": absolute.to_string_lossy() });
            let request = ApprovalRequest::new(
                READ_ATTACHMENT_TOOL,
                format!("Attach file {}", absolute.display()),
                payload.clone(),
            )
            .with_presentation(Presentation::new(
                PresentationKind::FileContent,
                absolute.display().to_string(),
            ));

            self.runtime
                .broker()
                .authorize_sticky(&request)
                .await
                .map_err(|error| RuntimeError::AttachmentDenied {
                    path: reference.clone(),
                    reason: error.to_string(),
                })?;

            let data = self
                .gate_tool
                .execute(payload)
                .await
                .map_err(|error| RuntimeError::AttachmentDenied {
                    path: reference.clone(),
                    reason: error.to_string(),
                })?;
            parts.push(ContentPart::File {
                name: reference.clone(),
                data,
                media_type: attachment_media_type(&absolute).to_string(),
            });
        }
        Ok(parts)
    }

    /// Run cleanup on every toolset, reverse instantiation order, exactly
    /// once. Cleanup failures are reported as error events and never mask
    /// the caller's primary error.
    pub(crate) async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for plane_toolset in self.toolsets.iter().rev() {
            if let Err(error) = plane_toolset.toolset.cleanup().await {
                warn!(
                    toolset = plane_toolset.toolset.name(),
                    %error,
                    "toolset cleanup failed"
                );
                self.runtime.events().emit(RuntimeEvent::Error {
                    meta: self.meta(),
                    kind: "toolset_cleanup".to_string(),
                    message: format!(
                        "cleanup of toolset '{}' failed: {error}",
                        plane_toolset.toolset.name()
                    ),
                });
            }
        }
    }

    async fn cleanup_toolsets(toolsets: &mut Vec<PlaneToolset>) {
        for plane_toolset in toolsets.iter().rev() {
            if let Err(error) = plane_toolset.toolset.cleanup().await {
                warn!(toolset = plane_toolset.toolset.name(), %error, "cleanup during failed build");
            }
        }
        toolsets.clear();
    }

    fn request_for(&self, tool: &dyn Tool, call: &ToolCall) -> ApprovalRequest {
        let presentation = tool.presentation(&call.arguments).unwrap_or_else(|| {
            Presentation::new(PresentationKind::Structured, call.arguments.to_string())
        });
        ApprovalRequest::new(&call.name, tool.description(), call.arguments.clone())
            .with_presentation(presentation)
    }

    /// Emit a call/result event pair for a call rejected before execution.
    fn emit_call_pair(
        &self,
        call: &ToolCall,
        result: ToolCallResult,
        duration_ms: u64,
    ) -> ToolCallResult {
        let call_id = self.runtime.next_call_id();
        self.runtime.events().emit(RuntimeEvent::ToolCall {
            meta: self.meta(),
            tool_name: call.name.clone(),
            call_id,
            args: truncate_args(&call.arguments.to_string()),
        });
        self.runtime.events().emit(RuntimeEvent::ToolResult {
            meta: self.meta(),
            tool_name: call.name.clone(),
            call_id,
            result: truncate_result(&result.content),
            duration_ms,
            is_error: result.is_error,
        });
        result
    }
}

/// Light structural validation of tool arguments against the tool's schema:
/// the argument value must be an object and every `required` property must
/// be present. Tools do fine-grained checks themselves at execution time.
fn check_required_args(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(args_object) = args.as_object() else {
        return Err(format!(
            "expected an object, got {}",
            crate::input::json_type_name(args)
        ));
    };
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args_object.contains_key(key) {
                return Err(format!("missing required field '{key}'"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_required_args_accepts_valid() {
        let schema = json!({"type": "object", "required": ["path"]});
        assert!(check_required_args(&schema, &json!({"path": "x"})).is_ok());
    }

    #[test]
    fn test_check_required_args_rejects_missing() {
        let schema = json!({"type": "object", "required": ["path"]});
        let reason = check_required_args(&schema, &json!({})).unwrap_err();
        assert!(reason.contains("path"));
    }

    #[test]
    fn test_check_required_args_rejects_non_object() {
        let schema = json!({"type": "object"});
        assert!(check_required_args(&schema, &json!("bare string")).is_err());
    }
}
