//! The deps facade handed to user code.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use tandem_events::RuntimeEvent;
use tandem_llm::{ToolCall, ToolCallResult, Usage};

use crate::entry::Entry;
use crate::error::RuntimeResult;
use crate::plane::ToolPlane;
use crate::runtime::Runtime;
use crate::scope::CallScope;
use crate::sinks::RecordedMessage;

/// The view of the runtime exposed to entry functions and embedded tools.
///
/// Carries tool dispatch and child spawning for the *current* call, plus
/// read access to the shared run state. It never exposes toolset instances
/// directly; every tool call goes through the enclosing scope's approval
/// plane.
#[derive(Clone)]
pub struct CallRuntime {
    runtime: Arc<Runtime>,
    plane: Arc<ToolPlane>,
}

impl CallRuntime {
    pub(crate) fn new(runtime: Arc<Runtime>, plane: Arc<ToolPlane>) -> Self {
        Self { runtime, plane }
    }

    /// Call a tool in the enclosing scope by name.
    ///
    /// # Errors
    ///
    /// `ToolNotFound` for unresolved names; approval errors per the
    /// runtime's policy.
    pub async fn call_tool(&self, name: &str, args: Value) -> RuntimeResult<ToolCallResult> {
        let call = ToolCall::new(format!("direct-{}", self.runtime.next_call_id()), name)
            .with_arguments(args);
        self.plane.dispatch(&call).await
    }

    /// Spawn a child scope for `entry`, one depth level below this call.
    ///
    /// The caller owns the returned scope and must close it.
    ///
    /// # Errors
    ///
    /// `MaxDepthExceeded` before any child toolset is instantiated.
    pub async fn spawn_child(
        &self,
        entry: &Entry,
        model: Option<String>,
        invocation_name: Option<String>,
    ) -> RuntimeResult<CallScope> {
        CallScope::open(
            Arc::clone(&self.runtime),
            entry.clone(),
            self.plane.depth().saturating_add(1),
            invocation_name,
            model,
            None,
        )
        .await
    }

    /// Aggregated usage of the run so far.
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.runtime.usage()
    }

    /// The run transcript so far.
    #[must_use]
    pub fn messages(&self) -> Vec<RecordedMessage> {
        self.runtime.messages()
    }

    /// The project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.runtime.config().project_root
    }

    /// Depth of the enclosing call.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.plane.depth()
    }

    /// Invocation name of the enclosing call.
    #[must_use]
    pub fn invocation_name(&self) -> &str {
        self.plane.invocation_name()
    }

    /// Emit a status event attributed to the enclosing call.
    pub fn status(&self, message: impl Into<String>) {
        self.runtime.events().emit(RuntimeEvent::Status {
            meta: self.plane.meta(),
            message: message.into(),
        });
    }
}

impl std::fmt::Debug for CallRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRuntime")
            .field("invocation", &self.plane.invocation_name())
            .field("depth", &self.plane.depth())
            .finish()
    }
}
