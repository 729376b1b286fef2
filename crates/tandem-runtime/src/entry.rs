//! The uniform entry abstraction.

use std::sync::Arc;

use tandem_llm::Message;

use crate::error::RuntimeResult;
use crate::function::EntryFunction;
use crate::input::InputModel;
use crate::runtime::Runtime;
use crate::scope::CallScope;
use crate::worker::{ToolsetRef, Worker};

/// A uniquely named invocable: an LLM-backed worker or a code entry
/// function. Downstream code discriminates on the variant, never on
/// duck-typed capabilities.
#[derive(Debug, Clone)]
pub enum Entry {
    /// LLM-backed worker.
    Worker(Arc<Worker>),
    /// Native entry function.
    Function(Arc<EntryFunction>),
}

impl Entry {
    /// Entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Worker(worker) => worker.name(),
            Self::Function(function) => function.name(),
        }
    }

    /// Toolset references in declaration order.
    #[must_use]
    pub fn toolset_refs(&self) -> &[ToolsetRef] {
        match self {
            Self::Worker(worker) => worker.toolset_refs(),
            Self::Function(function) => function.toolset_refs(),
        }
    }

    /// Input schema handle.
    #[must_use]
    pub fn input_model(&self) -> &Arc<dyn InputModel> {
        match self {
            Self::Worker(worker) => worker.input_model(),
            Self::Function(function) => function.input_model(),
        }
    }

    /// Description for worker-as-tool schemas.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Worker(worker) => worker.description(),
            Self::Function(function) => function.description(),
        }
    }

    /// Open a root call scope for this entry.
    ///
    /// The scope is returned open and can run multiple turns; the caller is
    /// responsible for closing it. `message_history` seeds the frame's
    /// conversation for chat-style reuse.
    ///
    /// # Errors
    ///
    /// Fails when the depth bound is zero or a declared toolset cannot be
    /// instantiated.
    pub async fn start(
        &self,
        runtime: &Arc<Runtime>,
        message_history: Option<Vec<Message>>,
    ) -> RuntimeResult<CallScope> {
        CallScope::open(Arc::clone(runtime), self.clone(), 0, None, None, message_history).await
    }
}
