//! Code-backed entries.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::RuntimeResult;
use crate::facade::CallRuntime;
use crate::input::InputModel;
use crate::worker::ToolsetRef;

/// Boxed future returned by an entry function.
pub type EntryFnFuture = Pin<Box<dyn Future<Output = RuntimeResult<Value>> + Send>>;

/// The callable behind an [`EntryFunction`].
pub type EntryFn = Arc<dyn Fn(crate::input::WorkerInput, CallRuntime) -> EntryFnFuture + Send + Sync>;

/// A deterministic code entry: a registered native function invoked inside a
/// call scope, with the same toolset declaration surface as a worker but no
/// LLM model. Its call frame carries the null model, which hard-fails any
/// model request.
pub struct EntryFunction {
    name: String,
    input_model: Arc<dyn InputModel>,
    toolset_refs: Vec<ToolsetRef>,
    func: EntryFn,
    description: Option<String>,
}

impl EntryFunction {
    /// Create an entry function.
    pub fn new(
        name: impl Into<String>,
        input_model: Arc<dyn InputModel>,
        toolset_refs: Vec<ToolsetRef>,
        func: EntryFn,
    ) -> Self {
        Self {
            name: name.into(),
            input_model,
            toolset_refs,
            func,
            description: None,
        }
    }

    /// Convenience constructor from an async closure.
    pub fn from_async<F, Fut>(
        name: impl Into<String>,
        input_model: Arc<dyn InputModel>,
        toolset_refs: Vec<ToolsetRef>,
        func: F,
    ) -> Self
    where
        F: Fn(crate::input::WorkerInput, CallRuntime) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RuntimeResult<Value>> + Send + 'static,
    {
        Self::new(
            name,
            input_model,
            toolset_refs,
            Arc::new(move |input, runtime| {
                let future: EntryFnFuture = Box::pin(func(input, runtime));
                future
            }),
        )
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input schema handle.
    #[must_use]
    pub fn input_model(&self) -> &Arc<dyn InputModel> {
        &self.input_model
    }

    /// Declared toolset references.
    #[must_use]
    pub fn toolset_refs(&self) -> &[ToolsetRef] {
        &self.toolset_refs
    }

    /// Description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The callable itself.
    #[must_use]
    pub(crate) fn func(&self) -> &EntryFn {
        &self.func
    }
}

impl std::fmt::Debug for EntryFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFunction")
            .field("name", &self.name)
            .field("toolset_refs", &self.toolset_refs.len())
            .finish()
    }
}
