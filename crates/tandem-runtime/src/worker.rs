//! LLM-backed workers.

use std::sync::Arc;

use tandem_tools::ToolsetSpec;

use crate::error::{RuntimeError, RuntimeResult};
use crate::input::InputModel;

/// Environment variable consulted when a worker's frontmatter names no model.
pub const MODEL_ENV_VAR: &str = "TANDEM_MODEL";

/// A reference in a worker's `toolsets` list: either a registered toolset
/// factory or another worker exposed as a tool. Self-reference is allowed
/// and enables recursion, bounded only by the runtime depth limit.
#[derive(Debug, Clone)]
pub enum ToolsetRef {
    /// Instantiate a toolset from the factory registry at call time.
    Toolset(ToolsetSpec),
    /// Expose the named worker as a callable tool.
    Worker(String),
}

/// A resolved, callable LLM-backed entry.
///
/// Created once by the linker and shared across calls; never mutated. The
/// model is resolved exactly once, at construction, and is immutable from
/// then on.
pub struct Worker {
    name: String,
    model: String,
    instructions: String,
    input_model: Arc<dyn InputModel>,
    toolset_refs: Vec<ToolsetRef>,
    compatible_models: Vec<String>,
    description: Option<String>,
}

impl Worker {
    /// Construct a worker, resolving the model from `declared_model` or the
    /// `TANDEM_MODEL` environment fallback.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ModelUnresolved`] when neither source names a
    /// model.
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        input_model: Arc<dyn InputModel>,
        toolset_refs: Vec<ToolsetRef>,
        declared_model: Option<String>,
    ) -> RuntimeResult<Self> {
        let name = name.into();
        let model = select_model(declared_model).ok_or_else(|| RuntimeError::ModelUnresolved {
            worker: name.clone(),
        })?;
        Ok(Self {
            name,
            model,
            instructions: instructions.into(),
            input_model,
            toolset_refs,
            compatible_models: Vec::new(),
            description: None,
        })
    }

    /// Set the compatible-models hint (construction-time signal only).
    #[must_use]
    pub fn with_compatible_models(mut self, models: Vec<String>) -> Self {
        self.compatible_models = models;
        self
    }

    /// Set the description used in worker-as-tool schemas.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Worker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved model. Immutable after construction.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Instruction prompt.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Input schema handle.
    #[must_use]
    pub fn input_model(&self) -> &Arc<dyn InputModel> {
        &self.input_model
    }

    /// Toolset references in declaration order.
    #[must_use]
    pub fn toolset_refs(&self) -> &[ToolsetRef] {
        &self.toolset_refs
    }

    /// Compatible models hint.
    #[must_use]
    pub fn compatible_models(&self) -> &[String] {
        &self.compatible_models
    }

    /// Description for worker-as-tool exposure.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("toolset_refs", &self.toolset_refs.len())
            .finish()
    }
}

/// Pick the model for a worker: frontmatter first, environment fallback
/// second. Called exactly once per worker, from the constructor.
fn select_model(declared: Option<String>) -> Option<String> {
    declared
        .filter(|m| !m.is_empty())
        .or_else(|| std::env::var(MODEL_ENV_VAR).ok().filter(|m| !m.is_empty()))
}
