//! Registered modules: the native contribution surface for toolsets, entry
//! functions, and input models.
//!
//! The manifest's `modules` list names entries in a [`ModuleRegistry`] the
//! host populated before linking. An unregistered name fails the link; the
//! registry preserves the manifest-driven semantics (declared names,
//! link-time failure) without any dynamic loading.

use std::collections::HashMap;
use std::sync::Arc;

use tandem_runtime::{EntryFn, InputModel};
use tandem_tools::{ToolsetFactory, ToolsetInit, Toolset};

use crate::error::{ProjectError, ProjectResult};

/// Declaration of an entry function inside a module.
///
/// Toolset names are resolved to specs (or worker references) at link time,
/// like a worker's `toolsets` list.
pub struct EntryFunctionDef {
    /// Function name; shares the entry namespace with workers.
    pub name: String,
    /// Input model name; `None` means the default prompt model.
    pub input: Option<String>,
    /// Declared toolset references.
    pub toolsets: Vec<String>,
    /// Description, if any.
    pub description: Option<String>,
    /// The callable.
    pub func: EntryFn,
}

impl std::fmt::Debug for EntryFunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFunctionDef")
            .field("name", &self.name)
            .field("toolsets", &self.toolsets)
            .finish()
    }
}

/// A named bundle of contributions to the project namespace.
pub struct ProjectModule {
    name: String,
    toolsets: Vec<(String, ToolsetFactory)>,
    entry_functions: Vec<EntryFunctionDef>,
    input_models: Vec<Arc<dyn InputModel>>,
}

impl ProjectModule {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            toolsets: Vec::new(),
            entry_functions: Vec::new(),
            input_models: Vec::new(),
        }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contribute a toolset factory.
    #[must_use]
    pub fn with_toolset<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ToolsetInit) -> tandem_tools::ToolResult<Arc<dyn Toolset>> + Send + Sync + 'static,
    {
        self.toolsets.push((name.into(), Arc::new(factory)));
        self
    }

    /// Contribute an entry function.
    #[must_use]
    pub fn with_entry_function(mut self, def: EntryFunctionDef) -> Self {
        self.entry_functions.push(def);
        self
    }

    /// Contribute an input model.
    #[must_use]
    pub fn with_input_model(mut self, model: Arc<dyn InputModel>) -> Self {
        self.input_models.push(model);
        self
    }

    pub(crate) fn toolsets(&self) -> &[(String, ToolsetFactory)] {
        &self.toolsets
    }

    pub(crate) fn entry_functions(&self) -> &[EntryFunctionDef] {
        &self.entry_functions
    }

    pub(crate) fn input_models(&self) -> &[Arc<dyn InputModel>] {
        &self.input_models
    }
}

impl std::fmt::Debug for ProjectModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectModule")
            .field("name", &self.name)
            .field("toolsets", &self.toolsets.len())
            .field("entry_functions", &self.entry_functions.len())
            .field("input_models", &self.input_models.len())
            .finish()
    }
}

/// Host-populated registry of modules available to manifests.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ProjectModule>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::DuplicateModule`] if the name is taken.
    pub fn register(&mut self, module: ProjectModule) -> ProjectResult<()> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(ProjectError::DuplicateModule { name });
        }
        self.modules.insert(name, module);
        Ok(())
    }

    /// Look up a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProjectModule> {
        self.modules.get(name)
    }

    /// Registered module names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }
}
