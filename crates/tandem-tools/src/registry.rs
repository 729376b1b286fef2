//! The toolset factory registry.
//!
//! The linker merges built-in factories with module-contributed ones into a
//! single registry; call scopes instantiate from it, one fresh instance per
//! spec per scope.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ToolError, ToolResult};
use crate::toolset::{Toolset, ToolsetSpec};

/// Context handed to a factory at instantiation time.
#[derive(Debug, Clone)]
pub struct ToolsetInit {
    /// Constructor arguments from the spec.
    pub args: Value,
    /// Project root for path resolution.
    pub project_root: PathBuf,
}

/// A toolset factory: invoked once per call scope per spec.
pub type ToolsetFactory = Arc<dyn Fn(&ToolsetInit) -> ToolResult<Arc<dyn Toolset>> + Send + Sync>;

/// Registry of toolset factories by canonical name.
#[derive(Default)]
pub struct ToolsetRegistry {
    factories: HashMap<String, ToolsetFactory>,
}

impl ToolsetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in toolsets registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_factory("shell", |init| {
            Ok(Arc::new(crate::shell::ShellToolset::new(init.project_root.clone())) as Arc<dyn Toolset>)
        });
        registry.register_factory("fs", |init| {
            Ok(Arc::new(crate::fs::FsToolset::new(init.project_root.clone())) as Arc<dyn Toolset>)
        });
        registry
    }

    /// Register a factory under `name`, replacing any existing entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ToolsetFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Register a plain closure as a factory.
    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ToolsetInit) -> ToolResult<Arc<dyn Toolset>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory));
    }

    /// Whether a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered factory names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate a fresh toolset for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Instantiation`] if no factory is registered for
    /// the spec's name or the factory itself fails.
    pub fn instantiate(&self, spec: &ToolsetSpec, project_root: &std::path::Path) -> ToolResult<Arc<dyn Toolset>> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| ToolError::Instantiation {
                name: spec.name.clone(),
                reason: "no factory registered under this name".to_string(),
            })?;
        let init = ToolsetInit {
            args: spec.args.clone(),
            project_root: project_root.to_path_buf(),
        };
        factory(&init)
    }
}

impl std::fmt::Debug for ToolsetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsetRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = ToolsetRegistry::with_builtins();
        assert!(registry.contains("shell"));
        assert!(registry.contains("fs"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn test_instantiate_unknown_fails() {
        let registry = ToolsetRegistry::new();
        let spec = ToolsetSpec::named("ghost");
        let err = registry
            .instantiate(&spec, std::path::Path::new("/tmp"))
            .unwrap_err();
        assert!(matches!(err, ToolError::Instantiation { .. }));
    }

    #[test]
    fn test_instances_are_distinct() {
        let registry = ToolsetRegistry::with_builtins();
        let spec = ToolsetSpec::named("shell");
        let a = registry.instantiate(&spec, std::path::Path::new("/tmp")).unwrap();
        let b = registry.instantiate(&spec, std::path::Path::new("/tmp")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
