//! The linked-project view the runtime executes against.

use std::collections::HashMap;
use std::sync::Arc;

use tandem_tools::ToolsetRegistry;

use crate::worker::Worker;

/// Resolved name registries produced by the linker.
///
/// The runtime owns toolset *factories* by reference through this resolver;
/// it never owns toolset instances. Worker lookups serve the worker-as-tool
/// bridge at call time.
pub struct Resolver {
    toolsets: ToolsetRegistry,
    workers: HashMap<String, Arc<Worker>>,
}

impl Resolver {
    /// Create a resolver from a factory registry and a worker index.
    #[must_use]
    pub fn new(toolsets: ToolsetRegistry, workers: HashMap<String, Arc<Worker>>) -> Self {
        Self { toolsets, workers }
    }

    /// The toolset factory registry.
    #[must_use]
    pub fn toolsets(&self) -> &ToolsetRegistry {
        &self.toolsets
    }

    /// Look up a worker by name.
    #[must_use]
    pub fn worker(&self, name: &str) -> Option<&Arc<Worker>> {
        self.workers.get(name)
    }

    /// All worker names, sorted.
    #[must_use]
    pub fn worker_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("toolsets", &self.toolsets.names())
            .field("workers", &self.worker_names())
            .finish()
    }
}
