//! The `Tool` and `Toolset` traits and the declarative `ToolsetSpec`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use tandem_approval::{ApprovalConfig, HookDecision, Presentation};

use crate::error::ToolResult;

/// A single callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, unique within its toolset.
    fn name(&self) -> &str;

    /// Human-readable description for the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn input_schema(&self) -> Value;

    /// Rendering hint for approval prompts, when the raw payload is not the
    /// clearest presentation.
    fn presentation(&self, _args: &Value) -> Option<Presentation> {
        None
    }

    /// Execute the tool.
    async fn execute(&self, args: Value) -> ToolResult;
}

/// A named container of tools with lifecycle and approval metadata.
///
/// Instances live exactly one call scope. `cleanup` runs when the scope
/// closes, on success and failure alike.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Toolset name.
    fn name(&self) -> &str;

    /// The tools this instance exposes.
    fn tools(&self) -> Vec<Arc<dyn Tool>>;

    /// Static per-tool policy attributes (blocked / pre-approved).
    fn approval_config(&self) -> ApprovalConfig {
        ApprovalConfig::new()
    }

    /// Dynamic approval hook, consulted before the static attributes.
    ///
    /// `None` means "no opinion"; resolution falls through to the static
    /// policy and the session cache.
    async fn needs_approval(&self, _tool_name: &str, _args: &Value) -> Option<HookDecision> {
        None
    }

    /// Release any resources held by this instance.
    async fn cleanup(&self) -> ToolResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset").field("name", &self.name()).finish()
    }
}

/// Declarative reference to a toolset: a registered factory name plus the
/// arguments handed to it at instantiation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsetSpec {
    /// Registered factory name.
    pub name: String,
    /// Constructor arguments.
    #[serde(default)]
    pub args: Value,
}

impl ToolsetSpec {
    /// Reference a factory with no arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Value::Null,
        }
    }

    /// Attach constructor arguments.
    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}
