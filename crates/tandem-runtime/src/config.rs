//! Runtime configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tandem_approval::{ApprovalHandler, ApprovalMode};
use tandem_events::EventCallback;
use tandem_llm::{LlmProvider, LlmResult};

/// Default maximum nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: usize = 5;

/// Resolves credentials for provider factories.
///
/// The core never imports an auth store; harnesses that keep OAuth tokens
/// or API keys somewhere inject a resolver here and provider factories
/// consult it.
pub trait CredentialResolver: Send + Sync {
    /// Resolve a credential for a provider identifier.
    fn resolve(&self, provider: &str) -> Option<String>;
}

/// Creates providers for resolved model identifiers.
///
/// The harness supplies this; the core calls it once per worker turn with
/// the frame's model and the configured credential resolver.
pub trait ProviderFactory: Send + Sync {
    /// Create (or reuse) a provider serving `model`.
    ///
    /// # Errors
    ///
    /// Returns an error when no transport can serve the model.
    fn create(
        &self,
        model: &str,
        credentials: Option<&dyn CredentialResolver>,
    ) -> LlmResult<Arc<dyn LlmProvider>>;
}

/// The approval policy slice of the configuration.
#[derive(Clone, Default)]
pub struct ApprovalPolicy {
    /// Resolution mode.
    pub mode: ApprovalMode,
    /// Decision callback for prompt mode.
    pub handler: Option<Arc<dyn ApprovalHandler>>,
    /// When true, denied calls return a structured error object to the
    /// model instead of terminating the turn.
    pub return_permission_errors: bool,
}

impl std::fmt::Debug for ApprovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalPolicy")
            .field("mode", &self.mode)
            .field("has_handler", &self.handler.is_some())
            .field("return_permission_errors", &self.return_permission_errors)
            .finish()
    }
}

/// Immutable per-runtime configuration.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Overrides every worker's resolved model when set.
    pub model_override: Option<String>,
    /// Approval policy.
    pub approval: ApprovalPolicy,
    /// Maximum call nesting depth.
    pub max_depth: usize,
    /// Event callback; `None` drops events.
    pub on_event: Option<EventCallback>,
    /// Verbosity: 0 quiet, 1 progress, 2 streaming text deltas.
    pub verbosity: u8,
    /// Project root for path resolution.
    pub project_root: PathBuf,
    /// Provider factory for worker turns.
    pub providers: Option<Arc<dyn ProviderFactory>>,
    /// Credential resolver handed to the provider factory.
    pub credentials: Option<Arc<dyn CredentialResolver>>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            model_override: None,
            approval: ApprovalPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            on_event: None,
            verbosity: 0,
            project_root,
            providers: None,
            credentials: None,
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("model_override", &self.model_override)
            .field("approval", &self.approval)
            .field("max_depth", &self.max_depth)
            .field("has_on_event", &self.on_event.is_some())
            .field("verbosity", &self.verbosity)
            .field("project_root", &self.project_root)
            .field("has_providers", &self.providers.is_some())
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}
