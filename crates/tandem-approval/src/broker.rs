//! The per-runtime broker that resolves every gated call.

use std::sync::Arc;
use tracing::debug;

use crate::error::{ApprovalError, ApprovalResult};
use crate::handler::ApprovalHandler;
use crate::memory::ApprovalMemory;
use crate::policy::{ApprovalMode, HookDecision, ToolPolicy};
use crate::request::{ApprovalDecision, ApprovalRequest};

/// How a call came to be authorized; useful for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// The toolset's `needs_approval` hook exempted or decided the call.
    Hook,
    /// The tool is pre-approved on its toolset.
    PreApproved,
    /// A cached session decision matched.
    Cached,
    /// The mode approved without a callback (`approve_all`).
    Mode,
    /// The handler approved interactively.
    Handler,
}

/// Resolves gated tool calls for one Runtime.
///
/// Resolution order, first match wins:
/// 1. the toolset's `needs_approval` hook,
/// 2. `blocked` on the toolset policy (wins over pre-approval),
/// 3. `pre_approved` on the toolset policy,
/// 4. the session cache,
/// 5. the mode (`prompt` consults the handler; `approve_all` and
///    `reject_all` decide without one).
pub struct ApprovalBroker {
    mode: ApprovalMode,
    handler: Option<Arc<dyn ApprovalHandler>>,
    memory: ApprovalMemory,
}

impl ApprovalBroker {
    /// Create a broker with the given mode and optional handler.
    #[must_use]
    pub fn new(mode: ApprovalMode, handler: Option<Arc<dyn ApprovalHandler>>) -> Self {
        Self {
            mode,
            handler,
            memory: ApprovalMemory::new(),
        }
    }

    /// The session cache owned by this broker.
    #[must_use]
    pub fn memory(&self) -> &ApprovalMemory {
        &self.memory
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> ApprovalMode {
        self.mode
    }

    /// Resolve one gated call.
    ///
    /// `policy` is the static attribute for this tool on its toolset, if
    /// any; `hook` is the verdict from the toolset's `needs_approval` hook,
    /// if it had one.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Blocked`] for statically blocked tools,
    /// [`ApprovalError::Denied`] when the cache, mode, or handler denies,
    /// and [`ApprovalError::NoHandler`] when prompt mode has no handler.
    pub async fn authorize(
        &self,
        policy: Option<ToolPolicy>,
        hook: Option<HookDecision>,
        request: &ApprovalRequest,
    ) -> ApprovalResult<Authorization> {
        match hook {
            Some(HookDecision::Exempt) => {
                debug!(tool = %request.tool_name, "hook exempted call from approval");
                return Ok(Authorization::Hook);
            }
            Some(HookDecision::Decide(decision)) => {
                return if decision.approved {
                    Ok(Authorization::Hook)
                } else {
                    Err(self.denied(request, &decision))
                };
            }
            Some(HookDecision::Require) => {
                // Fall through to the cache and mode; static attributes are
                // overridden by an explicit Require.
            }
            None => {
                if let Some(policy) = policy {
                    if policy.blocked {
                        return Err(ApprovalError::Blocked {
                            tool_name: request.tool_name.clone(),
                        });
                    }
                    if policy.pre_approved {
                        return Ok(Authorization::PreApproved);
                    }
                }
            }
        }

        if let Some(cached) = self.memory.lookup(&request.tool_name, &request.payload) {
            debug!(tool = %request.tool_name, "reusing cached session decision");
            return if cached.approved {
                Ok(Authorization::Cached)
            } else {
                Err(self.denied(request, &cached))
            };
        }

        match self.mode {
            ApprovalMode::ApproveAll => Ok(Authorization::Mode),
            ApprovalMode::RejectAll => Err(ApprovalError::Denied {
                tool_name: request.tool_name.clone(),
                reason: "approval mode is reject_all".to_string(),
            }),
            ApprovalMode::Prompt => {
                let handler = self.handler.as_ref().ok_or(ApprovalError::NoHandler)?;
                let decision = handler.decide(request.clone()).await;
                self.memory.record(&request.tool_name, &request.payload, &decision);
                if decision.approved {
                    Ok(Authorization::Handler)
                } else {
                    Err(self.denied(request, &decision))
                }
            }
        }
    }

    /// Resolve a gated call whose approvals stick for the session.
    ///
    /// Same flow as [`authorize`](Self::authorize) with no static policy or
    /// hook, except that handler approvals are remembered for the session
    /// regardless of the decision's own `remember` field. The attachment
    /// gate uses this so an approved path never re-prompts within a run.
    ///
    /// # Errors
    ///
    /// Same as [`authorize`](Self::authorize).
    pub async fn authorize_sticky(&self, request: &ApprovalRequest) -> ApprovalResult<Authorization> {
        if let Some(cached) = self.memory.lookup(&request.tool_name, &request.payload) {
            return if cached.approved {
                Ok(Authorization::Cached)
            } else {
                Err(self.denied(request, &cached))
            };
        }

        match self.mode {
            ApprovalMode::ApproveAll => Ok(Authorization::Mode),
            ApprovalMode::RejectAll => Err(ApprovalError::Denied {
                tool_name: request.tool_name.clone(),
                reason: "approval mode is reject_all".to_string(),
            }),
            ApprovalMode::Prompt => {
                let handler = self.handler.as_ref().ok_or(ApprovalError::NoHandler)?;
                let mut decision = handler.decide(request.clone()).await;
                if decision.approved {
                    decision.remember = crate::request::Remember::Session;
                }
                self.memory.record(&request.tool_name, &request.payload, &decision);
                if decision.approved {
                    Ok(Authorization::Handler)
                } else {
                    Err(self.denied(request, &decision))
                }
            }
        }
    }

    fn denied(&self, request: &ApprovalRequest, decision: &ApprovalDecision) -> ApprovalError {
        ApprovalError::Denied {
            tool_name: request.tool_name.clone(),
            reason: decision
                .note
                .clone()
                .unwrap_or_else(|| "denied".to_string()),
        }
    }
}

impl std::fmt::Debug for ApprovalBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalBroker")
            .field("mode", &self.mode)
            .field("has_handler", &self.handler.is_some())
            .field("cached_decisions", &self.memory.len())
            .finish()
    }
}
