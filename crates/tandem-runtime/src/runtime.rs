//! The process-scoped execution environment.

use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use tandem_approval::ApprovalBroker;
use tandem_events::{EventMeta, EventSink, RuntimeEvent};
use tandem_llm::{LlmError, LlmProvider, NullModel, Usage};

use crate::config::RuntimeConfig;
use crate::entry::Entry;
use crate::error::RuntimeResult;
use crate::input::WorkerInput;
use crate::resolver::Resolver;
use crate::scope::CallScope;
use crate::sinks::{MessageAccumulator, RecordedMessage, UsageCollector, UsageRecord};

/// The execution environment for one run (or one interactive session).
///
/// Immutable policy lives in [`RuntimeConfig`]; the only mutable state is
/// the usage and message sinks, the approval broker's session cache, and
/// the monotonic id counters. The runtime owns toolset factories by
/// reference through the [`Resolver`] — never instances.
pub struct Runtime {
    config: RuntimeConfig,
    resolver: Arc<Resolver>,
    usage: UsageCollector,
    messages: MessageAccumulator,
    broker: ApprovalBroker,
    events: EventSink,
    next_call_id: AtomicU64,
    run_id: Uuid,
}

impl Runtime {
    /// Create a runtime over a linked project.
    ///
    /// The approval callback is resolved once, here; its session cache
    /// lives for this runtime's lifetime and is never shared.
    #[must_use]
    pub fn new(config: RuntimeConfig, resolver: Arc<Resolver>) -> Arc<Self> {
        let broker = ApprovalBroker::new(config.approval.mode, config.approval.handler.clone());
        let events = EventSink::new(config.on_event.clone());
        let run_id = Uuid::new_v4();
        info!(%run_id, mode = ?config.approval.mode, max_depth = config.max_depth, "runtime created");
        Arc::new(Self {
            config,
            resolver,
            usage: UsageCollector::new(),
            messages: MessageAccumulator::new(),
            broker,
            events,
            next_call_id: AtomicU64::new(0),
            run_id,
        })
    }

    /// The immutable configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The linked-project resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// This run's id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Aggregated token usage across all calls so far.
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.usage.total()
    }

    /// Per-call usage records.
    #[must_use]
    pub fn usage_records(&self) -> Vec<UsageRecord> {
        self.usage.records()
    }

    /// The run transcript so far.
    #[must_use]
    pub fn messages(&self) -> Vec<RecordedMessage> {
        self.messages.snapshot()
    }

    pub(crate) fn usage_collector(&self) -> &UsageCollector {
        &self.usage
    }

    pub(crate) fn message_accumulator(&self) -> &MessageAccumulator {
        &self.messages
    }

    pub(crate) fn broker(&self) -> &ApprovalBroker {
        &self.broker
    }

    pub(crate) fn events(&self) -> &EventSink {
        &self.events
    }

    /// Allocate the next run-local tool call id.
    pub(crate) fn next_call_id(&self) -> u64 {
        self.next_call_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Resolve a provider for a frame's model. `None` (entry function
    /// frames) yields the null model, which hard-fails any LLM call.
    ///
    /// # Errors
    ///
    /// Fails when no provider factory is configured or the factory cannot
    /// serve the model.
    pub fn provider_for(&self, model: Option<&str>) -> RuntimeResult<Arc<dyn LlmProvider>> {
        let Some(model) = model else {
            return Ok(Arc::new(NullModel));
        };
        let factory = self.config.providers.as_ref().ok_or_else(|| LlmError::NoProvider {
            model: model.to_string(),
        })?;
        let provider = factory.create(model, self.config.credentials.as_deref())?;
        Ok(provider)
    }

    /// Run one turn of `entry` and return the output together with the
    /// still-open scope. The caller is responsible for closing the scope
    /// (or for running further turns first).
    ///
    /// # Errors
    ///
    /// On failure the scope is closed (toolset cleanup still runs) and the
    /// error is returned.
    pub async fn run(
        self: &Arc<Self>,
        entry: &Entry,
        input: WorkerInput,
    ) -> RuntimeResult<(Value, CallScope)> {
        debug!(entry = entry.name(), "starting run");
        let mut scope = entry.start(self, None).await?;
        match scope.run_turn(input).await {
            Ok(output) => Ok((output, scope)),
            Err(error) => {
                self.events.emit(RuntimeEvent::Error {
                    meta: EventMeta::new(entry.name(), 0, self.events.next_event_id(), 0),
                    kind: error.kind().to_string(),
                    message: error.to_string(),
                });
                scope.close().await;
                Err(error)
            }
        }
    }

    /// Run one turn of `entry` and close the scope.
    ///
    /// # Errors
    ///
    /// Returns the turn's error after cleanup has run.
    pub async fn run_to_completion(
        self: &Arc<Self>,
        entry: &Entry,
        input: WorkerInput,
    ) -> RuntimeResult<Value> {
        let (output, mut scope) = self.run(entry, input).await?;
        scope.close().await;
        Ok(output)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .finish()
    }
}
