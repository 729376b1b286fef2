#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Execution core of the tandem workflow runtime.
//!
//! The unit of work is a [`CallScope`]: it owns one invocation's toolsets,
//! messages, and cleanup. Scopes nest — a worker exposed as a tool to
//! another worker spawns a child scope one depth level down — and the
//! [`CallFrame`] depth counter against [`RuntimeConfig::max_depth`] is the
//! sole termination mechanism for recursive workflows.
//!
//! A [`Runtime`] is the process-scoped execution environment: immutable
//! policy (approval mode, event sink, depth bound, project root) plus the
//! only mutable cross-call state in the system, the lock-guarded
//! [`UsageCollector`] and [`MessageAccumulator`].

mod config;
mod entry;
mod error;
mod facade;
mod function;
mod input;
mod plane;
mod resolver;
mod runtime;
mod scope;
mod sinks;
mod turn;
mod worker;

pub use config::{ApprovalPolicy, CredentialResolver, ProviderFactory, RuntimeConfig};
pub use entry::Entry;
pub use error::{RuntimeError, RuntimeResult};
pub use facade::CallRuntime;
pub use function::{EntryFn, EntryFnFuture, EntryFunction};
pub use input::{InputModel, PromptInputModel, PromptSpec, WorkerInput};
pub use resolver::Resolver;
pub use runtime::Runtime;
pub use scope::{CallFrame, CallScope};
pub use sinks::{MessageAccumulator, RecordedMessage, UsageCollector, UsageRecord};
pub use worker::{ToolsetRef, Worker, MODEL_ENV_VAR};
