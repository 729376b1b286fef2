#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Test doubles for the tandem workflow runtime.
//!
//! Everything here is deterministic and offline: a scripted LLM provider, a
//! scripted approval handler, an event-capturing sink, and a stateful
//! counter toolset for isolation tests.

mod counter;
mod events;
mod handler;
mod provider;

pub use counter::CounterToolset;
pub use events::CollectingSink;
pub use handler::ScriptedHandler;
pub use provider::{MockProvider, MockProviderFactory, MockTurn, RecordedRequest};
