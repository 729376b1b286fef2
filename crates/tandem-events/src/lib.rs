#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Typed UI events for the tandem workflow runtime.
//!
//! Every observable action in a run (user prompts, text deltas, tool calls
//! and results, status and errors) is emitted as a [`RuntimeEvent`] through
//! the runtime's single [`EventSink`]. Events carry authoritative
//! attribution: the *direct* caller's invocation name and depth, never the
//! root entry's.

mod event;
mod sink;
mod truncate;

pub use event::{EventMeta, RuntimeEvent};
pub use sink::{EventCallback, EventSink};
pub use truncate::{truncate_args, truncate_result};
