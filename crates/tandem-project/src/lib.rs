#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Project loading and linking for the tandem workflow runtime.
//!
//! A project is a static manifest naming worker files and registered
//! modules. The linker resolves everything into a single executable
//! [`Entry`](tandem_runtime::Entry) plus the name registries the runtime
//! executes against, failing loudly — with the offending names — on any
//! duplicate, unresolved reference, or missing entry.

mod error;
mod linker;
mod manifest;
mod module;
mod worker_file;

pub use error::{ProjectError, ProjectResult};
pub use linker::{Project, link, link_manifest};
pub use manifest::{Manifest, ManifestEntry, ManifestRuntime};
pub use module::{EntryFunctionDef, ModuleRegistry, ProjectModule};
pub use worker_file::{WorkerDefinition, parse_worker_file};
