//! Link-time errors. Every variant names what a human needs to fix the
//! manifest.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Errors raised while loading or linking a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// A referenced file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The manifest is not valid JSON for the schema.
    #[error("invalid manifest {path}: {source}")]
    ManifestParse {
        /// The manifest file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The manifest version is not the supported integer.
    #[error("unsupported manifest version {found} (expected 1)")]
    ManifestVersion {
        /// The version found.
        found: u32,
    },

    /// A worker file failed to parse.
    #[error("invalid worker file {path}: {reason}")]
    WorkerParse {
        /// The worker file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Two worker files declare the same name.
    #[error("duplicate worker name '{name}'")]
    DuplicateWorker {
        /// The colliding name.
        name: String,
    },

    /// More than one worker file sets `entry: true`.
    #[error("multiple workers flagged as entry: {}", names.join(", "))]
    MultipleEntryFlags {
        /// The flagged workers.
        names: Vec<String>,
    },

    /// A worker flagged `entry: true` is not the manifest's entry.
    #[error("worker '{flagged}' is flagged as entry but the manifest selects '{selected}'")]
    EntryFlagMismatch {
        /// The flagged worker.
        flagged: String,
        /// The manifest's selection.
        selected: String,
    },

    /// The manifest names a module that is not registered.
    #[error("module '{name}' is not registered (registered: {})", available.join(", "))]
    UnknownModule {
        /// The missing module.
        name: String,
        /// Modules that are registered.
        available: Vec<String>,
    },

    /// Two modules registered under the same name.
    #[error("duplicate module name '{name}'")]
    DuplicateModule {
        /// The colliding name.
        name: String,
    },

    /// A toolset name collides with an existing factory.
    #[error("duplicate toolset name '{name}' (contributed by module '{module}')")]
    DuplicateToolset {
        /// The colliding name.
        name: String,
        /// The module that contributed it.
        module: String,
    },

    /// An input model name collides with an existing one.
    #[error("duplicate input model '{name}' (contributed by module '{module}')")]
    DuplicateInputModel {
        /// The colliding name.
        name: String,
        /// The module that contributed it.
        module: String,
    },

    /// A worker and an entry function share a name.
    #[error("duplicate entry name '{name}'")]
    DuplicateEntry {
        /// The colliding name.
        name: String,
    },

    /// A `toolsets` reference resolves to neither a factory nor a worker.
    #[error("worker '{owner}' references unknown toolset '{name}'")]
    UnknownToolset {
        /// The worker or function holding the reference.
        owner: String,
        /// The unresolved name.
        name: String,
    },

    /// An input model reference resolves to nothing.
    #[error("'{owner}' references unknown input model '{name}'")]
    UnknownInputModel {
        /// The worker or function holding the reference.
        owner: String,
        /// The unresolved name.
        name: String,
    },

    /// The manifest's entry name resolves to nothing.
    #[error("entry '{name}' not found (available: {})", available.join(", "))]
    EntryNotFound {
        /// The requested entry.
        name: String,
        /// Entries that do exist.
        available: Vec<String>,
    },

    /// A worker has no model and no environment fallback.
    #[error("no model resolved for worker '{worker}' (set model in frontmatter or TANDEM_MODEL)")]
    ModelUnresolved {
        /// The worker without a model.
        worker: String,
    },
}
