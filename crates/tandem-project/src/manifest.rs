//! The project manifest: strict JSON, version 1.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use tandem_approval::ApprovalMode;
use tandem_runtime::RuntimeConfig;

use crate::error::{ProjectError, ProjectResult};

/// The static project manifest.
///
/// Strict schema: unknown keys are rejected, the version must be the
/// integer `1`, and all paths resolve relative to the manifest's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Schema version; must be 1.
    pub version: u32,
    /// Runtime defaults (overridable by the harness).
    #[serde(default)]
    pub runtime: ManifestRuntime,
    /// The entry to execute.
    pub entry: ManifestEntry,
    /// Worker files to load, relative to the manifest directory.
    #[serde(default)]
    pub worker_files: Vec<PathBuf>,
    /// Registered modules to link (toolsets, entry functions, input models).
    #[serde(default)]
    pub modules: Vec<String>,
    /// Whether a positional CLI prompt may override `entry.input`.
    #[serde(default)]
    pub allow_cli_input: bool,
}

/// Runtime defaults carried by the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestRuntime {
    /// Maximum call nesting depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Verbosity: 0 quiet, 1 progress, 2 streaming deltas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,
    /// Approval mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<ApprovalMode>,
    /// Surface permission denials to the model as structured errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_permission_errors: Option<bool>,
}

impl ManifestRuntime {
    /// Overlay these defaults onto a runtime configuration.
    pub fn apply(&self, config: &mut RuntimeConfig) {
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity;
        }
        if let Some(mode) = self.approval_mode {
            config.approval.mode = mode;
        }
        if let Some(flag) = self.return_permission_errors {
            config.approval.return_permission_errors = flag;
        }
    }
}

/// The manifest's entry selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Entry name; must resolve to exactly one worker or entry function.
    pub name: String,
    /// Model override for the selected entry (worker entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Default input when the harness provides none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl Manifest {
    /// Load and validate a manifest file. Returns the manifest and its
    /// directory (the base for relative paths).
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, schema violations, unknown keys, and
    /// unsupported versions.
    pub fn load(path: &Path) -> ProjectResult<(Self, PathBuf)> {
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| ProjectError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        let base_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok((manifest, base_dir))
    }

    /// Validate invariants the schema cannot express.
    ///
    /// # Errors
    ///
    /// Fails when the version is not 1.
    pub fn validate(&self) -> ProjectResult<()> {
        if self.version != 1 {
            return Err(ProjectError::ManifestVersion {
                found: self.version,
            });
        }
        Ok(())
    }

    /// Worker file paths resolved against the manifest directory.
    #[must_use]
    pub fn resolved_worker_files(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.worker_files
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { base_dir.join(p) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(version: u32) -> String {
        format!(r#"{{"version": {version}, "entry": {{"name": "main"}}}}"#)
    }

    #[test]
    fn test_minimal_manifest_parses() {
        let manifest: Manifest = serde_json::from_str(&minimal(1)).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.entry.name, "main");
        assert!(manifest.worker_files.is_empty());
        assert!(!manifest.allow_cli_input);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let manifest: Manifest = serde_json::from_str(&minimal(2)).unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ProjectError::ManifestVersion { found: 2 })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let raw = r#"{"version": 1, "entry": {"name": "main"}, "surprise": true}"#;
        assert!(serde_json::from_str::<Manifest>(raw).is_err());
    }

    #[test]
    fn test_unknown_entry_keys_rejected() {
        let raw = r#"{"version": 1, "entry": {"name": "main", "extra": 1}}"#;
        assert!(serde_json::from_str::<Manifest>(raw).is_err());
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let raw = r#"{"version": 1, "entry": {"name": "main"}, "worker_files": ["workers/a.worker"]}"#;
        let manifest: Manifest = serde_json::from_str(raw).unwrap();
        let resolved = manifest.resolved_worker_files(Path::new("/proj"));
        assert_eq!(resolved, vec![PathBuf::from("/proj/workers/a.worker")]);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let raw = r#"{
            "version": 1,
            "runtime": {"max_depth": 3, "approval_mode": "approve_all"},
            "entry": {"name": "main", "input": {"input": "go"}},
            "worker_files": ["a.worker", "b.worker"],
            "modules": ["extra"],
            "allow_cli_input": true
        }"#;
        let manifest: Manifest = serde_json::from_str(raw).unwrap();
        let serialized = serde_json::to_string(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back.entry.name, manifest.entry.name);
        assert_eq!(back.worker_files, manifest.worker_files);
        assert_eq!(back.runtime.max_depth, Some(3));
        assert!(back.allow_cli_input);
    }
}
