//! Shared fixtures for the integration suite.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use tandem_approval::{ApprovalHandler, ApprovalMode};
use tandem_project::{Manifest, ModuleRegistry, Project, link_manifest};
use tandem_runtime::{ApprovalPolicy, Runtime, RuntimeConfig};
use tandem_test::{CollectingSink, MockProvider, MockProviderFactory};

/// A project fixture on disk: tempdir, manifest, worker files.
pub struct Fixture {
    pub dir: TempDir,
    pub project: Project,
}

/// Write a worker file into `dir`.
pub fn write_worker(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).expect("write worker file");
}

/// Link a project from worker files already written into `dir`.
pub fn link_fixture(
    dir: TempDir,
    entry: &str,
    worker_files: &[&str],
    modules: &ModuleRegistry,
) -> Fixture {
    let manifest_json = serde_json::json!({
        "version": 1,
        "entry": { "name": entry },
        "worker_files": worker_files,
        "allow_cli_input": false,
    });
    let manifest: Manifest =
        serde_json::from_value(manifest_json).expect("manifest fixture parses");
    let project = link_manifest(manifest, dir.path(), modules).expect("fixture links");
    Fixture { dir, project }
}

/// Runtime configuration wired for tests: mock provider factory, capture
/// sink, and the given approval policy.
pub fn test_config(
    fixture: &Fixture,
    provider: &MockProvider,
    mode: ApprovalMode,
    handler: Option<Arc<dyn ApprovalHandler>>,
    sink: &CollectingSink,
) -> RuntimeConfig {
    RuntimeConfig {
        approval: ApprovalPolicy {
            mode,
            handler,
            return_permission_errors: false,
        },
        on_event: Some(sink.callback()),
        project_root: fixture.dir.path().to_path_buf(),
        providers: Some(MockProviderFactory::new(provider.clone())),
        ..RuntimeConfig::default()
    }
}

/// Build a runtime over a fixture.
pub fn test_runtime(
    fixture: &Fixture,
    provider: &MockProvider,
    mode: ApprovalMode,
    handler: Option<Arc<dyn ApprovalHandler>>,
    sink: &CollectingSink,
) -> Arc<Runtime> {
    let config = test_config(fixture, provider, mode, handler, sink);
    Runtime::new(config, Arc::clone(&fixture.project.resolver))
}
