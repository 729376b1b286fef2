//! The linker: manifest + worker files + modules → one executable entry.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use tandem_runtime::{
    Entry, EntryFunction, InputModel, PromptInputModel, Resolver, RuntimeError, ToolsetRef, Worker,
};
use tandem_tools::{ToolsetRegistry, ToolsetSpec};

use crate::error::{ProjectError, ProjectResult};
use crate::manifest::Manifest;
use crate::module::{EntryFunctionDef, ModuleRegistry};
use crate::worker_file::{WorkerDefinition, parse_worker_file};

/// A linked project: the selected entry plus the registries the runtime
/// executes against.
#[derive(Debug)]
pub struct Project {
    /// The manifest the project was linked from.
    pub manifest: Manifest,
    /// The selected entry.
    pub entry: Entry,
    /// Name registries for the runtime.
    pub resolver: Arc<Resolver>,
}

/// Load a manifest file and link the project it describes.
///
/// # Errors
///
/// Any manifest, worker-file, or resolution failure; see [`ProjectError`].
pub fn link(manifest_path: &Path, modules: &ModuleRegistry) -> ProjectResult<Project> {
    let (manifest, base_dir) = Manifest::load(manifest_path)?;
    link_manifest(manifest, &base_dir, modules)
}

/// Link an already-parsed manifest.
///
/// Resolution order:
/// 1. merge built-in toolset factories with module contributions
///    (collisions fail),
/// 2. construct a `Worker` per worker definition (input model, toolset
///    refs, model),
/// 3. union workers and entry functions into the entry registry
///    (collisions fail),
/// 4. select `manifest.entry.name` (must exist).
///
/// # Errors
///
/// Any resolution failure; every error names the offending entity.
pub fn link_manifest(
    manifest: Manifest,
    base_dir: &Path,
    modules: &ModuleRegistry,
) -> ProjectResult<Project> {
    manifest.validate()?;
    let mut toolsets = ToolsetRegistry::with_builtins();
    let mut input_models: HashMap<String, Arc<dyn InputModel>> = HashMap::new();
    let default_model: Arc<dyn InputModel> = Arc::new(PromptInputModel);
    input_models.insert(default_model.name().to_string(), Arc::clone(&default_model));

    // 1. Merge module contributions. Name collisions fail loudly.
    let mut linked_functions: Vec<&EntryFunctionDef> = Vec::new();
    for module_name in &manifest.modules {
        let module = modules
            .get(module_name)
            .ok_or_else(|| ProjectError::UnknownModule {
                name: module_name.clone(),
                available: modules.names(),
            })?;
        for (toolset_name, factory) in module.toolsets() {
            if toolsets.contains(toolset_name) {
                return Err(ProjectError::DuplicateToolset {
                    name: toolset_name.clone(),
                    module: module_name.clone(),
                });
            }
            toolsets.register(toolset_name.clone(), Arc::clone(factory));
        }
        for model in module.input_models() {
            let name = model.name().to_string();
            if input_models.contains_key(&name) {
                return Err(ProjectError::DuplicateInputModel {
                    name,
                    module: module_name.clone(),
                });
            }
            input_models.insert(name, Arc::clone(model));
        }
        linked_functions.extend(module.entry_functions());
        debug!(module = %module_name, "module linked");
    }

    // 2. Parse worker files.
    let mut definitions: Vec<WorkerDefinition> = Vec::new();
    for path in manifest.resolved_worker_files(base_dir) {
        let content = std::fs::read_to_string(&path).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        definitions.push(parse_worker_file(&path, &content)?);
    }

    let mut worker_names: HashSet<String> = HashSet::new();
    for definition in &definitions {
        if !worker_names.insert(definition.name.clone()) {
            return Err(ProjectError::DuplicateWorker {
                name: definition.name.clone(),
            });
        }
    }

    // At most one worker may be flagged as the entry candidate, and a flag
    // must agree with the manifest's selection.
    let flagged: Vec<String> = definitions
        .iter()
        .filter(|d| d.entry)
        .map(|d| d.name.clone())
        .collect();
    if flagged.len() > 1 {
        return Err(ProjectError::MultipleEntryFlags { names: flagged });
    }
    if let Some(flagged_name) = flagged.first()
        && *flagged_name != manifest.entry.name
    {
        return Err(ProjectError::EntryFlagMismatch {
            flagged: flagged_name.clone(),
            selected: manifest.entry.name.clone(),
        });
    }

    // 3. Construct workers. A `toolsets` reference may name a factory or
    //    any worker in the project (including the worker itself).
    let mut workers: HashMap<String, Arc<Worker>> = HashMap::new();
    for definition in &definitions {
        let input_model = resolve_input_model(&input_models, &definition.name, definition.input.as_deref())?;
        let refs = resolve_toolset_refs(
            &toolsets,
            &worker_names,
            &definition.name,
            &definition.toolsets,
        )?;

        let declared_model = if definition.name == manifest.entry.name {
            manifest.entry.model.clone().or_else(|| definition.model.clone())
        } else {
            definition.model.clone()
        };

        let mut worker = Worker::new(
            &definition.name,
            &definition.instructions,
            input_model,
            refs,
            declared_model,
        )
        .map_err(|error| match error {
            RuntimeError::ModelUnresolved { worker } => ProjectError::ModelUnresolved { worker },
            other => ProjectError::WorkerParse {
                path: base_dir.to_path_buf(),
                reason: other.to_string(),
            },
        })?
        .with_compatible_models(definition.compatible_models.clone());
        if let Some(description) = &definition.description {
            worker = worker.with_description(description.clone());
        }
        workers.insert(definition.name.clone(), Arc::new(worker));
    }

    // 4. Entry registry: union of workers and entry functions.
    let mut entries: HashMap<String, Entry> = HashMap::new();
    for (name, worker) in &workers {
        entries.insert(name.clone(), Entry::Worker(Arc::clone(worker)));
    }
    for def in linked_functions {
        if entries.contains_key(&def.name) {
            return Err(ProjectError::DuplicateEntry {
                name: def.name.clone(),
            });
        }
        let input_model = resolve_input_model(&input_models, &def.name, def.input.as_deref())?;
        let refs = resolve_toolset_refs(&toolsets, &worker_names, &def.name, &def.toolsets)?;
        let mut function = EntryFunction::new(&def.name, input_model, refs, Arc::clone(&def.func));
        if let Some(description) = &def.description {
            function = function.with_description(description.clone());
        }
        entries.insert(def.name.clone(), Entry::Function(Arc::new(function)));
    }

    // 5. Select the entry.
    let entry = entries
        .get(&manifest.entry.name)
        .cloned()
        .ok_or_else(|| {
            let mut available: Vec<String> = entries.keys().cloned().collect();
            available.sort();
            ProjectError::EntryNotFound {
                name: manifest.entry.name.clone(),
                available,
            }
        })?;

    if manifest.entry.model.is_some() && matches!(entry, Entry::Function(_)) {
        warn!(
            entry = %manifest.entry.name,
            "entry.model is ignored for entry functions"
        );
    }

    info!(
        entry = %manifest.entry.name,
        workers = workers.len(),
        toolsets = toolsets.names().len(),
        "project linked"
    );

    Ok(Project {
        manifest,
        entry,
        resolver: Arc::new(Resolver::new(toolsets, workers)),
    })
}

fn resolve_input_model(
    input_models: &HashMap<String, Arc<dyn InputModel>>,
    owner: &str,
    reference: Option<&str>,
) -> ProjectResult<Arc<dyn InputModel>> {
    let name = reference.unwrap_or("prompt");
    input_models
        .get(name)
        .cloned()
        .ok_or_else(|| ProjectError::UnknownInputModel {
            owner: owner.to_string(),
            name: name.to_string(),
        })
}

fn resolve_toolset_refs(
    toolsets: &ToolsetRegistry,
    worker_names: &HashSet<String>,
    owner: &str,
    references: &[String],
) -> ProjectResult<Vec<ToolsetRef>> {
    references
        .iter()
        .map(|name| {
            if worker_names.contains(name) {
                Ok(ToolsetRef::Worker(name.clone()))
            } else if toolsets.contains(name) {
                Ok(ToolsetRef::Toolset(ToolsetSpec::named(name)))
            } else {
                Err(ProjectError::UnknownToolset {
                    owner: owner.to_string(),
                    name: name.clone(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestEntry, ManifestRuntime};
    use serde_json::Value;
    use tandem_runtime::{CallRuntime, WorkerInput};

    fn manifest_for(entry: &str) -> Manifest {
        Manifest {
            version: 1,
            runtime: ManifestRuntime::default(),
            entry: ManifestEntry {
                name: entry.to_string(),
                model: None,
                input: None,
            },
            worker_files: Vec::new(),
            modules: Vec::new(),
            allow_cli_input: false,
        }
    }

    fn write_worker(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    fn noop_function(name: &str) -> EntryFunctionDef {
        EntryFunctionDef {
            name: name.to_string(),
            input: None,
            toolsets: Vec::new(),
            description: None,
            func: Arc::new(|_input: WorkerInput, _runtime: CallRuntime| {
                let future: tandem_runtime::EntryFnFuture = Box::pin(async { Ok(Value::Null) });
                future
            }),
        }
    }

    #[test]
    fn test_links_single_worker_entry() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "greeter.worker",
            "---\nname: greeter\nmodel: test-model\n---\nGreet.\n",
        );
        let mut manifest = manifest_for("greeter");
        manifest.worker_files = vec!["greeter.worker".into()];

        let project = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap();
        assert_eq!(project.entry.name(), "greeter");
        assert!(project.resolver.worker("greeter").is_some());
    }

    #[test]
    fn test_entry_not_found_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "a.worker",
            "---\nname: alpha\nmodel: m\n---\nA.\n",
        );
        let mut manifest = manifest_for("missing");
        manifest.worker_files = vec!["a.worker".into()];

        let err = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap_err();
        match err {
            ProjectError::EntryNotFound { name, available } => {
                assert_eq!(name, "missing");
                assert_eq!(available, vec!["alpha".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_worker_names_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(dir.path(), "a.worker", "---\nname: twin\nmodel: m\n---\nA.\n");
        write_worker(dir.path(), "b.worker", "---\nname: twin\nmodel: m\n---\nB.\n");
        let mut manifest = manifest_for("twin");
        manifest.worker_files = vec!["a.worker".into(), "b.worker".into()];

        let err = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateWorker { .. }));
    }

    #[test]
    fn test_worker_and_function_name_collision_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "main.worker",
            "---\nname: main\nmodel: m\n---\nBody.\n",
        );
        let mut registry = ModuleRegistry::new();
        registry
            .register(crate::module::ProjectModule::new("extras").with_entry_function(noop_function("main")))
            .unwrap();
        let mut manifest = manifest_for("main");
        manifest.worker_files = vec!["main.worker".into()];
        manifest.modules = vec!["extras".to_string()];

        let err = link_manifest(manifest, dir.path(), &registry).unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateEntry { .. }));
    }

    #[test]
    fn test_unknown_toolset_names_owner() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "w.worker",
            "---\nname: writer\nmodel: m\ntoolsets:\n- ghost\n---\nW.\n",
        );
        let mut manifest = manifest_for("writer");
        manifest.worker_files = vec!["w.worker".into()];

        let err = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap_err();
        match err {
            ProjectError::UnknownToolset { owner, name } => {
                assert_eq!(owner, "writer");
                assert_eq!(name, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_reference_links() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "rec.worker",
            "---\nname: rec\nmodel: m\ntoolsets:\n- rec\n---\nRecurse.\n",
        );
        let mut manifest = manifest_for("rec");
        manifest.worker_files = vec!["rec.worker".into()];

        let project = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap();
        let worker = project.resolver.worker("rec").unwrap();
        assert!(matches!(
            worker.toolset_refs()[0],
            ToolsetRef::Worker(ref name) if name == "rec"
        ));
    }

    #[test]
    fn test_unknown_module_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = manifest_for("main");
        manifest.modules = vec!["ghost".to_string()];

        let err = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap_err();
        assert!(matches!(err, ProjectError::UnknownModule { .. }));
    }

    #[test]
    fn test_entry_flag_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "a.worker",
            "---\nname: alpha\nmodel: m\nentry: true\n---\nA.\n",
        );
        write_worker(dir.path(), "b.worker", "---\nname: beta\nmodel: m\n---\nB.\n");
        let mut manifest = manifest_for("beta");
        manifest.worker_files = vec!["a.worker".into(), "b.worker".into()];

        let err = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap_err();
        assert!(matches!(err, ProjectError::EntryFlagMismatch { .. }));
    }

    #[test]
    fn test_entry_model_overrides_worker_model() {
        let dir = tempfile::tempdir().unwrap();
        write_worker(
            dir.path(),
            "g.worker",
            "---\nname: greeter\nmodel: base-model\n---\nG.\n",
        );
        let mut manifest = manifest_for("greeter");
        manifest.worker_files = vec!["g.worker".into()];
        manifest.entry.model = Some("override-model".to_string());

        let project = link_manifest(manifest, dir.path(), &ModuleRegistry::new()).unwrap();
        let worker = project.resolver.worker("greeter").unwrap();
        assert_eq!(worker.model(), "override-model");
    }

    #[test]
    fn test_function_entry_links() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ModuleRegistry::new();
        registry
            .register(crate::module::ProjectModule::new("extras").with_entry_function(noop_function("main")))
            .unwrap();
        let mut manifest = manifest_for("main");
        manifest.modules = vec!["extras".to_string()];

        let project = link_manifest(manifest, dir.path(), &registry).unwrap();
        assert!(matches!(project.entry, Entry::Function(_)));
    }
}
