//! End-to-end scenarios over the mock provider.

mod common;

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use common::{link_fixture, test_runtime, write_worker};
use tandem_approval::{ApprovalDecision, ApprovalMode};
use tandem_project::{EntryFunctionDef, ModuleRegistry, ProjectModule};
use tandem_runtime::{RuntimeError, WorkerInput};
use tandem_test::{CollectingSink, CounterToolset, MockProvider, MockTurn, ScriptedHandler};
use tandem_llm::{ToolCall, Usage};
use tandem_events::RuntimeEvent;

fn greeter_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_worker(
        dir.path(),
        "greeter.worker",
        "---\nname: greeter\nmodel: test-model\n---\nGreet whoever asks.\n",
    );
    dir
}

/// S1: one worker, no toolsets, text response.
#[tokio::test]
async fn scenario_hello_world() {
    let fixture = link_fixture(greeter_dir(), "greeter", &["greeter.worker"], &ModuleRegistry::new());
    let provider = MockProvider::new("test-model").with_turn(MockTurn::text("Hello!"));
    let sink = CollectingSink::new();
    let runtime = test_runtime(&fixture, &provider, ApprovalMode::Prompt, None, &sink);

    let input = WorkerInput::new(
        Arc::clone(fixture.project.entry.input_model()),
        json!({"input": "say hi"}),
    )
    .unwrap();
    let output = runtime
        .run_to_completion(&fixture.project.entry, input)
        .await
        .unwrap();

    assert_eq!(output, Value::String("Hello!".to_string()));
    assert!(runtime.usage().input_tokens > 0);

    let user_messages = sink.of_type("user_message");
    assert_eq!(user_messages.len(), 1);
    assert_eq!(user_messages[0].meta().invocation_name, "greeter");
}

/// S2: a shell tool call under approve_all; the callback is never invoked.
#[tokio::test]
async fn scenario_tool_call_with_approve_all() {
    let dir = TempDir::new().unwrap();
    write_worker(
        dir.path(),
        "runner.worker",
        "---\nname: runner\nmodel: test-model\ntoolsets:\n- shell\n---\nRun things.\n",
    );
    let fixture = link_fixture(dir, "runner", &["runner.worker"], &ModuleRegistry::new());

    let provider = MockProvider::new("test-model")
        .with_turn(MockTurn::tool_calls(vec![
            ToolCall::new("call_1", "shell").with_arguments(json!({"command": "echo hi"})),
        ]))
        .with_turn(MockTurn::text("done"));
    let sink = CollectingSink::new();
    let handler = ScriptedHandler::new();
    let runtime = test_runtime(
        &fixture,
        &provider,
        ApprovalMode::ApproveAll,
        Some(handler.clone()),
        &sink,
    );

    let input = WorkerInput::new(
        Arc::clone(fixture.project.entry.input_model()),
        json!({"input": "echo hi"}),
    )
    .unwrap();
    let output = runtime
        .run_to_completion(&fixture.project.entry, input)
        .await
        .unwrap();

    assert_eq!(output, Value::String("done".to_string()));
    assert_eq!(handler.call_count(), 0);

    let calls = sink.of_type("tool_call");
    let results = sink.of_type("tool_result");
    assert_eq!(calls.len(), 1);
    assert_eq!(results.len(), 1);
    if let RuntimeEvent::ToolResult { result, is_error, .. } = &results[0] {
        assert!(!is_error);
        assert_eq!(result.trim(), "hi");
    } else {
        panic!("expected a tool_result event");
    }

    // The transcript carries the tool result back to the model.
    let recorded = runtime.messages();
    assert!(recorded.iter().any(|m| {
        matches!(&m.message.content, tandem_llm::MessageContent::ToolResult(r) if r.content.trim() == "hi")
    }));
}

/// S3: reject_all fails the turn and still runs toolset cleanup.
#[tokio::test]
async fn scenario_reject_all_runs_cleanup() {
    let dir = TempDir::new().unwrap();
    write_worker(
        dir.path(),
        "counting.worker",
        "---\nname: counting\nmodel: test-model\ntoolsets:\n- counter\n---\nCount.\n",
    );

    let cleanups: Arc<std::sync::Mutex<Vec<Arc<AtomicUsize>>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let cleanups_factory = Arc::clone(&cleanups);
    let mut modules = ModuleRegistry::new();
    modules
        .register(ProjectModule::new("testing").with_toolset("counter", move |_init| {
            let toolset = CounterToolset::new();
            cleanups_factory
                .lock()
                .unwrap()
                .push(toolset.cleanup_handle());
            Ok(Arc::new(toolset) as Arc<dyn tandem_tools::Toolset>)
        }))
        .unwrap();

    let manifest: tandem_project::Manifest = serde_json::from_value(json!({
        "version": 1,
        "entry": { "name": "counting" },
        "worker_files": ["counting.worker"],
        "modules": ["testing"],
    }))
    .unwrap();
    let project = tandem_project::link_manifest(manifest, dir.path(), &modules).unwrap();
    let fixture = common::Fixture { dir, project };

    let provider = MockProvider::new("test-model").with_turn(MockTurn::tool_calls(vec![
        ToolCall::new("call_1", "incr").with_arguments(json!({})),
    ]));
    let sink = CollectingSink::new();
    let runtime = test_runtime(&fixture, &provider, ApprovalMode::RejectAll, None, &sink);

    let input = WorkerInput::new(
        Arc::clone(fixture.project.entry.input_model()),
        json!({"input": "count"}),
    )
    .unwrap();
    let error = runtime
        .run_to_completion(&fixture.project.entry, input)
        .await
        .unwrap_err();

    assert!(matches!(error, RuntimeError::PermissionDenied(_)));
    let handles = cleanups.lock().unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].load(Ordering::SeqCst), 1);
}

/// S4: self-recursion is bounded by max_depth; usage of the successful
/// depths is aggregated.
#[tokio::test]
async fn scenario_recursion_depth_bound() {
    let dir = TempDir::new().unwrap();
    write_worker(
        dir.path(),
        "rec.worker",
        "---\nname: rec\nmodel: test-model\ntoolsets:\n- rec\n---\nRecurse until told otherwise.\n",
    );
    let fixture = link_fixture(dir, "rec", &["rec.worker"], &ModuleRegistry::new());

    let provider = MockProvider::new("test-model");
    for _ in 0..3 {
        provider.push_turn(
            MockTurn::tool_calls(vec![
                ToolCall::new("call", "rec").with_arguments(json!({"input": "deeper"})),
            ])
            .with_usage(Usage::new(11, 7)),
        );
    }

    let sink = CollectingSink::new();
    let mut config = common::test_config(&fixture, &provider, ApprovalMode::ApproveAll, None, &sink);
    config.max_depth = 3;
    let runtime = tandem_runtime::Runtime::new(config, Arc::clone(&fixture.project.resolver));

    let input = WorkerInput::new(
        Arc::clone(fixture.project.entry.input_model()),
        json!({"input": "go"}),
    )
    .unwrap();
    let error = runtime
        .run_to_completion(&fixture.project.entry, input)
        .await
        .unwrap_err();

    assert!(matches!(error, RuntimeError::MaxDepthExceeded { depth: 3, max_depth: 3 }));

    // Three scopes (depths 0, 1, 2) each made one model request.
    let records = runtime.usage_records();
    assert_eq!(records.len(), 3);
    let depths: Vec<usize> = records.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert_eq!(runtime.usage(), Usage::new(33, 21));
}

/// S5: a code entry calls a gated tool and returns without any model.
#[tokio::test]
async fn scenario_entry_function_calls_tool() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("x.txt"), "twelve bytes").unwrap();

    let mut modules = ModuleRegistry::new();
    modules
        .register(
            ProjectModule::new("app").with_entry_function(EntryFunctionDef {
                name: "main".to_string(),
                input: None,
                toolsets: vec!["fs".to_string()],
                description: None,
                func: Arc::new(|_input: WorkerInput, call_runtime: tandem_runtime::CallRuntime| {
                    let future: tandem_runtime::EntryFnFuture = Box::pin(async move {
                        let result = call_runtime
                            .call_tool("read_file", json!({"path": "x.txt"}))
                            .await?;
                        Ok(Value::from(result.content.len()))
                    });
                    future
                }),
            }),
        )
        .unwrap();

    let manifest: tandem_project::Manifest = serde_json::from_value(json!({
        "version": 1,
        "entry": { "name": "main" },
        "modules": ["app"],
    }))
    .unwrap();
    let project = tandem_project::link_manifest(manifest, dir.path(), &modules).unwrap();
    let fixture = common::Fixture { dir, project };

    let provider = MockProvider::new("unused");
    let sink = CollectingSink::new();
    let runtime = test_runtime(&fixture, &provider, ApprovalMode::ApproveAll, None, &sink);

    let input = WorkerInput::new(
        Arc::clone(fixture.project.entry.input_model()),
        json!({"input": "measure"}),
    )
    .unwrap();
    let output = runtime
        .run_to_completion(&fixture.project.entry, input)
        .await
        .unwrap();

    assert_eq!(output, json!(12));
    // No model request was ever made.
    assert!(provider.requests().is_empty());
}

/// S6: attachment approvals stick per path for the session.
#[tokio::test]
async fn scenario_attachment_approval_is_cached() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("data.txt"), "attached").unwrap();
    std::fs::write(dir.path().join("other.txt"), "different").unwrap();
    write_worker(
        dir.path(),
        "reader.worker",
        "---\nname: reader\nmodel: test-model\n---\nRead attachments.\n",
    );
    let fixture = link_fixture(dir, "reader", &["reader.worker"], &ModuleRegistry::new());

    let provider = MockProvider::new("test-model")
        .with_turn(MockTurn::text("first"))
        .with_turn(MockTurn::text("second"))
        .with_turn(MockTurn::text("third"));
    let sink = CollectingSink::new();
    let handler = ScriptedHandler::with_default(ApprovalDecision::approve());
    let runtime = test_runtime(
        &fixture,
        &provider,
        ApprovalMode::Prompt,
        Some(handler.clone()),
        &sink,
    );

    let entry = fixture.project.entry.clone();
    let input_model = Arc::clone(entry.input_model());
    let mut scope = entry.start(&runtime, None).await.unwrap();

    let with_data = WorkerInput::new(
        Arc::clone(&input_model),
        json!({"input": "read it", "attachments": ["data.txt"]}),
    )
    .unwrap();
    scope.run_turn(with_data.clone()).await.unwrap();
    assert_eq!(handler.call_count(), 1);

    // Same path again: the session cache answers, no re-prompt.
    scope.run_turn(with_data).await.unwrap();
    assert_eq!(handler.call_count(), 1);

    // A new path prompts again.
    let with_other = WorkerInput::new(
        Arc::clone(&input_model),
        json!({"input": "read more", "attachments": ["other.txt"]}),
    )
    .unwrap();
    scope.run_turn(with_other).await.unwrap();
    assert_eq!(handler.call_count(), 2);

    scope.close().await;
}
