//! Shell toolset — command execution with timeout and output truncation.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tracing::debug;

use tandem_approval::{Presentation, PresentationKind};

use crate::error::{ToolError, ToolResult};
use crate::toolset::{Tool, Toolset};
use crate::truncate_output;

/// Default command timeout.
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
/// Upper bound a caller may request.
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Toolset exposing a single `shell` tool.
///
/// Every call is approval-gated by default; there is no pre-approval entry
/// in this toolset's config.
pub struct ShellToolset {
    project_root: PathBuf,
}

impl ShellToolset {
    /// Create a shell toolset rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }
}

#[async_trait]
impl Toolset for ShellToolset {
    fn name(&self) -> &str {
        "shell"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(ShellTool {
            cwd: self.project_root.clone(),
        })]
    }
}

struct ShellTool {
    cwd: PathBuf,
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Executes a shell command in the project root and returns combined \
         stdout/stderr. Commands time out after 120 seconds by default; pass \
         timeout_ms to adjust (max 600000)."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to execute"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (max 600000)"
                }
            },
            "required": ["command"]
        })
    }

    fn presentation(&self, args: &Value) -> Option<Presentation> {
        let command = args.get("command").and_then(Value::as_str)?;
        Some(Presentation::new(PresentationKind::Command, command).with_language("bash"))
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("command is required".into()))?;

        let timeout_ms = args
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_TIMEOUT_MS, |v| v.min(MAX_TIMEOUT_MS));

        debug!(command, timeout_ms, "running shell command");

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ToolError::Timeout(timeout_ms))??;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let err = String::from_utf8_lossy(&output.stderr);
        if !err.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&err);
        }

        if output.status.success() {
            Ok(truncate_output(combined))
        } else {
            Err(ToolError::ExecutionFailed(format!(
                "exit status {}: {}",
                output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                truncate_output(combined)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_tool() -> ShellTool {
        ShellTool {
            cwd: std::env::temp_dir(),
        }
    }

    #[tokio::test]
    async fn test_shell_echo() {
        let result = shell_tool()
            .execute(serde_json::json!({"command": "echo hi"}))
            .await
            .unwrap();
        assert_eq!(result.trim(), "hi");
    }

    #[tokio::test]
    async fn test_shell_failure_is_error() {
        let result = shell_tool()
            .execute(serde_json::json!({"command": "exit 3"}))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_shell_missing_command() {
        let result = shell_tool().execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_shell_timeout() {
        let result = shell_tool()
            .execute(serde_json::json!({"command": "sleep 5", "timeout_ms": 50}))
            .await;
        assert!(matches!(result, Err(ToolError::Timeout(50))));
    }

    #[test]
    fn test_presentation_is_command() {
        let tool = shell_tool();
        let p = tool
            .presentation(&serde_json::json!({"command": "ls -la"}))
            .unwrap();
        assert_eq!(p.kind, PresentationKind::Command);
        assert_eq!(p.content, "ls -la");
    }
}
