//! Filesystem toolset — read, write, and list under the project root.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tandem_approval::{ApprovalConfig, Presentation, PresentationKind};

use crate::error::{ToolError, ToolResult};
use crate::toolset::{Tool, Toolset};
use crate::truncate_output;

/// Toolset exposing `read_file`, `write_file`, and `list_directory`.
///
/// Reads and listings are pre-approved; writes are approval-gated with a
/// file-content presentation.
pub struct FsToolset {
    project_root: PathBuf,
}

impl FsToolset {
    /// Create a filesystem toolset rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }
}

#[async_trait]
impl Toolset for FsToolset {
    fn name(&self) -> &str {
        "fs"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ReadFileTool {
                root: self.project_root.clone(),
            }),
            Arc::new(WriteFileTool {
                root: self.project_root.clone(),
            }),
            Arc::new(ListDirectoryTool {
                root: self.project_root.clone(),
            }),
        ]
    }

    fn approval_config(&self) -> ApprovalConfig {
        ApprovalConfig::new()
            .pre_approve("read_file")
            .pre_approve("list_directory")
    }
}

/// Resolve `path` against `root`, rejecting escapes above the root.
fn resolve(root: &Path, path: &str) -> ToolResult<PathBuf> {
    let joined = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        root.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            std::path::Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ToolError::InvalidArguments(format!(
                        "path escapes the project root: {path}"
                    )));
                }
            }
            std::path::Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    if !normalized.starts_with(root) {
        return Err(ToolError::InvalidArguments(format!(
            "path is outside the project root: {path}"
        )));
    }
    Ok(normalized)
}

fn path_arg(args: &Value) -> ToolResult<&str> {
    args.get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("path is required".into()))
}

struct ReadFileTool {
    root: PathBuf,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a UTF-8 file under the project root and returns its contents."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the project root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let path = resolve(&self.root, path_arg(&args)?)?;
        if !path.exists() {
            return Err(ToolError::PathNotFound(path.display().to_string()));
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(truncate_output(content))
    }
}

struct WriteFileTool {
    root: PathBuf,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file under the project root, creating parent \
         directories as needed. Overwrites existing files."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the project root"
                },
                "content": {
                    "type": "string",
                    "description": "File content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn presentation(&self, args: &Value) -> Option<Presentation> {
        let path = args.get("path").and_then(Value::as_str)?;
        let content = args.get("content").and_then(Value::as_str)?;
        Some(Presentation::new(
            PresentationKind::FileContent,
            format!("{path}\n---\n{content}"),
        ))
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("content is required".into()))?;
        let path = resolve(&self.root, path_arg(&args)?)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(format!("wrote {} bytes to {}", content.len(), path.display()))
    }
}

struct ListDirectoryTool {
    root: PathBuf,
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "Lists the entries of a directory under the project root."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the project root; defaults to the root"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let raw = args.get("path").and_then(Value::as_str).unwrap_or(".");
        let path = resolve(&self.root, raw)?;
        if !path.is_dir() {
            return Err(ToolError::PathNotFound(path.display().to_string()));
        }
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let suffix = if entry.file_type().await?.is_dir() { "/" } else { "" };
            names.push(format!("{}{suffix}", entry.file_name().to_string_lossy()));
        }
        names.sort();
        Ok(names.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toolset() -> (TempDir, FsToolset) {
        let dir = TempDir::new().unwrap();
        let toolset = FsToolset::new(dir.path().to_path_buf());
        (dir, toolset)
    }

    fn tool(toolset: &FsToolset, name: &str) -> Arc<dyn Tool> {
        toolset
            .tools()
            .into_iter()
            .find(|t| t.name() == name)
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_dir, fs) = toolset();
        let write = tool(&fs, "write_file");
        let read = tool(&fs, "read_file");

        write
            .execute(serde_json::json!({"path": "notes/a.txt", "content": "hello"}))
            .await
            .unwrap();
        let content = read
            .execute(serde_json::json!({"path": "notes/a.txt"}))
            .await
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (_dir, fs) = toolset();
        let read = tool(&fs, "read_file");
        let result = read.execute(serde_json::json!({"path": "nope.txt"})).await;
        assert!(matches!(result, Err(ToolError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_escape_rejected() {
        let (_dir, fs) = toolset();
        let read = tool(&fs, "read_file");
        let result = read
            .execute(serde_json::json!({"path": "../../etc/passwd"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_list_directory() {
        let (dir, fs) = toolset();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let list = tool(&fs, "list_directory");
        let out = list.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(out, "a.txt\nsub/");
    }

    #[test]
    fn test_reads_are_pre_approved_writes_are_not() {
        let (_dir, fs) = toolset();
        let config = fs.approval_config();
        assert!(config.get("read_file").map(|p| p.pre_approved).unwrap_or(false));
        assert!(config.get("write_file").is_none());
    }
}
