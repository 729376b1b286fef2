//! The attachment gate — the approval-gated read path for prompt attachments.

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tandem_approval::{Presentation, PresentationKind};

use crate::error::{ToolError, ToolResult};
use crate::toolset::{Tool, Toolset};

/// Name of the gated read tool.
pub const READ_ATTACHMENT_TOOL: &str = "read_attachment";

/// Dedicated toolset for attachment reads.
///
/// Attachments referenced in a worker's prompt never bypass approval: each
/// absolute path is authorized through this toolset before its bytes are
/// loaded into the model conversation. The runtime caches approvals per
/// absolute path for the session.
pub struct AttachmentToolset {
    project_root: PathBuf,
}

impl AttachmentToolset {
    /// Create an attachment gate rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Resolve an attachment reference to the absolute path that approval
    /// is requested for.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::PathNotFound`] when the file does not exist.
    pub fn resolve(&self, reference: &str) -> ToolResult<PathBuf> {
        let path = if Path::new(reference).is_absolute() {
            PathBuf::from(reference)
        } else {
            self.project_root.join(reference)
        };
        if !path.is_file() {
            return Err(ToolError::PathNotFound(path.display().to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl Toolset for AttachmentToolset {
    fn name(&self) -> &str {
        "attachments"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(ReadAttachmentTool)]
    }
}

struct ReadAttachmentTool;

#[async_trait]
impl Tool for ReadAttachmentTool {
    fn name(&self) -> &str {
        READ_ATTACHMENT_TOOL
    }

    fn description(&self) -> &str {
        "Loads an approved prompt attachment and returns its bytes as base64."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute path of the attachment"
                }
            },
            "required": ["path"]
        })
    }

    fn presentation(&self, args: &Value) -> Option<Presentation> {
        let path = args.get("path").and_then(Value::as_str)?;
        Some(Presentation::new(PresentationKind::FileContent, path))
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("path is required".into()))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

/// Best-effort MIME type from an attachment path.
#[must_use]
pub fn attachment_media_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt" | "md") => "text/plain",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_relative_against_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.txt"), "x").unwrap();

        let gate = AttachmentToolset::new(dir.path().to_path_buf());
        let resolved = gate.resolve("data.txt").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data.txt"));
    }

    #[test]
    fn test_resolve_missing_fails() {
        let dir = TempDir::new().unwrap();
        let gate = AttachmentToolset::new(dir.path().to_path_buf());
        assert!(matches!(
            gate.resolve("ghost.txt"),
            Err(ToolError::PathNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_attachment_encodes_base64() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let tool = ReadAttachmentTool;
        let encoded = tool
            .execute(serde_json::json!({"path": path.to_str().unwrap()}))
            .await
            .unwrap();
        assert_eq!(encoded, base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]));
    }

    #[test]
    fn test_media_types() {
        assert_eq!(attachment_media_type(Path::new("a.md")), "text/plain");
        assert_eq!(attachment_media_type(Path::new("a.png")), "image/png");
        assert_eq!(attachment_media_type(Path::new("a")), "application/octet-stream");
    }
}
