//! `.worker` file parsing: YAML frontmatter between `---` fences, free-form
//! instruction body.

use serde::Deserialize;
use std::path::Path;

use crate::error::{ProjectError, ProjectResult};

/// A parsed `.worker` file, unresolved.
#[derive(Debug, Clone)]
pub struct WorkerDefinition {
    /// Worker name, unique across the project.
    pub name: String,
    /// Declared model, if any.
    pub model: Option<String>,
    /// Compatibility hint; construction-time signal only.
    pub compatible_models: Vec<String>,
    /// Input model name; defaults to the built-in prompt model.
    pub input: Option<String>,
    /// Toolset references (factory names or worker names).
    pub toolsets: Vec<String>,
    /// Whether this worker is flagged as the entry candidate.
    pub entry: bool,
    /// Description for worker-as-tool schemas.
    pub description: Option<String>,
    /// Instruction body.
    pub instructions: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Frontmatter {
    name: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    compatible_models: Option<Vec<String>>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    toolsets: Option<Vec<String>>,
    #[serde(default)]
    entry: Option<bool>,
    #[serde(default)]
    description: Option<String>,
}

/// Parse the contents of a `.worker` file.
///
/// # Errors
///
/// Returns [`ProjectError::WorkerParse`] on missing fences, malformed YAML,
/// unknown frontmatter keys, or an empty name.
pub fn parse_worker_file(path: &Path, content: &str) -> ProjectResult<WorkerDefinition> {
    let parse_error = |reason: String| ProjectError::WorkerParse {
        path: path.to_path_buf(),
        reason,
    };

    let mut lines = content.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return Err(parse_error(
            "missing opening '---' frontmatter fence".to_string(),
        ));
    }

    let mut frontmatter_text = String::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_frontmatter = true;
    for line in lines {
        if in_frontmatter {
            if line.trim_end() == "---" {
                in_frontmatter = false;
            } else {
                frontmatter_text.push_str(line);
                frontmatter_text.push('\n');
            }
        } else {
            body_lines.push(line);
        }
    }
    if in_frontmatter {
        return Err(parse_error(
            "missing closing '---' frontmatter fence".to_string(),
        ));
    }
    let body = body_lines.join("\n");

    let frontmatter: Frontmatter = serde_yaml::from_str(&frontmatter_text)
        .map_err(|e| parse_error(format!("frontmatter: {e}")))?;

    if frontmatter.name.trim().is_empty() {
        return Err(parse_error("worker name must not be empty".to_string()));
    }

    Ok(WorkerDefinition {
        name: frontmatter.name,
        model: frontmatter.model,
        compatible_models: frontmatter.compatible_models.unwrap_or_default(),
        input: frontmatter.input,
        toolsets: frontmatter.toolsets.unwrap_or_default(),
        entry: frontmatter.entry.unwrap_or(false),
        description: frontmatter.description,
        instructions: body.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ProjectResult<WorkerDefinition> {
        parse_worker_file(Path::new("test.worker"), content)
    }

    #[test]
    fn test_full_worker_file() {
        let definition = parse(
            "---\n\
             name: greeter\n\
             model: claude-sonnet-4-20250514\n\
             toolsets:\n\
             - shell\n\
             - greeter\n\
             entry: true\n\
             description: Greets people.\n\
             ---\n\
             \n\
             You are a friendly greeter.\n",
        )
        .unwrap();

        assert_eq!(definition.name, "greeter");
        assert_eq!(definition.model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert_eq!(definition.toolsets, vec!["shell", "greeter"]);
        assert!(definition.entry);
        assert_eq!(definition.instructions, "You are a friendly greeter.");
    }

    #[test]
    fn test_minimal_worker_file() {
        let definition = parse("---\nname: tiny\n---\nDo the thing.\n").unwrap();
        assert_eq!(definition.name, "tiny");
        assert!(definition.model.is_none());
        assert!(definition.toolsets.is_empty());
        assert!(!definition.entry);
    }

    #[test]
    fn test_missing_opening_fence() {
        let err = parse("name: x\n---\nbody\n").unwrap_err();
        assert!(err.to_string().contains("opening"));
    }

    #[test]
    fn test_missing_closing_fence() {
        let err = parse("---\nname: x\n").unwrap_err();
        assert!(err.to_string().contains("closing"));
    }

    #[test]
    fn test_unknown_frontmatter_key_rejected() {
        let err = parse("---\nname: x\ncolor: blue\n---\nbody\n").unwrap_err();
        assert!(matches!(err, ProjectError::WorkerParse { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = parse("---\nname: \"\"\n---\nbody\n").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
