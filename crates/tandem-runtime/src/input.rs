//! Typed worker inputs.
//!
//! Every worker input is a JSON value validated against an [`InputModel`]
//! before it enters the runtime. Validation is strict: objects only, no
//! unknown keys, no implicit coercion. The one place a bare string is
//! accepted is the top-level CLI boundary, which wraps it in the default
//! prompt model before calling in here.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};

/// What a worker input contributes to a turn: the prompt text and any
/// attachment references to gate and load.
#[derive(Debug, Clone, Default)]
pub struct PromptSpec {
    /// Prompt text handed to the model.
    pub text: String,
    /// Attachment references (paths, resolved against the project root).
    pub attachments: Vec<String>,
}

/// An input schema for a worker or entry function.
///
/// Implementations validate candidate values and derive the prompt spec the
/// turn is built from. The JSON schema is also what a worker exposes when it
/// is called as a tool by another worker.
pub trait InputModel: Send + Sync {
    /// Model name, unique within a project.
    fn name(&self) -> &str;

    /// JSON schema describing valid inputs.
    fn schema(&self) -> Value;

    /// Strictly validate a candidate value. Returns a human-readable reason
    /// on mismatch.
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch found.
    fn validate(&self, value: &Value) -> Result<(), String>;

    /// Derive the prompt spec from a validated value.
    fn prompt_spec(&self, value: &Value) -> PromptSpec;
}

/// A validated worker input: a value paired with the model it satisfied.
#[derive(Clone)]
pub struct WorkerInput {
    model: Arc<dyn InputModel>,
    value: Value,
}

impl WorkerInput {
    /// Validate `value` against `model`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::InputValidation`] when the value does not
    /// satisfy the model.
    pub fn new(model: Arc<dyn InputModel>, value: Value) -> RuntimeResult<Self> {
        model
            .validate(&value)
            .map_err(|reason| RuntimeError::InputValidation {
                target: model.name().to_string(),
                reason,
            })?;
        Ok(Self { model, value })
    }

    /// Wrap a bare prompt string in the default prompt model.
    ///
    /// This is the CLI-boundary convenience; everywhere else inputs arrive
    /// as structured values.
    #[must_use]
    pub fn from_prompt(text: impl Into<String>) -> Self {
        let value = serde_json::json!({ "input": text.into() });
        Self {
            model: Arc::new(PromptInputModel),
            value,
        }
    }

    /// Name of the model this input satisfied.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// The validated value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Derive the prompt spec.
    #[must_use]
    pub fn prompt_spec(&self) -> PromptSpec {
        self.model.prompt_spec(&self.value)
    }
}

impl std::fmt::Debug for WorkerInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerInput")
            .field("model", &self.model.name())
            .field("value", &self.value)
            .finish()
    }
}

/// The default input model: `{"input": string, "attachments"?: [string]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInputModel;

/// Name under which the default model is registered.
pub(crate) const PROMPT_MODEL_NAME: &str = "prompt";

impl InputModel for PromptInputModel {
    fn name(&self) -> &str {
        PROMPT_MODEL_NAME
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The task or question for the worker"
                },
                "attachments": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "File paths to attach, relative to the project root"
                }
            },
            "required": ["input"],
            "additionalProperties": false
        })
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let Some(object) = value.as_object() else {
            return Err(format!(
                "expected an object, got {}",
                json_type_name(value)
            ));
        };
        match object.get("input") {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(format!(
                    "'input' must be a string, got {}",
                    json_type_name(other)
                ));
            }
            None => return Err("missing required field 'input'".to_string()),
        }
        if let Some(attachments) = object.get("attachments") {
            let Some(items) = attachments.as_array() else {
                return Err("'attachments' must be an array of strings".to_string());
            };
            if items.iter().any(|item| !item.is_string()) {
                return Err("'attachments' must contain only strings".to_string());
            }
        }
        for key in object.keys() {
            if key != "input" && key != "attachments" {
                return Err(format!("unknown field '{key}'"));
            }
        }
        Ok(())
    }

    fn prompt_spec(&self, value: &Value) -> PromptSpec {
        let text = value
            .get("input")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let attachments = value
            .get("attachments")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        PromptSpec { text, attachments }
    }
}

/// Human-readable JSON type name for validation messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_prompt_input() {
        let input = WorkerInput::new(
            Arc::new(PromptInputModel),
            json!({"input": "say hi", "attachments": ["notes.md"]}),
        )
        .unwrap();
        let spec = input.prompt_spec();
        assert_eq!(spec.text, "say hi");
        assert_eq!(spec.attachments, vec!["notes.md".to_string()]);
    }

    #[test]
    fn test_bare_string_rejected() {
        let err = WorkerInput::new(Arc::new(PromptInputModel), json!("just a string")).unwrap_err();
        assert!(matches!(err, RuntimeError::InputValidation { .. }));
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err =
            WorkerInput::new(Arc::new(PromptInputModel), json!({"input": "x", "extra": 1}))
                .unwrap_err();
        assert!(err.to_string().contains("unknown field 'extra'"));
    }

    #[test]
    fn test_missing_input_rejected() {
        let err = WorkerInput::new(Arc::new(PromptInputModel), json!({})).unwrap_err();
        assert!(err.to_string().contains("missing required field"));
    }

    #[test]
    fn test_from_prompt_wraps_string() {
        let input = WorkerInput::from_prompt("hello");
        assert_eq!(input.model_name(), "prompt");
        assert_eq!(input.prompt_spec().text, "hello");
    }

    #[test]
    fn test_non_string_attachments_rejected() {
        let err = WorkerInput::new(
            Arc::new(PromptInputModel),
            json!({"input": "x", "attachments": [1, 2]}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("attachments"));
    }
}
