//! Field-level compute operations
//!
//! Operations are applied to a single field value, in declaration order, before
//! any sheet-level rule sees the record.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::as_number;

/// All available field operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Collapse runs of inner whitespace into a single space
    CollapseWhitespace,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Parse a numeric string into a number
    ToNumber,
}

impl Operation {
    /// Whether the operation may be called with an absent (null or missing) value.
    ///
    /// The pipeline skips operations that return `false` for absent values.
    pub fn accepts_absent(&self) -> bool {
        false
    }

    /// Check that the operation can run, e.g. that its regex compiles.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Operation::Replace { pattern, .. } => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| format!("invalid pattern '{}': {}", pattern, e)),
            _ => Ok(()),
        }
    }

    /// Apply this operation to a present value
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        match self {
            Operation::Trim => Ok(map_text(value, |s| s.trim().to_string())),
            Operation::Uppercase => Ok(map_text(value, str::to_uppercase)),
            Operation::Lowercase => Ok(map_text(value, str::to_lowercase)),
            Operation::CollapseWhitespace => Ok(map_text(value, |s| {
                s.split_whitespace().collect::<Vec<_>>().join(" ")
            })),
            Operation::Replace { pattern, value: replacement } => {
                self.apply_replace(value, pattern, replacement)
            }
            Operation::ToNumber => self.apply_to_number(value),
        }
    }

    fn apply_replace(&self, value: &Value, pattern: &str, replacement: &str) -> Result<Value, String> {
        let Value::String(s) = value else {
            return Ok(value.clone());
        };
        let re = Regex::new(pattern).map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
        Ok(Value::String(re.replace_all(s, replacement).to_string()))
    }

    fn apply_to_number(&self, value: &Value) -> Result<Value, String> {
        match value {
            Value::Number(_) => Ok(value.clone()),
            // Blank strings stay blank so `required` is reported by validation instead
            Value::String(s) if s.trim().is_empty() => Ok(value.clone()),
            _ => as_number(Some(value)).map(|n| n.map(crate::models::number_value).unwrap_or(Value::Null)),
        }
    }
}

/// Apply `f` to string values; other values pass through unchanged.
fn map_text(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        _ => value.clone(),
    }
}

/// Get a description of all available operations
pub fn operations_description() -> String {
    r#"Available field operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| collapse_whitespace | Collapse inner whitespace runs to one space | - |
| replace | Regex pattern replacement | pattern: regex, value: replacement |
| to_number | Parse numeric text into a number (fails on non-numeric text) | - |

Operations never run on absent (null or missing) values.

Example operations in JSON:
[
  {"type": "trim"},
  {"type": "replace", "pattern": "[$ ]", "value": ""},
  {"type": "to_number"}
]"#
    .to_string()
}
