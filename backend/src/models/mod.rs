//! Record model shared by the pipeline and the contract checker.
//!
//! - [`RecordId`] - Host-facing identifier of one input row
//! - [`Record`] - Ordered, mutable field-value mapping for one row
//!
//! Values are plain [`serde_json::Value`]s. A value is *absent* when the key is
//! missing or holds `null`, and *blank* when it is absent or a string that is
//! empty once trimmed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{PipelineError, PipelineResult};

// =============================================================================
// Record Identifier
// =============================================================================

/// Identifier of a record, used to report faults and violations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Identifier for the 1-based row number of an input batch.
    pub fn from_row(row: usize) -> Self {
        Self(format!("row-{}", row))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Record
// =============================================================================

/// One row's field values.
///
/// Field order follows insertion order (`serde_json` is built with
/// `preserve_order`), so computed records serialize in the order the host
/// supplied them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub values: Map<String, Value>,
}

impl Record {
    /// Create an empty record with the given identifier.
    pub fn with_id(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            values: Map::new(),
        }
    }

    /// Build a record from a JSON object.
    ///
    /// Returns `None` if `value` is not an object.
    pub fn from_value(id: impl Into<RecordId>, value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self {
                id: id.into(),
                values,
            }),
            _ => None,
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Current value of a field, `None` if the key is missing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Replace the value of a field.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Whether the field is missing, null or a whitespace-only string.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).map_or(true, is_blank)
    }

    /// Consume the record into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

// =============================================================================
// Value Helpers
// =============================================================================

/// Check if a value is "blank" (null or whitespace-only string).
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Render a scalar as text; absent values render as the empty string.
pub fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Read a number from a JSON number or a numeric string.
///
/// Returns `Ok(None)` for blank values and `Err` for present values that are
/// not numeric.
pub fn as_number(value: Option<&Value>) -> Result<Option<f64>, String> {
    match value {
        None => Ok(None),
        Some(v) if is_blank(v) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a finite number", n)),
        Some(Value::String(s)) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a number", s)),
        Some(other) => Err(format!("{} is not a number", other)),
    }
}

/// Convert a float back to a JSON number, preferring integers for whole values.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Read a JSON array of objects into records with ids `row-1`, `row-2`, ...
pub fn records_from_json(json: &str) -> PipelineResult<Vec<Record>> {
    let rows = match serde_json::from_str::<Value>(json)? {
        Value::Array(rows) => rows,
        other => {
            return Err(PipelineError::InvalidInput(format!(
                "expected an array of records, got {}",
                type_name(&other)
            )))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let kind = type_name(&row);
            Record::from_value(RecordId::from_row(i + 1), row).ok_or_else(|| {
                PipelineError::InvalidInput(format!("row {} is {}, expected an object", i + 1, kind))
            })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Tests
// =============================================================================
