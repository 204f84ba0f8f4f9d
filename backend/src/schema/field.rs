//! Field descriptors
//!
//! A [`FieldDescriptor`] declares one column of a sheet: its type, validation
//! flags, default value, options, stage visibility and value computes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transform::operations::Operation;

/// Column type understood by the import host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Date,
    Option,
    Linked,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Option => "option",
            FieldType::Linked => "linked",
        }
    }
}

/// Whether the host shows a field at each pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVisibility {
    #[serde(default = "visible")]
    pub mapping: bool,
    #[serde(default = "visible")]
    pub review: bool,
    #[serde(default = "visible")]
    pub export: bool,
}

fn visible() -> bool {
    true
}

impl StageVisibility {
    /// Shown during review only, as used for synthesized keys.
    pub fn review_only() -> Self {
        Self {
            mapping: false,
            review: true,
            export: false,
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for StageVisibility {
    fn default() -> Self {
        Self {
            mapping: true,
            review: true,
            export: true,
        }
    }
}

/// Target of a linked field
///
/// This is a weak reference by name; resolution is left to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub sheet: String,
    pub field: String,
    #[serde(default)]
    pub upsert: bool,
}

/// Declarative definition of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Option code -> display label, in declaration order
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compute: Vec<Operation>,
    #[serde(default, skip_serializing_if = "StageVisibility::is_default")]
    pub stage_visibility: StageVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkTarget>,
}

impl FieldDescriptor {
    /// Create a field of the given type with every flag off
    pub fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: None,
            field_type,
            required: false,
            unique: false,
            primary: false,
            default: None,
            options: Map::new(),
            compute: Vec::new(),
            stage_visibility: StageVisibility::default(),
            link: None,
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldType::Number)
    }

    pub fn boolean(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldType::Boolean)
    }

    pub fn date(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldType::Date)
    }

    /// Option field from `(code, label)` pairs
    pub fn option(key: &str, label: &str, options: &[(&str, &str)]) -> Self {
        let mut field = Self::new(key, label, FieldType::Option);
        field.options = options
            .iter()
            .map(|(code, label)| (code.to_string(), Value::String(label.to_string())))
            .collect();
        field
    }

    /// Linked field referencing `field` of `sheet`, without upsert
    pub fn linked(key: &str, label: &str, sheet: &str, field: &str) -> Self {
        let mut descriptor = Self::new(key, label, FieldType::Linked);
        descriptor.link = Some(LinkTarget {
            sheet: sheet.to_string(),
            field: field.to_string(),
            upsert: false,
        });
        descriptor
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as the primary key; primary fields are unique
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_operation(mut self, op: Operation) -> Self {
        self.compute.push(op);
        self
    }

    /// Shorthand for the whitespace trim used on text-like fields
    pub fn trimmed(self) -> Self {
        self.with_operation(Operation::Trim)
    }

    pub fn with_visibility(mut self, visibility: StageVisibility) -> Self {
        self.stage_visibility = visibility;
        self
    }

    /// Whether `code` is one of the declared option codes
    pub fn has_option(&self, code: &str) -> bool {
        self.options.contains_key(code)
    }

    /// Run the declared computes on a present value.
    ///
    /// Callers must not pass absent values unless every operation accepts
    /// them; the pipeline enforces this.
    pub fn compute_value(&self, value: &Value) -> Result<Value, String> {
        self.compute
            .iter()
            .try_fold(value.clone(), |current, op| op.apply(&current))
    }

    /// Whether every declared compute may run on an absent value
    pub fn computes_accept_absent(&self) -> bool {
        self.compute.iter().all(Operation::accepts_absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_implies_unique() {
        let field = FieldDescriptor::text("jobCode", "Job Code").primary();
        assert!(field.primary);
        assert!(field.unique);
    }

    #[test]
    fn test_compute_value_chains_operations() {
        let field = FieldDescriptor::text("grade", "Grade")
            .trimmed()
            .with_operation(Operation::Uppercase);
        assert_eq!(field.compute_value(&json!("  g5 ")), Ok(json!("G5")));
    }

    #[test]
    fn test_compute_value_without_operations_is_identity() {
        let field = FieldDescriptor::number("min", "Min");
        assert_eq!(field.compute_value(&json!(10)), Ok(json!(10)));
        assert!(field.computes_accept_absent());
    }

    #[test]
    fn test_trimmed_fields_skip_absent() {
        let field = FieldDescriptor::text("grade", "Grade").trimmed();
        assert!(!field.computes_accept_absent());
    }

    #[test]
    fn test_option_field() {
        let field = FieldDescriptor::option("currency", "Currency", &[("USD", "USD"), ("EUR", "EUR")]);
        assert!(field.has_option("USD"));
        assert!(!field.has_option("usd"));
        let codes: Vec<&String> = field.options.keys().collect();
        assert_eq!(codes, vec!["USD", "EUR"]);
    }

    #[test]
    fn test_serialization_shape() {
        let field = FieldDescriptor::linked("structureGrade", "Structure + Grade", "SalaryRange", "structureGrade")
            .with_visibility(StageVisibility::review_only());
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "linked");
        assert_eq!(value["stageVisibility"], json!({"mapping": false, "review": true, "export": false}));
        assert_eq!(value["link"], json!({"sheet": "SalaryRange", "field": "structureGrade", "upsert": false}));
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_deserialize_minimal_field() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "key": "flsaStatus",
            "label": "FLSA status",
            "type": "text"
        }))
        .unwrap();
        assert_eq!(field, FieldDescriptor::text("flsaStatus", "FLSA status"));
    }

    #[test]
    fn test_partial_stage_visibility_defaults_to_visible() {
        let visibility: StageVisibility = serde_json::from_value(json!({"export": false})).unwrap();
        assert!(visibility.mapping);
        assert!(visibility.review);
        assert!(!visibility.export);
    }
}
