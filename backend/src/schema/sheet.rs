//! Sheet descriptors
//!
//! A [`Sheet`] is a named, ordered collection of fields plus the record rules
//! that run after field computes. Sheets are validated when built, so a
//! `Sheet` value always satisfies the schema invariants.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::field::{FieldDescriptor, FieldType};
use crate::error::{ComputeFault, SchemaError, SchemaResult};
use crate::models::Record;
use crate::transform::pipeline::{compute_record, ComputeOptions};
use crate::transform::rules::RecordRule;

/// Functional dependency checked across a sheet: every value of `key` must map
/// to a single value of `dependent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub key: String,
    pub dependent: String,
}

/// A validated sheet descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SheetSpec")]
pub struct Sheet {
    name: String,
    fields: Vec<FieldDescriptor>,
    preview_field_key: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    record_compute: Vec<RecordRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    consistency: Vec<ConsistencyRule>,
}

/// Unvalidated sheet declaration, as read from configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSpec {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub preview_field_key: String,
    #[serde(default)]
    pub record_compute: Vec<RecordRule>,
    #[serde(default)]
    pub consistency: Vec<ConsistencyRule>,
}

impl TryFrom<SheetSpec> for Sheet {
    type Error = SchemaError;

    fn try_from(spec: SheetSpec) -> SchemaResult<Self> {
        let sheet = Sheet {
            name: spec.name,
            fields: spec.fields,
            preview_field_key: spec.preview_field_key,
            record_compute: spec.record_compute,
            consistency: spec.consistency,
        };
        sheet.check()?;
        Ok(sheet)
    }
}

impl Sheet {
    /// Validate a sheet declaration
    pub fn new(spec: SheetSpec) -> SchemaResult<Self> {
        Self::try_from(spec)
    }

    /// Start building a sheet
    pub fn builder(name: &str) -> SheetBuilder {
        SheetBuilder {
            name: name.to_string(),
            fields: Vec::new(),
            preview_field_key: None,
            record_compute: Vec::new(),
            consistency: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn preview_field_key(&self) -> &str {
        &self.preview_field_key
    }

    pub fn record_compute(&self) -> &[RecordRule] {
        &self.record_compute
    }

    pub fn consistency(&self) -> &[ConsistencyRule] {
        &self.consistency
    }

    /// The primary field, if any
    pub fn primary_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.primary)
    }

    /// Fields whose values must be unique across the sheet
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.unique || f.primary)
    }

    /// Run the full compute pipeline (defaults, field computes, record rules)
    /// on one record.
    pub fn compute(&self, record: &mut Record) -> Result<(), ComputeFault> {
        compute_record(self, record, &ComputeOptions::default())
    }

    /// Enforce the schema invariants
    fn check(&self) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName("Sheet"));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.key.trim().is_empty() {
                return Err(SchemaError::UnknownField {
                    sheet: self.name.clone(),
                    field: field.key.clone(),
                    context: "field declarations (empty key)".to_string(),
                });
            }
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateField {
                    sheet: self.name.clone(),
                    field: field.key.clone(),
                });
            }
            check_field(field)?;
        }

        let primary: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.primary)
            .map(|f| f.key.clone())
            .collect();
        if primary.len() > 1 {
            return Err(SchemaError::MultiplePrimary {
                sheet: self.name.clone(),
                fields: primary,
            });
        }

        self.check_reference(&self.preview_field_key, "previewFieldKey")?;
        for rule in &self.record_compute {
            for key in rule.fields() {
                self.check_reference(key, "recordCompute")?;
            }
        }
        for rule in &self.consistency {
            self.check_reference(&rule.key, "consistency")?;
            self.check_reference(&rule.dependent, "consistency")?;
        }

        Ok(())
    }

    fn check_reference(&self, key: &str, context: &str) -> SchemaResult<()> {
        if self.field(key).is_some() {
            Ok(())
        } else {
            Err(SchemaError::UnknownField {
                sheet: self.name.clone(),
                field: key.to_string(),
                context: context.to_string(),
            })
        }
    }
}

/// Per-field invariants that do not depend on the rest of the sheet
fn check_field(field: &FieldDescriptor) -> SchemaResult<()> {
    let options_error = |message: &str| SchemaError::InvalidOptions {
        field: field.key.clone(),
        message: message.to_string(),
    };

    match field.field_type {
        FieldType::Option => {
            if field.options.is_empty() {
                return Err(options_error("option fields must declare at least one option"));
            }
            if let Some(default) = &field.default {
                let known = default.as_str().is_some_and(|code| field.has_option(code));
                if !known {
                    return Err(options_error(&format!("default {} is not a declared option", default)));
                }
            }
        }
        _ if !field.options.is_empty() => {
            return Err(options_error("only option fields may declare options"));
        }
        _ => {}
    }

    match (field.field_type, &field.link) {
        (FieldType::Linked, None) => {
            return Err(SchemaError::InvalidLink {
                field: field.key.clone(),
                message: "linked fields must declare a target".to_string(),
            });
        }
        (FieldType::Linked, Some(link)) if link.sheet.trim().is_empty() || link.field.trim().is_empty() => {
            return Err(SchemaError::InvalidLink {
                field: field.key.clone(),
                message: "link target sheet and field must not be empty".to_string(),
            });
        }
        (ty, Some(_)) if ty != FieldType::Linked => {
            return Err(SchemaError::InvalidLink {
                field: field.key.clone(),
                message: format!("{} fields cannot declare a link", ty.as_str()),
            });
        }
        _ => {}
    }

    for op in &field.compute {
        op.check().map_err(|message| SchemaError::InvalidOperation {
            field: field.key.clone(),
            message,
        })?;
    }

    Ok(())
}

/// Builder for [`Sheet`]
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    preview_field_key: Option<String>,
    record_compute: Vec<RecordRule>,
    consistency: Vec<ConsistencyRule>,
}

impl SheetBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn preview_field(mut self, key: &str) -> Self {
        self.preview_field_key = Some(key.to_string());
        self
    }

    pub fn rule(mut self, rule: RecordRule) -> Self {
        self.record_compute.push(rule);
        self
    }

    /// Require every `key` value to map to a single `dependent` value
    pub fn consistent(mut self, key: &str, dependent: &str) -> Self {
        self.consistency.push(ConsistencyRule {
            key: key.to_string(),
            dependent: dependent.to_string(),
        });
        self
    }

    /// Validate and build the sheet.
    ///
    /// Without an explicit preview field, the first field is used.
    pub fn build(self) -> SchemaResult<Sheet> {
        let preview_field_key = match self.preview_field_key {
            Some(key) => key,
            None => self
                .fields
                .first()
                .map(|f| f.key.clone())
                .ok_or_else(|| SchemaError::NoFields(self.name.clone()))?,
        };
        Sheet::new(SheetSpec {
            name: self.name,
            fields: self.fields,
            preview_field_key,
            record_compute: self.record_compute,
            consistency: self.consistency,
        })
    }
}
