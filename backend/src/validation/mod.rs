//! Contract checks for computed records.
//!
//! The import host enforces `required`, `unique`, option membership and field
//! types. This module checks computed records against the same contract so a
//! misconfigured sheet is caught before it is deployed:
//!
//! - [`check_record`] - per-record checks (required, type, options)
//! - [`check_sheet`] - per-record checks plus sheet-level post-conditions
//!   (uniqueness over the full column, consistency rules)
//! - [`json_schema`] - the per-record part rendered as JSON Schema Draft 7
//!
//! Uniqueness is a sheet-level post-condition: it is only meaningful after
//! every record of the batch has been computed, because synthesized composite
//! keys take part in it.
//!
//! # Example
//!
//! ```rust,ignore
//! use bettercomp::{base_workbook, check_sheet, Record};
//!
//! let workbook = base_workbook(Default::default())?;
//! let jobs = workbook.require_sheet("Jobs")?;
//! let report = check_sheet(jobs, &[Record::with_id("row-1").field("jobTitle", "Analyst")]);
//! assert!(!report.is_valid()); // jobCode is required
//! ```

mod schema;

pub use schema::{is_valid, json_schema, validate};

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::models::{as_text, is_blank, Record, RecordId};
use crate::schema::{FieldDescriptor, FieldType, Sheet};

/// Date formats accepted for date fields
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A contract violation found in computed records
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Required field is blank after compute.
    #[error("record {record}: required field '{field}' is empty")]
    MissingRequired { record: RecordId, field: String },

    /// Value does not match the field type.
    #[error("record {record}: field '{field}' expects {expected}, got {value}")]
    TypeMismatch {
        record: RecordId,
        field: String,
        expected: &'static str,
        value: String,
    },

    /// Value is not one of the declared option codes.
    #[error("record {record}: '{value}' is not an option of field '{field}'")]
    InvalidOption {
        record: RecordId,
        field: String,
        value: String,
    },

    /// The same value appears in a unique column more than once.
    #[error("field '{field}' value '{value}' is not unique (records: {})", join_ids(.records))]
    Duplicate {
        field: String,
        value: String,
        records: Vec<RecordId>,
    },

    /// A key value maps to several dependent values.
    #[error("'{key}' = '{key_value}' has several '{dependent}' values: {values:?}")]
    Inconsistent {
        key: String,
        key_value: String,
        dependent: String,
        values: Vec<String>,
        records: Vec<RecordId>,
    },
}

fn join_ids(records: &[RecordId]) -> String {
    records.iter().map(RecordId::as_str).collect::<Vec<_>>().join(", ")
}

impl Violation {
    /// Records implicated by this violation
    pub fn records(&self) -> Vec<&RecordId> {
        match self {
            Violation::MissingRequired { record, .. }
            | Violation::TypeMismatch { record, .. }
            | Violation::InvalidOption { record, .. } => vec![record],
            Violation::Duplicate { records, .. } | Violation::Inconsistent { records, .. } => {
                records.iter().collect()
            }
        }
    }
}

/// Result of checking a sheet batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetReport {
    pub sheet: String,
    /// Number of records checked
    pub checked: usize,
    pub violations: Vec<Violation>,
}

impl SheetReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Records not implicated by any violation
    pub fn valid_count(&self) -> usize {
        let invalid: BTreeSet<&RecordId> = self.violations.iter().flat_map(Violation::records).collect();
        self.checked.saturating_sub(invalid.len())
    }
}

/// Check one computed record against its field descriptors
pub fn check_record(sheet: &Sheet, record: &Record) -> Vec<Violation> {
    let mut violations = Vec::new();

    for field in sheet.fields() {
        let value = record.get(&field.key);
        match value {
            Some(v) if !is_blank(v) => {
                if let Some(violation) = check_value(field, &record.id, v) {
                    violations.push(violation);
                }
            }
            _ if field.required => violations.push(Violation::MissingRequired {
                record: record.id.clone(),
                field: field.key.clone(),
            }),
            _ => {}
        }
    }

    violations
}

/// Type and option checks for a present, non-blank value
fn check_value(field: &FieldDescriptor, record: &RecordId, value: &Value) -> Option<Violation> {
    let mismatch = |expected: &'static str| Violation::TypeMismatch {
        record: record.clone(),
        field: field.key.clone(),
        expected,
        value: value.to_string(),
    };

    match field.field_type {
        FieldType::Text | FieldType::Linked => (!value.is_string()).then(|| mismatch("text")),
        FieldType::Number => (!value.is_number()).then(|| mismatch("a number")),
        FieldType::Boolean => (!value.is_boolean()).then(|| mismatch("a boolean")),
        FieldType::Date => match value.as_str() {
            Some(s) if is_date(s) => None,
            _ => Some(mismatch("a date (YYYY-MM-DD or MM/DD/YYYY)")),
        },
        FieldType::Option => match value.as_str() {
            Some(code) if field.has_option(code) => None,
            _ => Some(Violation::InvalidOption {
                record: record.clone(),
                field: field.key.clone(),
                value: as_text(Some(value)),
            }),
        },
    }
}

/// Whether `s` parses with one of [`DATE_FORMATS`]
pub fn is_date(s: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| chrono::NaiveDate::parse_from_str(s.trim(), fmt).is_ok())
}

/// Check a computed batch: every record, then column-level post-conditions
pub fn check_sheet(sheet: &Sheet, records: &[Record]) -> SheetReport {
    let mut violations: Vec<Violation> = records
        .iter()
        .flat_map(|record| check_record(sheet, record))
        .collect();

    for field in sheet.unique_fields() {
        violations.extend(check_unique(&field.key, records));
    }
    for rule in sheet.consistency() {
        violations.extend(check_consistent(&rule.key, &rule.dependent, records));
    }

    SheetReport {
        sheet: sheet.name().to_string(),
        checked: records.len(),
        violations,
    }
}

/// Values of `key` accepted by `include`, grouped by text, in first-seen order
fn group_by_value<'a>(
    key: &str,
    records: &'a [Record],
    include: impl Fn(&Value) -> bool,
) -> Vec<(String, Vec<&'a Record>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();

    for record in records {
        let Some(value) = record.get(key).filter(|v| include(v)) else {
            continue;
        };
        let text = as_text(Some(value));
        match index.get(&text) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(text.clone(), groups.len());
                groups.push((text, vec![record]));
            }
        }
    }

    groups
}

/// Duplicate non-null values in a unique column.
///
/// Blank strings take part, so composite keys built from blank segments
/// (`" "`) still collide.
pub fn check_unique(key: &str, records: &[Record]) -> Vec<Violation> {
    group_by_value(key, records, |v| !v.is_null())
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(value, group)| Violation::Duplicate {
            field: key.to_string(),
            value,
            records: group.iter().map(|r| r.id.clone()).collect(),
        })
        .collect()
}

/// Key values that map to more than one dependent value
pub fn check_consistent(key: &str, dependent: &str, records: &[Record]) -> Vec<Violation> {
    group_by_value(key, records, |v| !is_blank(v))
        .into_iter()
        .filter_map(|(key_value, group)| {
            let mut values: Vec<String> = Vec::new();
            for record in &group {
                let text = as_text(record.get(dependent));
                if !values.contains(&text) {
                    values.push(text);
                }
            }
            (values.len() > 1).then(|| Violation::Inconsistent {
                key: key.to_string(),
                key_value,
                dependent: dependent.to_string(),
                values,
                records: group.iter().map(|r| r.id.clone()).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use serde_json::json;

    fn jobs() -> Sheet {
        Sheet::builder("Jobs")
            .field(FieldDescriptor::text("jobCode", "Job Code").primary().required())
            .field(FieldDescriptor::text("jobLevelCode", "Job Level Code"))
            .field(FieldDescriptor::text("jobLevelTitle", "Job Level Title"))
            .field(FieldDescriptor::number("stiTarget", "STI Target %"))
            .field(FieldDescriptor::boolean("stiEligible", "STI Eligible"))
            .field(FieldDescriptor::date("effectiveDate", "Effective Date"))
            .field(FieldDescriptor::option("status", "Status", &[("active", "Active"), ("inactive", "Inactive")]))
            .consistent("jobLevelCode", "jobLevelTitle")
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_record() {
        let record = Record::with_id("row-1")
            .field("jobCode", "J100")
            .field("stiTarget", 10)
            .field("stiEligible", true)
            .field("effectiveDate", "2024-01-01")
            .field("status", "active");
        assert!(check_record(&jobs(), &record).is_empty());
    }

    #[test]
    fn test_required_rejects_blank() {
        let sheet = jobs();
        for value in [Value::Null, json!(""), json!("   ")] {
            let record = Record::with_id("row-1").field("jobCode", value);
            let violations = check_record(&sheet, &record);
            assert_eq!(
                violations,
                vec![Violation::MissingRequired {
                    record: RecordId::from("row-1"),
                    field: "jobCode".to_string()
                }]
            );
        }
    }

    #[test]
    fn test_type_mismatches() {
        let record = Record::with_id("row-1")
            .field("jobCode", "J100")
            .field("stiTarget", "ten")
            .field("stiEligible", "yes")
            .field("effectiveDate", "31/31/2024");
        let violations = check_record(&jobs(), &record);
        assert_eq!(violations.len(), 3);
        assert!(violations.iter().all(|v| matches!(v, Violation::TypeMismatch { .. })));
    }

    #[test]
    fn test_invalid_option() {
        let record = Record::with_id("row-1").field("jobCode", "J100").field("status", "Active");
        let violations = check_record(&jobs(), &record);
        assert!(matches!(&violations[..], [Violation::InvalidOption { value, .. }] if value == "Active"));
    }

    #[test]
    fn test_date_formats() {
        assert!(is_date("2024-03-15"));
        assert!(is_date("03/15/2024"));
        assert!(!is_date("15/03/2024"));
        assert!(!is_date("soon"));
    }

    #[test]
    fn test_unique_is_checked_across_sheet() {
        let records = vec![
            Record::with_id("row-1").field("jobCode", "J100"),
            Record::with_id("row-2").field("jobCode", "J200"),
            Record::with_id("row-3").field("jobCode", "J100"),
        ];
        let report = check_sheet(&jobs(), &records);
        assert_eq!(
            report.violations,
            vec![Violation::Duplicate {
                field: "jobCode".to_string(),
                value: "J100".to_string(),
                records: vec![RecordId::from("row-1"), RecordId::from("row-3")],
            }]
        );
        assert_eq!(report.valid_count(), 1);
    }

    #[test]
    fn test_unique_ignores_absent_values() {
        let records = vec![
            Record::with_id("row-1").field("jobCode", "J1").field("jobLevelCode", Value::Null),
            Record::with_id("row-2").field("jobCode", "J2").field("jobLevelCode", Value::Null),
            Record::with_id("row-3").field("jobCode", "J3"),
        ];
        assert!(check_unique("jobLevelCode", &records).is_empty());
    }

    #[test]
    fn test_unique_flags_repeated_blank_strings() {
        let records = vec![
            Record::with_id("row-1").field("structureGrade", " "),
            Record::with_id("row-2").field("structureGrade", " "),
            Record::with_id("row-3").field("structureGrade", "Exempt G5"),
        ];
        assert_eq!(
            check_unique("structureGrade", &records),
            vec![Violation::Duplicate {
                field: "structureGrade".to_string(),
                value: " ".to_string(),
                records: vec![RecordId::from("row-1"), RecordId::from("row-2")],
            }]
        );
    }

    #[test]
    fn test_consistency_ignores_blank_keys() {
        let records = vec![
            Record::with_id("row-1").field("jobLevelCode", "").field("jobLevelTitle", "Senior"),
            Record::with_id("row-2").field("jobLevelCode", " ").field("jobLevelTitle", "Lead"),
        ];
        assert!(check_consistent("jobLevelCode", "jobLevelTitle", &records).is_empty());
    }

    #[test]
    fn test_consistency_rule() {
        let records = vec![
            Record::with_id("row-1").field("jobCode", "J1").field("jobLevelCode", "L3").field("jobLevelTitle", "Senior"),
            Record::with_id("row-2").field("jobCode", "J2").field("jobLevelCode", "L3").field("jobLevelTitle", "Lead"),
            Record::with_id("row-3").field("jobCode", "J3").field("jobLevelCode", "L2").field("jobLevelTitle", "Mid"),
            Record::with_id("row-4").field("jobCode", "J4").field("jobLevelCode", "L2").field("jobLevelTitle", "Mid"),
        ];
        let report = check_sheet(&jobs(), &records);
        assert_eq!(report.violations.len(), 1);
        match &report.violations[0] {
            Violation::Inconsistent { key_value, values, .. } => {
                assert_eq!(key_value, "L3");
                assert_eq!(values, &vec!["Senior".to_string(), "Lead".to_string()]);
            }
            other => panic!("unexpected violation: {other:?}"),
        }
        assert_eq!(report.valid_count(), 2);
    }

    #[test]
    fn test_violation_messages() {
        let dup = Violation::Duplicate {
            field: "structureGrade".into(),
            value: "Exempt G5".into(),
            records: vec![RecordId::from("row-1"), RecordId::from("row-2")],
        };
        let msg = dup.to_string();
        assert!(msg.contains("structureGrade"));
        assert!(msg.contains("row-1, row-2"));
    }
}
