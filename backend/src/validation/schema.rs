//! JSON Schema rendering of a sheet's per-record contract.
//!
//! Column-level constraints (unique, consistency) cannot be expressed per
//! record and are left to [`super::check_sheet`].

use serde_json::{json, Map, Value};

use crate::schema::{FieldDescriptor, FieldType, Sheet};

/// Matches `YYYY-MM-DD` or `MM/DD/YYYY`; calendar validity is checked by [`super::is_date`].
const DATE_PATTERN: &str = r"^\s*(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4})\s*$";

/// Render the per-record contract of a sheet as a Draft 7 schema
pub fn json_schema(sheet: &Sheet) -> Value {
    let properties: Map<String, Value> = sheet
        .fields()
        .iter()
        .map(|field| (field.key.clone(), field_schema(field)))
        .collect();

    let required: Vec<&str> = sheet
        .fields()
        .iter()
        .filter(|f| f.required)
        .map(|f| f.key.as_str())
        .collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": sheet.name(),
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

fn field_schema(field: &FieldDescriptor) -> Value {
    let mut schema = match field.field_type {
        FieldType::Text | FieldType::Linked => json!({ "type": "string" }),
        FieldType::Number => json!({ "type": "number" }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::Date => json!({ "type": "string", "pattern": DATE_PATTERN }),
        FieldType::Option => {
            let codes: Vec<&String> = field.options.keys().collect();
            json!({ "type": "string", "enum": codes })
        }
    };

    if field.required {
        // Whitespace-only text counts as missing
        if matches!(field.field_type, FieldType::Text | FieldType::Linked) {
            schema["pattern"] = json!(r"\S");
        }
    } else {
        schema = json!({ "anyOf": [schema, { "type": "null" }, { "type": "string", "pattern": r"^\s*$" }] });
    }

    let mut annotated = Map::new();
    annotated.insert("title".to_string(), json!(field.label));
    if let Some(description) = &field.description {
        annotated.insert("description".to_string(), json!(description));
    }
    if let Value::Object(inner) = schema {
        annotated.extend(inner);
    }
    Value::Object(annotated)
}

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every error otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check: just true/false.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    fn sheet() -> Sheet {
        Sheet::builder("SalaryRange")
            .field(FieldDescriptor::text("grade", "Grade").required())
            .field(FieldDescriptor::number("min", "Min").describe("Annualized minimum"))
            .field(FieldDescriptor::option("currency", "Currency", &[("USD", "USD"), ("EUR", "EUR")]).required())
            .field(FieldDescriptor::date("effectiveDate", "Effective Date"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_shape() {
        let schema = json_schema(&sheet());
        assert_eq!(schema["title"], "SalaryRange");
        assert_eq!(schema["required"], json!(["grade", "currency"]));
        assert_eq!(schema["properties"]["currency"]["enum"], json!(["USD", "EUR"]));
        assert_eq!(schema["properties"]["min"]["description"], "Annualized minimum");
    }

    #[test]
    fn test_valid_record() {
        let schema = json_schema(&sheet());
        let record = json!({
            "grade": "G5",
            "min": 40000,
            "currency": "USD",
            "effectiveDate": "2024-01-01"
        });
        assert!(validate(&schema, &record).is_ok());
    }

    #[test]
    fn test_optional_fields_accept_null_and_blank() {
        let schema = json_schema(&sheet());
        let record = json!({ "grade": "G5", "currency": "EUR", "min": null, "effectiveDate": "" });
        assert!(is_valid(&schema, &record));
    }

    #[test]
    fn test_invalid_records() {
        let schema = json_schema(&sheet());
        assert!(!is_valid(&schema, &json!({ "currency": "USD" })));
        assert!(!is_valid(&schema, &json!({ "grade": "   ", "currency": "USD" })));
        assert!(!is_valid(&schema, &json!({ "grade": "G5", "currency": "GBP" })));
        assert!(!is_valid(&schema, &json!({ "grade": "G5", "currency": "USD", "min": "low" })));

        let errors = validate(&schema, &json!({ "grade": "G5" })).unwrap_err();
        assert!(!errors.is_empty());
    }
}
