//! Sheet-level record rules
//!
//! Rules run once per record after all field operations, in declaration order.
//! Every rule is idempotent: applying it to an already-computed record is a
//! no-op.

use serde::{Deserialize, Serialize};

use crate::models::{as_number, as_text, number_value, Record};

/// A record-level compute rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordRule {
    /// Join source values into a composite key field
    CompositeKey {
        sources: Vec<String>,
        target: String,
        #[serde(default = "default_key_separator")]
        separator: String,
    },

    /// Fill `mid` with the average of `min` and `max` when it is absent
    DeriveMidpoint { min: String, mid: String, max: String },
}

fn default_key_separator() -> String {
    " ".to_string()
}

/// A rule failure, attributed to one field of the record
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    pub field: String,
    pub message: String,
}

impl RecordRule {
    /// Composite key over `sources`, joined with a single space
    pub fn composite_key(sources: &[&str], target: &str) -> Self {
        RecordRule::CompositeKey {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            target: target.to_string(),
            separator: default_key_separator(),
        }
    }

    pub fn derive_midpoint(min: &str, mid: &str, max: &str) -> Self {
        RecordRule::DeriveMidpoint {
            min: min.to_string(),
            mid: mid.to_string(),
            max: max.to_string(),
        }
    }

    /// Field keys read or written by this rule
    pub fn fields(&self) -> Vec<&str> {
        match self {
            RecordRule::CompositeKey { sources, target, .. } => sources
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(target.as_str()))
                .collect(),
            RecordRule::DeriveMidpoint { min, mid, max } => vec![min.as_str(), mid.as_str(), max.as_str()],
        }
    }

    /// Apply this rule to a record
    pub fn apply(&self, record: &mut Record) -> Result<(), RuleFailure> {
        match self {
            RecordRule::CompositeKey { sources, target, separator } => {
                // Absent sources still produce a (blank) segment so collisions stay visible
                let key = sources
                    .iter()
                    .map(|s| as_text(record.get(s)))
                    .collect::<Vec<_>>()
                    .join(separator);
                record.set(target, key);
                Ok(())
            }
            RecordRule::DeriveMidpoint { min, mid, max } => {
                if !record.is_blank(mid) {
                    return Ok(());
                }
                let read = |key: &String| {
                    as_number(record.get(key)).map_err(|message| RuleFailure {
                        field: key.clone(),
                        message,
                    })
                };
                if let (Some(lo), Some(hi)) = (read(min)?, read(max)?) {
                    // Halve first: `lo + hi` overflows for bounds near f64::MAX
                    record.set(mid, number_value(lo / 2.0 + hi / 2.0));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn midpoint() -> RecordRule {
        RecordRule::derive_midpoint("min", "mid", "max")
    }

    #[test]
    fn test_composite_key() {
        let rule = RecordRule::composite_key(&["structure", "grade"], "structureGrade");
        let mut record = Record::with_id("row-1")
            .field("structure", "Exempt")
            .field("grade", "G5");
        rule.apply(&mut record).unwrap();
        assert_eq!(record.get("structureGrade"), Some(&json!("Exempt G5")));
    }

    #[test]
    fn test_composite_key_with_blank_segment() {
        let rule = RecordRule::composite_key(&["structure", "grade"], "structureGrade");
        let mut record = Record::with_id("row-1").field("grade", "G5");
        rule.apply(&mut record).unwrap();
        assert_eq!(record.get("structureGrade"), Some(&json!(" G5")));

        let mut record = Record::with_id("row-2").field("structure", "Exempt").field("grade", Value::Null);
        rule.apply(&mut record).unwrap();
        assert_eq!(record.get("structureGrade"), Some(&json!("Exempt ")));
    }

    #[test]
    fn test_composite_key_renders_numbers() {
        let rule = RecordRule::composite_key(&["structure", "grade"], "structureGrade");
        let mut record = Record::with_id("row-1").field("structure", "Tech").field("grade", 7);
        rule.apply(&mut record).unwrap();
        assert_eq!(record.get("structureGrade"), Some(&json!("Tech 7")));
    }

    #[test]
    fn test_midpoint_derived() {
        let mut record = Record::with_id("row-1").field("min", 10).field("max", 20);
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid"), Some(&json!(15)));
    }

    #[test]
    fn test_midpoint_fractional() {
        let mut record = Record::with_id("row-1").field("min", 10).field("max", 15);
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid"), Some(&json!(12.5)));
    }

    #[test]
    fn test_midpoint_of_huge_bounds_stays_finite() {
        let mut record = Record::with_id("row-1").field("min", 1e308).field("max", 1e308);
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid"), Some(&json!(1e308)));

        let mut record = Record::with_id("row-2").field("min", f64::MAX).field("max", f64::MAX);
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid").and_then(Value::as_f64), Some(f64::MAX));
    }

    #[test]
    fn test_midpoint_never_overwrites() {
        let mut record = Record::with_id("row-1")
            .field("min", 10)
            .field("mid", 12)
            .field("max", 20);
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid"), Some(&json!(12)));
    }

    #[test]
    fn test_midpoint_missing_bound_leaves_mid_absent() {
        let mut record = Record::with_id("row-1").field("min", 10);
        midpoint().apply(&mut record).unwrap();
        assert!(record.get("mid").is_none());

        let mut record = Record::with_id("row-2").field("min", 10).field("max", "");
        midpoint().apply(&mut record).unwrap();
        assert!(record.get("mid").is_none());
    }

    #[test]
    fn test_midpoint_accepts_numeric_strings() {
        let mut record = Record::with_id("row-1")
            .field("min", "40000")
            .field("mid", "")
            .field("max", "60000");
        midpoint().apply(&mut record).unwrap();
        assert_eq!(record.get("mid"), Some(&json!(50000)));
    }

    #[test]
    fn test_midpoint_non_numeric_bound_fails() {
        let mut record = Record::with_id("row-1").field("min", "low").field("max", 20);
        let failure = midpoint().apply(&mut record).unwrap_err();
        assert_eq!(failure.field, "min");
        assert!(record.get("mid").is_none());
    }

    #[test]
    fn test_rules_are_idempotent() {
        let rules = [
            RecordRule::composite_key(&["structure", "grade"], "structureGrade"),
            midpoint(),
        ];
        let mut once = Record::with_id("row-1")
            .field("structure", "Exempt")
            .field("grade", "G5")
            .field("min", 10)
            .field("max", 20);
        for rule in &rules {
            rule.apply(&mut once).unwrap();
        }
        let mut twice = once.clone();
        for rule in &rules {
            rule.apply(&mut twice).unwrap();
        }
        assert_eq!(once, twice);
    }

    #[test]
    fn test_serde_default_separator() {
        let rule: RecordRule = serde_json::from_value(json!({
            "type": "composite_key",
            "sources": ["salaryStructure", "grade"],
            "target": "structureGrade"
        }))
        .unwrap();
        assert_eq!(rule, RecordRule::composite_key(&["salaryStructure", "grade"], "structureGrade"));
    }
}
