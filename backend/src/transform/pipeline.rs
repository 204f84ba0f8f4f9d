//! Record compute pipeline.
//!
//! For each record, in order:
//! 1. Fill declared defaults into blank fields (optional)
//! 2. Run each field's operations on its present value, in field order
//! 3. Run the sheet's record rules, in declaration order
//!
//! Records are independent: a fault in one record is collected and logged,
//! and the rest of the batch is still computed.
//!
//! # Example
//!
//! ```rust,ignore
//! use bettercomp::{base_workbook, compute_batch, ComputeOptions, Record};
//!
//! let workbook = base_workbook(Default::default())?;
//! let sheet = workbook.require_sheet("SalaryRange")?;
//! let rows = vec![Record::with_id("row-1").field("structure", " Exempt ").field("grade", "G5")];
//! let result = compute_batch(sheet, rows, &ComputeOptions::default());
//! assert_eq!(result.records[0].get("structureGrade"), Some(&"Exempt G5".into()));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ComputeFault;
use crate::logs::{log_fault, log_info, log_success, log_warning};
use crate::models::{is_blank, Record};
use crate::schema::Sheet;
use crate::validation::{check_sheet, SheetReport};

/// Options for the compute pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeOptions {
    /// Fill declared defaults into blank fields before computing
    pub apply_defaults: bool,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self { apply_defaults: true }
    }
}

/// Result of computing a batch of records
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    /// Successfully computed records, in input order
    pub records: Vec<Record>,
    /// One fault per failed record
    pub faults: Vec<ComputeFault>,
}

impl BatchResult {
    /// Check if every record was computed
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Computed: {} records, {} faults",
            self.records.len(),
            self.faults.len()
        )
    }
}

/// Compute one record in place.
///
/// On error the record may be partially computed and should be discarded.
pub fn compute_record(
    sheet: &Sheet,
    record: &mut Record,
    options: &ComputeOptions,
) -> Result<(), ComputeFault> {
    if options.apply_defaults {
        apply_defaults(sheet, record);
    }

    for field in sheet.fields().iter().filter(|f| !f.compute.is_empty()) {
        let current = record.get(&field.key).cloned().unwrap_or(Value::Null);
        if current.is_null() && !field.computes_accept_absent() {
            continue;
        }

        let computed = field.compute_value(&current).map_err(|message| {
            ComputeFault::new(sheet.name(), record.id.clone(), message).with_field(&field.key)
        })?;
        record.set(&field.key, computed);
    }

    for rule in sheet.record_compute() {
        rule.apply(record).map_err(|failure| {
            ComputeFault::new(sheet.name(), record.id.clone(), failure.message).with_field(failure.field)
        })?;
    }

    Ok(())
}

/// Fill declared defaults into blank fields
fn apply_defaults(sheet: &Sheet, record: &mut Record) {
    for field in sheet.fields() {
        if let Some(default) = &field.default {
            if record.get(&field.key).map_or(true, is_blank) {
                record.set(&field.key, default.clone());
            }
        }
    }
}

/// Compute every record of a batch, isolating faults per record
pub fn compute_batch(sheet: &Sheet, rows: Vec<Record>, options: &ComputeOptions) -> BatchResult {
    let mut result = BatchResult::default();

    for mut record in rows {
        match compute_record(sheet, &mut record, options) {
            Ok(()) => result.records.push(record),
            Err(fault) => {
                log_fault(&fault);
                result.faults.push(fault);
            }
        }
    }

    result
}

/// Outcome of computing and checking one sheet batch
#[derive(Debug, Clone, Serialize)]
pub struct SheetRun {
    pub sheet: String,
    pub records: Vec<Record>,
    pub faults: Vec<ComputeFault>,
    pub report: SheetReport,
}

impl SheetRun {
    /// No faults and no violations
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.report.is_valid()
    }
}

/// Compute a batch, then check the computed records against the sheet contract
pub fn run_sheet(sheet: &Sheet, rows: Vec<Record>, options: &ComputeOptions) -> SheetRun {
    log_info(format!("⚙️  Computing {} records for sheet {}...", rows.len(), sheet.name()));
    let batch = compute_batch(sheet, rows, options);
    if batch.is_ok() {
        log_success(batch.summary());
    } else {
        log_warning(batch.summary());
    }

    log_info("✔️  Checking records...");
    let report = check_sheet(sheet, &batch.records);
    print_report(&report);

    SheetRun {
        sheet: sheet.name().to_string(),
        records: batch.records,
        faults: batch.faults,
        report,
    }
}

/// Print contract check results
fn print_report(report: &SheetReport) {
    if report.is_valid() {
        log_success(format!("All {} records valid!", report.checked));
        return;
    }

    log_success(format!("Valid: {}", report.valid_count()));
    log_warning(format!("{} violations", report.violations.len()));
    for violation in report.violations.iter().take(5) {
        log_warning(format!("• {}", violation));
    }
    if report.violations.len() > 5 {
        log_warning(format!("... +{}", report.violations.len() - 5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, StageVisibility};
    use crate::transform::operations::Operation;
    use crate::transform::rules::RecordRule;
    use serde_json::json;

    fn ranges() -> Sheet {
        Sheet::builder("SalaryRange")
            .field(FieldDescriptor::text("structure", "Structure").required().trimmed())
            .field(FieldDescriptor::text("grade", "Grade").required().trimmed())
            .field(
                FieldDescriptor::text("structureGrade", "Structure + Grade")
                    .unique()
                    .with_visibility(StageVisibility::review_only()),
            )
            .field(FieldDescriptor::number("min", "Min"))
            .field(FieldDescriptor::number("mid", "Mid"))
            .field(FieldDescriptor::number("max", "Max"))
            .field(FieldDescriptor::text("note", "Note").with_default("n/a").trimmed())
            .preview_field("structureGrade")
            .rule(RecordRule::composite_key(&["structure", "grade"], "structureGrade"))
            .rule(RecordRule::derive_midpoint("min", "mid", "max"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_field_computes_run_before_rules() {
        let sheet = ranges();
        let mut record = Record::with_id("row-1")
            .field("structure", "  Exempt ")
            .field("grade", " G5");
        compute_record(&sheet, &mut record, &ComputeOptions::default()).unwrap();
        assert_eq!(record.get("structure"), Some(&json!("Exempt")));
        assert_eq!(record.get("structureGrade"), Some(&json!("Exempt G5")));
    }

    #[test]
    fn test_absent_values_are_not_computed() {
        let sheet = ranges();
        let mut record = Record::with_id("row-1").field("structure", Value::Null);
        compute_record(&sheet, &mut record, &ComputeOptions { apply_defaults: false }).unwrap();
        assert_eq!(record.get("structure"), Some(&Value::Null));
        assert!(record.get("grade").is_none());
        assert_eq!(record.get("structureGrade"), Some(&json!(" ")));
    }

    #[test]
    fn test_defaults_fill_blank_fields() {
        let sheet = ranges();
        let mut record = Record::with_id("row-1").field("note", "  ");
        compute_record(&sheet, &mut record, &ComputeOptions::default()).unwrap();
        assert_eq!(record.get("note"), Some(&json!("n/a")));

        let mut record = Record::with_id("row-2");
        compute_record(&sheet, &mut record, &ComputeOptions { apply_defaults: false }).unwrap();
        assert!(record.get("note").is_none());
    }

    #[test]
    fn test_compute_is_idempotent() {
        let sheet = ranges();
        let mut once = Record::with_id("row-1")
            .field("structure", " Exempt ")
            .field("grade", "G5 ")
            .field("min", 10)
            .field("max", 20);
        sheet.compute(&mut once).unwrap();
        let mut twice = once.clone();
        sheet.compute(&mut twice).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.get("mid"), Some(&json!(15)));
    }

    #[test]
    fn test_field_fault_names_field() {
        let sheet = Sheet::builder("Jobs")
            .field(FieldDescriptor::text("jobCode", "Job Code").primary())
            .field(FieldDescriptor::number("stiTarget", "STI Target %").with_operation(Operation::ToNumber))
            .build()
            .unwrap();
        let mut record = Record::with_id("row-7").field("jobCode", "J1").field("stiTarget", "ten");
        let fault = compute_record(&sheet, &mut record, &ComputeOptions::default()).unwrap_err();
        assert_eq!(fault.sheet, "Jobs");
        assert_eq!(fault.record.as_str(), "row-7");
        assert_eq!(fault.field.as_deref(), Some("stiTarget"));
    }

    #[test]
    fn test_batch_isolates_faults() {
        crate::logs::LOG_BROADCASTER.set_echo(false);
        let sheet = ranges();
        let rows = vec![
            Record::with_id("row-1").field("structure", "Exempt").field("grade", "G1").field("min", 10).field("max", 20),
            Record::with_id("row-2").field("structure", "Exempt").field("grade", "G2").field("min", "low").field("max", 20),
            Record::with_id("row-3").field("structure", "Exempt").field("grade", "G3"),
        ];
        let result = compute_batch(&sheet, rows, &ComputeOptions::default());

        assert!(!result.is_ok());
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.faults.len(), 1);
        assert_eq!(result.faults[0].record.as_str(), "row-2");
        assert_eq!(result.faults[0].field.as_deref(), Some("min"));
        assert_eq!(result.records[1].id.as_str(), "row-3");
        assert_eq!(result.summary(), "Computed: 2 records, 1 faults");
    }

    #[test]
    fn test_run_sheet_reports_composite_collisions() {
        crate::logs::LOG_BROADCASTER.set_echo(false);
        let sheet = ranges();
        let rows = vec![
            Record::with_id("row-1").field("structure", "Exempt ").field("grade", "G5"),
            Record::with_id("row-2").field("structure", " Exempt").field("grade", "G5 "),
        ];
        let run = run_sheet(&sheet, rows, &ComputeOptions::default());

        assert!(!run.is_clean());
        assert!(run.faults.is_empty());
        assert_eq!(run.records[0].get("structureGrade"), run.records[1].get("structureGrade"));
        assert_eq!(run.report.violations.len(), 1);
    }
}
