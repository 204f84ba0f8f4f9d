//! Error types for the workbook schema and record pipeline.
//!
//! - [`SchemaError`] - Sheet/workbook construction errors
//! - [`ComputeFault`] - Per-record compute failure, reported but never fatal
//! - [`ConfigError`] - Environment and workbook file loading errors
//! - [`PipelineError`] - Top-level errors surfaced by the CLI
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::RecordId;

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while building a sheet or workbook descriptor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Sheet or workbook name is empty.
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// Sheet declares no fields.
    #[error("Sheet '{0}' declares no fields")]
    NoFields(String),

    /// Field key declared twice.
    #[error("Sheet '{sheet}' declares field '{field}' more than once")]
    DuplicateField { sheet: String, field: String },

    /// More than one primary field.
    #[error("Sheet '{sheet}' has more than one primary field: {fields:?}")]
    MultiplePrimary { sheet: String, fields: Vec<String> },

    /// A key referenced by the sheet configuration does not exist.
    #[error("Sheet '{sheet}' references unknown field '{field}' in {context}")]
    UnknownField {
        sheet: String,
        field: String,
        context: String,
    },

    /// Option field problems (missing options, options on a non-option field, bad default).
    #[error("Invalid options for field '{field}': {message}")]
    InvalidOptions { field: String, message: String },

    /// Link declaration problems.
    #[error("Invalid link on field '{field}': {message}")]
    InvalidLink { field: String, message: String },

    /// A field operation cannot be compiled.
    #[error("Invalid operation on field '{field}': {message}")]
    InvalidOperation { field: String, message: String },

    /// Sheet name declared twice in a workbook.
    #[error("Workbook declares sheet '{0}' more than once")]
    DuplicateSheet(String),

    /// Sheet declaration inside a workbook could not be read.
    #[error("Invalid sheet '{sheet}': {message}")]
    InvalidSheet { sheet: String, message: String },

    /// Sheet not found in a workbook.
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),
}

// =============================================================================
// Compute Faults
// =============================================================================

/// A failure while computing one record.
///
/// Faults carry enough context for host-side display and never abort the
/// rest of a batch.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{sheet} / record {record}{}: {message}", field_suffix(.field))]
pub struct ComputeFault {
    pub sheet: String,
    pub record: RecordId,
    pub field: Option<String>,
    pub message: String,
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(" / field '{f}'"))
        .unwrap_or_default()
}

impl ComputeFault {
    pub fn new(sheet: impl Into<String>, record: RecordId, message: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            record,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading settings or workbook configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid JSON in a workbook file.
    #[error("Invalid workbook JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Workbook parsed but violates schema invariants.
    #[error("Invalid workbook: {0}")]
    Schema(#[from] SchemaError),

    /// Environment variable holds an unsupported value.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors for batch runs driven from the CLI.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Input is not a JSON array of objects.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
