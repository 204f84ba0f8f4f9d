//! # Better Comp - Import schema for compensation data
//!
//! Declares the Better Comp base workbook (salary ranges and jobs) as typed
//! field and sheet descriptors, and runs the record compute pipeline the
//! import host calls for every uploaded row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Host rows  │────▶│  Defaults   │────▶│   Field     │────▶│   Record    │
//! │   (JSON)    │     │  (blank)    │     │  computes   │     │   rules     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    ▼
//!                                                             ┌─────────────┐
//!                                                             │  Contract   │
//!                                                             │   check     │
//!                                                             └─────────────┘
//! ```
//!
//! The host enforces required/unique/option constraints; the contract check
//! reproduces them locally for dry runs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bettercomp::{base_workbook, Record, UniquePolicy};
//!
//! let workbook = base_workbook(UniquePolicy::Composite)?;
//! let ranges = workbook.require_sheet("SalaryRange")?;
//!
//! let mut record = Record::with_id("row-1")
//!     .field("structure", " Exempt ")
//!     .field("grade", "G5")
//!     .field("min", 40000)
//!     .field("max", 60000);
//! ranges.compute(&mut record)?;
//! // structureGrade = "Exempt G5", mid = 50000
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Records and value helpers
//! - [`schema`] - Field, sheet and workbook descriptors
//! - [`transform`] - Field operations, record rules and the compute pipeline
//! - [`validation`] - Contract checks and JSON Schema rendering
//! - [`workbooks`] - The base workbook
//! - [`config`] - Environment settings and workbook files
//! - [`logs`] - Log broadcasting

// Core modules
pub mod error;
pub mod models;

// Descriptors
pub mod schema;
pub mod workbooks;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Configuration
pub mod config;

// Logs
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ComputeFault,
    ConfigError,
    ConfigResult,
    PipelineError,
    PipelineResult,
    SchemaError,
    SchemaResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{records_from_json, Record, RecordId};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    ConsistencyRule,
    FieldDescriptor,
    FieldType,
    LinkTarget,
    Sheet,
    SheetBuilder,
    StageVisibility,
    Workbook,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    compute_batch,
    compute_record,
    operations_description,
    run_sheet,
    BatchResult,
    ComputeOptions,
    Operation,
    RecordRule,
    SheetRun,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_sheet, is_valid, json_schema, validate, SheetReport, Violation};

// =============================================================================
// Re-exports - Workbooks & Config
// =============================================================================

pub use config::{load_workbook, Settings};
pub use workbooks::{base_workbook, UniquePolicy};
