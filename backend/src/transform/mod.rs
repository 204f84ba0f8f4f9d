//! Record transformation.
//!
//! - Operations: per-field value transforms (trim, case, replace, ...)
//! - Rules: record-level computes (composite keys, derived midpoint)
//! - Pipeline: defaults, field computes and rules over a batch

pub mod operations;
pub mod pipeline;
pub mod rules;

pub use operations::{operations_description, Operation};
pub use pipeline::*;
pub use rules::{RecordRule, RuleFailure};
