//! Declarative import schema.
//!
//! - `field`: Column descriptors (type, flags, options, computes, visibility)
//! - `sheet`: Validated sheets with record rules and consistency rules
//! - `workbook`: Named, namespaced set of sheets handed to the import host
//!
//! All descriptors serialize to the JSON shape the host consumes, and
//! deserialize through the same invariant checks as the builders.

pub mod field;
pub mod sheet;
pub mod workbook;

pub use field::{FieldDescriptor, FieldType, LinkTarget, StageVisibility};
pub use sheet::{ConsistencyRule, Sheet, SheetBuilder, SheetSpec};
pub use workbook::{Workbook, WorkbookSpec};
