//! The Better Comp base workbook: salary ranges and jobs.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │ Jobs                 │        │ SalaryRange          │
//! │  salaryStructure ─┐  │        │  structure ─┐        │
//! │  grade ───────────┼─▶│ link   │  grade ─────┼─▶      │
//! │  structureGrade ◀─┘ ─┼───────▶│  structureGrade ◀─┘  │
//! └──────────────────────┘        └──────────────────────┘
//! ```
//!
//! Both sheets synthesize `structureGrade` as `"{structure} {grade}"`, so a
//! job resolves to its salary range through the host's link lookup.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SchemaResult;
use crate::schema::{FieldDescriptor, Sheet, StageVisibility, Workbook};
use crate::transform::operations::Operation;
use crate::transform::rules::RecordRule;

pub const WORKBOOK_NAME: &str = "Base Workbook";
pub const WORKBOOK_NAMESPACE: &str = "better-comp-base";

pub const SALARY_RANGE: &str = "SalaryRange";
pub const JOBS: &str = "Jobs";

/// How salary range uniqueness over structure and grade is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UniquePolicy {
    /// Only the `(structure, grade)` pair is unique, via `structureGrade`
    #[default]
    Composite,
    /// `structure` and `grade` are each unique on their own
    PerField,
}

impl FromStr for UniquePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "composite" => Ok(Self::Composite),
            "per-field" | "per_field" | "perfield" => Ok(Self::PerField),
            other => Err(format!("unknown unique policy '{}'", other)),
        }
    }
}

/// The base workbook with both sheets
pub fn base_workbook(policy: UniquePolicy) -> SchemaResult<Workbook> {
    Workbook::new(
        WORKBOOK_NAME,
        WORKBOOK_NAMESPACE,
        vec![jobs()?, salary_range(policy)?],
    )
}

/// Number field that also accepts numeric text such as `"52,000"`
fn numeric(key: &str, label: &str) -> FieldDescriptor {
    FieldDescriptor::number(key, label).with_operation(Operation::ToNumber)
}

fn with_unique(field: FieldDescriptor, unique: bool) -> FieldDescriptor {
    if unique {
        field.unique()
    } else {
        field
    }
}

/// Salary ranges per structure and grade
pub fn salary_range(policy: UniquePolicy) -> SchemaResult<Sheet> {
    let per_field = policy == UniquePolicy::PerField;

    Sheet::builder(SALARY_RANGE)
        .field(
            FieldDescriptor::text("salaryGroup", "Salary Group")
                .describe(
                    "Salary range group. Used when there are multiple min-mid-max values or currencies \
                     associated with a single structure + grade combination. Commonly seen for premium \
                     or discounted range variations as well as location differentiators for \
                     geographically disparate ranges, including global versioning.",
                )
                .required()
                .trimmed(),
        )
        .field(with_unique(
            FieldDescriptor::text("structure", "Structure")
                .describe(
                    "Salary structure. Utilized where multiple structures are present (ex: Executive, \
                     Exempt, Non-Exempt, Technical, Nursing, etc.) If organization does not have multiple \
                     structures this field may be equal to organization name or code. This is a Key \
                     Field linking to the Job table",
                )
                .required()
                .trimmed(),
            per_field,
        ))
        .field(with_unique(
            FieldDescriptor::text("grade", "Grade")
                .describe("Salary range grade. This is a Key Field linking to the Job table")
                .required()
                .trimmed(),
            per_field,
        ))
        .field(with_unique(
            FieldDescriptor::text("structureGrade", "Structure + Grade")
                .describe("Composite field to uniquely validate the combination of Structure and Grade")
                .with_visibility(StageVisibility::review_only())
                .trimmed(),
            !per_field,
        ))
        .field(numeric("min", "Min").describe("Salary range minimum. Must be annualized value"))
        .field(
            numeric("mid", "Mid")
                .describe("Salary range midpoint. Must be annualized value. Derived from Min and Max when empty")
                .required(),
        )
        .field(numeric("max", "Max").describe("Salary range maximum. Must be annualized value"))
        .field(
            FieldDescriptor::option("currency", "Currency", &[("USD", "USD"), ("GBP", "GBP"), ("EUR", "EUR")])
                .describe("Currency for salary range.")
                .required()
                .with_default("USD")
                .trimmed(),
        )
        .field(FieldDescriptor::date("effectiveDate", "Effective Date").describe("Effective date of salary range"))
        .preview_field("structureGrade")
        .rule(RecordRule::composite_key(&["structure", "grade"], "structureGrade"))
        .rule(RecordRule::derive_midpoint("min", "mid", "max"))
        .build()
}

/// Job catalog, linked to salary ranges by structure and grade
pub fn jobs() -> SchemaResult<Sheet> {
    let text = |key: &str, label: &str, description: &str| {
        FieldDescriptor::text(key, label).describe(description).trimmed()
    };

    Sheet::builder(JOBS)
        .field(text("jobCode", "Job Code", "Unique code for job. This is a Key Field").required().primary())
        .field(text("jobTitle", "Job Title", "Title for job").required())
        .field(
            text(
                "jobFamilyCode",
                "Job Family Code",
                "Job family code for job. Parent to Job Subfamily Code. Must be unique. Alternatively Job Function Code",
            )
            .with_default("JF ND"),
        )
        .field(
            text("jobFamilyTitle", "Job Family Title", "Job family title for job. Alternatively Job Function Title")
                .with_default("Not Defined"),
        )
        .field(
            text(
                "jobSubfamilyCode",
                "Job Subfamily Code",
                "Job subfamily code for job. Child to Job Family Code. Must be unique",
            )
            .with_default("SF ND"),
        )
        .field(text("jobSubfamilyTitle", "Job Subfamily Title", "Job subfamily title for job").with_default("Not Defined"))
        .field(
            text(
                "jobCategoryCode",
                "Job Category Code",
                "Career path/track code for job, grouping of levels. Parent to Job Level Code. Must be unique",
            )
            .with_default("All"),
        )
        .field(
            text(
                "jobCategoryTitle",
                "Job Category Title",
                "Career path/track title for job, grouping of levels. (ex: Executive, Professional, IC, Support, etc.)",
            )
            .with_default("All"),
        )
        .field(
            text(
                "jobLevelCode",
                "Job Level Code",
                "Job level code for job. Child to Job Category Code. Must be unique",
            )
            .with_default("L ND"),
        )
        .field(text("jobLevelTitle", "Job Level Title", "Job level title for job").with_default("Not Defined"))
        .field(
            numeric("jobLevelSortOrder", "Job Level Sort Order")
                .describe("Used to sort job levels based on hierarchy"),
        )
        .field(text(
            "salaryStructure",
            "Salary Structure",
            "Salary structure job is assigned to. Distinct from Salary Group. REQUIRED if Salary Range file loading is desired",
        ))
        .field(text(
            "grade",
            "Grade",
            "Grade job is assigned to. REQUIRED if Salary Range file loading is desired",
        ))
        .field(
            FieldDescriptor::linked("structureGrade", "Structure + Grade", SALARY_RANGE, "structureGrade")
                .describe("Composite field to link a combination of structure + grade to a Salary Range")
                .with_visibility(StageVisibility::review_only()),
        )
        .field(text("flsaStatus", "FLSA status", "FLSA status for job"))
        .field(numeric("stiTarget", "STI Target %").describe("Short-term incentive target % for job"))
        .field(FieldDescriptor::boolean("stiEligible", "STI Eligible").describe("Is job eligible for short-term incentive"))
        .field(
            FieldDescriptor::option("status", "Status", &[("active", "Active"), ("inactive", "Inactive")])
                .describe("Please enter either \"Active\" or \"Inactive.\" If left blank, the status will default to Active.")
                .with_default("active")
                .trimmed(),
        )
        .preview_field("jobCode")
        .rule(RecordRule::composite_key(&["salaryStructure", "grade"], "structureGrade"))
        .consistent("jobLevelCode", "jobLevelTitle")
        .consistent("jobFamilyCode", "jobFamilyTitle")
        .consistent("jobSubfamilyCode", "jobSubfamilyTitle")
        .consistent("jobSubfamilyTitle", "jobFamilyTitle")
        .build()
}
