//! Runtime settings and workbook loading.
//!
//! Settings come from the environment (a `.env` file is loaded by the CLI
//! before this runs). CLI flags override them.
//!
//! | Variable                     | Values                    | Default     |
//! |------------------------------|---------------------------|-------------|
//! | `BETTERCOMP_UNIQUE_POLICY`   | `composite`, `per-field`  | `composite` |
//! | `BETTERCOMP_APPLY_DEFAULTS`  | `true`/`false`/`1`/`0`    | `true`      |
//! | `BETTERCOMP_WORKBOOK`        | path to workbook JSON     | built-in    |

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::logs::log_info;
use crate::schema::Workbook;
use crate::transform::pipeline::ComputeOptions;
use crate::workbooks::{base_workbook, UniquePolicy};

pub const ENV_UNIQUE_POLICY: &str = "BETTERCOMP_UNIQUE_POLICY";
pub const ENV_APPLY_DEFAULTS: &str = "BETTERCOMP_APPLY_DEFAULTS";
pub const ENV_WORKBOOK: &str = "BETTERCOMP_WORKBOOK";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub unique_policy: UniquePolicy,
    pub apply_defaults: bool,
    /// Workbook JSON to load instead of the built-in base workbook
    pub workbook_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unique_policy: UniquePolicy::default(),
            apply_defaults: true,
            workbook_path: None,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut settings = Self::default();

        if let Some(value) = lookup(ENV_UNIQUE_POLICY).filter(|v| !v.trim().is_empty()) {
            settings.unique_policy = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_UNIQUE_POLICY,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(ENV_APPLY_DEFAULTS).filter(|v| !v.trim().is_empty()) {
            settings.apply_defaults = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_APPLY_DEFAULTS,
                value: value.clone(),
            })?;
        }

        settings.workbook_path = lookup(ENV_WORKBOOK)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(settings)
    }

    pub fn compute_options(&self) -> ComputeOptions {
        ComputeOptions {
            apply_defaults: self.apply_defaults,
        }
    }

    /// The configured workbook: loaded from file if a path is set, else built in
    pub fn workbook(&self) -> ConfigResult<Workbook> {
        match &self.workbook_path {
            Some(path) => load_workbook(path),
            None => Ok(base_workbook(self.unique_policy)?),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load a workbook descriptor from a JSON file.
///
/// Sheet invariants are enforced while deserializing, so an invalid
/// workbook fails here rather than at compute time.
pub fn load_workbook(path: impl AsRef<Path>) -> ConfigResult<Workbook> {
    let path = path.as_ref();
    log_info(format!("📄 Loading workbook: {}", path.display()));

    let content = fs::read_to_string(path)?;
    let workbook = Workbook::from_json(&content)?;

    log_info(format!(
        "   {} ({}): {}",
        workbook.name(),
        workbook.namespace(),
        workbook.sheet_names().join(", ")
    ));
    Ok(workbook)
}

/// Write a workbook descriptor to a JSON file
pub fn save_workbook(workbook: &Workbook, path: impl AsRef<Path>) -> ConfigResult<()> {
    fs::write(path, workbook.to_json()?)?;
    Ok(())
}
