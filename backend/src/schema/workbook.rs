//! Workbook descriptor, the deployable unit handed to the import host.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::field::FieldType;
use super::sheet::Sheet;
use crate::error::{SchemaError, SchemaResult};

/// A validated workbook: named, namespaced, ordered sheets
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WorkbookSpec")]
pub struct Workbook {
    name: String,
    namespace: String,
    sheets: Vec<Sheet>,
}

/// Wire form of a workbook: sheets keyed by name
#[derive(Debug, Clone, Deserialize)]
pub struct WorkbookSpec {
    pub name: String,
    pub namespace: String,
    pub sheets: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<WorkbookSpec> for Workbook {
    type Error = SchemaError;

    fn try_from(spec: WorkbookSpec) -> SchemaResult<Self> {
        let mut sheets = Vec::with_capacity(spec.sheets.len());
        for (name, value) in spec.sheets {
            let sheet: Sheet = serde_json::from_value(value).map_err(|e| SchemaError::InvalidSheet {
                sheet: name.clone(),
                message: e.to_string(),
            })?;
            if sheet.name() != name {
                return Err(SchemaError::InvalidSheet {
                    sheet: name,
                    message: format!("declared under a different name ('{}')", sheet.name()),
                });
            }
            sheets.push(sheet);
        }
        Workbook::new(&spec.name, &spec.namespace, sheets)
    }
}

impl Serialize for Workbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Workbook", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("namespace", &self.namespace)?;
        state.serialize_field("sheets", &SheetsByName(&self.sheets))?;
        state.end()
    }
}

/// Sheets serialized as a map keyed by sheet name, in workbook order
struct SheetsByName<'a>(&'a [Sheet]);

impl Serialize for SheetsByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|sheet| (sheet.name(), sheet)))
    }
}

impl Workbook {
    /// Build a workbook, checking names and cross-sheet links
    pub fn new(name: &str, namespace: &str, sheets: Vec<Sheet>) -> SchemaResult<Self> {
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName("Workbook"));
        }
        if namespace.trim().is_empty() {
            return Err(SchemaError::EmptyName("Workbook namespace"));
        }

        let workbook = Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            sheets,
        };

        for (i, sheet) in workbook.sheets.iter().enumerate() {
            if workbook.sheets[..i].iter().any(|s| s.name() == sheet.name()) {
                return Err(SchemaError::DuplicateSheet(sheet.name().to_string()));
            }
        }
        workbook.check_links()?;

        Ok(workbook)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// Like [`Workbook::sheet`] but returns an error for unknown names
    pub fn require_sheet(&self, name: &str) -> SchemaResult<&Sheet> {
        self.sheet(name)
            .ok_or_else(|| SchemaError::UnknownSheet(name.to_string()))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    /// Parse and validate a workbook descriptor
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the descriptor handed to the host
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every linked field must point at an existing field of an existing sheet
    fn check_links(&self) -> SchemaResult<()> {
        for sheet in &self.sheets {
            let links = sheet
                .fields()
                .iter()
                .filter(|f| f.field_type == FieldType::Linked)
                .filter_map(|f| f.link.as_ref().map(|link| (f, link)));

            for (field, link) in links {
                let target = self.sheet(&link.sheet).ok_or_else(|| SchemaError::InvalidLink {
                    field: field.key.clone(),
                    message: format!("unknown sheet '{}'", link.sheet),
                })?;
                if target.field(&link.field).is_none() {
                    return Err(SchemaError::InvalidLink {
                        field: field.key.clone(),
                        message: format!("sheet '{}' has no field '{}'", link.sheet, link.field),
                    });
                }
            }
        }
        Ok(())
    }
}
