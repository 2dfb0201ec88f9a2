//! Wire records exchanged with the execution/caching layer.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::defaults::DEFAULT_NUMBER_FORMAT;
use crate::i18n::I18nMessage;
use crate::ProtocolError;

// ============================================================================
// Column types
// ============================================================================

/// Minimal column type descriptor.
///
/// Serialized as `{"kind": "number", "format": "{:,}"}`. Deserialization
/// also accepts the legacy bare-string form (`"text"`, `"number"`,
/// `"datetime"`).
///
/// The `format` string is carried verbatim; validating it is the kernel's
/// job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Number { format: String },
    Datetime,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnTypeRepr {
    Legacy(String),
    Modern(ColumnTypeObject),
}

#[derive(Debug, Deserialize)]
struct ColumnTypeObject {
    kind: String,
    #[serde(default)]
    format: Option<String>,
}

impl ColumnType {
    /// Kind name: "text", "number" or "datetime".
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number { .. } => "number",
            ColumnType::Datetime => "datetime",
        }
    }

    pub fn format(&self) -> Option<&str> {
        match self {
            ColumnType::Number { format } => Some(format),
            _ => None,
        }
    }

    fn from_parts(kind: &str, format: Option<String>) -> Result<Self, String> {
        match kind {
            "text" | "datetime" if format.is_some() => {
                Err(format!("column type '{}' does not take a format", kind))
            }
            "text" => Ok(ColumnType::Text),
            "datetime" => Ok(ColumnType::Datetime),
            "number" => Ok(ColumnType::Number {
                format: format.unwrap_or_else(|| DEFAULT_NUMBER_FORMAT.to_string()),
            }),
            other => Err(format!("unknown column type kind '{}'", other)),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ColumnType::Number { format } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("kind", "number")?;
                map.serialize_entry("format", format)?;
                map.end()
            }
            other => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("kind", other.kind())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ColumnTypeRepr::deserialize(deserializer)? {
            ColumnTypeRepr::Legacy(raw) => {
                ColumnType::from_parts(raw.trim(), None).map_err(de::Error::custom)
            }
            ColumnTypeRepr::Modern(obj) => {
                ColumnType::from_parts(&obj.kind, obj.format).map_err(de::Error::custom)
            }
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Table metadata: row count and columns, no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub n_rows: usize,
    pub columns: Vec<Column>,
}

impl TableMetadata {
    pub fn new(n_rows: usize, columns: Vec<Column>) -> Self {
        Self { n_rows, columns }
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Record of a columnar artifact on disk.
///
/// `path` is `None` exactly when `metadata.columns` is empty: a table with no
/// columns has no file at all, which is distinct from a file with zero rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowTable {
    path: Option<PathBuf>,
    metadata: TableMetadata,
}

impl ArrowTable {
    pub fn new(path: Option<PathBuf>, metadata: TableMetadata) -> Result<Self, ProtocolError> {
        match (&path, metadata.columns.is_empty()) {
            (Some(path), true) => Err(ProtocolError::Artifact(format!(
                "artifact {} has a file but no columns",
                path.display()
            ))),
            (None, false) => Err(ProtocolError::Artifact(format!(
                "artifact has {} columns but no file",
                metadata.columns.len()
            ))),
            _ => Ok(Self { path, metadata }),
        }
    }

    /// Artifact of a table with no columns. `n_rows` is kept for callers
    /// that track row counts of column-less tables.
    pub fn without_file(n_rows: usize) -> Self {
        Self {
            path: None,
            metadata: TableMetadata::new(n_rows, Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn n_rows(&self) -> usize {
        self.metadata.n_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.metadata.columns
    }
}

// ============================================================================
// Errors and quick fixes
// ============================================================================

/// Action a quick-fix button dispatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuickFixAction {
    /// Insert a step before the current one.
    #[serde(rename = "prependStep")]
    PrependStep {
        #[serde(rename = "moduleSlug")]
        module_slug: String,
        #[serde(rename = "partialParams")]
        partial_params: Map<String, Value>,
    },
}

impl QuickFixAction {
    pub fn prepend_step(module_slug: impl Into<String>, partial_params: Map<String, Value>) -> Self {
        QuickFixAction::PrependStep {
            module_slug: module_slug.into(),
            partial_params,
        }
    }
}

/// A suggested one-click fix attached to an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickFix {
    #[serde(rename = "buttonText")]
    pub button_text: I18nMessage,
    pub action: QuickFixAction,
}

impl QuickFix {
    pub fn new(button_text: I18nMessage, action: QuickFixAction) -> Self {
        Self {
            button_text,
            action,
        }
    }
}

/// One error (or warning) with its quick fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderError {
    pub message: I18nMessage,
    #[serde(default, rename = "quickFixes")]
    pub quick_fixes: Vec<QuickFix>,
}

impl RenderError {
    pub fn new(message: I18nMessage, quick_fixes: Vec<QuickFix>) -> Self {
        Self {
            message,
            quick_fixes,
        }
    }
}

/// Canonical result of one render, as cached by the execution layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub table: ArrowTable,
    #[serde(default)]
    pub errors: Vec<RenderError>,
    #[serde(default)]
    pub json: Map<String, Value>,
}

impl RenderResult {
    pub fn new(table: ArrowTable, errors: Vec<RenderError>, json: Map<String, Value>) -> Self {
        Self {
            table,
            errors,
            json,
        }
    }
}

// ============================================================================
// Tabs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Permanent id, unique within a workflow.
    pub slug: String,
    /// User-editable name.
    pub name: String,
}

/// Output of the final step of another tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabOutput {
    pub tab: Tab,
    pub table: ArrowTable,
}
