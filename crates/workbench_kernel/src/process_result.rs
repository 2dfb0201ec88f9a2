//! `ProcessResult`: the normalized output of one module run.
//!
//! Modules return loosely-shaped values; [`ProcessResult::coerce`] maps
//! every accepted shape onto one table + errors + JSON + columns record.
//! Two failure tiers come out of it:
//!
//! - malformed configuration (bad number formats, bad quick fixes, invalid
//!   tables) is returned as `Err`;
//! - a module that returns the wrong shape gets an error-status result with
//!   a "bug in this module" message instead.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use workbench_protocol::defaults::DEFAULT_LOCALE;
use workbench_protocol::{translate_i18n_message, I18nMessage, RenderError, RenderResult};

use crate::arrow_io::{read_dataframe, write_dataframe};
use crate::column::{Column, TableShape};
use crate::column_type::ColumnType;
use crate::dataframe::DataFrame;
use crate::error::{KernelError, KernelResult};
use crate::inference::{infer_columns, ColumnFormats};
use crate::module_error::{coerce_error, coerce_i18n_message, ProcessResultError};
use crate::quick_fix::QuickFix;
use crate::validate::validate_dataframe;
use crate::value::ModuleValue;

pub const TRUNCATED_MESSAGE_ID: &str = "kernel.process_result.truncated";
pub const WRONG_TYPES_MESSAGE_ID: &str = "kernel.process_result.wrong_types";
pub const BIG_TUPLE_MESSAGE_ID: &str = "kernel.process_result.big_tuple";
pub const INVALID_RETURN_TYPE_MESSAGE_ID: &str = "kernel.process_result.invalid_return_type";

/// Keys accepted by the dict form of a module result.
const KWARGS_KEYS: &[&str] = &[
    "dataframe",
    "error",
    "errors",
    "json",
    "quick_fixes",
    "column_formats",
];

/// Outcome of a step, derived from the table and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// There is a table; errors, if any, are warnings.
    Ok,
    /// No table, at least one error.
    Error,
    /// No table and no error: later steps cannot run.
    Unreachable,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Ok => "ok",
            StepStatus::Error => "error",
            StepStatus::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus the table shape later steps will see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResultShape {
    pub status: StepStatus,
    pub table_shape: TableShape,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    dataframe: DataFrame,
    errors: Vec<ProcessResultError>,
    json: Map<String, Value>,
    columns: Vec<Column>,
}

impl ProcessResult {
    /// Build a result, re-inferring `columns` if they do not describe
    /// `dataframe`. The supplied columns then act as fallbacks.
    pub fn new(
        dataframe: DataFrame,
        errors: Vec<ProcessResultError>,
        json: Map<String, Value>,
        columns: Vec<Column>,
    ) -> KernelResult<Self> {
        let mut result = Self {
            dataframe,
            errors,
            json,
            columns,
        };
        result.fix_columns()?;
        Ok(result)
    }

    /// An error-status result.
    pub fn from_error(message: I18nMessage) -> Self {
        Self::from_errors(vec![message.into()])
    }

    pub fn from_errors(errors: Vec<ProcessResultError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.dataframe
    }

    pub fn errors(&self) -> &[ProcessResultError] {
        &self.errors
    }

    pub fn json(&self) -> &Map<String, Value> {
        &self.json
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn table_shape(&self) -> TableShape {
        TableShape::new(self.dataframe.len(), self.columns.clone())
    }

    pub fn status(&self) -> StepStatus {
        if self.dataframe.has_columns() {
            StepStatus::Ok
        } else if self.errors.is_empty() {
            StepStatus::Unreachable
        } else {
            StepStatus::Error
        }
    }

    /// The first error as plain text in the default locale, or `""`.
    pub fn error(&self) -> String {
        self.error_in(DEFAULT_LOCALE)
    }

    /// The first error as plain text in `locale`, or `""`.
    pub fn error_in(&self, locale: &str) -> String {
        self.errors
            .first()
            .map(|error| translate_i18n_message(&error.message, locale))
            .unwrap_or_default()
    }

    /// What the next step sees. Non-ok results have no rows or columns.
    pub fn shape(&self) -> StepResultShape {
        let status = self.status();
        let table_shape = match status {
            StepStatus::Ok => self.table_shape(),
            StepStatus::Error | StepStatus::Unreachable => TableShape::default(),
        };
        StepResultShape {
            status,
            table_shape,
        }
    }

    /// Edit the table in place. Columns are re-inferred afterwards if the
    /// edit changed them.
    pub fn update_dataframe(&mut self, edit: impl FnOnce(&mut DataFrame)) -> KernelResult<()> {
        edit(&mut self.dataframe);
        self.fix_columns()
    }

    fn fix_columns(&mut self) -> KernelResult<()> {
        if self.columns_describe_table() {
            return Ok(());
        }
        debug!(
            "Re-inferring columns {:?} for table columns {:?}",
            self.column_names(),
            self.dataframe.column_names()
        );
        self.columns = infer_columns(&self.dataframe, &ColumnFormats::new(), &self.columns)?;
        Ok(())
    }

    fn columns_describe_table(&self) -> bool {
        self.columns.len() == self.dataframe.width()
            && self
                .columns
                .iter()
                .zip(self.dataframe.columns())
                .all(|(column, series)| {
                    column.name() == series.name()
                        && ColumnType::class_from_dtype(series.dtype()).ok()
                            == Some(column.column_type().kind())
                })
    }

    /// Keep at most `max_rows` rows, recording a warning when rows are cut.
    pub fn truncate_in_place_if_too_big(&mut self, max_rows: usize) {
        let old_len = self.dataframe.len();
        if old_len <= max_rows {
            return;
        }

        self.dataframe.truncate(max_rows);
        self.dataframe.remove_unused_categories();
        self.errors.push(
            I18nMessage::bare(TRUNCATED_MESSAGE_ID)
                .with_arg("old_number", old_len)
                .with_arg("new_number", max_rows)
                .into(),
        );
        warn!("Truncated module output from {} rows to {}", old_len, max_rows);
    }

    /// Equality with tables compared as strings, so `1_i32` equals `1_i64`.
    pub fn fuzzy_eq(&self, other: &ProcessResult) -> bool {
        self.dataframe.column_names() == other.dataframe.column_names()
            && self.dataframe.to_strings() == other.dataframe.to_strings()
            && self.errors == other.errors
            && self.json == other.json
            && self.columns == other.columns
    }

    // ------------------------------------------------------------------------
    // Coercion
    // ------------------------------------------------------------------------

    /// Normalize a module's return value.
    ///
    /// `fallback_columns` (usually the previous step's output) supply
    /// number formats for columns the module did not format. They never
    /// override `column_formats` given in a dict result, and are ignored
    /// for a value that is already a `ProcessResult`.
    pub fn coerce(value: ModuleValue, fallback_columns: &[Column]) -> KernelResult<Self> {
        match value {
            ModuleValue::None => Ok(Self::default()),
            ModuleValue::Result(result) => {
                validate_dataframe(&result.dataframe)?;
                Ok(*result)
            }
            ModuleValue::Table(table) => Self::from_table(
                table,
                Vec::new(),
                Map::new(),
                &ColumnFormats::new(),
                fallback_columns,
            ),
            ModuleValue::Dict(entries) => {
                let has_error_keys = entries.iter().any(|(k, _)| k == "message")
                    && entries.iter().any(|(k, _)| k == "quickFixes");
                if has_error_keys {
                    let errors = coerce_error(&ModuleValue::Dict(entries), true)?;
                    Ok(Self::from_errors(errors))
                } else {
                    Self::coerce_kwargs(entries, fallback_columns)
                }
            }
            ModuleValue::Tuple(items) => match <[ModuleValue; 2]>::try_from(items) {
                Ok(pair) => Self::coerce_pair(pair, fallback_columns),
                Err(items) => match <[ModuleValue; 3]>::try_from(items) {
                    Ok(triple) => Self::coerce_triple(triple, fallback_columns),
                    Err(items) => {
                        warn!("Module returned a {}-tuple", items.len());
                        Ok(Self::from_error(
                            I18nMessage::bare(BIG_TUPLE_MESSAGE_ID).with_arg("length", items.len()),
                        ))
                    }
                },
            },
            other => match coerce_error(&other, true) {
                Ok(errors) => Ok(Self::from_errors(errors)),
                Err(err) if err.is_type_or_value_error() => {
                    warn!("Module returned invalid type {}: {}", other.type_name(), err);
                    Ok(Self::from_error(
                        I18nMessage::bare(INVALID_RETURN_TYPE_MESSAGE_ID)
                            .with_arg("type", other.type_name()),
                    ))
                }
                Err(err) => Err(err),
            },
        }
    }

    fn from_table(
        table: DataFrame,
        errors: Vec<ProcessResultError>,
        json: Map<String, Value>,
        column_formats: &ColumnFormats,
        fallback_columns: &[Column],
    ) -> KernelResult<Self> {
        validate_dataframe(&table)?;
        let columns = infer_columns(&table, column_formats, fallback_columns)?;
        Self::new(table, errors, json, columns)
    }

    /// `(table-or-None, error)`, or an `(id, arguments)` message pair.
    fn coerce_pair([first, error]: [ModuleValue; 2], fallback_columns: &[Column]) -> KernelResult<Self> {
        let actual = format!("({}, {})", first.type_name(), error.type_name());

        let table = match first {
            ModuleValue::Table(table) => table,
            ModuleValue::None => DataFrame::empty(),
            first => {
                let whole = ModuleValue::Tuple(vec![first, error]);
                return Ok(match coerce_error(&whole, true) {
                    Ok(errors) => Self::from_errors(errors),
                    Err(err) => {
                        warn!("Module returned {}: {}", actual, err);
                        wrong_types("(DataFrame, ModuleError)", &actual)
                    }
                });
            }
        };

        let errors = match coerce_error(&error, true) {
            Ok(errors) => errors,
            Err(err) if err.is_type_error() => {
                warn!("Module returned {}: {}", actual, err);
                return Ok(wrong_types("(DataFrame, ModuleError)", &actual));
            }
            Err(err) => return Err(err),
        };
        Self::from_table(table, errors, Map::new(), &ColumnFormats::new(), fallback_columns)
    }

    /// `(table-or-None, error-or-None, json-or-None)`
    fn coerce_triple(
        [first, error, json]: [ModuleValue; 3],
        fallback_columns: &[Column],
    ) -> KernelResult<Self> {
        let actual = format!(
            "({}, {}, {})",
            first.type_name(),
            error.type_name(),
            json.type_name()
        );

        let errors = match coerce_error(&error, true) {
            Ok(errors) => Some(errors),
            Err(err) if err.is_type_error() => None,
            Err(err) => return Err(err),
        };
        let json = match json {
            ModuleValue::None => Some(Map::new()),
            ModuleValue::Dict(_) => match json.to_json() {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        };
        let table = match first {
            ModuleValue::Table(table) => Some(table),
            ModuleValue::None => Some(DataFrame::empty()),
            _ => None,
        };

        match (table, errors, json) {
            (Some(table), Some(errors), Some(json)) => {
                Self::from_table(table, errors, json, &ColumnFormats::new(), fallback_columns)
            }
            _ => {
                warn!("Module returned {}", actual);
                Ok(wrong_types("(DataFrame, ModuleError, dict)", &actual))
            }
        }
    }

    /// The dict form: every failure is returned as `Err`.
    fn coerce_kwargs(
        entries: Vec<(String, ModuleValue)>,
        fallback_columns: &[Column],
    ) -> KernelResult<Self> {
        if entries.iter().any(|(k, _)| !KWARGS_KEYS.contains(&k.as_str())) {
            return Err(KernelError::value_error(
                "ProcessResult input must only contain {dataframe, error, errors, json, quick_fixes, column_formats} keys",
            ));
        }
        // Later duplicates win.
        let mut kwargs: HashMap<String, ModuleValue> = entries.into_iter().collect();

        let quick_fixes = match kwargs.remove("quick_fixes") {
            None => None,
            Some(ModuleValue::List(items) | ModuleValue::Tuple(items)) => Some(
                items
                    .iter()
                    .map(QuickFix::coerce)
                    .collect::<KernelResult<Vec<_>>>()?,
            ),
            Some(other) => {
                return Err(KernelError::type_error(format!(
                    "quick_fixes must be a list, got {}",
                    other.type_name()
                )))
            }
        };
        let message = kwargs
            .remove("error")
            .map(|error| coerce_i18n_message(&error))
            .transpose()?;

        let mut errors = match (message, quick_fixes) {
            (Some(message), quick_fixes) => {
                vec![ProcessResultError::new(message, quick_fixes.unwrap_or_default())]
            }
            (None, Some(_)) => {
                return Err(KernelError::value_error(
                    "quick_fixes were given without an error",
                ))
            }
            (None, None) => Vec::new(),
        };
        if let Some(more) = kwargs.remove("errors") {
            errors.extend(coerce_error(&more, true)?);
        }

        let table = match kwargs.remove("dataframe") {
            None => DataFrame::empty(),
            Some(ModuleValue::Table(table)) => table,
            Some(other) => {
                return Err(KernelError::type_error(format!(
                    "dataframe must be a DataFrame, got {}",
                    other.type_name()
                )))
            }
        };

        let json = match kwargs.remove("json") {
            None | Some(ModuleValue::None) => Map::new(),
            Some(json @ ModuleValue::Dict(_)) => match json.to_json()? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Some(other) => {
                return Err(KernelError::value_error(format!(
                    "json must be a dict, got {}",
                    other.type_name()
                )))
            }
        };

        let column_formats = match kwargs.remove("column_formats") {
            None => ColumnFormats::new(),
            Some(ModuleValue::Dict(formats)) => formats
                .into_iter()
                .map(|(name, format)| match format {
                    ModuleValue::Str(format) => Ok((name, format)),
                    other => Err(KernelError::type_error(format!(
                        "column_formats[\"{}\"] must be a str, got {}",
                        name,
                        other.type_name()
                    ))),
                })
                .collect::<KernelResult<ColumnFormats>>()?,
            Some(other) => {
                return Err(KernelError::type_error(format!(
                    "column_formats must be a dict, got {}",
                    other.type_name()
                )))
            }
        };

        Self::from_table(table, errors, json, &column_formats, fallback_columns)
    }

    // ------------------------------------------------------------------------
    // Arrow
    // ------------------------------------------------------------------------

    /// Write the table to `path` (unless it has no columns) and build the
    /// wire result.
    pub fn to_arrow(&self, path: &Path) -> KernelResult<RenderResult> {
        let errors = self
            .errors
            .iter()
            .map(ProcessResultError::to_arrow)
            .collect::<KernelResult<Vec<RenderError>>>()?;
        let table = write_dataframe(&self.dataframe, &self.columns, path)?;
        Ok(RenderResult::new(table, errors, self.json.clone()))
    }

    pub fn from_arrow(render_result: &RenderResult) -> KernelResult<Self> {
        let (dataframe, columns) = read_dataframe(&render_result.table)?;
        let errors = render_result
            .errors
            .iter()
            .map(ProcessResultError::from_arrow)
            .collect();
        Self::new(dataframe, errors, render_result.json.clone(), columns)
    }
}

fn wrong_types(expected: &str, actual: &str) -> ProcessResult {
    ProcessResult::from_error(
        I18nMessage::bare(WRONG_TYPES_MESSAGE_ID)
            .with_arg("expected_type", expected)
            .with_arg("type", actual),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_type::ColumnTypeKind;
    use crate::dataframe::Series;
    use serde_json::json;

    fn table() -> DataFrame {
        DataFrame::new(vec![
            Series::int64("A", vec![1, 2]),
            Series::text("B", [Some("x"), Some("y")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_status() {
        assert_eq!(ProcessResult::default().status(), StepStatus::Unreachable);
        assert_eq!(
            ProcessResult::from_error(I18nMessage::todo_i18n("x")).status(),
            StepStatus::Error
        );
        let ok = ProcessResult::new(table(), vec![], Map::new(), vec![]).unwrap();
        assert_eq!(ok.status(), StepStatus::Ok);
        assert_eq!(serde_json::to_value(ok.status()).unwrap(), json!("ok"));
    }

    #[test]
    fn test_new_infers_missing_columns() {
        let result = ProcessResult::new(table(), vec![], Map::new(), vec![]).unwrap();
        assert_eq!(result.column_names(), vec!["A", "B"]);
        assert_eq!(result.columns()[0].column_type().kind(), ColumnTypeKind::Number);
        assert_eq!(result.columns()[1].column_type().kind(), ColumnTypeKind::Text);
    }

    #[test]
    fn test_new_keeps_columns_that_describe_table() {
        let columns = vec![
            Column::new("A", ColumnType::number("{:.1f}").unwrap()),
            Column::new("B", ColumnType::Text),
        ];
        let result = ProcessResult::new(table(), vec![], Map::new(), columns.clone()).unwrap();
        assert_eq!(result.columns(), columns.as_slice());
    }

    #[test]
    fn test_update_dataframe_refits_columns() {
        let columns = vec![
            Column::new("A", ColumnType::number("{:.1f}").unwrap()),
            Column::new("B", ColumnType::Text),
        ];
        let mut result = ProcessResult::new(table(), vec![], Map::new(), columns).unwrap();
        result
            .update_dataframe(|df| {
                df.drop_column("B");
                df.push_column(Series::float64("C", vec![0.5, 1.5])).unwrap();
            })
            .unwrap();
        assert_eq!(result.column_names(), vec!["A", "C"]);
        // Surviving columns keep their format.
        assert_eq!(result.columns()[0].column_type().format(), Some("{:.1f}"));
        assert_eq!(result.columns()[1].column_type().format(), Some("{:,}"));
    }

    #[test]
    fn test_error_accessor() {
        assert_eq!(ProcessResult::default().error(), "");
        let result = ProcessResult::from_errors(vec![
            I18nMessage::todo_i18n("first").into(),
            I18nMessage::todo_i18n("second").into(),
        ]);
        assert_eq!(result.error(), "first");
    }

    #[test]
    fn test_shape_hides_table_of_non_ok_results() {
        let shape = ProcessResult::from_error(I18nMessage::todo_i18n("x")).shape();
        assert_eq!(shape.status, StepStatus::Error);
        assert_eq!(shape.table_shape, TableShape::default());

        let ok = ProcessResult::new(table(), vec![], Map::new(), vec![]).unwrap();
        assert_eq!(ok.shape().table_shape.nrows, 2);
        assert_eq!(ok.shape().table_shape.columns.len(), 2);
    }

    #[test]
    fn test_truncate() {
        let table = DataFrame::new(vec![Series::categorical(
            "A",
            [Some("a"), Some("b"), Some("c"), Some("a")],
        )])
        .unwrap();
        let mut result = ProcessResult::new(table, vec![], Map::new(), vec![]).unwrap();
        result.truncate_in_place_if_too_big(2);

        assert_eq!(result.dataframe().len(), 2);
        assert_eq!(result.status(), StepStatus::Ok);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].message.id, TRUNCATED_MESSAGE_ID);
        assert_eq!(result.errors()[0].message.arguments["old_number"], json!(4));
        assert_eq!(result.errors()[0].message.arguments["new_number"], json!(2));
        assert_eq!(result.error(), "Truncated output from 4 rows to 2");
        assert!(validate_dataframe(result.dataframe()).is_ok());
    }

    #[test]
    fn test_truncate_noop_when_small() {
        let mut result = ProcessResult::new(table(), vec![], Map::new(), vec![]).unwrap();
        result.truncate_in_place_if_too_big(2);
        assert!(result.errors().is_empty());
        assert_eq!(result.dataframe().len(), 2);
    }

    #[test]
    fn test_fuzzy_eq_ignores_integer_width() {
        use crate::dataframe::SeriesData;
        let a = ProcessResult::new(
            DataFrame::new(vec![Series::int64("A", vec![1])]).unwrap(),
            vec![],
            Map::new(),
            vec![],
        )
        .unwrap();
        let b = ProcessResult::new(
            DataFrame::new(vec![Series::new("A", SeriesData::Int8(vec![1]))]).unwrap(),
            vec![],
            Map::new(),
            vec![],
        )
        .unwrap();
        assert_ne!(a, b);
        assert!(a.fuzzy_eq(&b));
    }

    #[test]
    fn test_coerce_result_is_trusted() {
        let columns = vec![
            Column::new("A", ColumnType::number("{:d}").unwrap()),
            Column::new("B", ColumnType::Text),
        ];
        let inner = ProcessResult::new(table(), vec![], Map::new(), columns.clone()).unwrap();
        let fallback = vec![Column::new("A", ColumnType::number("{:.3f}").unwrap())];
        let result = ProcessResult::coerce(inner.into(), &fallback).unwrap();
        assert_eq!(result.columns(), columns.as_slice());
    }

    #[test]
    fn test_coerce_kwargs_quick_fixes_need_error() {
        let value = ModuleValue::dict([("quick_fixes", ModuleValue::list([]))]);
        assert!(matches!(
            ProcessResult::coerce(value, &[]),
            Err(KernelError::Value(_))
        ));
    }
}
