//! Column-type inference.
//!
//! A module may format its own number columns; otherwise the columns of
//! the previous step act as fallbacks so number formats carry through
//! steps that never mention them.

use std::collections::HashMap;

use crate::column::Column;
use crate::column_type::{ColumnType, ColumnTypeKind};
use crate::dataframe::{DataFrame, Series};
use crate::error::{KernelError, KernelResult};

/// Number formats by column name.
pub type ColumnFormats = HashMap<String, String>;

/// Build the `Column` for `series`.
///
/// Fails when `given_format` is invalid, or given for a column that is
/// not a number column.
pub fn infer_column(
    series: &Series,
    given_format: Option<&str>,
    fallback: Option<&Column>,
) -> KernelResult<Column> {
    let kind = ColumnType::class_from_dtype(series.dtype())?;

    let column_type = match (kind, given_format) {
        (ColumnTypeKind::Number, Some(format)) => ColumnType::number(format)?,
        (_, Some(_)) => {
            return Err(KernelError::value_error(format!(
                "\"format\" not allowed for column \"{}\" because it is of type \"{}\"",
                series.name(),
                kind
            )))
        }
        (_, None) => match fallback {
            Some(fallback) if fallback.column_type().kind() == kind => {
                fallback.column_type().clone()
            }
            _ => kind.default_type(),
        },
    };

    Ok(Column::new(series.name(), column_type))
}

/// Infer every column of `table`, in table order.
pub fn infer_columns(
    table: &DataFrame,
    column_formats: &ColumnFormats,
    fallback_columns: &[Column],
) -> KernelResult<Vec<Column>> {
    let fallbacks: HashMap<&str, &Column> =
        fallback_columns.iter().map(|c| (c.name(), c)).collect();

    table
        .columns()
        .iter()
        .map(|series| {
            infer_column(
                series,
                column_formats.get(series.name()).map(String::as_str),
                fallbacks.get(series.name()).copied(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::SeriesData;

    #[test]
    fn test_default_types() {
        let table = DataFrame::new(vec![
            Series::int64("A", vec![1]),
            Series::text("B", [Some("x")]),
            Series::datetime("C", vec![None]),
            Series::categorical("D", [Some("y")]),
        ])
        .unwrap();
        let columns = infer_columns(&table, &ColumnFormats::new(), &[]).unwrap();
        assert_eq!(
            columns,
            vec![
                Column::new("A", ColumnTypeKind::Number.default_type()),
                Column::new("B", ColumnType::Text),
                Column::new("C", ColumnType::Datetime),
                Column::new("D", ColumnType::Text),
            ]
        );
    }

    #[test]
    fn test_given_format_wins_over_fallback() {
        let series = Series::float64("A", vec![1.5]);
        let fallback = Column::new("A", ColumnType::number("{:.2f}").unwrap());
        let column = infer_column(&series, Some("{:d}"), Some(&fallback)).unwrap();
        assert_eq!(column.column_type().format(), Some("{:d}"));
    }

    #[test]
    fn test_fallback_kept_when_kind_matches() {
        let series = Series::float64("A", vec![1.5]);
        let fallback = Column::new("A", ColumnType::number("{:.2f}").unwrap());
        let column = infer_column(&series, None, Some(&fallback)).unwrap();
        assert_eq!(column, fallback);
    }

    #[test]
    fn test_fallback_ignored_when_kind_differs() {
        let series = Series::text("A", [Some("x")]);
        let fallback = Column::new("A", ColumnType::number("{:.2f}").unwrap());
        let column = infer_column(&series, None, Some(&fallback)).unwrap();
        assert_eq!(column.column_type(), &ColumnType::Text);
    }

    #[test]
    fn test_format_on_text_column_is_rejected() {
        let series = Series::text("A", [Some("x")]);
        let err = infer_column(&series, Some("{:,}"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"format\" not allowed for column \"A\" because it is of type \"text\""
        );
        assert!(!err.is_type_error());
    }

    #[test]
    fn test_invalid_format_propagates() {
        let series = Series::int64("A", vec![1]);
        assert!(matches!(
            infer_column(&series, Some("{:nope}"), None),
            Err(KernelError::Format(_))
        ));
    }

    #[test]
    fn test_unknown_dtype() {
        let series = Series::new("A", SeriesData::Timedelta(vec![None]));
        assert!(matches!(
            infer_column(&series, None, None),
            Err(KernelError::UnknownDtype(_))
        ));
    }

    #[test]
    fn test_lookups_are_by_name() {
        let table = DataFrame::new(vec![
            Series::int64("A", vec![1]),
            Series::int64("B", vec![2]),
        ])
        .unwrap();
        let mut formats = ColumnFormats::new();
        formats.insert("B".to_string(), "{:d}".to_string());
        let fallbacks = vec![Column::new("A", ColumnType::number("{:.1f}").unwrap())];

        let columns = infer_columns(&table, &formats, &fallbacks).unwrap();
        assert_eq!(columns[0].column_type().format(), Some("{:.1f}"));
        assert_eq!(columns[1].column_type().format(), Some("{:d}"));
    }
}
