//! The closed set of column types: text, number (with a format) and
//! datetime.

use std::fmt;

use workbench_protocol as protocol;

use crate::dataframe::{Dtype, Series, SeriesData};
use crate::error::{KernelError, KernelResult};
use crate::number_format::{FormatError, NumberFormatter};

/// Timestamps render as ISO-8601 UTC with microseconds.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Which of the three types, without parameters. Ordered by preference
/// as a conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnTypeKind {
    Text,
    Number,
    Datetime,
}

impl ColumnTypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnTypeKind::Text => "text",
            ColumnTypeKind::Number => "number",
            ColumnTypeKind::Datetime => "datetime",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(ColumnTypeKind::Text),
            "number" => Some(ColumnTypeKind::Number),
            "datetime" => Some(ColumnTypeKind::Datetime),
            _ => None,
        }
    }

    /// The type of this kind with default parameters.
    pub fn default_type(self) -> ColumnType {
        match self {
            ColumnTypeKind::Text => ColumnType::Text,
            ColumnTypeKind::Number => ColumnType::Number(NumberFormatter::default()),
            ColumnTypeKind::Datetime => ColumnType::Datetime,
        }
    }
}

impl fmt::Display for ColumnTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data type of a column. A number type always carries a valid format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Number(NumberFormatter),
    Datetime,
}

impl ColumnType {
    pub fn number(format: &str) -> Result<Self, FormatError> {
        Ok(ColumnType::Number(NumberFormatter::new(format)?))
    }

    pub fn kind(&self) -> ColumnTypeKind {
        match self {
            ColumnType::Text => ColumnTypeKind::Text,
            ColumnType::Number(_) => ColumnTypeKind::Number,
            ColumnType::Datetime => ColumnTypeKind::Datetime,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn format(&self) -> Option<&str> {
        match self {
            ColumnType::Number(formatter) => Some(formatter.as_str()),
            _ => None,
        }
    }

    /// Map a runtime dtype to its column type kind.
    pub fn class_from_dtype(dtype: Dtype) -> KernelResult<ColumnTypeKind> {
        match dtype {
            d if d.is_numeric() => Ok(ColumnTypeKind::Number),
            Dtype::Datetime => Ok(ColumnTypeKind::Datetime),
            Dtype::Object | Dtype::Category => Ok(ColumnTypeKind::Text),
            other => Err(KernelError::UnknownDtype(other)),
        }
    }

    /// Render every value of `series` for display. Missing values, and
    /// values this type cannot render, are `None`.
    pub fn format_series(&self, series: &Series) -> Vec<Option<String>> {
        match self {
            ColumnType::Text => match series.data() {
                SeriesData::Object(values) => values
                    .iter()
                    .map(|v| v.as_deref().map(str::to_string))
                    .collect(),
                SeriesData::Category(categorical) => (0..categorical.len())
                    .map(|row| categorical.get(row).map(|s| s.to_string()))
                    .collect(),
                _ => series.to_strings().into_iter().map(Some).collect(),
            },
            ColumnType::Number(formatter) => (0..series.len())
                .map(|row| series.number_at(row).map(|n| formatter.format(n)))
                .collect(),
            ColumnType::Datetime => match series.data() {
                SeriesData::Datetime(values) => values
                    .iter()
                    .map(|ns| ns.map(format_timestamp))
                    .collect(),
                _ => vec![None; series.len()],
            },
        }
    }

    /// Wire descriptor.
    pub fn to_arrow(&self) -> protocol::ColumnType {
        match self {
            ColumnType::Text => protocol::ColumnType::Text,
            ColumnType::Number(formatter) => protocol::ColumnType::Number {
                format: formatter.as_str().to_string(),
            },
            ColumnType::Datetime => protocol::ColumnType::Datetime,
        }
    }

    /// Parse a wire descriptor; the number format is validated here.
    pub fn from_arrow(wire: &protocol::ColumnType) -> KernelResult<Self> {
        Ok(match wire {
            protocol::ColumnType::Text => ColumnType::Text,
            protocol::ColumnType::Number { format } => ColumnType::number(format)?,
            protocol::ColumnType::Datetime => ColumnType::Datetime,
        })
    }
}

fn format_timestamp(ns: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_nanos(ns)
        .format(DATETIME_FORMAT)
        .to_string()
}
