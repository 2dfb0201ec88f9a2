//! In-memory tables.
//!
//! A [`DataFrame`] is an ordered list of equal-length named [`Series`].
//! Missing values: NaN for floats, `None` for timestamps and strings,
//! code `-1` for categoricals. Integer columns cannot hold missing values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use half::f16;

use crate::error::{KernelError, KernelResult};
use crate::number_format::NumberValue;

/// Runtime dtype of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    /// Nanoseconds since the epoch, timezone-naive
    Datetime,
    /// Nanosecond durations; no column type represents these
    Timedelta,
    /// Strings
    Object,
    Category,
}

impl Dtype {
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Dtype::Int8
                | Dtype::Int16
                | Dtype::Int32
                | Dtype::Int64
                | Dtype::UInt8
                | Dtype::UInt16
                | Dtype::UInt32
                | Dtype::UInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Dtype::Float16 | Dtype::Float32 | Dtype::Float64)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::UInt8 => "uint8",
            Dtype::UInt16 => "uint16",
            Dtype::UInt32 => "uint32",
            Dtype::UInt64 => "uint64",
            Dtype::Float16 => "float16",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Datetime => "datetime64[ns]",
            Dtype::Timedelta => "timedelta64[ns]",
            Dtype::Object => "object",
            Dtype::Category => "category",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Categorical
// ============================================================================

/// Dictionary-encoded strings. Code `-1` is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    codes: Vec<i32>,
    categories: Vec<Arc<str>>,
}

impl Categorical {
    /// Unchecked; `validate_dataframe` reports bad codes and categories.
    pub fn new(codes: Vec<i32>, categories: Vec<Arc<str>>) -> Self {
        Self { codes, categories }
    }

    /// Encode values. Categories are the distinct values, sorted.
    pub fn from_values<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let values: Vec<Option<&str>> = values.into_iter().collect();
        let mut distinct: Vec<&str> = values.iter().flatten().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();

        let index: HashMap<&str, i32> = distinct
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i as i32))
            .collect();
        let codes = values
            .iter()
            .map(|v| v.and_then(|v| index.get(v).copied()).unwrap_or(-1))
            .collect();

        Self {
            codes,
            categories: distinct.into_iter().map(Arc::from).collect(),
        }
    }

    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    pub fn categories(&self) -> &[Arc<str>] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Arc<str>> {
        let code = *self.codes.get(row)?;
        usize::try_from(code).ok().and_then(|c| self.categories.get(c))
    }

    /// Drop categories no code points at, keeping the order of the rest.
    pub fn remove_unused_categories(&mut self) {
        let mut used = vec![false; self.categories.len()];
        for code in &self.codes {
            if let Some(slot) = usize::try_from(*code).ok().and_then(|c| used.get_mut(c)) {
                *slot = true;
            }
        }
        if used.iter().all(|u| *u) {
            return;
        }

        let mut remap = vec![-1i32; self.categories.len()];
        let mut kept = Vec::new();
        for (i, category) in self.categories.iter().enumerate() {
            if used[i] {
                remap[i] = kept.len() as i32;
                kept.push(Arc::clone(category));
            }
        }
        for code in &mut self.codes {
            *code = usize::try_from(*code)
                .ok()
                .and_then(|c| remap.get(c).copied())
                .unwrap_or(-1);
        }
        self.categories = kept;
    }

    fn truncate(&mut self, n: usize) {
        self.codes.truncate(n);
    }
}

// ============================================================================
// Series
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Datetime(Vec<Option<i64>>),
    Timedelta(Vec<Option<i64>>),
    Object(Vec<Option<Arc<str>>>),
    Category(Categorical),
}

/// Apply `$body` to the vector inside any non-categorical variant.
macro_rules! each_vec {
    ($data:expr, $v:ident => $body:expr, $cat:ident => $cat_body:expr) => {
        match $data {
            SeriesData::Int8($v) => $body,
            SeriesData::Int16($v) => $body,
            SeriesData::Int32($v) => $body,
            SeriesData::Int64($v) => $body,
            SeriesData::UInt8($v) => $body,
            SeriesData::UInt16($v) => $body,
            SeriesData::UInt32($v) => $body,
            SeriesData::UInt64($v) => $body,
            SeriesData::Float16($v) => $body,
            SeriesData::Float32($v) => $body,
            SeriesData::Float64($v) => $body,
            SeriesData::Datetime($v) => $body,
            SeriesData::Timedelta($v) => $body,
            SeriesData::Object($v) => $body,
            SeriesData::Category($cat) => $cat_body,
        }
    };
}

impl SeriesData {
    pub fn dtype(&self) -> Dtype {
        match self {
            SeriesData::Int8(_) => Dtype::Int8,
            SeriesData::Int16(_) => Dtype::Int16,
            SeriesData::Int32(_) => Dtype::Int32,
            SeriesData::Int64(_) => Dtype::Int64,
            SeriesData::UInt8(_) => Dtype::UInt8,
            SeriesData::UInt16(_) => Dtype::UInt16,
            SeriesData::UInt32(_) => Dtype::UInt32,
            SeriesData::UInt64(_) => Dtype::UInt64,
            SeriesData::Float16(_) => Dtype::Float16,
            SeriesData::Float32(_) => Dtype::Float32,
            SeriesData::Float64(_) => Dtype::Float64,
            SeriesData::Datetime(_) => Dtype::Datetime,
            SeriesData::Timedelta(_) => Dtype::Timedelta,
            SeriesData::Object(_) => Dtype::Object,
            SeriesData::Category(_) => Dtype::Category,
        }
    }

    pub fn len(&self) -> usize {
        each_vec!(self, v => v.len(), c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn truncate(&mut self, n: usize) {
        each_vec!(self, v => v.truncate(n), c => c.truncate(n))
    }
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    data: SeriesData,
}

impl Series {
    pub fn new(name: impl Into<String>, data: SeriesData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int64(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, SeriesData::Int64(values))
    }

    pub fn float64(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, SeriesData::Float64(values))
    }

    pub fn text<'a>(name: impl Into<String>, values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self::new(
            name,
            SeriesData::Object(values.into_iter().map(|v| v.map(Arc::from)).collect()),
        )
    }

    pub fn categorical<'a>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Self {
        Self::new(name, SeriesData::Category(Categorical::from_values(values)))
    }

    pub fn datetime(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, SeriesData::Datetime(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn data(&self) -> &SeriesData {
        &self.data
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric value at `row`; `None` for NaN or non-numeric series.
    pub fn number_at(&self, row: usize) -> Option<NumberValue> {
        let value: NumberValue = match &self.data {
            SeriesData::Int8(v) => (*v.get(row)?).into(),
            SeriesData::Int16(v) => (*v.get(row)?).into(),
            SeriesData::Int32(v) => (*v.get(row)?).into(),
            SeriesData::Int64(v) => (*v.get(row)?).into(),
            SeriesData::UInt8(v) => (*v.get(row)?).into(),
            SeriesData::UInt16(v) => (*v.get(row)?).into(),
            SeriesData::UInt32(v) => (*v.get(row)?).into(),
            SeriesData::UInt64(v) => (*v.get(row)?).into(),
            SeriesData::Float16(v) => (*v.get(row)?).into(),
            SeriesData::Float32(v) => (*v.get(row)?).into(),
            SeriesData::Float64(v) => (*v.get(row)?).into(),
            _ => return None,
        };
        match value {
            NumberValue::Float(f) if f.is_nan() => None,
            other => Some(other),
        }
    }

    /// String-cast rendering of every value.
    pub fn to_strings(&self) -> Vec<String> {
        fn float_str(f: f64) -> String {
            if f.is_nan() {
                "nan".to_string()
            } else {
                f.to_string()
            }
        }

        match &self.data {
            SeriesData::Int8(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::Int16(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::Int32(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::Int64(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::UInt8(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::UInt16(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::UInt32(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::UInt64(v) => v.iter().map(ToString::to_string).collect(),
            SeriesData::Float16(v) => v.iter().map(|f| float_str(f.to_f64())).collect(),
            SeriesData::Float32(v) => v.iter().map(|f| float_str(*f as f64)).collect(),
            SeriesData::Float64(v) => v.iter().map(|f| float_str(*f)).collect(),
            SeriesData::Datetime(v) => v
                .iter()
                .map(|ns| match ns {
                    Some(ns) => chrono::DateTime::<chrono::Utc>::from_timestamp_nanos(*ns)
                        .naive_utc()
                        .to_string(),
                    None => "NaT".to_string(),
                })
                .collect(),
            SeriesData::Timedelta(v) => v
                .iter()
                .map(|ns| match ns {
                    Some(ns) => format!("{}ns", ns),
                    None => "NaT".to_string(),
                })
                .collect(),
            SeriesData::Object(v) => v
                .iter()
                .map(|s| s.as_deref().unwrap_or("None").to_string())
                .collect(),
            SeriesData::Category(c) => (0..c.len())
                .map(|row| c.get(row).map_or_else(|| "nan".to_string(), |s| s.to_string()))
                .collect(),
        }
    }
}

// ============================================================================
// DataFrame
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Series>,
}

impl DataFrame {
    pub fn new(columns: Vec<Series>) -> KernelResult<Self> {
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|s| s.len() != first.len()) {
                return Err(KernelError::value_error(format!(
                    "column \"{}\" has {} rows; column \"{}\" has {}",
                    bad.name(),
                    bad.len(),
                    first.name(),
                    first.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// No columns, no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Row count. A table without columns has no rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Series::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|s| s.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Series::name).collect()
    }

    pub fn push_column(&mut self, series: Series) -> KernelResult<()> {
        if self.has_columns() && series.len() != self.len() {
            return Err(KernelError::value_error(format!(
                "column \"{}\" has {} rows; table has {}",
                series.name(),
                series.len(),
                self.len()
            )));
        }
        self.columns.push(series);
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Series> {
        let index = self.columns.iter().position(|s| s.name() == name)?;
        Some(self.columns.remove(index))
    }

    /// Returns false when there is no column named `from`.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.columns.iter_mut().find(|s| s.name() == from) {
            Some(series) => {
                series.rename(to);
                true
            }
            None => false,
        }
    }

    /// Keep the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        for series in &mut self.columns {
            series.data.truncate(n);
        }
    }

    pub fn remove_unused_categories(&mut self) {
        for series in &mut self.columns {
            if let SeriesData::Category(categorical) = &mut series.data {
                categorical.remove_unused_categories();
            }
        }
    }

    /// String-cast rendering, one vector per column.
    pub fn to_strings(&self) -> Vec<Vec<String>> {
        self.columns.iter().map(Series::to_strings).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = DataFrame::new(vec![
            Series::int64("A", vec![1, 2]),
            Series::int64("B", vec![1]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("\"B\" has 1 rows"));
    }

    #[test]
    fn test_empty_table_has_no_rows() {
        let table = DataFrame::empty();
        assert_eq!(table.len(), 0);
        assert!(!table.has_columns());
    }

    #[test]
    fn test_categorical_from_values_sorts_categories() {
        let cat = Categorical::from_values([Some("b"), None, Some("a"), Some("b")]);
        assert_eq!(cat.codes(), &[1, -1, 0, 1]);
        assert_eq!(
            cat.categories().iter().map(|c| c.as_ref()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(cat.get(1).is_none());
    }

    #[test]
    fn test_truncate_then_remove_unused_categories() {
        let mut table = DataFrame::new(vec![Series::categorical(
            "A",
            [Some("x"), Some("y"), Some("z")],
        )])
        .unwrap();
        table.truncate(2);
        table.remove_unused_categories();

        let SeriesData::Category(cat) = table.columns()[0].data() else {
            panic!("expected categorical");
        };
        assert_eq!(cat.codes(), &[0, 1]);
        assert_eq!(cat.categories().len(), 2);
    }

    #[test]
    fn test_number_at_skips_nan() {
        let series = Series::float64("A", vec![1.5, f64::NAN]);
        assert_eq!(series.number_at(0), Some(NumberValue::Float(1.5)));
        assert_eq!(series.number_at(1), None);
        assert_eq!(Series::text("B", [Some("x")]).number_at(0), None);
    }

    #[test]
    fn test_to_strings() {
        let table = DataFrame::new(vec![
            Series::float64("A", vec![1.0, f64::NAN]),
            Series::text("B", [Some("x"), None]),
            Series::datetime("C", vec![Some(0), None]),
        ])
        .unwrap();
        assert_eq!(
            table.to_strings(),
            vec![
                vec!["1".to_string(), "nan".to_string()],
                vec!["x".to_string(), "None".to_string()],
                vec!["1970-01-01 00:00:00".to_string(), "NaT".to_string()],
            ]
        );
    }

    #[test]
    fn test_column_edits() {
        let mut table = DataFrame::new(vec![Series::int64("A", vec![1, 2])]).unwrap();
        table.push_column(Series::int64("B", vec![3, 4])).unwrap();
        assert!(table.push_column(Series::int64("C", vec![5])).is_err());
        assert!(table.rename_column("A", "Z"));
        assert!(!table.rename_column("missing", "Y"));
        assert!(table.drop_column("B").is_some());
        assert_eq!(table.column_names(), vec!["Z"]);
    }
}
