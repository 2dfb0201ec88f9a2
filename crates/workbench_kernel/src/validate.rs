//! Structural validation of module-produced tables.

use std::collections::HashSet;

use thiserror::Error;

use crate::dataframe::{DataFrame, Dtype, SeriesData};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("column name \"{0}\" appears more than once")]
    DuplicateColumnName(String),
    #[error("column names must not be empty")]
    EmptyColumnName,
    #[error("column \"{column}\" has unsupported dtype {dtype}")]
    DisallowedDtype { column: String, dtype: Dtype },
    #[error("column \"{0}\" contains an infinite value")]
    InfiniteValue(String),
    #[error("column \"{column}\" has duplicate category \"{category}\"")]
    DuplicateCategory { column: String, category: String },
    #[error("column \"{column}\" has category code {code}, outside of its {n_categories} categories")]
    CategoryCodeOutOfRange {
        column: String,
        code: i32,
        n_categories: usize,
    },
    #[error("column \"{0}\" has unused categories; call remove_unused_categories()")]
    UnusedCategories(String),
}

/// Reject tables the rest of the system cannot store or render.
pub fn validate_dataframe(table: &DataFrame) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for series in table.columns() {
        let name = series.name();
        if name.is_empty() {
            return Err(ValidationError::EmptyColumnName);
        }
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateColumnName(name.to_string()));
        }

        match series.data() {
            SeriesData::Timedelta(_) => {
                return Err(ValidationError::DisallowedDtype {
                    column: name.to_string(),
                    dtype: Dtype::Timedelta,
                })
            }
            SeriesData::Float16(v) if v.iter().any(|f| f.is_infinite()) => {
                return Err(ValidationError::InfiniteValue(name.to_string()))
            }
            SeriesData::Float32(v) if v.iter().any(|f| f.is_infinite()) => {
                return Err(ValidationError::InfiniteValue(name.to_string()))
            }
            SeriesData::Float64(v) if v.iter().any(|f| f.is_infinite()) => {
                return Err(ValidationError::InfiniteValue(name.to_string()))
            }
            SeriesData::Category(categorical) => {
                let categories = categorical.categories();
                let mut distinct = HashSet::new();
                for category in categories {
                    if !distinct.insert(category.as_ref()) {
                        return Err(ValidationError::DuplicateCategory {
                            column: name.to_string(),
                            category: category.to_string(),
                        });
                    }
                }

                let mut used = vec![false; categories.len()];
                for &code in categorical.codes() {
                    if code == -1 {
                        continue;
                    }
                    match usize::try_from(code).ok().filter(|c| *c < categories.len()) {
                        Some(c) => used[c] = true,
                        None => {
                            return Err(ValidationError::CategoryCodeOutOfRange {
                                column: name.to_string(),
                                code,
                                n_categories: categories.len(),
                            })
                        }
                    }
                }
                if used.contains(&false) {
                    return Err(ValidationError::UnusedCategories(name.to_string()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::{Categorical, Series};
    use std::sync::Arc;

    fn table(columns: Vec<Series>) -> DataFrame {
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn test_accepts_supported_table() {
        let t = table(vec![
            Series::int64("A", vec![1]),
            Series::float64("B", vec![f64::NAN]),
            Series::text("C", [None]),
            Series::categorical("D", [Some("x")]),
            Series::datetime("E", vec![None]),
        ]);
        assert_eq!(validate_dataframe(&t), Ok(()));
    }

    #[test]
    fn test_rejects_duplicate_and_empty_names() {
        let t = table(vec![Series::int64("A", vec![1]), Series::int64("A", vec![2])]);
        assert_eq!(
            validate_dataframe(&t),
            Err(ValidationError::DuplicateColumnName("A".to_string()))
        );
        let t = table(vec![Series::int64("", vec![1])]);
        assert_eq!(validate_dataframe(&t), Err(ValidationError::EmptyColumnName));
    }

    #[test]
    fn test_rejects_timedelta_and_infinity() {
        let t = table(vec![Series::new("A", SeriesData::Timedelta(vec![Some(1)]))]);
        assert!(matches!(
            validate_dataframe(&t),
            Err(ValidationError::DisallowedDtype { .. })
        ));
        let t = table(vec![Series::float64("A", vec![f64::INFINITY])]);
        assert_eq!(
            validate_dataframe(&t),
            Err(ValidationError::InfiniteValue("A".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_categoricals() {
        let dup = Categorical::new(vec![0, 1], vec![Arc::from("x"), Arc::from("x")]);
        let t = table(vec![Series::new("A", SeriesData::Category(dup))]);
        assert!(matches!(
            validate_dataframe(&t),
            Err(ValidationError::DuplicateCategory { .. })
        ));

        let out_of_range = Categorical::new(vec![2], vec![Arc::from("x")]);
        let t = table(vec![Series::new("A", SeriesData::Category(out_of_range))]);
        assert!(matches!(
            validate_dataframe(&t),
            Err(ValidationError::CategoryCodeOutOfRange { code: 2, .. })
        ));

        let unused = Categorical::new(vec![0, -1], vec![Arc::from("x"), Arc::from("y")]);
        let t = table(vec![Series::new("A", SeriesData::Category(unused))]);
        assert_eq!(
            validate_dataframe(&t),
            Err(ValidationError::UnusedCategories("A".to_string()))
        );
    }
}
