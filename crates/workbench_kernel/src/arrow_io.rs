//! DataFrame ⇄ Arrow IPC file.
//!
//! Writes go to a hidden temp file next to the destination and are renamed
//! into place once the single record batch is finished, so a returned
//! artifact never points at a partial file. Reads map the file for the
//! duration of the call only.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use arrow::array::{
    Array, ArrayRef, AsArray, DictionaryArray, Float16Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, StringArray, TimestampNanosecondArray,
    UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::compute::concat_batches;
use arrow::datatypes::{
    DataType, Field, Float16Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, Schema, TimeUnit, TimestampNanosecondType, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use half::f16;
use memmap2::Mmap;
use tracing::{debug, info, warn};
use workbench_protocol::ArrowTable;

use crate::column::{Column, TableShape};
use crate::dataframe::{Categorical, DataFrame, Series, SeriesData};
use crate::error::{KernelError, KernelResult};

// ============================================================================
// Write
// ============================================================================

/// Write `table` to `path` and describe it with `columns`.
///
/// A table without columns writes nothing and returns a file-less artifact.
pub fn write_dataframe(table: &DataFrame, columns: &[Column], path: &Path) -> KernelResult<ArrowTable> {
    let table_names = table.column_names();
    let column_names: Vec<&str> = columns.iter().map(Column::name).collect();
    if table_names != column_names {
        return Err(KernelError::value_error(format!(
            "columns {:?} do not describe table columns {:?}",
            column_names, table_names
        )));
    }

    if columns.is_empty() {
        debug!("Table has no columns; not writing {}", path.display());
        return Ok(ArrowTable::without_file(0));
    }

    let batch = record_batch(table)?;
    write_batch_atomically(&batch, path)?;
    info!(
        "Wrote Arrow artifact: {} ({} rows, {} columns)",
        path.display(),
        batch.num_rows(),
        batch.num_columns()
    );

    let metadata = TableShape::new(table.len(), columns.to_vec()).to_arrow();
    Ok(ArrowTable::new(Some(path.to_path_buf()), metadata)?)
}

// Dictionary columns each get their own dictionary id.
#[allow(deprecated)]
fn record_batch(table: &DataFrame) -> KernelResult<RecordBatch> {
    let mut fields = Vec::with_capacity(table.width());
    let mut arrays = Vec::with_capacity(table.width());

    for (index, series) in table.columns().iter().enumerate() {
        let array = series_to_array(series)?;
        let field = match array.data_type() {
            DataType::Dictionary(..) => Field::new_dict(
                series.name(),
                array.data_type().clone(),
                true,
                index as i64,
                false,
            ),
            data_type => Field::new(series.name(), data_type.clone(), array.null_count() > 0 || nullable(series)),
        };
        fields.push(field);
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays)
        .context("Failed to assemble record batch")
        .map_err(KernelError::from)
}

fn nullable(series: &Series) -> bool {
    !series.dtype().is_integer()
}

fn series_to_array(series: &Series) -> KernelResult<ArrayRef> {
    fn nan_to_null<T: Copy>(values: &[T], is_nan: impl Fn(&T) -> bool) -> Vec<Option<T>> {
        values.iter().map(|v| (!is_nan(v)).then_some(*v)).collect()
    }

    let array: ArrayRef = match series.data() {
        SeriesData::Int8(v) => Arc::new(Int8Array::from(v.clone())),
        SeriesData::Int16(v) => Arc::new(Int16Array::from(v.clone())),
        SeriesData::Int32(v) => Arc::new(Int32Array::from(v.clone())),
        SeriesData::Int64(v) => Arc::new(Int64Array::from(v.clone())),
        SeriesData::UInt8(v) => Arc::new(UInt8Array::from(v.clone())),
        SeriesData::UInt16(v) => Arc::new(UInt16Array::from(v.clone())),
        SeriesData::UInt32(v) => Arc::new(UInt32Array::from(v.clone())),
        SeriesData::UInt64(v) => Arc::new(UInt64Array::from(v.clone())),
        SeriesData::Float16(v) => Arc::new(Float16Array::from(nan_to_null(v, |f| f.is_nan()))),
        SeriesData::Float32(v) => Arc::new(Float32Array::from(nan_to_null(v, |f| f.is_nan()))),
        SeriesData::Float64(v) => Arc::new(Float64Array::from(nan_to_null(v, |f| f.is_nan()))),
        SeriesData::Datetime(v) => Arc::new(TimestampNanosecondArray::from(v.clone())),
        SeriesData::Object(v) => Arc::new(StringArray::from(
            v.iter().map(|s| s.as_deref()).collect::<Vec<Option<&str>>>(),
        )),
        SeriesData::Category(categorical) => {
            let keys = Int32Array::from(
                categorical
                    .codes()
                    .iter()
                    .map(|code| (*code >= 0).then_some(*code))
                    .collect::<Vec<Option<i32>>>(),
            );
            let values = StringArray::from(
                categorical
                    .categories()
                    .iter()
                    .map(|c| c.as_ref())
                    .collect::<Vec<&str>>(),
            );
            let dictionary = DictionaryArray::<Int32Type>::try_new(keys, Arc::new(values))
                .with_context(|| format!("Failed to encode categorical column \"{}\"", series.name()))?;
            Arc::new(dictionary)
        }
        SeriesData::Timedelta(_) => {
            return Err(KernelError::UnsupportedDtype {
                column: series.name().to_string(),
                dtype: series.dtype(),
            })
        }
    };
    Ok(array)
}

/// Removes the staged file unless it was renamed into place.
struct StagedFile {
    path: Option<PathBuf>,
}

impl StagedFile {
    fn commit(&mut self) {
        self.path = None;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if path.exists() {
                let _ = fs::remove_file(path);
                warn!("Cleaned up orphaned temp file: {}", path.display());
            }
        }
    }
}

fn write_batch_atomically(batch: &RecordBatch, path: &Path) -> anyhow::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Artifact path has no file name: {}", path.display()))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    let mut staged = StagedFile {
        path: Some(temp_path.clone()),
    };

    debug!("Staging Arrow artifact at {}", temp_path.display());
    let file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp Arrow file: {}", temp_path.display()))?;
    let mut writer =
        FileWriter::try_new(file, &batch.schema()).context("Failed to create Arrow IPC writer")?;
    writer
        .write(batch)
        .context("Failed to write record batch to Arrow IPC file")?;
    writer.finish().context("Failed to finish Arrow IPC file")?;
    drop(writer);

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} -> {}",
            temp_path.display(),
            path.display()
        )
    })?;
    staged.commit();
    Ok(())
}

// ============================================================================
// Read
// ============================================================================

/// Load an artifact. Columns come from the artifact's metadata, so number
/// formats survive exactly.
pub fn read_dataframe(artifact: &ArrowTable) -> KernelResult<(DataFrame, Vec<Column>)> {
    let columns = artifact
        .columns()
        .iter()
        .map(Column::from_arrow)
        .collect::<KernelResult<Vec<_>>>()?;

    let Some(path) = artifact.path() else {
        return Ok((DataFrame::empty(), Vec::new()));
    };

    let batch = read_batch(path)?;
    let file_names: Vec<&str> = batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    let column_names: Vec<&str> = columns.iter().map(Column::name).collect();
    if file_names != column_names || batch.num_rows() != artifact.n_rows() {
        return Err(anyhow!(
            "Arrow file {} holds {} rows of {:?}; metadata says {} rows of {:?}",
            path.display(),
            batch.num_rows(),
            file_names,
            artifact.n_rows(),
            column_names
        )
        .into());
    }

    let mut strings = StringPool::default();
    let series = batch
        .schema_ref()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| array_to_series(field.name(), array, &mut strings))
        .collect::<KernelResult<Vec<_>>>()?;

    debug!(
        "Read Arrow artifact: {} ({} rows, {} columns)",
        path.display(),
        batch.num_rows(),
        series.len()
    );
    Ok((DataFrame::new(series)?, columns))
}

fn read_batch(path: &Path) -> anyhow::Result<RecordBatch> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open Arrow file: {}", path.display()))?;
    // SAFETY: artifacts are never modified after the rename that publishes
    // them, and the mapping is dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map Arrow file: {}", path.display()))?;

    let reader = FileReader::try_new(Cursor::new(&mmap[..]), None)
        .with_context(|| format!("Invalid Arrow IPC file: {}", path.display()))?;
    let schema = reader.schema();
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read record batches from {}", path.display()))?;

    concat_batches(&schema, &batches).context("Failed to combine record batches")
}

/// Shares one allocation per distinct string.
#[derive(Default)]
struct StringPool {
    strings: HashMap<String, Arc<str>>,
}

impl StringPool {
    fn intern(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(value) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(value);
        self.strings.insert(value.to_string(), Arc::clone(&shared));
        shared
    }
}

macro_rules! read_ints {
    ($array:expr, $arrow:ty, $variant:ident) => {{
        let typed = $array.as_primitive::<$arrow>();
        if typed.null_count() > 0 {
            // Integer columns cannot hold missing values.
            SeriesData::Float64(typed.iter().map(|v| v.map_or(f64::NAN, |x| x as f64)).collect())
        } else {
            SeriesData::$variant(typed.values().to_vec())
        }
    }};
}

fn array_to_series(name: &str, array: &ArrayRef, strings: &mut StringPool) -> KernelResult<Series> {
    let data = match array.data_type() {
        DataType::Int8 => read_ints!(array, Int8Type, Int8),
        DataType::Int16 => read_ints!(array, Int16Type, Int16),
        DataType::Int32 => read_ints!(array, Int32Type, Int32),
        DataType::Int64 => read_ints!(array, Int64Type, Int64),
        DataType::UInt8 => read_ints!(array, UInt8Type, UInt8),
        DataType::UInt16 => read_ints!(array, UInt16Type, UInt16),
        DataType::UInt32 => read_ints!(array, UInt32Type, UInt32),
        DataType::UInt64 => read_ints!(array, UInt64Type, UInt64),
        DataType::Float16 => SeriesData::Float16(
            array
                .as_primitive::<Float16Type>()
                .iter()
                .map(|v| v.unwrap_or(f16::NAN))
                .collect(),
        ),
        DataType::Float32 => SeriesData::Float32(
            array
                .as_primitive::<Float32Type>()
                .iter()
                .map(|v| v.unwrap_or(f32::NAN))
                .collect(),
        ),
        DataType::Float64 => SeriesData::Float64(
            array
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect(),
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, None) => SeriesData::Datetime(
            array
                .as_primitive::<TimestampNanosecondType>()
                .iter()
                .collect(),
        ),
        DataType::Utf8 => SeriesData::Object(
            array
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(|s| strings.intern(s)))
                .collect(),
        ),
        DataType::Dictionary(_, value_type) if value_type.as_ref() == &DataType::Utf8 => {
            let dictionary = array
                .as_any_dictionary_opt()
                .ok_or_else(|| anyhow!("Column \"{}\" is not a dictionary array", name))?;
            let categories: Vec<Arc<str>> = dictionary
                .values()
                .as_string::<i32>()
                .iter()
                .map(|v| strings.intern(v.unwrap_or_default()))
                .collect();
            let keys = dictionary.keys();
            let codes = dictionary
                .normalized_keys()
                .into_iter()
                .enumerate()
                .map(|(row, key)| if keys.is_null(row) { -1 } else { key as i32 })
                .collect();
            SeriesData::Category(Categorical::new(codes, categories))
        }
        other => {
            return Err(anyhow!("Column \"{}\" has unsupported Arrow type {}", name, other).into())
        }
    };
    Ok(Series::new(name, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_type::{ColumnType, ColumnTypeKind};
    use crate::inference::{infer_columns, ColumnFormats};
    use tempfile::tempdir;

    fn columns_of(table: &DataFrame) -> Vec<Column> {
        infer_columns(table, &ColumnFormats::new(), &[]).unwrap()
    }

    #[test]
    fn test_no_columns_writes_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let artifact = write_dataframe(&DataFrame::empty(), &[], &path).unwrap();
        assert!(artifact.path().is_none());
        assert!(!path.exists());

        let (table, columns) = read_dataframe(&artifact).unwrap();
        assert!(!table.has_columns());
        assert!(columns.is_empty());
    }

    #[test]
    fn test_zero_rows_still_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table = DataFrame::new(vec![Series::int64("A", vec![])]).unwrap();
        let artifact = write_dataframe(&table, &columns_of(&table), &path).unwrap();
        assert_eq!(artifact.path(), Some(path.as_path()));
        assert_eq!(artifact.n_rows(), 0);

        let (read, _) = read_dataframe(&artifact).unwrap();
        assert_eq!(read, table);
    }

    #[test]
    fn test_categorical_nulls_become_dictionary_nulls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table =
            DataFrame::new(vec![Series::categorical("A", [Some("b"), None, Some("a")])]).unwrap();
        write_dataframe(&table, &columns_of(&table), &path).unwrap();

        let batch = read_batch(&path).unwrap();
        let dictionary = batch.column(0).as_dictionary::<Int32Type>();
        assert_eq!(dictionary.keys().null_count(), 1);
        assert!(dictionary.keys().is_null(1));
        assert_eq!(dictionary.values().len(), 2);
    }

    #[test]
    fn test_timestamps_are_naive_nanoseconds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table = DataFrame::new(vec![Series::datetime("T", vec![Some(1), None])]).unwrap();
        write_dataframe(&table, &columns_of(&table), &path).unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(
            batch.schema().field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Nanosecond, None)
        );
    }

    #[test]
    fn test_float_nan_written_as_null() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table = DataFrame::new(vec![Series::float64("F", vec![1.5, f64::NAN])]).unwrap();
        write_dataframe(&table, &columns_of(&table), &path).unwrap();

        let batch = read_batch(&path).unwrap();
        assert!(batch.column(0).is_null(1));
    }

    #[test]
    fn test_timedelta_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table =
            DataFrame::new(vec![Series::new("D", SeriesData::Timedelta(vec![Some(1)]))]).unwrap();
        let columns = vec![Column::new("D", ColumnType::Text)];
        let err = write_dataframe(&table, &columns, &path).unwrap_err();
        assert!(matches!(err, KernelError::UnsupportedDtype { .. }));
        assert!(!path.exists());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_columns_must_describe_table() {
        let dir = tempdir().unwrap();
        let table = DataFrame::new(vec![Series::int64("A", vec![1])]).unwrap();
        let columns = vec![Column::new("B", ColumnTypeKind::Number.default_type())];
        let err = write_dataframe(&table, &columns, &dir.path().join("x.arrow")).unwrap_err();
        assert!(matches!(err, KernelError::Value(_)));
    }

    #[test]
    fn test_read_shares_repeated_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table = DataFrame::new(vec![Series::text("S", [Some("x"), Some("x"), None])]).unwrap();
        let artifact = write_dataframe(&table, &columns_of(&table), &path).unwrap();

        let (read, _) = read_dataframe(&artifact).unwrap();
        let SeriesData::Object(values) = read.columns()[0].data() else {
            panic!("expected strings");
        };
        let (Some(a), Some(b)) = (&values[0], &values[1]) else {
            panic!("expected values");
        };
        assert!(Arc::ptr_eq(a, b));
        assert!(values[2].is_none());
    }

    #[test]
    fn test_read_rejects_mismatched_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.arrow");
        let table = DataFrame::new(vec![Series::int64("A", vec![1, 2])]).unwrap();
        let artifact = write_dataframe(&table, &columns_of(&table), &path).unwrap();

        let lying = ArrowTable::new(
            artifact.path().map(Path::to_path_buf),
            TableShape::new(5, columns_of(&table)).to_arrow(),
        )
        .unwrap();
        assert!(matches!(
            read_dataframe(&lying),
            Err(KernelError::Artifact { .. })
        ));
    }
}
