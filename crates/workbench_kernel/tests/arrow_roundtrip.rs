//! Arrow Artifact Round-Trip Tests
//!
//! `ProcessResult::to_arrow` followed by `ProcessResult::from_arrow` must
//! give back the same table (compared as strings), the same columns
//! (formats included) and the same errors.

use half::f16;
use serde_json::{json, Map};
use std::sync::Arc;
use tempfile::TempDir;
use workbench_kernel::*;
use workbench_protocol::config::KernelConfig;
use workbench_protocol::{I18nMessage, QuickFixAction};

fn roundtrip(result: &ProcessResult) -> (TempDir, workbench_protocol::RenderResult, ProcessResult) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.arrow");
    let render = result.to_arrow(&path).unwrap();
    let back = ProcessResult::from_arrow(&render).unwrap();
    (dir, render, back)
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_every_supported_dtype() {
    let table = DataFrame::new(vec![
        Series::new("i8", SeriesData::Int8(vec![-1, 2])),
        Series::new("u16", SeriesData::UInt16(vec![0, 65535])),
        Series::new("u64", SeriesData::UInt64(vec![u64::MAX, 1])),
        Series::new("f16", SeriesData::Float16(vec![f16::from_f32(1.5), f16::NAN])),
        Series::new("f32", SeriesData::Float32(vec![0.25, f32::NAN])),
        Series::float64("f64", vec![f64::NAN, 3.0]),
        Series::datetime("t", vec![Some(1_500_000_000_000_000_000), None]),
        Series::text("s", [Some("a"), None]),
        Series::categorical("c", [None, Some("z")]),
    ])
    .unwrap();
    let result = ProcessResult::new(table.clone(), vec![], Map::new(), vec![]).unwrap();

    let (_dir, render, back) = roundtrip(&result);
    assert_eq!(render.table.n_rows(), 2);
    assert_eq!(render.table.columns().len(), 9);
    let dtypes = |t: &DataFrame| t.columns().iter().map(Series::dtype).collect::<Vec<_>>();
    assert_eq!(dtypes(back.dataframe()), dtypes(&table));
    // NaN != NaN, so compare as strings
    assert!(back.fuzzy_eq(&result));
}

#[test]
fn test_formats_survive_exactly() {
    let table = DataFrame::new(vec![
        Series::float64("price", vec![1.5, 2.25]),
        Series::int64("count", vec![1, 2]),
    ])
    .unwrap();
    let columns = vec![
        Column::new("price", ColumnType::number("${:,.2f}").unwrap()),
        Column::new("count", ColumnType::number("{:d} items").unwrap()),
    ];
    let result = ProcessResult::new(table, vec![], Map::new(), columns.clone()).unwrap();

    let (_dir, _render, back) = roundtrip(&result);
    assert_eq!(back.columns(), columns.as_slice());
}

#[test]
fn test_categorical_missing_values_stay_in_place() {
    let table = DataFrame::new(vec![Series::categorical(
        "A",
        [Some("b"), None, Some("a"), None, Some("b")],
    )])
    .unwrap();
    let result = ProcessResult::new(table, vec![], Map::new(), vec![]).unwrap();

    let (_dir, _render, back) = roundtrip(&result);
    let SeriesData::Category(categorical) = back.dataframe().columns()[0].data() else {
        panic!("expected a categorical column");
    };
    let values: Vec<Option<&str>> = (0..categorical.len())
        .map(|row| categorical.get(row).map(|v| v.as_ref()))
        .collect();
    assert_eq!(values, vec![Some("b"), None, Some("a"), None, Some("b")]);
}

#[test]
fn test_integer_column_with_nulls_reads_as_float() {
    // Arrow integer columns may hold nulls; in-memory integers may not.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nulls.arrow");
    {
        use arrow::array::{ArrayRef, Int32Array};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::ipc::writer::FileWriter;
        use arrow::record_batch::RecordBatch;

        let schema = Arc::new(Schema::new(vec![Field::new("A", DataType::Int32, true)]));
        let array: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None]));
        let batch = RecordBatch::try_new(schema.clone(), vec![array]).unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = FileWriter::try_new(file, &schema).unwrap();
        writer.write(&batch).unwrap();
        writer.finish().unwrap();
    }
    let artifact = workbench_protocol::ArrowTable::new(
        Some(path),
        TableShape::new(2, vec![Column::new("A", ColumnType::number("{:d}").unwrap())]).to_arrow(),
    )
    .unwrap();

    let (table, columns) = read_dataframe(&artifact).unwrap();
    let SeriesData::Float64(values) = table.columns()[0].data() else {
        panic!("expected float64");
    };
    assert_eq!(values[0], 1.0);
    assert!(values[1].is_nan());
    assert_eq!(columns[0].column_type().format(), Some("{:d}"));
}

#[test]
fn test_zero_rows_is_not_zero_columns() {
    let table = DataFrame::new(vec![Series::text("A", [])]).unwrap();
    let result = ProcessResult::new(table, vec![], Map::new(), vec![]).unwrap();
    let (_dir, render, back) = roundtrip(&result);
    assert!(render.table.path().is_some());
    assert_eq!(back.status(), StepStatus::Ok);
    assert_eq!(back.dataframe().len(), 0);
}

// ============================================================================
// Errors and JSON
// ============================================================================

#[test]
fn test_error_result_writes_no_file() {
    let mut params = Map::new();
    params.insert("colnames".to_string(), json!(["A"]));
    let error = ProcessResultError::new(
        I18nMessage::bare("my.error").with_arg("n", 3),
        vec![QuickFix::prepend_module(
            I18nMessage::bare("my.fix"),
            "converttotext",
            params,
        )],
    );
    let mut aux = Map::new();
    aux.insert("chart".to_string(), json!({"x": [1, 2]}));
    let result = ProcessResult::new(DataFrame::empty(), vec![error], aux, vec![]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.arrow");
    let render = result.to_arrow(&path).unwrap();
    assert!(render.table.path().is_none());
    assert!(!path.exists());
    assert_eq!(render.errors[0].message.id, "my.error");
    let QuickFixAction::PrependStep { module_slug, .. } = &render.errors[0].quick_fixes[0].action;
    assert_eq!(module_slug, "converttotext");

    let back = ProcessResult::from_arrow(&render).unwrap();
    assert_eq!(back, result);
    assert_eq!(back.status(), StepStatus::Error);
}

#[test]
fn test_quick_fix_without_wire_form_fails_before_writing() {
    let error = ProcessResultError::new(
        I18nMessage::todo_i18n("x"),
        vec![QuickFix::new(I18nMessage::todo_i18n("y"), "selectTab", vec![])],
    );
    let table = DataFrame::new(vec![Series::int64("A", vec![1])]).unwrap();
    let result = ProcessResult::new(table, vec![error], Map::new(), vec![]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.arrow");
    assert!(matches!(result.to_arrow(&path), Err(KernelError::Value(_))));
    assert!(!path.exists());
}

#[test]
fn test_truncated_result_roundtrips() {
    let table = DataFrame::new(vec![Series::int64("A", (0..10).collect())]).unwrap();
    let config = KernelConfig::from_json_str(r#"{"max_rows_per_table": 3}"#).unwrap();
    let mut result = ProcessResult::coerce(table.into(), &[]).unwrap();
    result.truncate_in_place_if_too_big(config.max_rows_per_table);

    let (_dir, render, back) = roundtrip(&result);
    assert_eq!(render.table.n_rows(), 3);
    assert_eq!(back.errors().len(), 1);
    assert_eq!(back.error(), "Truncated output from 10 rows to 3");
}

#[test]
fn test_configured_locale_renders_errors() {
    let config = KernelConfig::from_json_str(r#"{"default_locale": "fr"}"#).unwrap();
    let table = DataFrame::new(vec![Series::int64("A", (0..4).collect())]).unwrap();
    let mut result = ProcessResult::coerce(table.into(), &[]).unwrap();
    result.truncate_in_place_if_too_big(config.max_rows_per_table.min(2));

    // Only "en" has a catalog; other locales fall back to it.
    assert_eq!(
        result.error_in(&config.default_locale),
        "Truncated output from 4 rows to 2"
    );
    assert_eq!(ProcessResult::default().error_in(&config.default_locale), "");
}
