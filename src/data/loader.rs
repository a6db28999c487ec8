use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt8Type,
};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, IncidentTable, RawTable};
use super::normalize::{build_table, Normalizer};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load, clean and normalize the incident table.
///
/// Missing file → [`DataError::Unavailable`]; anything else that prevents
/// reading the expected shape → [`DataError::Malformed`]. Bad individual
/// rows never fail the load.
pub fn load_incidents(
    path: &Path,
    sheet: &str,
    normalizer: &Normalizer,
) -> Result<IncidentTable, DataError> {
    let raw = load_raw(path, sheet)?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        raw.len(),
        raw.columns.len(),
        path.display()
    );
    build_table(&raw, normalizer).map_err(|e| DataError::malformed(path, format!("{e:#}")))
}

/// Read a file into an untyped table. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – worksheet `sheet`
/// * `.csv`     – header row, cells kept as text
/// * `.json`    – `[{ "Country": "...", "LAT_1": ..., ... }, ...]`
/// * `.parquet` – scalar columns
pub fn load_raw(path: &Path, sheet: &str) -> Result<RawTable, DataError> {
    if !path.exists() {
        return Err(DataError::Unavailable {
            path: path.to_path_buf(),
        });
    }
    read_raw(path, sheet).map_err(|e| DataError::malformed(path, format!("{e:#}")))
}

fn read_raw(path: &Path, sheet: &str) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

/// First row of the sheet is the header; date-formatted cells arrive as
/// date-times.
fn load_workbook(path: &Path, sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        bail!(
            "sheet '{sheet}' not found (available: {})",
            names.join(", ")
        );
    }
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        bail!("sheet '{sheet}' is empty");
    };
    let columns: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let rows = rows
        .map(|row| row.iter().map(excel_cell).collect())
        .collect();

    Ok(RawTable { columns, rows })
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records',
/// date_format='iso')`):
///
/// ```json
/// [
///   { "Country": "Indonesia", "inc_date": "2021-03-04", "LAT_1": -6.2, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one incident per line. Short
/// lines are tolerated; their missing cells read as null. Cells stay text so
/// free-text columns keep their exact spelling; numeric columns are parsed
/// later.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(RawTable { columns, rows })
}

fn csv_cell(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns (strings, integers, floats, bools,
/// dates and timestamps). Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { columns, rows })
}

/// Extract a single cell from an Arrow column at a given row. Unsupported
/// types read as null.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let int = |v: i64| CellValue::Integer(v);
    let datetime = |v: Option<chrono::NaiveDateTime>| v.map(CellValue::DateTime).unwrap_or(CellValue::Null);

    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => int(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => int(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => int(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => int(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => int(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => int(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => int(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => datetime(col.as_primitive::<Date32Type>().value_as_datetime(row)),
        DataType::Date64 => datetime(col.as_primitive::<Date64Type>().value_as_datetime(row)),
        DataType::Timestamp(unit, _) => datetime(match unit {
            TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
            TimeUnit::Millisecond => col
                .as_primitive::<TimestampMillisecondType>()
                .value_as_datetime(row),
            TimeUnit::Microsecond => col
                .as_primitive::<TimestampMicrosecondType>()
                .value_as_datetime(row),
            TimeUnit::Nanosecond => col
                .as_primitive::<TimestampNanosecondType>()
                .value_as_datetime(row),
        }),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; reading as null");
            CellValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;

    use crate::config::NormalizationRules;

    fn norm() -> Normalizer {
        Normalizer::new(&NormalizationRules::default()).unwrap()
    }

    const CSV: &str = "\
inc_date,pollution_qty,LAT_1,LONG,Country,pollution_type,material,aware_ans,Note_Officer
2021-01-04,10,-6.1,106.8,Indonesia,oil spill,crude,Yes,checked
not a date,abc,-7.0,110.2,Indonesia,Oil Spills,,No,
2021-02-11,3.5,,120.0,Philippines,plastic waste,bottles,,
2021-02-12,1,14.6,121.0,Philippines,-,nets
";

    #[test]
    fn csv_loads_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.csv");
        std::fs::write(&path, CSV).unwrap();

        let table = load_incidents(&path, "ignored", &norm()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.has_awareness());

        let types: Vec<&str> = table
            .records()
            .iter()
            .map(|r| r.pollution_type.as_str())
            .collect();
        assert_eq!(types, ["Tumpahan Minyak", "Tumpahan Minyak", "Unknown"]);

        let second = &table.records()[1];
        assert_eq!(second.incident_date, None);
        assert_eq!(second.pollution_quantity, None);
        assert_eq!(second.material, None);

        // Short last line: aware_ans and the note column read as null.
        assert_eq!(table.records()[2].aware_ans, None);
        assert!(table.records().iter().all(|r| r.extra.is_empty()));
    }

    #[test]
    fn csv_free_text_keeps_its_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.csv");
        std::fs::write(
            &path,
            "inc_date,pollution_qty,LAT_1,LONG,Country,pollution_type,material,aware_ans\n\
             2021-01-04,10,-6.1,106.8,Indonesia,oil spill,007,Yes\n\
             2021-01-05, 2.50 ,-6.2,106.9,1e3,1e3,1.50,0042\n",
        )
        .unwrap();

        let table = load_incidents(&path, "ignored", &norm()).unwrap();
        let materials: Vec<_> = table.records().iter().map(|r| r.material.clone()).collect();
        assert_eq!(materials, [Some("007".to_string()), Some("1.50".to_string())]);

        let second = &table.records()[1];
        assert_eq!(second.country.as_deref(), Some("1e3"));
        assert_eq!(second.aware_ans.as_deref(), Some("0042"));
        assert_eq!(second.pollution_type, "1E3");
        // Numeric columns still parse from the text.
        assert_eq!(second.pollution_quantity, Some(2.5));
        assert_eq!(second.latitude, -6.2);
    }

    fn write_workbook(path: &Path) {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.set_name("Incidents").unwrap();

        let header = [
            "inc_date",
            "pollution_qty",
            "LAT_1",
            "LONG",
            "Country",
            "pollution_type",
            "material",
            "Note_Checked",
        ];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }

        let day = ExcelDateTime::from_ymd(2021, 3, 4).unwrap();
        sheet.write_datetime_with_format(1, 0, &day, &date_format).unwrap();
        sheet.write_number(1, 1, 12.0).unwrap();
        sheet.write_number(1, 2, -6.1).unwrap();
        sheet.write_number(1, 3, 106.8).unwrap();
        sheet.write_string(1, 4, "Indonesia").unwrap();
        sheet.write_string(1, 5, "oil spill").unwrap();
        sheet.write_string(1, 6, "007").unwrap();
        sheet.write_string(1, 7, "seen by ranger").unwrap();

        sheet.write_string(2, 0, "not a date").unwrap();
        sheet.write_string(2, 1, "lots").unwrap();
        sheet.write_number(2, 2, 13.7).unwrap();
        sheet.write_number(2, 3, 100.5).unwrap();
        sheet.write_string(2, 4, "Thailand").unwrap();
        sheet.write_string(2, 5, "").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn workbook_sheet_loads_with_date_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.xlsx");
        write_workbook(&path);

        let table = load_incidents(&path, "Incidents", &norm()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.records()[0];
        assert_eq!(first.incident_day(), NaiveDate::from_ymd_opt(2021, 3, 4));
        assert_eq!(first.pollution_quantity, Some(12.0));
        assert_eq!(first.pollution_type, "Tumpahan Minyak");
        assert_eq!(first.material.as_deref(), Some("007"));
        assert!(first.extra.is_empty());

        let second = &table.records()[1];
        assert_eq!(second.incident_date, None);
        assert_eq!(second.pollution_quantity, None);
        assert_eq!(second.pollution_type, "Unknown");
        assert_eq!(second.material, None);
        assert!(!table.has_awareness());
    }

    #[test]
    fn workbook_without_the_sheet_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.xlsx");
        write_workbook(&path);

        match load_incidents(&path, "Sheet9", &norm()) {
            Err(DataError::Malformed { reason, .. }) => {
                assert!(reason.contains("'Sheet9' not found"), "{reason}");
                assert!(reason.contains("Incidents"), "{reason}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn json_records_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.json");
        std::fs::write(
            &path,
            r#"[
                {"inc_date": "2021-06-01", "pollution_qty": 2, "LAT_1": 1.5, "LONG": 103.8,
                 "Country": "Singapore", "pollution_type": "Ghost nets", "material": "nylon"},
                {"inc_date": null, "pollution_qty": null, "LAT_1": null, "LONG": 103.8,
                 "Country": "Singapore", "pollution_type": "", "material": "nylon"}
            ]"#,
        )
        .unwrap();

        let table = load_incidents(&path, "ignored", &norm()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.has_awareness());
        assert_eq!(table.records()[0].pollution_type, "Ghost Nets");
        assert_eq!(table.records()[0].pollution_quantity, Some(2.0));
    }

    #[test]
    fn parquet_scalar_columns_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("inc_date", DataType::Date32, true),
            Field::new("pollution_qty", DataType::Float64, true),
            Field::new("LAT_1", DataType::Float64, true),
            Field::new("LONG", DataType::Float64, true),
            Field::new("Country", DataType::Utf8, true),
            Field::new("material", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![Some(18628), None])),
                Arc::new(Float64Array::from(vec![Some(1.0), None])),
                Arc::new(Float64Array::from(vec![Some(5.0), Some(6.0)])),
                Arc::new(Float64Array::from(vec![Some(100.0), Some(101.0)])),
                Arc::new(StringArray::from(vec![Some("Thailand"), None])),
                Arc::new(StringArray::from(vec![Some("oil"), Some("tar")])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_incidents(&path, "ignored", &norm()).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.incident_day(), NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(first.pollution_type, "Unknown (missing column)");
        assert_eq!(table.records()[1].country, None);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_incidents(&dir.path().join("absent.xlsx"), "Sheet1", &norm()).unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
    }

    #[test]
    fn corrupt_workbook_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        let err = load_incidents(&path, "Sheet1", &norm()).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn unsupported_extension_and_missing_columns_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("incidents.txt");
        std::fs::write(&txt, "whatever").unwrap();
        assert!(matches!(
            load_incidents(&txt, "", &norm()),
            Err(DataError::Malformed { .. })
        ));

        let csv = dir.path().join("thin.csv");
        std::fs::write(&csv, "Country,LAT_1\nFiji,1.0\n").unwrap();
        match load_incidents(&csv, "", &norm()) {
            Err(DataError::Malformed { reason, .. }) => assert!(reason.contains("inc_date")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
