use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Observation, Panel, PROVINCE, REQUIRED_COLUMNS, YEAR};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the panel from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "Year": 2020, "Province": "Beijing", ... }, ...]`
/// * `.parquet` – one column per field, as written by `df.to_parquet()`
///
/// A missing file is reported as [`LoadError::NotFound`] so callers can
/// tell it apart from a file that exists but cannot be read.
pub fn load_file(path: &Path) -> Result<Panel> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()).into());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    };

    build_panel(table).with_context(|| format!("building panel from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Raw table shared by every reader
// ---------------------------------------------------------------------------

/// Header-plus-cells view of a file before it is mapped onto observations.
#[derive(Debug, Default)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Map a raw table onto [`Observation`]s.
///
/// Only the nine required columns are interpreted. Unparseable numeric cells
/// become NaN; `Year` and `Province` must be present on every row. Rows with
/// no values at all are skipped. Row numbers in errors count data rows from 1.
fn build_panel(table: RawTable) -> Result<Panel> {
    let RawTable { headers, rows } = table;
    let headers = normalize_headers(&headers);

    let mut required = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }
    let [year_idx, province_idx, capital_idx, labor_idx, energy_idx, finance_idx, carbon_idx, dea_idx, bann_idx] =
        required;

    let extra_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !required.contains(i))
        .collect();

    let null = CellValue::Null;
    let mut observations = Vec::with_capacity(rows.len());

    for (row_no, cells) in rows.iter().enumerate() {
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        let row = row_no + 1;
        let cell = |idx: usize| cells.get(idx).unwrap_or(&null);
        let number = |idx: usize| cell(idx).as_f64().unwrap_or(f64::NAN);

        let year_cell = cell(year_idx);
        let year = year_cell
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| LoadError::InvalidCell {
                row,
                column: YEAR.to_string(),
                value: year_cell.to_string(),
            })?;

        let province = match cell(province_idx) {
            CellValue::Null => {
                return Err(LoadError::InvalidCell {
                    row,
                    column: PROVINCE.to_string(),
                    value: CellValue::Null.to_string(),
                }
                .into())
            }
            CellValue::String(s) => s.clone(),
            other => other.to_string(),
        };

        let extra: BTreeMap<String, CellValue> = extra_cols
            .iter()
            .map(|&(idx, name)| (name.clone(), cell(idx).clone()))
            .collect();

        observations.push(Observation {
            province,
            year,
            capital: number(capital_idx),
            labor: number(labor_idx),
            energy: number(energy_idx),
            finance: number(finance_idx),
            carbon_emission: number(carbon_idx),
            dea_score: number(dea_idx),
            bann_score: number(bann_idx),
            extra,
        });
    }

    Ok(Panel::from_observations(headers, observations))
}

/// Trim header names and rename repeats `name.1`, `name.2`, ... so every
/// column has a distinct key.
fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    headers
        .iter()
        .map(|h| {
            let base = h.trim();
            let mut name = base.to_string();
            let mut n = 0;
            while seen.contains(&name) {
                n += 1;
                name = format!("{base}.{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spreadsheet reader
// ---------------------------------------------------------------------------

/// Read the first worksheet of an Excel / OpenDocument workbook.
fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => bail!("worksheet is empty"),
    };

    let rows = rows
        .map(|r| r.iter().map(workbook_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per record.
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable { headers, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Year": 2020, "Province": "Beijing", "Capital": 10.0, ... },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys over all records, in first-seen order.
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {} is not a JSON object", i + 1))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
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
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let headers: Vec<String> = builder
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
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string()))
            .unwrap_or(CellValue::Null),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64))
            .unwrap_or(CellValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64))
            .unwrap_or(CellValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row)))
            .unwrap_or(CellValue::Null),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "Year,Province,Capital,Labor,Energy,Finance,Carbon_Emission,DEA_Score,BANN_Score";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_rows_map_onto_observations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!(
                "{HEADER},Region\n\
                 2020,Beijing,10,1,2,3,5,0.8,0.7,North\n\
                 2020,Shanghai,20,1,2,3,8,0.6,0.9,East\n"
            ),
        );

        let panel = load_file(&path).unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.years, vec![2020]);
        assert_eq!(panel.provinces, vec!["Beijing", "Shanghai"]);
        assert_eq!(panel.columns.last().map(String::as_str), Some("Region"));

        let sh = &panel.observations[1];
        assert_eq!(sh.capital, 20.0);
        assert_eq!(sh.bann_score, 0.9);
        assert_eq!(sh.extra.get("Region"), Some(&CellValue::String("East".into())));
    }

    #[test]
    fn empty_numeric_cells_become_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!("{HEADER}\n2019,Hebei,,1,2,3,4,n/a,0.5\n"),
        );
        let panel = load_file(&path).unwrap();
        let o = &panel.observations[0];
        assert!(o.capital.is_nan());
        assert!(o.dea_score.is_nan());
        assert_eq!(o.bann_score, 0.5);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!("{HEADER}\n2019,Hebei,1,1,2,3,4,0.4,0.5\n,,,,,,,,\n"),
        );
        assert_eq!(load_file(&path).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("data.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "Year,Province\n2020,Beijing\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::MissingColumn(c)) if c == "Capital"
        ));
    }

    #[test]
    fn non_integer_year_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!("{HEADER}\nlast year,Hebei,1,1,2,3,4,0.4,0.5\n"),
        );
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::InvalidCell { row: 1, column, .. }) if column == "Year"
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.txt", HEADER);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::UnsupportedExtension(e)) if e == "txt"
        ));
    }

    #[test]
    fn json_records_use_union_of_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
                {"Year": 2021, "Province": "Anhui", "Capital": 1.5, "Labor": 1, "Energy": 2,
                 "Finance": 3, "Carbon_Emission": 4, "DEA_Score": 0.3, "BANN_Score": 0.4},
                {"Year": 2022, "Province": "Anhui", "Capital": 2.5, "Labor": 1, "Energy": 2,
                 "Finance": 3, "Carbon_Emission": 5, "DEA_Score": 0.35, "BANN_Score": 0.45,
                 "Note": "revised"}
            ]"#,
        );
        let panel = load_file(&path).unwrap();
        assert_eq!(panel.years, vec![2021, 2022]);
        assert_eq!(panel.observations[0].extra.get("Note"), Some(&CellValue::Null));
        assert_eq!(
            panel.observations[1].extra.get("Note"),
            Some(&CellValue::String("revised".into()))
        );
    }

    #[test]
    fn parquet_columns_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");

        let mut fields = vec![
            Field::new("Year", DataType::Int64, false),
            Field::new("Province", DataType::Utf8, false),
        ];
        for name in &REQUIRED_COLUMNS[2..] {
            fields.push(Field::new(*name, DataType::Float64, true));
        }
        let schema = Arc::new(Schema::new(fields));

        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(Int64Array::from(vec![2020, 2021])),
            Arc::new(StringArray::from(vec!["Jiangsu", "Jiangsu"])),
        ];
        for _ in &REQUIRED_COLUMNS[2..] {
            columns.push(Arc::new(Float64Array::from(vec![Some(0.5), None])));
        }
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let panel = load_file(&path).unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.observations[0].dea_score, 0.5);
        assert!(panel.observations[1].carbon_emission.is_nan());
        assert_eq!(panel.provinces, vec!["Jiangsu"]);
    }

    #[test]
    fn padded_extra_headers_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!("{HEADER}, Region \n2020,Beijing,10,1,2,3,5,0.8,0.7,North\n"),
        );
        let panel = load_file(&path).unwrap();
        let last = panel.columns.last().unwrap();
        assert_eq!(last, "Region");
        assert_eq!(panel.observations[0].cell_text(last), "North");
    }

    #[test]
    fn repeated_headers_get_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            &format!("{HEADER},Region,Region\n2020,Beijing,10,1,2,3,5,0.8,0.7,North,Capital area\n"),
        );
        let panel = load_file(&path).unwrap();
        assert_eq!(&panel.columns[9..], ["Region", "Region.1"]);

        let o = &panel.observations[0];
        assert_eq!(o.cell_text("Region"), "North");
        assert_eq!(o.cell_text("Region.1"), "Capital area");
    }

    #[test]
    fn workbook_cells_map_to_values() {
        use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

        assert_eq!(workbook_cell(&Data::Float(2020.0)), CellValue::Float(2020.0));
        assert_eq!(workbook_cell(&Data::Float(2020.0)).as_i64(), Some(2020));
        assert_eq!(workbook_cell(&Data::Int(7)), CellValue::Integer(7));
        assert_eq!(workbook_cell(&Data::String(String::new())), CellValue::Null);
        assert_eq!(
            workbook_cell(&Data::String("Beijing".into())),
            CellValue::String("Beijing".into())
        );
        assert_eq!(workbook_cell(&Data::Empty), CellValue::Null);
        assert_eq!(workbook_cell(&Data::Error(CellErrorType::Div0)), CellValue::Null);

        let dt = ExcelDateTime::new(43831.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(workbook_cell(&Data::DateTime(dt)), CellValue::Float(43831.0));
        assert_eq!(
            workbook_cell(&Data::DateTimeIso("2020-01-01".into())),
            CellValue::Date("2020-01-01".into())
        );
    }

    #[test]
    fn xlsx_first_sheet_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(0, 9, " Region").unwrap();

        let rows: [(f64, &str, [Option<f64>; 7], &str); 2] = [
            (2020.0, "Beijing", [Some(10.0), Some(1.0), Some(2.0), Some(3.0), Some(5.0), Some(0.8), Some(0.7)], "North"),
            (2020.0, "Shanghai", [None, Some(1.0), Some(2.0), Some(3.0), Some(8.0), Some(0.6), Some(0.9)], "East"),
        ];
        for (i, (year, province, values, region)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, *year).unwrap();
            sheet.write_string(r, 1, *province).unwrap();
            for (j, v) in values.iter().enumerate() {
                if let Some(v) = v {
                    sheet.write_number(r, j as u16 + 2, *v).unwrap();
                }
            }
            sheet.write_string(r, 9, *region).unwrap();
        }
        workbook.save(&path).unwrap();

        let panel = load_file(&path).unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.years, vec![2020]);
        assert_eq!(panel.provinces, vec!["Beijing", "Shanghai"]);

        let sh = &panel.observations[1];
        assert!(sh.capital.is_nan());
        assert_eq!(sh.bann_score, 0.9);
        assert_eq!(sh.cell_text("Region"), "East");
    }
}
