use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Record};
use super::pipeline::process;
use super::timestamp::serial_to_datetime;
use crate::config::{FieldNames, Settings};
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Category label for a file: its base name up to `delimiter`
/// (`"Aurora CBM 2024.xlsx"` → `"Aurora"`), or the stem when the delimiter
/// does not occur.
pub fn category_from_filename(filename: &str, delimiter: &str) -> String {
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if !delimiter.is_empty() {
        if let Some(idx) = base.find(delimiter) {
            return base[..idx].to_string();
        }
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
        .to_string()
}

/// Read, ingest and clean one file from disk.
pub fn load_file(path: &Path, settings: &Settings) -> Result<Dataset, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path.to_string_lossy();
    let label = category_from_filename(&filename, &settings.category_delimiter);

    let raw = ingest_bytes(&bytes, &filename, &label, &settings.fields)?;
    let dataset = process(raw, &settings.fields);
    log::info!(
        "Loaded {} row(s) for '{label}' from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse uploaded file content into raw (unprocessed) records. Dispatch by
/// the extension of `filename`.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first sheet, header row first
/// * `.csv`  – header row first
/// * `.json` – `[{ "DATE": ..., "TIME": ..., ... }, ...]`
pub fn ingest_bytes(
    bytes: &[u8],
    filename: &str,
    label: &str,
    names: &FieldNames,
) -> Result<Dataset, IngestError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(bytes)?,
        "csv" => read_csv(bytes)?,
        "json" => read_json(bytes)?,
        other => return Err(IngestError::UnsupportedFormat(other.to_string())),
    };
    Ok(table.into_dataset(label, names))
}

// ---------------------------------------------------------------------------
// Intermediate table
// ---------------------------------------------------------------------------

/// Header plus rows, before category labels are attached.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<BTreeMap<String, CellValue>>,
}

impl RawTable {
    fn into_dataset(self, label: &str, names: &FieldNames) -> Dataset {
        let records = self
            .rows
            .into_iter()
            .map(|mut fields| {
                // A re-imported export carries its own category column.
                let category = match fields.remove(&names.category) {
                    Some(CellValue::String(s)) if !s.trim().is_empty() => s,
                    Some(v) if !v.is_empty() => v.to_string(),
                    _ => label.to_string(),
                };
                Record {
                    category,
                    timestamp: None,
                    fields,
                }
            })
            .collect();

        let columns = self
            .headers
            .into_iter()
            .filter(|h| *h != names.category)
            .collect();
        Dataset::new(columns, records)
    }
}

/// Unique, non-empty header names.
fn header_names<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for (idx, name) in raw.into_iter().enumerate() {
        let name = name.trim().to_string();
        let mut name = if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };
        if seen.contains(&name) {
            let base = name;
            name = (1..)
                .map(|n| format!("{base}.{n}"))
                .find(|candidate| !seen.contains(candidate))
                .unwrap_or_default();
        }
        seen.push(name);
    }
    seen
}

// ---------------------------------------------------------------------------
// Workbook reader
// ---------------------------------------------------------------------------

fn read_workbook(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoSheets)??;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(RawTable {
            headers: Vec::new(),
            rows: Vec::new(),
        });
    };
    let headers = header_names(header_row.iter().map(data_to_header));

    let mut rows = Vec::new();
    for row in rows_iter {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let fields: BTreeMap<_, _> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).map_or(CellValue::Null, data_to_cell)))
            .collect();
        rows.push(fields);
    }

    Ok(RawTable { headers, rows })
}

fn data_to_header(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => data_to_cell(other).to_string(),
    }
}

fn data_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => {
            log::debug!("cell error {e:?} read as empty");
            CellValue::Null
        }
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = header_names(reader.headers()?.iter().map(|h| h.to_string()));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let fields: BTreeMap<_, _> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), guess_cell_type(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(fields);
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
    match s {
        "true" | "TRUE" | "True" => CellValue::Bool(true),
        "false" | "FALSE" | "False" => CellValue::Bool(false),
        _ => CellValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the layout the JSON export produces.
fn read_json(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root.as_array().ok_or(IngestError::NotAnArray)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(IngestError::RowNotObject(i))?;
        let mut fields = BTreeMap::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            fields.insert(key.clone(), json_to_cell(val));
        }
        rows.push(fields);
    }

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
