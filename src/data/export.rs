use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value as JsonValue};

use super::model::{CellValue, Dataset, Record};
use super::timestamp::{date_component, time_component};
use crate::config::FieldNames;
use crate::error::ExportError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Serialize `dataset` in the requested format.
pub fn export_bytes(
    dataset: &Dataset,
    names: &FieldNames,
    format: ExportFormat,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(dataset, names),
        ExportFormat::Xlsx => to_xlsx(dataset, names),
        ExportFormat::Json => to_json(dataset, names),
    }
}

/// Write an export next to `path`, appending the format's extension when
/// it is missing. Returns the path actually written.
pub fn write_export(
    dataset: &Dataset,
    names: &FieldNames,
    format: ExportFormat,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    let path = with_extension(path, format);
    let bytes = export_bytes(dataset, names, format)?;
    std::fs::write(&path, bytes).map_err(|source| ExportError::FileWrite {
        path: path.clone(),
        source,
    })?;
    log::info!("Exported {} record(s) to {}", dataset.len(), path.display());
    Ok(path)
}

fn with_extension(path: &Path, format: ExportFormat) -> PathBuf {
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()));
    if has_ext {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(format.extension());
        PathBuf::from(name)
    }
}

// ---------------------------------------------------------------------------
// Cell rendering
// ---------------------------------------------------------------------------

/// Output columns: extra fields in dataset order, then category, then the
/// derived timestamp.
fn export_columns(dataset: &Dataset, names: &FieldNames) -> Vec<String> {
    let mut columns: Vec<String> = dataset
        .columns
        .iter()
        .filter(|c| **c != names.category && **c != names.timestamp)
        .cloned()
        .collect();
    columns.push(names.category.clone());
    columns.push(names.timestamp.clone());
    columns
}

/// The value written for one cell. Dates become ISO calendar dates, times
/// `HH:MM:SS` and date-times ISO timestamps; NaN becomes empty.
fn export_value(record: &Record, column: &str, names: &FieldNames) -> CellValue {
    let value = record.value(column, names);
    if column == names.date {
        if let Some(day) = date_component(&value) {
            return CellValue::String(day.format("%Y-%m-%d").to_string());
        }
    }
    if column == names.time {
        if let Some(time) = time_component(&value) {
            return CellValue::String(time);
        }
    }
    match value {
        CellValue::DateTime(dt) => CellValue::String(dt.format(TIMESTAMP_FORMAT).to_string()),
        CellValue::Float(f) if f.is_nan() => CellValue::Null,
        other => other,
    }
}

fn export_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn to_csv(dataset: &Dataset, names: &FieldNames) -> Result<Vec<u8>, ExportError> {
    let columns = export_columns(dataset, names);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for rec in &dataset.records {
        writer.write_record(
            columns
                .iter()
                .map(|c| export_text(&export_value(rec, c, names))),
        )?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn to_xlsx(dataset: &Dataset, names: &FieldNames) -> Result<Vec<u8>, ExportError> {
    let columns = export_columns(dataset, names);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (row, rec) in dataset.records.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, name) in columns.iter().enumerate() {
            let col = col as u16;
            match export_value(rec, name, names) {
                CellValue::Null => {}
                CellValue::Float(f) => {
                    sheet.write_number(row, col, f)?;
                }
                CellValue::Integer(i) => {
                    sheet.write_number(row, col, i as f64)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(row, col, b)?;
                }
                other => {
                    sheet.write_string(row, col, export_text(&other))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn to_json(dataset: &Dataset, names: &FieldNames) -> Result<Vec<u8>, ExportError> {
    let columns = export_columns(dataset, names);
    let rows: Vec<JsonValue> = dataset
        .records
        .iter()
        .map(|rec| {
            let obj: Map<String, JsonValue> = columns
                .iter()
                .map(|c| (c.clone(), cell_to_json(export_value(rec, c, names))))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&rows)?)
}

fn cell_to_json(value: CellValue) -> JsonValue {
    match value {
        CellValue::String(s) => JsonValue::String(s),
        CellValue::Integer(i) => JsonValue::from(i),
        CellValue::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        CellValue::Bool(b) => JsonValue::Bool(b),
        CellValue::DateTime(dt) => JsonValue::String(dt.format(TIMESTAMP_FORMAT).to_string()),
        CellValue::Null => JsonValue::Null,
    }
}
