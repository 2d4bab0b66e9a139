use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::model::Dataset;
use crate::config::{FieldNames, Settings};

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateSpan {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub records: usize,
    pub vessel_counts: BTreeMap<String, usize>,
    pub component_counts: BTreeMap<String, usize>,
    pub measurement_point_counts: BTreeMap<String, usize>,
    pub date_range: Option<DateSpan>,
    pub numeric_stats: BTreeMap<String, NumericStats>,
}

/// Counts, timestamp span and per-column numeric statistics.
///
/// A column is numeric when every non-null value it holds is an integer or
/// a float. NaN values are ignored when computing its statistics.
pub fn summarize(dataset: &Dataset, settings: &Settings) -> SummaryStats {
    let names = &settings.fields;
    let mut stats = SummaryStats {
        records: dataset.len(),
        ..SummaryStats::default()
    };

    for rec in &dataset.records {
        *stats.vessel_counts.entry(rec.category.clone()).or_default() += 1;
        for (column, counts) in [
            (&names.component, &mut stats.component_counts),
            (&names.measurement_point, &mut stats.measurement_point_counts),
        ] {
            if let Some(v) = rec.get(column).filter(|v| !v.is_empty()) {
                *counts.entry(v.to_string()).or_default() += 1;
            }
        }
    }

    let mut stamps = dataset.records.iter().filter_map(|r| r.timestamp);
    if let Some(first) = stamps.next() {
        let (min, max) = stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        stats.date_range = Some(DateSpan { min, max });
    }

    for column in &dataset.columns {
        if settings.stats_exclude.contains(column) || is_reserved(column, names) {
            continue;
        }
        let values: Vec<_> = dataset
            .records
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| !v.is_null())
            .collect();
        if values.is_empty() || !values.iter().all(|v| v.is_numeric()) {
            continue;
        }
        let mut numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
        if let Some(s) = numeric_stats(&mut numbers) {
            stats.numeric_stats.insert(column.clone(), s);
        }
    }

    stats
}

fn is_reserved(column: &str, names: &FieldNames) -> bool {
    column == names.date || column == names.time || column == names.timestamp
}

fn numeric_stats(values: &mut [f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    };
    Some(NumericStats {
        min: values[0],
        max: values[n - 1],
        mean,
        median,
    })
}

// ---------------------------------------------------------------------------
// Column categories
// ---------------------------------------------------------------------------

/// Columns grouped by what they measure, for the measurement picker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnGroups {
    pub metadata: Vec<String>,
    pub vibration: Vec<String>,
    pub bearing: Vec<String>,
    pub shaft: Vec<String>,
    pub other: Vec<String>,
}

const METADATA_COLUMNS: &[&str] = &["MP_NUMBER", "MP_NAME", "COMP_NUMBER", "COMP_NAME"];
const VIBRATION_MARKERS: &[&str] = &["Vib", "Vel", "Acc", "Disp"];
const BEARING_MARKERS: &[&str] = &["Bearing", "Cuscinetto"];
const SHAFT_MARKERS: &[&str] = &["Shaft"];

/// Sort columns into metadata / vibration / bearing / shaft / other.
///
/// Markers match case-insensitively; a column lands in the first group
/// whose marker it contains.
pub fn categorize_columns(columns: &[String], names: &FieldNames) -> ColumnGroups {
    let mut groups = ColumnGroups::default();
    let contains_any = |col: &str, markers: &[&str]| {
        let col = col.to_ascii_lowercase();
        markers
            .iter()
            .any(|m| col.contains(&m.to_ascii_lowercase()))
    };

    for col in columns {
        let is_metadata = METADATA_COLUMNS.contains(&col.as_str())
            || *col == names.category
            || *col == names.component
            || *col == names.measurement_point
            || is_reserved(col, names);
        let group = if is_metadata {
            &mut groups.metadata
        } else if contains_any(col, VIBRATION_MARKERS) {
            &mut groups.vibration
        } else if contains_any(col, BEARING_MARKERS) {
            &mut groups.bearing
        } else if contains_any(col, SHAFT_MARKERS) {
            &mut groups.shaft
        } else {
            &mut groups.other
        };
        group.push(col.clone());
    }
    groups
}
