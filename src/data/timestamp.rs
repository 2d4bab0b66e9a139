use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{CellValue, Dataset, Record};
use crate::config::FieldNames;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
pub const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

// ---------------------------------------------------------------------------
// Spreadsheet serial numbers
// ---------------------------------------------------------------------------

/// Convert a spreadsheet serial (days since 1899-12-30, fraction = time of
/// day) into a wall-clock date-time.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let secs = ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * SECONDS_PER_DAY).round();
    DateTime::from_timestamp(secs as i64, 0).map(|dt| dt.naive_utc())
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Calendar date carried by a date-like cell.
///
/// Numbers follow `epoch + (n - 25569) * 86400` seconds and keep the UTC
/// calendar date of that instant.
pub fn date_component(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::String(s) => parse_date_str(s),
        CellValue::Float(_) | CellValue::Integer(_) => {
            let n = value.as_f64()?;
            if !n.is_finite() {
                return None;
            }
            let secs = ((n - SPREADSHEET_EPOCH_OFFSET_DAYS) * SECONDS_PER_DAY).floor();
            DateTime::from_timestamp(secs as i64, 0).map(|dt| dt.date_naive())
        }
        CellValue::Bool(_) | CellValue::Null => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime_str(s).map(|dt| dt.date()))
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// `HH:MM:SS` text for a time-like cell.
///
/// Fractional days are split with `floor(v*24)`, `floor(v*1440) mod 60` and
/// `floor(v*86400) mod 60`. The result is not range checked here; an hour of
/// 24 or more is rejected when the combined timestamp is parsed.
pub fn time_component(value: &CellValue) -> Option<String> {
    match value {
        CellValue::String(s) => {
            let s = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .map(|t| t.format("%H:%M:%S").to_string())
        }
        CellValue::Float(_) | CellValue::Integer(_) => {
            let v = value.as_f64()?;
            if !v.is_finite() || v < 0.0 {
                return None;
            }
            let hours = (v * 24.0).floor() as i64;
            let minutes = (v * 24.0 * 60.0).floor() as i64 % 60;
            let seconds = (v * SECONDS_PER_DAY).floor() as i64 % 60;
            Some(format!("{hours:02}:{minutes:02}:{seconds:02}"))
        }
        CellValue::DateTime(dt) => Some(dt.time().format("%H:%M:%S").to_string()),
        CellValue::Bool(_) | CellValue::Null => None,
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Derive a record's timestamp from its date and time fields. Both must be
/// present and parse; nothing else is consulted.
pub fn derive_timestamp(record: &Record, names: &FieldNames) -> Option<NaiveDateTime> {
    let date = date_component(record.get(&names.date)?)?;
    let time = time_component(record.get(&names.time)?)?;
    let combined = format!("{}T{}", date.format("%Y-%m-%d"), time);
    NaiveDateTime::parse_from_str(&combined, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Return a copy of `dataset` with a timestamp on every record that can
/// derive one. Records that cannot are left as they are.
///
/// A derived timestamp takes the place of a source column of the same name
/// (a previous export). Records without one keep a non-empty value there.
pub fn synthesize(dataset: &Dataset, names: &FieldNames) -> Dataset {
    let mut skipped = 0usize;
    let records = dataset
        .records
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            match derive_timestamp(rec, names) {
                Some(ts) => {
                    out.timestamp = Some(ts);
                    out.fields.remove(&names.timestamp);
                }
                None => {
                    skipped += 1;
                    if out.fields.get(&names.timestamp).is_some_and(CellValue::is_empty) {
                        out.fields.remove(&names.timestamp);
                    }
                }
            }
            out
        })
        .collect::<Vec<Record>>();

    if skipped > 0 {
        log::debug!(
            "{skipped} of {} record(s) have no usable {}/{}",
            dataset.len(),
            names.date,
            names.time
        );
    }

    let source_stamps_left = records.iter().any(|r| r.fields.contains_key(&names.timestamp));
    let columns = dataset
        .columns
        .iter()
        .filter(|c| **c != names.timestamp || source_stamps_left)
        .cloned()
        .collect();
    Dataset::new(columns, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> FieldNames {
        FieldNames::default()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn record(date: CellValue, time: CellValue) -> Record {
        Record::new("v").with("DATE", date).with("TIME", time)
    }

    #[test]
    fn string_date_and_fractional_time() {
        let rec = record(CellValue::String("2024-03-15".into()), CellValue::Float(0.5));
        assert_eq!(derive_timestamp(&rec, &names()), Some(ts(2024, 3, 15, 12, 0, 0)));
    }

    #[test]
    fn serial_date_and_string_time() {
        let rec = record(CellValue::Float(45000.0), CellValue::String("08:15:30".into()));
        // 45000 - 25569 = 19431 days after 1970-01-01
        assert_eq!(derive_timestamp(&rec, &names()), Some(ts(2023, 3, 15, 8, 15, 30)));

        let rec = record(CellValue::Integer(45000), CellValue::String("08:15:30".into()));
        assert_eq!(derive_timestamp(&rec, &names()), Some(ts(2023, 3, 15, 8, 15, 30)));
    }

    #[test]
    fn native_date_keeps_only_its_calendar_day() {
        let rec = record(
            CellValue::DateTime(ts(2024, 1, 2, 23, 59, 0)),
            CellValue::String("06:00:00".into()),
        );
        assert_eq!(derive_timestamp(&rec, &names()), Some(ts(2024, 1, 2, 6, 0, 0)));
    }

    #[test]
    fn fractional_time_components_are_floored() {
        assert_eq!(time_component(&CellValue::Float(0.0)), Some("00:00:00".into()));
        assert_eq!(time_component(&CellValue::Float(0.75)), Some("18:00:00".into()));
        assert_eq!(time_component(&CellValue::Float(0.25)), Some("06:00:00".into()));
        assert_eq!(time_component(&CellValue::Float(f64::NAN)), None);
    }

    #[test]
    fn short_time_strings_are_padded() {
        assert_eq!(time_component(&CellValue::String("8:05".into())), Some("08:05:00".into()));
        assert_eq!(time_component(&CellValue::String("noon".into())), None);
    }

    #[test]
    fn date_string_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        for s in ["2024-03-15", "2024/03/15", "15.03.2024", "2024-03-15T10:00:00", "2024-03-15 10:00"] {
            assert_eq!(date_component(&CellValue::String(s.into())), Some(d), "{s}");
        }
        assert_eq!(date_component(&CellValue::String("yesterday".into())), None);
        assert_eq!(date_component(&CellValue::Null), None);
    }

    #[test]
    fn unparseable_or_missing_fields_skip_the_record() {
        let bad_date = record(CellValue::String("not a date".into()), CellValue::Float(0.5));
        assert_eq!(derive_timestamp(&bad_date, &names()), None);

        let over_a_day = record(CellValue::String("2024-03-15".into()), CellValue::Float(1.5));
        assert_eq!(derive_timestamp(&over_a_day, &names()), None);

        let no_time = Record::new("v").with("DATE", CellValue::String("2024-03-15".into()));
        assert_eq!(derive_timestamp(&no_time, &names()), None);
    }

    #[test]
    fn timestamp_column_alone_derives_nothing() {
        let rec = Record::new("v").with("TIMESTAMP", CellValue::String("2024-03-15T07:30:00".into()));
        assert_eq!(derive_timestamp(&rec, &names()), None);

        let ds = Dataset::new(
            vec!["TIMESTAMP".into(), "V".into()],
            vec![rec.with("V", CellValue::Integer(1))],
        );
        let out = synthesize(&ds, &names());
        assert_eq!(out.records[0].timestamp, None);
        assert_eq!(out.columns, vec!["TIMESTAMP", "V"]);
        assert_eq!(
            out.records[0].get("TIMESTAMP"),
            Some(&CellValue::String("2024-03-15T07:30:00".into()))
        );

        // An export row that had no timestamp leaves nothing behind.
        let blank = Dataset::new(
            vec!["TIMESTAMP".into(), "V".into()],
            vec![Record::new("v")
                .with("TIMESTAMP", CellValue::Null)
                .with("V", CellValue::Integer(1))],
        );
        let out = synthesize(&blank, &names());
        assert_eq!(out.columns, vec!["V"]);
        assert!(out.records[0].get("TIMESTAMP").is_none());
    }

    #[test]
    fn synthesize_touches_only_the_timestamp() {
        let ds = Dataset::new(
            vec!["DATE".into(), "TIME".into(), "TIMESTAMP".into(), "X".into()],
            vec![
                record(CellValue::String("2024-03-15".into()), CellValue::Float(0.5))
                    .with("X", CellValue::Integer(7))
                    .with("TIMESTAMP", CellValue::String("stale".into())),
                record(CellValue::String("garbage".into()), CellValue::Float(0.5)),
            ],
        );
        let out = synthesize(&ds, &names());
        assert_eq!(out.columns, vec!["DATE", "TIME", "X"]);
        assert_eq!(out.records[0].timestamp, Some(ts(2024, 3, 15, 12, 0, 0)));
        assert_eq!(out.records[0].get("X"), Some(&CellValue::Integer(7)));
        assert!(out.records[0].get("TIMESTAMP").is_none());
        assert_eq!(out.records[1].timestamp, None);
        assert_eq!(
            out.records[1].get("DATE"),
            Some(&CellValue::String("garbage".into()))
        );
    }

    #[test]
    fn serial_numbers_map_to_wall_clock() {
        assert_eq!(serial_to_datetime(45000.0), Some(ts(2023, 3, 15, 0, 0, 0)));
        assert_eq!(serial_to_datetime(45000.25), Some(ts(2023, 3, 15, 6, 0, 0)));
        assert_eq!(serial_to_datetime(0.5), Some(ts(1899, 12, 30, 12, 0, 0)));
    }
}
