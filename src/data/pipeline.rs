use std::cmp::Ordering;

use super::model::{Dataset, Record};
use super::normalize::normalize;
use super::timestamp::synthesize;
use crate::config::FieldNames;

/// Run a freshly ingested dataset through the cleaning stages:
/// drop empty columns, derive timestamps, then sort chronologically.
///
/// The sort is stable and puts records without a timestamp after every
/// timestamped one. It only runs when some record has a timestamp.
pub fn process(raw: Dataset, names: &FieldNames) -> Dataset {
    let rows_in = raw.len();
    let cols_in = raw.columns.len();

    let normalized = normalize(&raw);
    let mut dataset = synthesize(&normalized, names);

    if dataset.has_timestamps() {
        dataset.records.sort_by(chronological);
    }

    log::debug!(
        "processed {rows_in} row(s): {cols_in} → {} column(s), {} timestamped",
        dataset.columns.len(),
        dataset.records.iter().filter(|r| r.timestamp.is_some()).count()
    );
    dataset
}

fn chronological(a: &Record, b: &Record) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn row(id: i64, date: &str, time: f64) -> Record {
        Record::new("v")
            .with("ID", CellValue::Integer(id))
            .with("DATE", CellValue::String(date.into()))
            .with("TIME", CellValue::Float(time))
            .with("BLANK", CellValue::Null)
    }

    fn ids(ds: &Dataset) -> Vec<i64> {
        ds.records
            .iter()
            .map(|r| match r.get("ID") {
                Some(CellValue::Integer(i)) => *i,
                other => panic!("unexpected ID {other:?}"),
            })
            .collect()
    }

    #[test]
    fn sorts_by_timestamp_with_missing_last() {
        let raw = Dataset::new(
            vec!["ID".into(), "DATE".into(), "TIME".into(), "BLANK".into()],
            vec![
                row(1, "2024-03-16", 0.5),
                row(2, "broken", 0.5),
                row(3, "2024-03-15", 0.75),
                row(4, "2024-03-15", 0.25),
                row(5, "also broken", 0.1),
            ],
        );

        let out = process(raw, &FieldNames::default());

        assert_eq!(ids(&out), vec![4, 3, 1, 2, 5]);
        assert_eq!(out.columns, vec!["ID", "DATE", "TIME"]);

        let stamps: Vec<_> = out.records.iter().map(|r| r.timestamp).collect();
        let first_none = stamps.iter().position(Option::is_none).unwrap();
        assert!(stamps[first_none..].iter().all(Option::is_none));
        for pair in stamps[..first_none].windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn order_is_kept_without_any_timestamp() {
        let raw = Dataset::new(
            vec!["ID".into()],
            vec![
                Record::new("v").with("ID", CellValue::Integer(3)),
                Record::new("v").with("ID", CellValue::Integer(1)),
                Record::new("v").with("ID", CellValue::Integer(2)),
            ],
        );
        let out = process(raw, &FieldNames::default());
        assert_eq!(ids(&out), vec![3, 1, 2]);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let raw = Dataset::new(
            Vec::new(),
            vec![
                row(10, "2024-01-01", 0.5),
                row(11, "2024-01-01", 0.5),
                row(12, "2024-01-01", 0.5),
            ],
        );
        let out = process(raw, &FieldNames::default());
        assert_eq!(ids(&out), vec![10, 11, 12]);
    }

    #[test]
    fn empty_input_stays_empty() {
        let out = process(Dataset::default(), &FieldNames::default());
        assert!(out.is_empty());
    }
}
