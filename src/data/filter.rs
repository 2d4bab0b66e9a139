use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{CellValue, Dataset, Record};
use crate::config::FieldNames;

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// If a column is absent it means "no filter" (show all).
pub type FilterState = BTreeMap<String, BTreeSet<CellValue>>;

/// Inclusive bounds on the calendar date of a record's timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Records without a timestamp only pass an unbounded range.
    pub fn admits(&self, record: &Record) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(day) = record.timestamp.map(|ts| ts.date()) else {
            return false;
        };
        self.from.map_or(true, |f| day >= f) && self.to.map_or(true, |t| day <= t)
    }
}

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(unique_values: &BTreeMap<String, BTreeSet<CellValue>>) -> FilterState {
    unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Whether `record` passes all active column filters.
///
/// A record passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The record's value for that column is in the selected set → passes
///   (a missing value is `Null`, so it passes only if `Null` is selected)
pub fn passes(record: &Record, filters: &FilterState, names: &FieldNames) -> bool {
    filters.iter().all(|(col, selected)| {
        if selected.is_empty() {
            return false;
        }
        selected.contains(&record.value(col, names))
    })
}

/// The "currently filtered" dataset: a copy of `dataset` holding the records
/// that pass both the column filters and the date range, in order.
pub fn filter_dataset(
    dataset: &Dataset,
    filters: &FilterState,
    range: &DateRange,
    names: &FieldNames,
) -> Dataset {
    // Columns whose every value is selected do not constrain anything.
    let unique = dataset.unique_values(&filters.keys().cloned().collect::<Vec<_>>(), names);
    let active: FilterState = filters
        .iter()
        .filter(|(col, selected)| {
            unique
                .get(*col)
                .map_or(true, |all| !all.is_subset(selected))
        })
        .map(|(c, s)| (c.clone(), s.clone()))
        .collect();

    let records = dataset
        .records
        .iter()
        .filter(|rec| range.admits(rec) && passes(rec, &active, names))
        .cloned()
        .collect();

    Dataset::new(dataset.columns.clone(), records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> FieldNames {
        FieldNames::default()
    }

    fn s(v: &str) -> CellValue {
        CellValue::String(v.into())
    }

    fn rec(vessel: &str, comp: Option<&str>, day: Option<u32>) -> Record {
        let mut r = Record::new(vessel);
        if let Some(c) = comp {
            r = r.with("COMP_NAME", s(c));
        }
        r.timestamp = day.map(|d| {
            NaiveDate::from_ymd_opt(2024, 3, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        });
        r
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["COMP_NAME".into()],
            vec![
                rec("Aurora", Some("Pump"), Some(1)),
                rec("Aurora", Some("Fan"), Some(2)),
                rec("Borealis", Some("Pump"), Some(3)),
                rec("Borealis", None, None),
            ],
        )
    }

    fn columns() -> Vec<String> {
        vec!["VESSEL_NAME".into(), "COMP_NAME".into()]
    }

    #[test]
    fn everything_selected_shows_everything() {
        let ds = dataset();
        let filters = init_filter_state(&ds.unique_values(&columns(), &names()));
        let out = filter_dataset(&ds, &filters, &DateRange::default(), &names());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn category_selection_narrows_records() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds.unique_values(&columns(), &names()));
        filters.insert("VESSEL_NAME".into(), BTreeSet::from([s("Borealis")]));
        let out = filter_dataset(&ds, &filters, &DateRange::default(), &names());
        assert_eq!(out.len(), 2);
        assert!(out.records.iter().all(|r| r.category == "Borealis"));
    }

    #[test]
    fn missing_values_need_null_selected() {
        let ds = dataset();
        let mut filters = FilterState::new();
        filters.insert("COMP_NAME".into(), BTreeSet::from([s("Pump"), s("Fan")]));
        let out = filter_dataset(&ds, &filters, &DateRange::default(), &names());
        assert_eq!(out.len(), 3);

        filters.insert("COMP_NAME".into(), BTreeSet::from([CellValue::Null]));
        let out = filter_dataset(&ds, &filters, &DateRange::default(), &names());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = FilterState::new();
        filters.insert("COMP_NAME".into(), BTreeSet::new());
        let out = filter_dataset(&ds, &filters, &DateRange::default(), &names());
        assert!(out.is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = dataset();
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 3, 2),
            to: NaiveDate::from_ymd_opt(2024, 3, 3),
        };
        let out = filter_dataset(&ds, &FilterState::new(), &range, &names());
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].get("COMP_NAME"), Some(&s("Fan")));
    }
}
