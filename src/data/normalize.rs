use std::collections::BTreeSet;

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Row normalizer: drop columns that never hold a value
// ---------------------------------------------------------------------------

/// Column names for which every record is empty (absent, NaN or `""`).
///
/// Candidates are the header plus any field a record carries, so columns
/// that only appear in later rows are judged too.
pub fn empty_columns(dataset: &Dataset) -> BTreeSet<String> {
    if dataset.is_empty() {
        return BTreeSet::new();
    }

    let mut candidates: BTreeSet<&str> = dataset.columns.iter().map(String::as_str).collect();
    for rec in &dataset.records {
        candidates.extend(rec.fields.keys().map(String::as_str));
    }

    candidates
        .into_iter()
        .filter(|col| {
            dataset
                .records
                .iter()
                .all(|rec| rec.get(col).map_or(true, CellValue::is_empty))
        })
        .map(str::to_string)
        .collect()
}

/// Return a copy of `dataset` without its all-empty columns.
pub fn normalize(dataset: &Dataset) -> Dataset {
    let dropped = empty_columns(dataset);
    if dropped.is_empty() {
        return dataset.clone();
    }
    log::debug!("dropping {} empty column(s): {:?}", dropped.len(), dropped);

    let columns = dataset
        .columns
        .iter()
        .filter(|c| !dropped.contains(*c))
        .cloned()
        .collect();

    let records = dataset
        .records
        .iter()
        .map(|rec| {
            let mut rec = rec.clone();
            rec.fields.retain(|k, _| !dropped.contains(k));
            rec
        })
        .collect();

    Dataset::new(columns, records)
}
