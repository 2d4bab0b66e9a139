use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::color::ColorMap;
use crate::config::Settings;
use crate::data::aggregate::{Chart, SeriesMemo};
use crate::data::filter::{filter_dataset, init_filter_state, DateRange, FilterState};
use crate::data::loader::load_file;
use crate::data::model::{CellValue, Dataset};
use crate::data::stats::{categorize_columns, summarize, ColumnGroups, SummaryStats};
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Every record loaded this session, across files.
    pub collection: Dataset,

    /// Names of the files merged into `collection`.
    pub loaded_files: Vec<String>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Date bounds applied on top of the column filters.
    pub date_range: DateRange,

    /// For each filter column the sorted set of values it takes.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,

    /// Records passing the current filters; what the chart and export see.
    pub filtered: Dataset,

    /// Bumped whenever `filtered` changes.
    pub generation: u64,

    /// Cached chart for `filtered`.
    pub series_memo: SeriesMemo,

    /// Measurement picked in the UI, tried before the configured candidates.
    pub measurement: Option<String>,

    pub column_groups: ColumnGroups,

    pub summary: SummaryStats,

    /// One colour per vessel.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            collection: Dataset::default(),
            loaded_files: Vec::new(),
            filters: FilterState::default(),
            date_range: DateRange::default(),
            unique_values: BTreeMap::new(),
            filtered: Dataset::default(),
            generation: 0,
            series_memo: SeriesMemo::default(),
            measurement: None,
            column_groups: ColumnGroups::default(),
            summary: SummaryStats::default(),
            color_map: ColorMap::new(&BTreeSet::new()),
            status_message: None,
        }
    }

    /// Columns offered as filters: the category label first, then the
    /// configured ones.
    pub fn filter_columns(&self) -> Vec<String> {
        let mut cols = vec![self.settings.fields.category.clone()];
        cols.extend(self.settings.filter_columns.iter().cloned());
        cols
    }

    /// Load one file and merge it into the collection. A failure leaves the
    /// already loaded data untouched.
    pub fn load_path(&mut self, path: &Path) -> Result<(), IngestError> {
        let dataset = load_file(path, &self.settings)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.add_dataset(name, dataset);
        Ok(())
    }

    /// Load several files, collecting a status line for the ones that fail.
    pub fn load_paths<P: AsRef<Path>>(&mut self, paths: &[P]) {
        let mut failures = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if let Err(e) = self.load_path(path) {
                log::error!("Failed to load {}: {e}", path.display());
                failures.push(format!("{}: {e}", path.display()));
            }
        }
        self.status_message = if failures.is_empty() {
            None
        } else {
            Some(format!("Error: {}", failures.join("; ")))
        };
    }

    /// Merge a processed dataset into the collection and rebuild indices.
    pub fn add_dataset(&mut self, name: String, dataset: Dataset) {
        self.collection.merge(dataset);
        self.loaded_files.push(name);

        let previous = std::mem::take(&mut self.unique_values);
        self.unique_values = self
            .collection
            .unique_values(&self.filter_columns(), &self.settings.fields);
        if previous.is_empty() {
            self.filters = init_filter_state(&self.unique_values);
        } else {
            // Newly seen values start selected; earlier choices are kept.
            for (col, values) in &self.unique_values {
                let known = previous.get(col);
                let selected = self.filters.entry(col.clone()).or_default();
                selected.extend(
                    values
                        .iter()
                        .filter(|v| known.map_or(true, |k| !k.contains(*v)))
                        .cloned(),
                );
            }
        }

        self.color_map = ColorMap::new(&self.collection.categories());
        self.column_groups = categorize_columns(&self.collection.columns, &self.settings.fields);
        self.refilter();
    }

    /// Drop every loaded file.
    pub fn clear(&mut self) {
        let settings = self.settings.clone();
        let generation = self.generation + 1;
        *self = AppState::new(settings);
        self.generation = generation;
    }

    /// Recompute the filtered dataset after a filter change.
    pub fn refilter(&mut self) {
        self.filtered = filter_dataset(
            &self.collection,
            &self.filters,
            &self.date_range,
            &self.settings.fields,
        );
        self.summary = summarize(&self.filtered, &self.settings);
        self.generation += 1;
    }

    /// Candidate measurement columns in priority order.
    pub fn chart_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(m) = &self.measurement {
            candidates.push(m.clone());
        }
        candidates.extend(
            self.settings
                .candidate_fields
                .iter()
                .filter(|c| Some(*c) != self.measurement.as_ref())
                .cloned(),
        );
        candidates
    }

    /// The chart for the current filtered dataset (memoized).
    pub fn chart(&mut self) -> &Chart {
        let candidates = self.chart_candidates();
        self.series_memo.chart(
            self.generation,
            &self.filtered,
            &candidates,
            self.settings.invalid_values,
        )
    }

    pub fn set_measurement(&mut self, column: Option<String>) {
        self.measurement = column;
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self.unique_values.get(column) {
            self.filters.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        if range != self.date_range {
            self.date_range = range;
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::export::{export_bytes, ExportFormat};
    use crate::data::model::Record;

    fn csv_file(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn files_merge_and_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let a = csv_file(
            dir.path(),
            "Aurora CBM.csv",
            "COMP_NAME,DATE,TIME,OVERALL_VEL\nPump,2024-03-15,0.25,2\nPump,2024-03-15,0.75,4\n",
        );
        let b = csv_file(
            dir.path(),
            "Borealis CBM.csv",
            "COMP_NAME,DATE,TIME,OVERALL_VEL\nFan,2024-03-15,0.5,10\nFan,2024-03-15,0.5,20\n",
        );
        let missing = dir.path().join("Ghost CBM.xlsx");

        let mut state = AppState::new(Settings::default());
        state.load_paths(&[a, missing, b]);

        assert_eq!(state.loaded_files.len(), 2);
        assert_eq!(state.collection.len(), 4);
        assert_eq!(state.filtered.len(), 4);
        assert!(state.status_message.as_deref().unwrap().contains("Ghost CBM.xlsx"));

        match state.chart() {
            Chart::Series(set) => {
                assert_eq!(set.field, "OVERALL_VEL");
                assert_eq!(set.series[0].name, "Aurora");
                assert_eq!(set.series[0].points[0].1, 3.0);
                assert_eq!(set.series[1].name, "Borealis");
                assert_eq!(set.series[1].points[0].1, 15.0);
            }
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn filtering_changes_chart_and_export() {
        let mut state = AppState::new(Settings::default());
        let mut a = Record::new("Aurora").with("OVERALL_VEL", CellValue::Float(1.0));
        a.timestamp = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        let b = Record::new("Borealis").with("OVERALL_VEL", CellValue::Float(2.0));
        state.add_dataset("a".into(), Dataset::new(vec!["OVERALL_VEL".into()], vec![a, b]));

        state.toggle_filter_value("VESSEL_NAME", &CellValue::String("Aurora".into()));
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.filtered.records[0].category, "Borealis");
        // Borealis has no timestamp, so nothing can be grouped by day.
        assert!(matches!(state.chart(), Chart::Series(s) if s.series.is_empty()));

        let csv = export_bytes(&state.filtered, &state.settings.fields, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert!(text.contains("Borealis"));
        assert!(!text.contains("Aurora"));

        state.select_none("VESSEL_NAME");
        assert!(state.filtered.is_empty());
        assert!(matches!(state.chart(), Chart::Placeholder(_)));

        state.select_all("VESSEL_NAME");
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn picked_measurement_comes_first() {
        let mut state = AppState::new(Settings::default());
        state.set_measurement(Some("OVERALL_ACC".into()));
        let candidates = state.chart_candidates();
        assert_eq!(candidates[0], "OVERALL_ACC");
        assert_eq!(
            candidates.iter().filter(|c| *c == "OVERALL_ACC").count(),
            1
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = AppState::new(Settings::default());
        state.add_dataset("a".into(), Dataset::new(Vec::new(), vec![Record::new("A")]));
        let before = state.generation;
        state.clear();
        assert!(state.collection.is_empty());
        assert!(state.loaded_files.is_empty());
        assert!(state.generation > before);
    }
}
