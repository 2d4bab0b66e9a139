use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::model::Dataset;
use crate::config::InvalidValuePolicy;

/// Message shown in place of a chart when there is nothing to plot.
pub const NO_DATA_MESSAGE: &str = "No data available for the current selection";

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// Daily means of one measurement for one category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// `(date, mean)` ordered by ascending date.
    pub points: Vec<(NaiveDate, f64)>,
}

impl Series {
    /// Values aligned to a shared date axis; `None` where this series has no
    /// data for the date.
    pub fn aligned(&self, axis: &[NaiveDate]) -> Vec<Option<f64>> {
        let by_date: BTreeMap<NaiveDate, f64> = self.points.iter().copied().collect();
        axis.iter().map(|d| by_date.get(d).copied()).collect()
    }
}

/// Everything the chart needs: the measurement shown, the shared date axis
/// and one series per category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    pub field: String,
    /// Sorted union of the dates of every series.
    pub dates: Vec<NaiveDate>,
    /// Ordered by category label.
    pub series: Vec<Series>,
}

/// Rendering instruction handed to the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Chart {
    Series(SeriesSet),
    Placeholder(String),
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// First candidate column (in priority order) for which any record holds a
/// non-null value.
pub fn select_field<'a>(dataset: &Dataset, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|field| {
            dataset
                .records
                .iter()
                .any(|r| r.get(field).is_some_and(|v| !v.is_null()))
        })
        .map(String::as_str)
}

/// Group records by (category, calendar day) and average the selected
/// measurement. `None` means no candidate column has data.
pub fn build_series(
    dataset: &Dataset,
    candidates: &[String],
    policy: InvalidValuePolicy,
) -> Option<SeriesSet> {
    let field = select_field(dataset, candidates)?;

    // (category, date) → (sum, count)
    let mut groups: BTreeMap<(&str, NaiveDate), (f64, usize)> = BTreeMap::new();
    for rec in &dataset.records {
        let Some(ts) = rec.timestamp else {
            continue;
        };
        let Some(raw) = rec.get(field).filter(|v| !v.is_null()) else {
            continue;
        };
        let value = match (raw.as_f64(), policy) {
            (Some(v), _) => v,
            (None, InvalidValuePolicy::Zero) => 0.0,
            (None, InvalidValuePolicy::Skip) => continue,
        };
        let acc = groups.entry((rec.category.as_str(), ts.date())).or_default();
        acc.0 += value;
        acc.1 += 1;
    }

    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut per_category: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for ((category, date), (sum, count)) in groups {
        dates.insert(date);
        per_category
            .entry(category)
            .or_default()
            .push((date, sum / count as f64));
    }

    let series = per_category
        .into_iter()
        .map(|(name, points)| Series {
            name: name.to_string(),
            points,
        })
        .collect();

    Some(SeriesSet {
        field: field.to_string(),
        dates: dates.into_iter().collect(),
        series,
    })
}

/// Chart for a (filtered) dataset, or the placeholder when the dataset is
/// empty or none of the candidates has data.
pub fn chart_for(dataset: &Dataset, candidates: &[String], policy: InvalidValuePolicy) -> Chart {
    if dataset.is_empty() {
        return Chart::Placeholder(NO_DATA_MESSAGE.to_string());
    }
    match build_series(dataset, candidates, policy) {
        Some(set) => Chart::Series(set),
        None => Chart::Placeholder(NO_DATA_MESSAGE.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

/// Caches the last chart so the UI does not regroup every frame.
///
/// The owner bumps a generation counter whenever the dataset it passes in
/// changes; the memo rebuilds when the generation, candidates or policy
/// differ from the cached ones.
#[derive(Debug, Default)]
pub struct SeriesMemo {
    key: Option<(u64, Vec<String>, InvalidValuePolicy)>,
    chart: Option<Chart>,
}

impl SeriesMemo {
    pub fn chart(
        &mut self,
        generation: u64,
        dataset: &Dataset,
        candidates: &[String],
        policy: InvalidValuePolicy,
    ) -> &Chart {
        let fresh = self.key.as_ref().is_some_and(|(g, c, p)| {
            *g == generation && c.as_slice() == candidates && *p == policy
        });
        if !fresh || self.chart.is_none() {
            log::debug!("rebuilding chart series (generation {generation})");
            self.key = Some((generation, candidates.to_vec(), policy));
            self.chart = Some(chart_for(dataset, candidates, policy));
        }
        self.chart.get_or_insert_with(|| Chart::Placeholder(NO_DATA_MESSAGE.to_string()))
    }
}
