use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

// ---------------------------------------------------------------------------
// Semantic column names
// ---------------------------------------------------------------------------

/// Column names that carry meaning for the pipeline. Every other column is
/// kept as an opaque extra field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Category label attached to each record at ingestion (vessel name).
    pub category: String,
    pub date: String,
    pub time: String,
    /// Derived timestamp, written on export and re-derived on import.
    pub timestamp: String,
    pub component: String,
    pub measurement_point: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            category: "VESSEL_NAME".into(),
            date: "DATE".into(),
            time: "TIME".into(),
            timestamp: "TIMESTAMP".into(),
            component: "COMP_NAME".into(),
            measurement_point: "MP_NAME".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation policy
// ---------------------------------------------------------------------------

/// What the aggregator does with a measurement that is not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidValuePolicy {
    /// Count it as `0.0` in the mean.
    #[default]
    Zero,
    /// Leave the record out of its group.
    Skip,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime configuration, loaded once during bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fields: FieldNames,
    /// Measurement columns tried in order when building the chart.
    pub candidate_fields: Vec<String>,
    /// Columns offered as value filters besides the category label.
    pub filter_columns: Vec<String>,
    /// The category label is the file name up to this marker.
    pub category_delimiter: String,
    pub invalid_values: InvalidValuePolicy,
    /// Numeric columns left out of summary statistics.
    pub stats_exclude: Vec<String>,
    /// Default `env_logger` filter; `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fields: FieldNames::default(),
            candidate_fields: vec![
                "OVERALL_VEL".into(),
                "OVERALL_ACC".into(),
                "OVERALL_DISP".into(),
                "VALUE".into(),
            ],
            filter_columns: vec!["COMP_NAME".into(), "MP_NAME".into()],
            category_delimiter: " CBM".into(),
            invalid_values: InvalidValuePolicy::default(),
            stats_exclude: vec!["COMP_NUMBER".into()],
            log_level: "info".into(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, BootstrapError> {
        let settings = match path {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|source| BootstrapError::ConfigRead {
                        path: path.to_path_buf(),
                        source,
                    })?;
                serde_json::from_str(&text).map_err(|source| BootstrapError::ConfigParse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), BootstrapError> {
        let f = &self.fields;
        let names = [&f.category, &f.date, &f.time, &f.timestamp];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(BootstrapError::InvalidConfig(
                "category, date, time and timestamp field names must not be empty".into(),
            ));
        }
        for (i, a) in names.iter().enumerate() {
            if names[i + 1..].contains(a) {
                return Err(BootstrapError::InvalidConfig(format!(
                    "field name '{a}' is used for more than one role"
                )));
            }
        }
        if self.candidate_fields.is_empty() {
            return Err(BootstrapError::InvalidConfig(
                "candidate_fields must list at least one measurement column".into(),
            ));
        }
        Ok(())
    }
}
