use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::config::Settings;
use crate::data::aggregate::{chart_for, Chart};
use crate::data::export::{write_export, ExportFormat};
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::data::stats::{summarize, SummaryStats};

/// Viewer for vessel condition-monitoring reports.
#[derive(Debug, Parser)]
#[command(name = "cbm-viewer", version, about)]
pub struct Cli {
    /// Report files to load (xlsx, xlsm, xls, xlsb, ods, csv, json).
    pub files: Vec<PathBuf>,

    /// JSON settings file.
    #[arg(long, env = "CBM_VIEWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the merged, processed records here instead of opening a window.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Format used with `--export`.
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Print summary statistics as JSON.
    #[arg(long)]
    pub summary: bool,

    /// Print the daily-mean chart data as JSON.
    #[arg(long)]
    pub series: bool,
}

impl Cli {
    /// Whether any flag asks for output without the GUI.
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.summary || self.series
    }
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    exported: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SummaryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a Chart>,
    failed: Vec<String>,
}

/// Load every file, then export and/or report. Returns the JSON document to
/// print. Files that fail to load are logged and listed under `failed`.
pub fn run_headless(cli: &Cli, settings: &Settings) -> Result<String> {
    let mut collection = Dataset::default();
    let mut failed = Vec::new();
    for path in &cli.files {
        match load_file(path, settings) {
            Ok(ds) => collection.merge(ds),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                failed.push(path.display().to_string());
            }
        }
    }

    let exported = match &cli.export {
        Some(dest) => Some(
            write_export(&collection, &settings.fields, cli.format, dest)
                .with_context(|| format!("exporting to {}", dest.display()))?,
        ),
        None => None,
    };

    let summary = cli.summary.then(|| summarize(&collection, settings));
    let chart = cli
        .series
        .then(|| chart_for(&collection, &settings.candidate_fields, settings.invalid_values));

    let report = Report {
        exported,
        summary,
        chart: chart.as_ref(),
        failed,
    };
    serde_json::to_string_pretty(&report).context("serializing report")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "cbm-viewer",
            "a.xlsx",
            "b.csv",
            "--export",
            "out",
            "--format",
            "xlsx",
        ])
        .unwrap();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.format, ExportFormat::Xlsx);
        assert!(cli.is_headless());

        let gui = Cli::try_parse_from(["cbm-viewer", "a.xlsx"]).unwrap();
        assert!(!gui.is_headless());
    }

    #[test]
    fn headless_reports_series_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "Aurora CBM.csv",
            "COMP_NAME,DATE,TIME,OVERALL_VEL\nPump,2024-03-15,0.25,2\nPump,2024-03-15,0.75,4\n",
        );
        let cli = Cli {
            files: vec![a, dir.path().join("missing.csv")],
            config: None,
            export: None,
            format: ExportFormat::Csv,
            summary: true,
            series: true,
        };

        let out = run_headless(&cli, &Settings::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["summary"]["records"], 2);
        assert_eq!(json["chart"]["kind"], "series");
        assert_eq!(json["chart"]["data"]["field"], "OVERALL_VEL");
        assert_eq!(json["chart"]["data"]["series"][0]["name"], "Aurora");
        assert_eq!(json["failed"].as_array().unwrap().len(), 1);
        assert!(json.get("exported").is_none());
    }

    #[test]
    fn headless_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "Aurora CBM.csv",
            "DATE,TIME,OVERALL_VEL\n2024-03-15,0.5,1\n",
        );
        let cli = Cli {
            files: vec![a],
            config: None,
            export: Some(dir.path().join("merged")),
            format: ExportFormat::Csv,
            summary: false,
            series: false,
        };

        run_headless(&cli, &Settings::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("merged.csv")).unwrap();
        assert!(text.contains("Aurora"));
        assert!(text.contains("2024-03-15T12:00:00"));
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let cli = Cli::try_parse_from(["cbm-viewer", "--series"]).unwrap();
        let out = run_headless(&cli, &Settings::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["chart"]["kind"], "placeholder");
    }
}
