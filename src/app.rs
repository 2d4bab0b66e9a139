use std::path::PathBuf;

use eframe::egui;

use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CbmViewerApp {
    pub state: AppState,
}

impl CbmViewerApp {
    /// Build the app and preload any files given on the command line.
    pub fn new(settings: Settings, files: &[PathBuf]) -> Self {
        let mut state = AppState::new(settings);
        if !files.is_empty() {
            state.load_paths(files);
        }
        Self { state }
    }
}

impl eframe::App for CbmViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: record preview ----
        if !self.state.collection.is_empty() {
            egui::TopBottomPanel::bottom("records_panel")
                .resizable(true)
                .default_height(200.0)
                .show(ctx, |ui| {
                    table::records_table(ui, &self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::time_series_plot(ui, &mut self.state);
        });
    }
}
