mod app;
mod bootstrap;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use std::process::ExitCode;

use app::CbmViewerApp;
use clap::Parser;
use cli::Cli;
use eframe::egui;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Nothing runs before initialization succeeds.
    let runtime = match bootstrap::initialize(cli.config.as_deref()) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("cbm-viewer: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.is_headless() {
        return match cli::run_headless(&cli, &runtime.settings) {
            Ok(report) => {
                println!("{report}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{e:#}");
                eprintln!("cbm-viewer: {e:#}");
                ExitCode::FAILURE
            }
        };
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let settings = runtime.settings;
    let files = cli.files;
    let result = eframe::run_native(
        "CBM Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(CbmViewerApp::new(settings, &files)))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("GUI failed: {e}");
            ExitCode::FAILURE
        }
    }
}
