use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::{write_export, ExportFormat};
use crate::data::filter::DateRange;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – measurement, dates and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.collection.is_empty() {
        ui.label("No data loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            measurement_picker(ui, state);
            ui.separator();

            date_range_pickers(ui, state);
            ui.separator();

            column_filters(ui, state);
            ui.separator();

            summary_section(ui, state);
        });
}

fn measurement_picker(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Measurement");
    let current = state
        .measurement
        .clone()
        .unwrap_or_else(|| "Automatic".to_string());

    let groups = state.column_groups.clone();
    let mut picked: Option<Option<String>> = None;
    egui::ComboBox::from_id_salt("measurement")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(state.measurement.is_none(), "Automatic")
                .clicked()
            {
                picked = Some(None);
            }
            for (title, cols) in [
                ("Vibration", &groups.vibration),
                ("Bearing", &groups.bearing),
                ("Shaft", &groups.shaft),
                ("Other", &groups.other),
            ] {
                if cols.is_empty() {
                    continue;
                }
                ui.label(RichText::new(title).weak());
                for col in cols {
                    let selected = state.measurement.as_deref() == Some(col.as_str());
                    if ui.selectable_label(selected, col).clicked() {
                        picked = Some(Some(col.clone()));
                    }
                }
            }
        });
    if let Some(choice) = picked {
        state.set_measurement(choice);
    }
}

fn date_range_pickers(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Date range");
    let bounds = state.summary.date_range.as_ref().map(|s| (s.min.date(), s.max.date()));

    let mut range = state.date_range;
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = range.from.is_some();
        if ui.checkbox(&mut enabled, "From").changed() {
            range.from = enabled.then(|| bounds.map_or(today(), |b| b.0));
        }
        if let Some(from) = range.from.as_mut() {
            ui.add(DatePickerButton::new(from).id_salt("date_from"));
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = range.to.is_some();
        if ui.checkbox(&mut enabled, "To").changed() {
            range.to = enabled.then(|| bounds.map_or(today(), |b| b.1));
        }
        if let Some(to) = range.to.as_mut() {
            ui.add(DatePickerButton::new(to).id_salt("date_to"));
        }
    });
    if ui.small_button("Any date").clicked() {
        range = DateRange::default();
    }
    state.set_date_range(range);
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn column_filters(ui: &mut Ui, state: &mut AppState) {
    // Clone what we need so we can mutate state inside the loop.
    let unique = state.unique_values.clone();
    let category_column = state.settings.fields.category.clone();

    for col in state.filter_columns() {
        let Some(all_values) = unique.get(&col) else {
            continue;
        };
        if all_values.len() <= 1 && col != category_column {
            continue;
        }

        // Show count of selected / total in the header
        let n_selected = state.filters.get(&col).map_or(0, |s| s.len());
        let n_total = all_values.len();
        let header_text = format!("{col}  ({n_selected}/{n_total})");

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(&col)
            .default_open(col == category_column)
            .show(ui, |ui: &mut Ui| {
                // Select all / none buttons
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all(&col);
                    }
                    if ui.small_button("None").clicked() {
                        state.select_none(&col);
                    }
                });

                for val in all_values {
                    let is_selected = state
                        .filters
                        .get(&col)
                        .is_some_and(|s| s.contains(val));

                    // Vessels get their chart colour as a swatch.
                    let mut text = RichText::new(val.to_string());
                    if col == category_column {
                        text = text.color(state.color_map.color_for(&val.to_string()));
                    }

                    let mut checked = is_selected;
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_filter_value(&col, val);
                    }
                }
            });
    }
}

fn summary_section(ui: &mut Ui, state: &AppState) {
    egui::CollapsingHeader::new(RichText::new("Summary").strong())
        .id_salt("summary")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let summary = &state.summary;
            ui.label(format!("{} record(s)", summary.records));
            if let Some(span) = &summary.date_range {
                ui.label(format!(
                    "{} → {}",
                    span.min.format("%Y-%m-%d %H:%M"),
                    span.max.format("%Y-%m-%d %H:%M")
                ));
            }
            for (vessel, count) in &summary.vessel_counts {
                ui.label(format!("{vessel}: {count}"));
            }
            if !summary.numeric_stats.is_empty() {
                ui.separator();
                egui::Grid::new("numeric_stats")
                    .striped(true)
                    .show(ui, |ui: &mut Ui| {
                        for h in ["Column", "Min", "Max", "Mean", "Median"] {
                            ui.strong(h);
                        }
                        ui.end_row();
                        for (col, s) in &summary.numeric_stats {
                            ui.label(col);
                            ui.label(format!("{:.3}", s.min));
                            ui.label(format!("{:.3}", s.max));
                            ui.label(format!("{:.3}", s.mean));
                            ui.label(format!("{:.3}", s.median));
                            ui.end_row();
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            for format in [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Json] {
                let label = format!("Export {}…", format.extension().to_uppercase());
                if ui
                    .add_enabled(!state.filtered.is_empty(), egui::Button::new(label))
                    .clicked()
                {
                    save_file_dialog(state, format);
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button("Clear").clicked() {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.collection.is_empty() {
            ui.label(format!(
                "{} file(s), {} records loaded, {} visible",
                state.loaded_files.len(),
                state.collection.len(),
                state.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open CBM data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv", "json"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "xlsb", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_files();

    if let Some(paths) = files {
        state.load_paths(paths.as_slice());
    }
}

pub fn save_file_dialog(state: &mut AppState, format: ExportFormat) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(format!("cbm_data.{}", format.extension()))
        .add_filter(format.extension(), &[format.extension()])
        .save_file();

    if let Some(path) = file {
        match write_export(&state.filtered, &state.settings.fields, format, &path) {
            Ok(written) => {
                state.status_message = None;
                log::info!("Saved {}", written.display());
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
