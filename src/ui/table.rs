use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::CellValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Record preview (bottom panel)
// ---------------------------------------------------------------------------

/// Scrollable table of the records passing the current filters.
pub fn records_table(ui: &mut Ui, state: &AppState) {
    let data = &state.filtered;
    if data.is_empty() {
        ui.label("No records match the current filters.");
        return;
    }

    let names = &state.settings.fields;
    let mut headers = vec![names.category.clone(), names.timestamp.clone()];
    headers.extend(data.columns.iter().cloned());

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(80.0), headers.len())
        .min_scrolled_height(0.0)
        .header(20.0, |mut header| {
            for h in &headers {
                header.col(|ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, data.len(), |mut row| {
                let rec = &data.records[row.index()];
                for h in &headers {
                    let value = rec.value(h, names);
                    row.col(|ui| {
                        ui.label(cell_text(&value));
                    });
                }
            });
        });
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Float(f) if !f.is_nan() => format!("{f:.3}"),
        other => other.to_string(),
    }
}
