use eframe::egui::Ui;
use egui_plot::{GridMark, Line, Plot, PlotPoints, Points};

use crate::data::aggregate::{Chart, SeriesSet};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Time-series chart (central panel)
// ---------------------------------------------------------------------------

/// Render the daily-mean chart in the central panel.
pub fn time_series_plot(ui: &mut Ui, state: &mut AppState) {
    if state.collection.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view measurements  (File → Open…)");
        });
        return;
    }

    let set = match state.chart() {
        Chart::Placeholder(msg) => {
            let msg = msg.clone();
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(msg);
            });
            return;
        }
        Chart::Series(set) => set.clone(),
    };

    draw_series(ui, state, &set);
}

fn draw_series(ui: &mut Ui, state: &AppState, set: &SeriesSet) {
    // x = index into the shared date axis, labelled with the date.
    let axis = set.dates.clone();
    let label_for = move |x: f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        axis.get(idx as usize)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    Plot::new("time_series_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Date")
        .y_axis_label(format!("{} (daily mean)", set.field))
        .x_axis_formatter(move |mark: GridMark, _range| label_for(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &set.series {
                let color = state.color_map.color_for(&series.name);
                let coords: Vec<[f64; 2]> = series
                    .aligned(&set.dates)
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|y| [i as f64, y]))
                    .collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(coords.clone()))
                        .name(&series.name)
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(coords))
                        .name(&series.name)
                        .color(color)
                        .radius(3.0),
                );
            }
        });
}
