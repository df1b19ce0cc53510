use eframe::egui::{self, Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Histogram window
// ---------------------------------------------------------------------------

/// Floating window with the weight distribution of the current iteration.
pub fn histogram_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_histogram {
        return;
    }
    let mut open = state.show_histogram;
    egui::Window::new("Histogram")
        .open(&mut open)
        .default_size([480.0, 320.0])
        .show(ctx, |ui: &mut Ui| {
            histogram_plot(ui, state);
        });
    state.show_histogram = open;
}

fn histogram_plot(ui: &mut Ui, state: &AppState) {
    let viewer = &state.viewer;
    let histogram = viewer.histogram(state.config.histogram.bins);
    let width = histogram.bin_width();

    ui.label(format!("histogram of iteration {}", viewer.current_label()));

    let bars: Vec<Bar> = histogram
        .counts
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let center = histogram.bin_center(i);
            let fill = if (viewer.lower_threshold()..=viewer.upper_threshold()).contains(&center) {
                Color32::LIGHT_BLUE
            } else {
                Color32::GRAY
            };
            Bar::new(center, n as f64).width(width).fill(fill)
        })
        .collect();

    Plot::new("weight_histogram")
        .x_axis_label(viewer.data().model.weight_label())
        .y_axis_label("number of streamlines")
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
