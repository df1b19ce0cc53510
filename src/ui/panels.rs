use eframe::egui::{self, Color32, RichText, Slider, Ui};

use crate::render;
use crate::state::{AppState, StatusMessage};

// ---------------------------------------------------------------------------
// Right side panel – view controls
// ---------------------------------------------------------------------------

/// Render the control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Save view").clicked() {
            state.save_view();
        }
        if ui.button("Histogram").clicked() {
            state.show_histogram = !state.show_histogram;
        }
        if ui.button("Reset camera").clicked() {
            state.reset_camera();
        }
    });
    ui.add_space(6.0);

    ui.label(RichText::new(state.count_label()).strong());
    ui.separator();

    // ---- Colour ----
    ui.strong("Color of streamlines");
    let mut hue = state.viewer.hue_span();
    if ui.add(Slider::new(&mut hue, 0.0..=1.0).fixed_decimals(1)).changed() {
        state.viewer.set_hue_span(hue);
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("weight color");
        let mut blend = state.viewer.color_mode().direction_share();
        if ui.add(Slider::new(&mut blend, 0.0..=1.0).show_value(false)).changed() {
            state.viewer.set_color_mode(blend);
        }
        ui.label("direction color");
    });
    ui.separator();

    // ---- Iteration ----
    ui.strong("Number of the iteration");
    let mut iteration = state.viewer.current_iteration();
    let max_iteration = state.viewer.max_iteration();
    let label = state.viewer.current_label().to_string();
    if ui
        .add(Slider::new(&mut iteration, 0..=max_iteration).show_value(false).text(label))
        .changed()
    {
        state.viewer.set_iteration(iteration as i64);
    }
    ui.separator();

    // ---- Threshold interval ----
    let max_weight = state.viewer.data().max_weight();
    let unit = state.viewer.data().model.weight_label();

    ui.strong(format!("Big {unit}s subdued"));
    let mut upper = state.viewer.upper_threshold();
    if ui
        .add(Slider::new(&mut upper, 0.0..=max_weight).fixed_decimals(2))
        .changed()
    {
        state.viewer.set_upper_threshold(upper);
    }

    ui.strong(format!("Small {unit}s subdued"));
    let mut lower = state.viewer.lower_threshold();
    if ui
        .add(Slider::new(&mut lower, 0.0..=max_weight).fixed_decimals(2))
        .changed()
    {
        state.viewer.set_lower_threshold(lower);
    }

    ui.strong("Opacity outside the interval");
    let mut opacity = state.viewer.dimmed_opacity();
    if ui.add(Slider::new(&mut opacity, 0.0..=1.0)).changed() {
        state.viewer.set_dimmed_opacity(opacity);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Save view").clicked() {
                state.save_view();
                ui.close_menu();
            }
            if ui.button("Save view as…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let data = state.viewer.data();
        ui.label(format!(
            "{} model, {} streamlines, iteration {} ({}/{})",
            data.model,
            data.len(),
            state.viewer.current_label(),
            state.viewer.current_iteration() + 1,
            data.iteration_count()
        ));

        match &state.status_message {
            Some(StatusMessage::Error(msg)) => {
                ui.separator();
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(StatusMessage::Info(msg)) => {
                ui.separator();
                ui.label(msg);
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState) {
    let suggested = render::next_snapshot_path(
        &state.config.snapshot.directory,
        state.viewer.current_label(),
    );
    let mut dialog = rfd::FileDialog::new()
        .set_title("Save current view")
        .add_filter("PNG image", &["png"])
        .set_directory(&state.config.snapshot.directory);
    if let Some(name) = suggested.file_name().and_then(|n| n.to_str()) {
        dialog = dialog.set_file_name(name);
    }

    if let Some(path) = dialog.save_file() {
        state.save_view_to(&path);
    }
}
