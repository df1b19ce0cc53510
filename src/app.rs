use eframe::egui;

use crate::state::AppState;
use crate::ui::{histogram, panels, viewport};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CommitViewerApp {
    pub state: AppState,
}

impl CommitViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CommitViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Right side panel: controls ----
        egui::SidePanel::right("control_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: streamlines ----
        egui::CentralPanel::default().show(ctx, |ui| {
            viewport::streamline_view(ui, &mut self.state);
        });

        histogram::histogram_window(ctx, &mut self.state);
    }
}
