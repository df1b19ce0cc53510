use std::path::Path;

use glam::Vec2;

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::render::{self, RenderOptions};
use crate::view::ViewerState;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Message shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded data and the interactive view model.
    pub viewer: ViewerState,

    /// Camera used by the viewport and by saved views.
    pub camera: Camera,

    /// Camera restored by "Reset camera".
    pub home_camera: Camera,

    pub config: ViewerConfig,

    /// Whether the histogram window is open.
    pub show_histogram: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<StatusMessage>,

    /// Last painted viewport size in points, with its pixels per point.
    /// Saved views match it; before the first frame the snapshot config
    /// decides the size.
    pub viewport: Option<(Vec2, f32)>,
}

impl AppState {
    /// Use the configured camera if any, otherwise frame the data.
    pub fn new(viewer: ViewerState, config: ViewerConfig) -> Self {
        let home_camera = config
            .camera
            .as_ref()
            .map(Camera::from_config)
            .or_else(|| viewer.data().bounds().map(|b| Camera::fit(&b)))
            .unwrap_or_default();
        Self {
            viewer,
            camera: home_camera,
            home_camera,
            config,
            show_histogram: false,
            status_message: None,
            viewport: None,
        }
    }

    pub fn reset_camera(&mut self) {
        self.camera = self.home_camera;
    }

    /// Text of the in-range counter.
    pub fn count_label(&self) -> String {
        format!("Number of streamlines in interval: {}", self.viewer.count_in_range())
    }

    /// Save into the snapshot directory under the next free
    /// `saved_iteration_<label>` name.
    pub fn save_view(&mut self) {
        let path = render::next_snapshot_path(
            &self.config.snapshot.directory,
            self.viewer.current_label(),
        );
        self.save_view_to(&path);
    }

    /// Size of a saved view: the current viewport when one has been
    /// painted, otherwise `[snapshot]` from the config.
    pub fn render_options(&self) -> RenderOptions {
        match self.viewport {
            Some((size, ppp)) => {
                RenderOptions::for_viewport(size, ppp, self.config.snapshot.background)
            }
            None => RenderOptions::from(&self.config.snapshot),
        }
    }

    /// Save to an explicit path. Failures are reported in the status line
    /// and leave the session running.
    pub fn save_view_to(&mut self, path: &Path) {
        let options = self.render_options();
        match self.viewer.save_view(path, &self.camera, &options) {
            Ok(()) => {
                let message = format!("Saved {}", path.display());
                self.status_message = Some(StatusMessage::Info(message));
            }
            Err(e) => {
                log::error!("Failed to save view: {e}");
                self.status_message = Some(StatusMessage::Error(format!("Error: {e}")));
            }
        }
    }
}
