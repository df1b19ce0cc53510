//! commit-viewer - inspect the convergence of COMMIT streamline weights
//!
//! Loads the fibre dictionary and the per-iteration coefficient vectors of a
//! COMMIT output directory, then lets the user scan iterations, subdue
//! streamlines outside a weight interval and recolour them by weight or by
//! direction.

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod data;
pub mod histogram;
pub mod render;
pub mod state;
pub mod ui;
pub mod view;

pub use app::CommitViewerApp;
pub use config::{ViewerConfig, load_config};
pub use data::loader::{discover_models, load, parse_model_choice};
pub use data::model::{ConvergenceData, MicrostructureModel};
pub use state::AppState;
pub use view::{ColorMode, ViewerState};
