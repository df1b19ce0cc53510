//! Viewer configuration.
//!
//! Settings are read from an optional TOML file: the path given with
//! `--config`, or `commit-viewer.toml` in the working directory. Every key
//! is optional.
//!
//! ```toml
//! [view]
//! dimmed_opacity = 0.5   # opacity of streamlines outside the interval
//! hue_span = 0.0         # 0 = white→red colour map
//! color_blend = 0.0      # 0 = weight colours, 1 = direction colours
//!
//! [histogram]
//! bins = 50
//!
//! [cylinder]
//! radius_min_um = 0.75
//! radius_max_um = 3.5
//! atoms = 12
//!
//! [camera]               # omit to fit the camera to the data
//! position = [-176.42, 118.52, 128.20]
//! focal_point = [113.30, 100.0, 76.56]
//! view_up = [0.18, 0.0, 0.98]
//!
//! [window]
//! width = 1200.0
//! height = 900.0
//!
//! [snapshot]
//! directory = "."
//! width = 1200
//! height = 900
//! background = [0, 0, 0]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "commit-viewer.toml";

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Initial control positions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub dimmed_opacity: f32,
    pub hue_span: f32,
    pub color_blend: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            dimmed_opacity: 0.5,
            hue_span: 0.0,
            color_blend: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistogramConfig {
    pub bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { bins: 50 }
    }
}

/// Radii of the intra-axonal cylinder atoms used to turn coefficients into
/// diameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CylinderConfig {
    pub radius_min_um: f64,
    pub radius_max_um: f64,
    pub atoms: usize,
}

impl Default for CylinderConfig {
    fn default() -> Self {
        Self {
            radius_min_um: 0.75,
            radius_max_um: 3.5,
            atoms: 12,
        }
    }
}

impl CylinderConfig {
    /// Atom radii in metres, evenly spaced like `np.linspace`.
    pub fn radii_m(&self) -> Vec<f64> {
        match self.atoms {
            0 => Vec::new(),
            1 => vec![self.radius_min_um * 1e-6],
            n => {
                let step = (self.radius_max_um - self.radius_min_um) / (n - 1) as f64;
                (0..n)
                    .map(|i| (self.radius_min_um + step * i as f64) * 1e-6)
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub focal_point: [f32; 3],
    pub view_up: [f32; 3],
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 900.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    pub directory: PathBuf,
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            width: 1200,
            height: 900,
            background: [0, 0, 0],
        }
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub view: ViewConfig,
    pub histogram: HistogramConfig,
    pub cylinder: CylinderConfig,
    pub camera: Option<CameraConfig>,
    pub window: WindowConfig,
    pub snapshot: SnapshotConfig,
}

impl ViewerConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.histogram.bins == 0 {
            return Err(ConfigError::InvalidValue {
                key: "histogram.bins",
                reason: "must be at least 1".into(),
            });
        }
        if self.cylinder.atoms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cylinder.atoms",
                reason: "must be at least 1".into(),
            });
        }
        let cylinder = &self.cylinder;
        if !(cylinder.radius_min_um > 0.0 && cylinder.radius_min_um <= cylinder.radius_max_um) {
            return Err(ConfigError::InvalidValue {
                key: "cylinder.radius_min_um",
                reason: "radii must be positive and ordered".into(),
            });
        }
        if self.snapshot.width == 0 || self.snapshot.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "snapshot",
                reason: "image size must be non-zero".into(),
            });
        }
        Ok(())
    }
}

/// Load the configuration from `explicit`, else from [`CONFIG_FILE_NAME`] in
/// the working directory, else fall back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ViewerConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = PathBuf::from(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(ViewerConfig::default());
            }
            candidate
        }
    };
    let text = fs::read_to_string(&path)?;
    let config = ViewerConfig::from_toml(&text)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}
