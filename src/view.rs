use std::path::Path;

use eframe::egui::Color32;

use crate::camera::Camera;
use crate::color::{self, WeightColorMap};
use crate::config::ViewConfig;
use crate::data::filter::{ThresholdInterval, WeightBand};
use crate::data::model::ConvergenceData;
use crate::histogram::Histogram;
use crate::render::{self, RenderOptions, SnapshotError};

// ---------------------------------------------------------------------------
// Colour mode
// ---------------------------------------------------------------------------

/// Interpretation of the colour-mode control position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMode {
    WeightMapped,
    DirectionEncoded,
    /// Linear blend; the value is the direction share in `(0, 1)`.
    Blend(f32),
}

impl ColorMode {
    pub fn from_position(position: f32) -> Self {
        let p = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        if p <= 0.0 {
            ColorMode::WeightMapped
        } else if p >= 1.0 {
            ColorMode::DirectionEncoded
        } else {
            ColorMode::Blend(p)
        }
    }

    /// Direction share of the final colour.
    pub fn direction_share(self) -> f32 {
        match self {
            ColorMode::WeightMapped => 0.0,
            ColorMode::DirectionEncoded => 1.0,
            ColorMode::Blend(t) => t,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived per-streamline attributes
// ---------------------------------------------------------------------------

/// Visual attributes of one streamline at the current view state.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamlineStyle {
    pub weight: f64,
    pub band: WeightBand,
    pub opacity: f32,
    /// Opaque colour per segment.
    pub colors: Vec<Color32>,
}

// ---------------------------------------------------------------------------
// ViewerState – the interactive view model
// ---------------------------------------------------------------------------

/// Owns the loaded data and the current view configuration, and keeps the
/// derived styles in sync with every control change.
pub struct ViewerState {
    data: ConvergenceData,
    /// Direction colours per streamline; they never change.
    direction_colors: Vec<Vec<Color32>>,

    current_iteration: usize,
    thresholds: ThresholdInterval,
    color_mode: ColorMode,
    dimmed_opacity: f32,
    hue_span: f32,

    styles: Vec<StreamlineStyle>,
    in_range: usize,
}

impl ViewerState {
    /// Start at iteration 0 with the full `[0, max_weight]` interval.
    pub fn new(data: ConvergenceData, defaults: &ViewConfig) -> Self {
        let direction_colors = data.streamlines().iter().map(color::direction_colors).collect();
        let thresholds =
            ThresholdInterval::new(0.0, data.max_weight()).unwrap_or(ThresholdInterval::ZERO);
        let mut state = Self {
            data,
            direction_colors,
            current_iteration: 0,
            thresholds,
            color_mode: ColorMode::from_position(defaults.color_blend),
            dimmed_opacity: clamp_unit(defaults.dimmed_opacity),
            hue_span: clamp_unit(defaults.hue_span),
            styles: Vec::new(),
            in_range: 0,
        };
        state.recompute_all();
        state
    }

    // -- accessors --

    pub fn data(&self) -> &ConvergenceData {
        &self.data
    }

    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    pub fn max_iteration(&self) -> usize {
        self.data.max_iteration()
    }

    pub fn current_label(&self) -> &str {
        self.data.label_at(self.current_iteration)
    }

    pub fn lower_threshold(&self) -> f64 {
        self.thresholds.lower()
    }

    pub fn upper_threshold(&self) -> f64 {
        self.thresholds.upper()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn dimmed_opacity(&self) -> f32 {
        self.dimmed_opacity
    }

    pub fn hue_span(&self) -> f32 {
        self.hue_span
    }

    pub fn styles(&self) -> &[StreamlineStyle] {
        &self.styles
    }

    pub fn color_map(&self) -> WeightColorMap {
        WeightColorMap::new(self.data.max_weight(), self.hue_span)
    }

    /// The scalar bar is only meaningful while weight colours dominate.
    pub fn show_color_bar(&self) -> bool {
        self.color_mode.direction_share() <= 0.5
    }

    // -- operations --

    /// Select an iteration; out-of-range values clamp to `[0, max_iteration]`.
    pub fn set_iteration(&mut self, iteration: i64) {
        let max = self.max_iteration() as i64;
        self.current_iteration = iteration.clamp(0, max) as usize;
        self.recompute_all();
    }

    /// Replace both bounds. Non-finite or inverted bounds are ignored and the
    /// previous interval is kept; returns whether the update was applied.
    pub fn set_thresholds(&mut self, lower: f64, upper: f64) -> bool {
        match ThresholdInterval::new(lower, upper) {
            Some(t) => {
                self.thresholds = t;
                self.recompute_bands();
                true
            }
            None => {
                log::debug!("ignoring threshold update [{lower}, {upper}]");
                false
            }
        }
    }

    pub fn set_lower_threshold(&mut self, lower: f64) -> bool {
        self.set_thresholds(lower, self.thresholds.upper())
    }

    pub fn set_upper_threshold(&mut self, upper: f64) -> bool {
        self.set_thresholds(self.thresholds.lower(), upper)
    }

    /// `0` = weight-mapped, `1` = direction-encoded, blended in between.
    pub fn set_color_mode(&mut self, position: f32) {
        self.color_mode = ColorMode::from_position(position);
        self.recompute_colors();
    }

    /// Opacity of streamlines outside the interval, clamped to `[0, 1]`.
    pub fn set_dimmed_opacity(&mut self, opacity: f32) {
        self.dimmed_opacity = clamp_unit(opacity);
        self.recompute_bands();
    }

    /// Hue span of the weight colour map, clamped to `[0, 1]`.
    pub fn set_hue_span(&mut self, span: f32) {
        self.hue_span = clamp_unit(span);
        self.recompute_colors();
    }

    /// Streamlines whose current weight lies in `[lower, upper]`.
    pub fn count_in_range(&self) -> usize {
        self.in_range
    }

    /// Distribution of the current iteration's weights over `[0, max_weight]`.
    pub fn histogram(&self, bins: usize) -> Histogram {
        Histogram::new(
            self.data.weights_at(self.current_iteration),
            0.0,
            self.data.max_weight(),
            bins,
        )
    }

    /// Render the current frame offscreen and write it as a PNG.
    pub fn save_view(
        &self,
        path: &Path,
        camera: &Camera,
        options: &RenderOptions,
    ) -> Result<(), SnapshotError> {
        let image = render::render_frame(self, camera, options);
        render::save_png(&image, path)?;
        log::info!("Saved view of iteration {} to {}", self.current_label(), path.display());
        Ok(())
    }

    // -- recomputation --

    fn recompute_all(&mut self) {
        let weights = self.data.weights_at(self.current_iteration);
        self.styles = weights
            .iter()
            .map(|&weight| StreamlineStyle {
                weight,
                band: WeightBand::InRange,
                opacity: 1.0,
                colors: Vec::new(),
            })
            .collect();
        self.recompute_bands();
        self.recompute_colors();
    }

    fn recompute_bands(&mut self) {
        let mut in_range = 0;
        for style in &mut self.styles {
            style.band = self.thresholds.classify(style.weight);
            style.opacity = if style.band == WeightBand::InRange {
                in_range += 1;
                1.0
            } else {
                self.dimmed_opacity
            };
        }
        self.in_range = in_range;
    }

    fn recompute_colors(&mut self) {
        let map = self.color_map();
        let share = self.color_mode.direction_share();
        for (style, directions) in self.styles.iter_mut().zip(&self.direction_colors) {
            let weight_color = map.color_for(style.weight);
            style.colors = directions
                .iter()
                .map(|&d| color::blend(weight_color, d, share))
                .collect();
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
