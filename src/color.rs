use eframe::egui::Color32;
use glam::Vec3;
use palette::{Hsv, IntoColor, Srgb};

use crate::data::model::Streamline;

/// Colour of a segment whose direction is undefined.
pub const UNDEFINED_DIRECTION: Color32 = Color32::from_rgb(128, 128, 128);

// ---------------------------------------------------------------------------
// Weight colour map: weight → Color32
// ---------------------------------------------------------------------------

/// Lookup table over `[0, max_weight]`.
///
/// Saturation grows with the weight while the hue sweeps `[0, hue_span]`
/// turns, so the default span of 0 runs from white to pure red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightColorMap {
    pub max_weight: f64,
    /// Fraction of the hue circle covered by the scale, in `[0, 1]`.
    pub hue_span: f32,
}

impl WeightColorMap {
    pub fn new(max_weight: f64, hue_span: f32) -> Self {
        Self {
            max_weight,
            hue_span: hue_span.clamp(0.0, 1.0),
        }
    }

    /// Position of `weight` on the scale, in `[0, 1]`.
    pub fn normalize(&self, weight: f64) -> f32 {
        if self.max_weight <= 0.0 {
            return 0.0;
        }
        (weight / self.max_weight).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, weight: f64) -> Color32 {
        let t = self.normalize(weight);
        let hsv = Hsv::new(t * self.hue_span * 360.0, t, 1.0);
        let rgb: Srgb = hsv.into_color();
        Color32::from_rgb(
            (rgb.red * 255.0).round() as u8,
            (rgb.green * 255.0).round() as u8,
            (rgb.blue * 255.0).round() as u8,
        )
    }

    /// `n` evenly spaced (weight, colour) stops for the colour bar, from
    /// lowest to highest.
    pub fn legend_stops(&self, n: usize) -> Vec<(f64, Color32)> {
        if n < 2 {
            return vec![(0.0, self.color_for(0.0))];
        }
        (0..n)
            .map(|i| {
                let w = self.max_weight * i as f64 / (n - 1) as f64;
                (w, self.color_for(w))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Direction encoding: segment tangent → RGB
// ---------------------------------------------------------------------------

/// Map a direction to `|x|, |y|, |z|` as red, green, blue.
pub fn direction_color(direction: Vec3) -> Option<Color32> {
    let unit = direction.try_normalize()?.abs();
    Some(Color32::from_rgb(
        (unit.x * 255.0).round() as u8,
        (unit.y * 255.0).round() as u8,
        (unit.z * 255.0).round() as u8,
    ))
}

/// One colour per segment of `streamline`. Degenerate segments reuse the
/// previous segment's colour.
pub fn direction_colors(streamline: &Streamline) -> Vec<Color32> {
    let mut previous = UNDEFINED_DIRECTION;
    streamline
        .points
        .windows(2)
        .map(|pair| {
            let color = direction_color(pair[1] - pair[0]).unwrap_or(previous);
            previous = color;
            color
        })
        .collect()
}

/// Per-channel linear blend; `t = 0` gives `a`, `t = 1` gives `b`.
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

/// Apply an opacity to an opaque colour.
pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map_runs_white_to_red() {
        let map = WeightColorMap::new(2.0, 0.0);
        assert_eq!(map.color_for(0.0), Color32::WHITE);
        assert_eq!(map.color_for(2.0), Color32::from_rgb(255, 0, 0));
        // out-of-scale weights saturate
        assert_eq!(map.color_for(10.0), Color32::from_rgb(255, 0, 0));
        assert_eq!(map.color_for(-1.0), Color32::WHITE);
    }

    #[test]
    fn test_hue_span_shifts_high_weights() {
        let red = WeightColorMap::new(1.0, 0.0).color_for(1.0);
        let shifted = WeightColorMap::new(1.0, 1.0 / 3.0).color_for(1.0);
        assert_ne!(red, shifted);
        assert_eq!(shifted, Color32::from_rgb(0, 255, 0));
    }

    #[test]
    fn test_zero_max_weight_is_safe() {
        let map = WeightColorMap::new(0.0, 0.5);
        assert_eq!(map.normalize(3.0), 0.0);
        assert_eq!(map.legend_stops(3).len(), 3);
    }

    #[test]
    fn test_direction_colors_per_segment() {
        let s = Streamline::new(vec![
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(-2.0, 3.0, 0.0),
        ]);
        let colors = direction_colors(&s);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], UNDEFINED_DIRECTION);
        assert_eq!(colors[1], Color32::from_rgb(255, 0, 0));
        assert_eq!(colors[2], Color32::from_rgb(0, 255, 0));
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Color32::from_rgb(0, 100, 200);
        let b = Color32::from_rgb(200, 100, 0);
        assert_eq!(blend(a, b, 0.0), a);
        assert_eq!(blend(a, b, 1.0), b);
        assert_eq!(blend(a, b, 0.5), Color32::from_rgb(100, 100, 100));
    }
}
