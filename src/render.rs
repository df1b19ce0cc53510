//! Offscreen rendering of the current view, used for "Save view".

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use glam::Vec2;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

use crate::camera::Camera;
use crate::color::WeightColorMap;
use crate::config::SnapshotConfig;
use crate::data::filter::WeightBand;
use crate::view::ViewerState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Output image size and background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Pixels per UI point, used to size overlays like the colour bar.
    pub scale: f32,
    pub background: [u8; 3],
}

impl RenderOptions {
    /// Match an on-screen viewport of `size` points at `pixels_per_point`.
    pub fn for_viewport(size: Vec2, pixels_per_point: f32, background: [u8; 3]) -> Self {
        let scale = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            pixels_per_point
        } else {
            1.0
        };
        let pixels = (size * scale).round().max(Vec2::ONE);
        Self {
            width: pixels.x as u32,
            height: pixels.y as u32,
            scale,
            background,
        }
    }
}

impl From<&SnapshotConfig> for RenderOptions {
    fn from(cfg: &SnapshotConfig) -> Self {
        Self {
            width: cfg.width.max(1),
            height: cfg.height.max(1),
            scale: 1.0,
            background: cfg.background,
        }
    }
}

// ---------------------------------------------------------------------------
// Colour bar geometry, shared with the on-screen viewport
// ---------------------------------------------------------------------------

/// Gradient steps of the colour bar.
pub const COLOR_BAR_STOPS: usize = 64;

/// Placement of the colour bar inside a frame, in the frame's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBarLayout {
    pub min: Vec2,
    pub size: Vec2,
}

impl ColorBarLayout {
    /// Vertical bar right of centre, half the frame tall. `scale` converts
    /// the fixed margins from points to frame units.
    pub fn new(frame: Vec2, scale: f32) -> Self {
        let height = frame.y * 0.5;
        Self {
            min: Vec2::new(frame.x - 70.0 * scale, (frame.y - height) * 0.5),
            size: Vec2::new(18.0 * scale, height),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Top and height of gradient step `i`, counted from the bottom.
    pub fn step(&self, i: usize) -> (f32, f32) {
        let step = self.size.y / COLOR_BAR_STOPS as f32;
        (self.max().y - step * (i + 1) as f32, step)
    }
}

/// Rasterize every streamline with its current style. Dimmed streamlines
/// are drawn first so in-range ones stay on top. The colour bar is drawn
/// whenever the viewport would show it.
pub fn render_frame(viewer: &ViewerState, camera: &Camera, options: &RenderOptions) -> RgbaImage {
    let [r, g, b] = options.background;
    let mut image = RgbaImage::from_pixel(options.width, options.height, Rgba([r, g, b, 255]));
    let frame = Vec2::new(options.width as f32, options.height as f32);
    let projector = camera.projector(frame);

    let streamlines = viewer.data().streamlines();
    let styles = viewer.styles();
    for pass_in_range in [false, true] {
        for (line, style) in streamlines.iter().zip(styles) {
            if (style.band == WeightBand::InRange) != pass_in_range || style.opacity <= 0.0 {
                continue;
            }
            for (pair, color) in line.points.windows(2).zip(&style.colors) {
                let (Some(a), Some(b)) =
                    (projector.project(pair[0]), projector.project(pair[1]))
                else {
                    continue;
                };
                draw_line(&mut image, a, b, [color.r(), color.g(), color.b()], style.opacity);
            }
        }
    }

    if viewer.show_color_bar() {
        draw_color_bar(&mut image, &viewer.color_map(), &ColorBarLayout::new(frame, options.scale));
    }
    image
}

fn draw_color_bar(image: &mut RgbaImage, map: &WeightColorMap, layout: &ColorBarLayout) {
    let x0 = layout.min.x.max(0.0).round() as u32;
    let x1 = (layout.max().x.round() as u32).min(image.width());
    for (i, (_, c)) in map.legend_stops(COLOR_BAR_STOPS).into_iter().enumerate() {
        let (top, step) = layout.step(i);
        let y0 = top.max(0.0).round() as u32;
        let y1 = ((top + step).round() as u32).min(image.height());
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgba([c.r(), c.g(), c.b(), 255]));
            }
        }
    }
}

/// Alpha-blended DDA line, clipped to the image.
fn draw_line(image: &mut RgbaImage, a: Vec2, b: Vec2, rgb: [u8; 3], opacity: f32) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let Some((a, b)) = clip(a, b, Vec2::ZERO, Vec2::new(w - 1.0, h - 1.0)) else {
        return;
    };
    let steps = (b - a).abs().max_element().ceil().max(1.0) as u32;
    for i in 0..=steps {
        let p = a.lerp(b, i as f32 / steps as f32);
        let (x, y) = (p.x.round() as u32, p.y.round() as u32);
        if x < image.width() && y < image.height() {
            blend_pixel(image.get_pixel_mut(x, y), rgb, opacity);
        }
    }
}

fn blend_pixel(px: &mut Rgba<u8>, rgb: [u8; 3], opacity: f32) {
    for (dst, src) in px.0.iter_mut().zip(rgb) {
        *dst = (src as f32 * opacity + *dst as f32 * (1.0 - opacity)).round() as u8;
    }
    px.0[3] = 255;
}

/// Liang–Barsky clipping of segment `a → b` against `[min, max]`.
fn clip(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }
    (t0 <= t1).then(|| (a + d * t0, a + d * t1))
}

/// Write `image` as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), SnapshotError> {
    let file = File::create(path).map_err(|source| SnapshotError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let encoder = PngEncoder::new(BufWriter::new(file));
    encoder.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)?;
    Ok(())
}

/// `saved_iteration_<label>.png`, or the first free `saved_iteration_<label>(n).png`.
pub fn next_snapshot_path(dir: &Path, label: &str) -> PathBuf {
    let first = dir.join(format!("saved_iteration_{label}.png"));
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|i| dir.join(format!("saved_iteration_{label}({i}).png")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::data::model::{ConvergenceData, IterationWeights, MicrostructureModel, Streamline};
    use glam::Vec3;

    /// Two vertical lines facing the camera: left weight 1.0, right weight 0.1.
    fn viewer() -> (ViewerState, Camera) {
        let streamlines = vec![
            Streamline::new(vec![Vec3::new(0.0, -1.0, -1.0), Vec3::new(0.0, -1.0, 1.0)]),
            Streamline::new(vec![Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.0, 1.0, 1.0)]),
        ];
        let data = ConvergenceData::new(
            MicrostructureModel::Stick,
            streamlines,
            vec![IterationWeights {
                label: "0007".into(),
                weights: vec![1.0, 0.1],
            }],
        )
        .unwrap();
        let camera = Camera::fit(&data.bounds().unwrap());
        (ViewerState::new(data, &ViewConfig::default()), camera)
    }

    fn options() -> RenderOptions {
        RenderOptions {
            width: 64,
            height: 64,
            scale: 1.0,
            background: [0, 0, 0],
        }
    }

    fn lit_columns(image: &RgbaImage) -> Vec<u32> {
        (0..image.width())
            .filter(|&x| (0..image.height()).any(|y| image.get_pixel(x, y).0[..3] != [0, 0, 0]))
            .collect()
    }

    #[test]
    fn test_render_draws_visible_lines() {
        let (mut viewer, camera) = viewer();
        viewer.set_color_mode(1.0);
        let image = render_frame(&viewer, &camera, &options());
        let columns = lit_columns(&image);
        assert!(!columns.is_empty());
        assert!(columns.iter().any(|&x| x < 32) && columns.iter().any(|&x| x >= 32));
    }

    #[test]
    fn test_zero_dimmed_opacity_hides_out_of_range_lines() {
        let (mut viewer, camera) = viewer();
        viewer.set_color_mode(1.0);
        viewer.set_dimmed_opacity(0.0);
        assert!(viewer.set_thresholds(0.5, 1.0));
        let image = render_frame(&viewer, &camera, &options());
        let columns = lit_columns(&image);
        assert!(!columns.is_empty());
        // only one of the two lines remains
        assert!(columns.iter().all(|&x| x < 32) || columns.iter().all(|&x| x >= 32));
    }

    #[test]
    fn test_save_view_writes_png_and_reports_failures() {
        let (viewer, camera) = viewer();
        let dir = tempfile::tempdir().unwrap();
        let path = next_snapshot_path(dir.path(), viewer.current_label());
        assert!(path.ends_with("saved_iteration_0007.png"));
        viewer.save_view(&path, &camera, &options()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let unwritable = dir.path().join("missing").join("x.png");
        let err = viewer.save_view(&unwritable, &camera, &options()).unwrap_err();
        assert!(matches!(err, SnapshotError::Create { .. }));
    }

    #[test]
    fn test_saved_frame_includes_color_bar_while_weight_mapped() {
        let (mut viewer, camera) = viewer();
        let options = RenderOptions {
            width: 200,
            height: 200,
            scale: 1.0,
            background: [0, 0, 0],
        };
        let layout = ColorBarLayout::new(Vec2::new(200.0, 200.0), 1.0);
        let inside = |x: u32, y: u32| {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            p.cmpge(layout.min).all() && p.cmple(layout.max()).all()
        };
        let bar_pixels = |image: &RgbaImage| {
            image
                .enumerate_pixels()
                .filter(|(x, y, px)| inside(*x, *y) && px.0[..3] != [0, 0, 0])
                .count()
        };

        assert!(viewer.show_color_bar());
        let image = render_frame(&viewer, &camera, &options);
        let area = (layout.size.x * layout.size.y) as usize;
        assert!(bar_pixels(&image) > area / 2);
        // top of the bar is the highest weight: pure red with hue span 0
        let top = image.get_pixel(layout.min.x as u32 + 2, layout.min.y as u32 + 1);
        assert_eq!(top.0, [255, 0, 0, 255]);

        viewer.set_color_mode(1.0);
        assert!(!viewer.show_color_bar());
        let image = render_frame(&viewer, &camera, &options);
        assert_eq!(bar_pixels(&image), 0);
    }

    #[test]
    fn test_viewport_options_keep_aspect_and_scale() {
        let options = RenderOptions::for_viewport(Vec2::new(800.0, 450.0), 2.0, [1, 2, 3]);
        assert_eq!((options.width, options.height), (1600, 900));
        assert_eq!(options.scale, 2.0);

        let options = RenderOptions::for_viewport(Vec2::new(0.0, 10.0), f32::NAN, [0; 3]);
        assert_eq!((options.width, options.height), (1, 10));
        assert_eq!(options.scale, 1.0);
    }

    #[test]
    fn test_snapshot_names_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("saved_iteration_0001.png"), b"").unwrap();
        std::fs::write(dir.path().join("saved_iteration_0001(1).png"), b"").unwrap();
        assert_eq!(
            next_snapshot_path(dir.path(), "0001"),
            dir.path().join("saved_iteration_0001(2).png")
        );
        assert_eq!(
            next_snapshot_path(dir.path(), "0002"),
            dir.path().join("saved_iteration_0002.png")
        );
    }

    #[test]
    fn test_clip_rejects_outside_segments() {
        let min = Vec2::ZERO;
        let max = Vec2::splat(10.0);
        assert!(clip(Vec2::new(-5.0, -5.0), Vec2::new(-1.0, 20.0), min, max).is_none());
        let (a, b) = clip(Vec2::new(-5.0, 5.0), Vec2::new(15.0, 5.0), min, max).unwrap();
        assert_eq!(a, Vec2::new(0.0, 5.0));
        assert_eq!(b, Vec2::new(10.0, 5.0));
    }
}
