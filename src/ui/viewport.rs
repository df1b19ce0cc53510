use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use crate::color::{self, WeightColorMap};
use crate::data::filter::WeightBand;
use crate::render::{COLOR_BAR_STOPS, ColorBarLayout};
use crate::state::AppState;

/// Degrees of orbit per dragged pixel.
const ORBIT_SPEED: f32 = 0.4;
const ZOOM_SPEED: f32 = 0.002;
const LINE_WIDTH: f32 = 1.5;

// ---------------------------------------------------------------------------
// Streamline viewport (central panel)
// ---------------------------------------------------------------------------

/// Paint the streamlines and handle orbit / zoom input.
pub fn streamline_view(ui: &mut Ui, state: &mut AppState) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
    let rect = response.rect;
    let size = glam::Vec2::new(rect.width(), rect.height());
    state.viewport = Some((size, ui.ctx().pixels_per_point()));

    if response.dragged() {
        let delta = response.drag_delta();
        state.camera.orbit(-delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            state.camera.zoom((scroll * ZOOM_SPEED).exp());
        }
    }

    painter.rect_filled(rect, 0.0, Color32::BLACK);

    let projector = state.camera.projector(glam::Vec2::new(rect.width(), rect.height()));
    let to_screen = |p: glam::Vec2| Pos2::new(rect.min.x + p.x, rect.min.y + p.y);

    let streamlines = state.viewer.data().streamlines();
    let styles = state.viewer.styles();
    for pass_in_range in [false, true] {
        for (line, style) in streamlines.iter().zip(styles) {
            if (style.band == WeightBand::InRange) != pass_in_range || style.opacity <= 0.0 {
                continue;
            }
            for (pair, &c) in line.points.windows(2).zip(&style.colors) {
                let (Some(a), Some(b)) =
                    (projector.project(pair[0]), projector.project(pair[1]))
                else {
                    continue;
                };
                painter.line_segment(
                    [to_screen(a), to_screen(b)],
                    Stroke::new(LINE_WIDTH, color::with_opacity(c, style.opacity)),
                );
            }
        }
    }

    if state.viewer.show_color_bar() {
        let label = state.viewer.data().model.weight_label();
        color_bar(&painter, rect, &state.viewer.color_map(), label);
    }
}

/// Vertical scalar bar in the right part of the viewport.
fn color_bar(painter: &egui::Painter, viewport: Rect, map: &WeightColorMap, title: &str) {
    let layout = ColorBarLayout::new(glam::Vec2::new(viewport.width(), viewport.height()), 1.0);
    let bar = Rect::from_min_size(
        viewport.min + Vec2::new(layout.min.x, layout.min.y),
        Vec2::new(layout.size.x, layout.size.y),
    );
    for (i, (_, c)) in map.legend_stops(COLOR_BAR_STOPS).into_iter().enumerate() {
        // highest weight at the top
        let (top, step) = layout.step(i);
        painter.rect_filled(
            Rect::from_min_size(
                Pos2::new(bar.min.x, viewport.min.y + top),
                Vec2::new(bar.width(), step + 0.5),
            ),
            0.0,
            c,
        );
    }

    let font = FontId::proportional(12.0);
    painter.text(
        Pos2::new(bar.center().x, bar.min.y - 6.0),
        Align2::CENTER_BOTTOM,
        title,
        font.clone(),
        Color32::WHITE,
    );
    painter.text(
        Pos2::new(bar.max.x + 4.0, bar.min.y),
        Align2::LEFT_CENTER,
        format!("{:.2}", map.max_weight),
        font.clone(),
        Color32::WHITE,
    );
    painter.text(
        Pos2::new(bar.max.x + 4.0, bar.max.y),
        Align2::LEFT_CENTER,
        "0.00",
        font,
        Color32::WHITE,
    );
}
