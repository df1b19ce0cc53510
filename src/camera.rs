use glam::{Mat4, Quat, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::data::model::Bounds;

/// Vertical field of view, matching VTK's default view angle.
pub const DEFAULT_FOV_Y_DEG: f32 = 30.0;

const MIN_DISTANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
// Camera – position / focal point / view-up, orbiting around the focal point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub focal_point: Vec3,
    pub view_up: Vec3,
    pub fov_y_deg: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -10.0, 0.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Z,
            fov_y_deg: DEFAULT_FOV_Y_DEG,
        }
    }
}

impl Camera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        let mut camera = Self {
            position: Vec3::from(cfg.position),
            focal_point: Vec3::from(cfg.focal_point),
            view_up: Vec3::from(cfg.view_up).try_normalize().unwrap_or(Vec3::Z),
            fov_y_deg: DEFAULT_FOV_Y_DEG,
        };
        camera.orthogonalize_view_up();
        camera
    }

    /// Frame the whole bounding box, looking along +x with z up.
    pub fn fit(bounds: &Bounds) -> Self {
        let radius = (bounds.extent() * 0.5).max(MIN_DISTANCE);
        let half_fov = (DEFAULT_FOV_Y_DEG * 0.5).to_radians();
        let distance = radius / half_fov.sin();
        let focal_point = bounds.center();
        Self {
            position: focal_point - Vec3::X * distance,
            focal_point,
            view_up: Vec3::Z,
            fov_y_deg: DEFAULT_FOV_Y_DEG,
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.focal_point).length()
    }

    /// Unit vector from the camera towards the focal point.
    fn direction(&self) -> Vec3 {
        (self.focal_point - self.position).try_normalize().unwrap_or(Vec3::Y)
    }

    fn right(&self) -> Vec3 {
        self.direction()
            .cross(self.view_up)
            .try_normalize()
            .unwrap_or_else(|| self.direction().any_orthonormal_vector())
    }

    fn orthogonalize_view_up(&mut self) {
        self.view_up = self.right().cross(self.direction()).normalize();
    }

    /// Rotate around the focal point: `azimuth_deg` about the view-up axis,
    /// `elevation_deg` about the camera's right axis.
    pub fn orbit(&mut self, azimuth_deg: f32, elevation_deg: f32) {
        let offset = self.position - self.focal_point;
        let yaw = Quat::from_axis_angle(self.view_up, -azimuth_deg.to_radians());
        let pitch = Quat::from_axis_angle(self.right(), elevation_deg.to_radians());
        let rotation = pitch * yaw;
        self.position = self.focal_point + rotation * offset;
        self.view_up = (rotation * self.view_up).normalize();
        self.orthogonalize_view_up();
    }

    /// Move towards (`factor > 1`) or away from the focal point.
    pub fn zoom(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let distance = (self.distance() / factor).max(MIN_DISTANCE);
        self.position = self.focal_point - self.direction() * distance;
    }

    /// Projection for a viewport of `size` pixels.
    pub fn projector(&self, size: Vec2) -> Projector {
        let distance = self.distance().max(MIN_DISTANCE);
        let near = distance * 0.01;
        let far = distance * 100.0;
        let aspect = if size.y > 0.0 { size.x / size.y } else { 1.0 };
        Projector {
            view: Mat4::look_at_rh(self.position, self.focal_point, self.view_up),
            projection: Mat4::perspective_rh(
                self.fov_y_deg.to_radians(),
                aspect.max(1e-3),
                near,
                far,
            ),
            near,
            size,
        }
    }
}

/// World → pixel mapping for one frame. Pixel `(0, 0)` is the top-left.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    view: Mat4,
    projection: Mat4,
    near: f32,
    size: Vec2,
}

impl Projector {
    /// `None` for points behind the near plane.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let eye = self.view.transform_point3(point);
        if eye.z > -self.near {
            return None;
        }
        let ndc = self.projection.project_point3(eye);
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.size.x,
            (1.0 - ndc.y) * 0.5 * self.size.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds {
        Bounds {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }
    }

    #[test]
    fn test_fit_projects_center_to_viewport_center() {
        let camera = Camera::fit(&unit_box());
        let p = camera.projector(Vec2::new(200.0, 100.0)).project(Vec3::ZERO).unwrap();
        assert!((p - Vec2::new(100.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn test_up_is_up_on_screen() {
        let camera = Camera::fit(&unit_box());
        let proj = camera.projector(Vec2::new(100.0, 100.0));
        let top = proj.project(Vec3::new(0.0, 0.0, 0.5)).unwrap();
        let center = proj.project(Vec3::ZERO).unwrap();
        assert!(top.y < center.y);
    }

    #[test]
    fn test_points_behind_camera_are_culled() {
        let camera = Camera::fit(&unit_box());
        let behind = camera.position - Vec3::X * 5.0;
        assert!(camera.projector(Vec2::splat(100.0)).project(behind).is_none());
    }

    #[test]
    fn test_orbit_keeps_distance_and_zoom_changes_it() {
        let mut camera = Camera::fit(&unit_box());
        let d = camera.distance();
        camera.orbit(35.0, -20.0);
        assert!((camera.distance() - d).abs() < 1e-3);
        assert!(camera.view_up.dot(camera.focal_point - camera.position).abs() < 1e-3);

        camera.zoom(2.0);
        assert!((camera.distance() - d / 2.0).abs() < 1e-3);
        camera.zoom(0.0);
        assert!((camera.distance() - d / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_from_config_orthogonalizes_view_up() {
        let camera = Camera::from_config(&CameraConfig {
            position: [-176.42, 118.52, 128.20],
            focal_point: [113.30, 100.0, 76.56],
            view_up: [0.18, 0.0, 0.98],
        });
        let dir = (camera.focal_point - camera.position).normalize();
        assert!(camera.view_up.dot(dir).abs() < 1e-4);
        assert!((camera.view_up.length() - 1.0).abs() < 1e-4);
    }
}
