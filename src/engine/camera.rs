// Follow camera for a single controlled character.
//
// Camera model:
//   - Third person: the eye trails a fixed offset above and behind the
//     character, scaled by a zoom factor, and looks at a point at chest height.
//   - First person: the eye sits at the character's head and looks along
//     (yaw, pitch), both of which ease towards mouse-driven targets.
//   - Mouse wheel zooms the third-person offset; mouse motion steers the
//     first-person look angles while the pointer is locked.
//
// All "per frame" smoothing factors are tuned for 60 Hz and converted with
// `damp` so that slower or faster frame rates converge at the same speed.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec2, Vec3};
use serde::Deserialize;

use super::picking::Ray;

/// Convert a smoothing factor tuned for one 60 Hz frame into the factor for `dt`.
pub fn damp(rate_per_frame: f32, dt: f32) -> f32 {
    let rate = rate_per_frame.clamp(0.0, 1.0);
    1.0 - (1.0 - rate).powf(dt.max(0.0) * 60.0)
}

/// Unit look vector for a yaw (0 = +Z) and pitch (positive = looking down).
///
/// Pitch tilts about the view's own right axis, so looking up or down works
/// the same at any yaw. Tilting about world X instead would roll the view
/// sideways once the player has turned.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(yaw.sin() * pitch.cos(), -pitch.sin(), yaw.cos() * pitch.cos())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(6.0, 6.0, 8.0),
            target: Vec3::ZERO,
            fov_deg: 45.0,
            near: 0.05,
            far: 200.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space ray through a point in window pixels (origin top-left).
    pub fn screen_ray(&self, cursor: Vec2, viewport: Vec2) -> Ray {
        let aspect = if viewport.y > 0.0 { viewport.x / viewport.y } else { 1.0 };
        let ndc = Vec2::new(
            2.0 * cursor.x / viewport.x.max(1.0) - 1.0,
            1.0 - 2.0 * cursor.y / viewport.y.max(1.0),
        );
        let inv = self.view_projection(aspect).inverse();
        // wgpu clip space depth runs 0..1
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

/// Third-person follow tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThirdPersonRig {
    /// Eye offset from the character at zoom 1
    pub offset: Vec3,
    /// Height of the look-at point above the ground
    pub target_height: f32,
    pub follow_smoothing: f32,
    pub fov_deg: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom change per scroll line (a browser wheel notch is ~100 px at 0.001/px)
    pub zoom_per_line: f32,
}

impl Default for ThirdPersonRig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(6.0, 6.0, 8.0),
            target_height: 1.8,
            follow_smoothing: 0.08,
            fov_deg: 45.0,
            min_zoom: 0.4,
            max_zoom: 2.5,
            zoom_per_line: 0.1,
        }
    }
}

/// First-person tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirstPersonRig {
    /// Head position relative to the character origin
    pub head_offset: Vec3,
    pub look_distance: f32,
    pub fov_deg: f32,
    pub look_smoothing: f32,
    pub position_smoothing: f32,
    pub pitch_limit: f32,
    /// Radians per pixel of mouse motion at sensitivity 50
    pub mouse_sensitivity: f32,
}

impl Default for FirstPersonRig {
    fn default() -> Self {
        Self {
            head_offset: Vec3::new(0.0, 1.6, 0.0),
            look_distance: 2.0,
            fov_deg: 45.0,
            look_smoothing: 0.06,
            position_smoothing: 0.12,
            pitch_limit: 1.2,
            mouse_sensitivity: 0.002,
        }
    }
}

/// Current and target look angles for first person.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
}

impl LookAngles {
    /// Mouse right turns right (yaw decreases), mouse down looks down.
    pub fn apply_mouse(&mut self, dx: f32, dy: f32, radians_per_px: f32, pitch_limit: f32) {
        self.target_yaw -= dx * radians_per_px;
        self.target_pitch = (self.target_pitch + dy * radians_per_px).clamp(-pitch_limit, pitch_limit);
    }

    pub fn ease(&mut self, factor: f32) {
        self.yaw += (self.target_yaw - self.yaw) * factor;
        self.pitch += (self.target_pitch - self.pitch) * factor;
    }
}

#[derive(Resource, Debug, Clone)]
pub struct CameraRig {
    pub camera: Camera,
    pub zoom: f32,
    pub look: LookAngles,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self { camera: Camera::default(), zoom: 1.0, look: LookAngles::default() }
    }
}

impl CameraRig {
    /// Scroll up (positive lines) zooms in.
    pub fn apply_scroll(&mut self, lines: f32, rig: &ThirdPersonRig) {
        self.zoom = (self.zoom - lines * rig.zoom_per_line).clamp(rig.min_zoom, rig.max_zoom);
    }

    pub fn follow_third_person(&mut self, player: Vec3, rig: &ThirdPersonRig, dt: f32) {
        let offset = rig.offset * self.zoom;
        let desired = Vec3::new(player.x + offset.x, offset.y, player.z + offset.z);
        self.camera.eye = self.camera.eye.lerp(desired, damp(rig.follow_smoothing, dt));
        self.camera.target = Vec3::new(player.x, rig.target_height, player.z);
        self.camera.fov_deg = rig.fov_deg;
    }

    pub fn follow_first_person(&mut self, player: Vec3, rig: &FirstPersonRig, dt: f32) {
        self.look.ease(damp(rig.look_smoothing, dt));
        let head = player + rig.head_offset;
        self.camera.eye = self.camera.eye.lerp(head, damp(rig.position_smoothing, dt));
        self.camera.target = head + look_direction(self.look.yaw, self.look.pitch) * rig.look_distance;
        self.camera.fov_deg = rig.fov_deg;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damp_matches_rate_at_60hz() {
        assert!((damp(0.08, 1.0 / 60.0) - 0.08).abs() < 1e-5);
        assert_eq!(damp(0.5, 0.0), 0.0);
        // Two half-length frames converge as far as one full frame.
        let half = damp(0.2, 1.0 / 120.0);
        let two = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((two - 0.2).abs() < 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let rig = ThirdPersonRig::default();
        let mut cam = CameraRig::default();
        cam.apply_scroll(-100.0, &rig);
        assert_eq!(cam.zoom, 2.5);
        cam.apply_scroll(100.0, &rig);
        assert_eq!(cam.zoom, 0.4);
        cam.zoom = 1.0;
        cam.apply_scroll(1.0, &rig);
        assert!((cam.zoom - 0.9).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut look = LookAngles::default();
        look.apply_mouse(0.0, 10_000.0, 0.002, 1.2);
        assert_eq!(look.target_pitch, 1.2);
        look.apply_mouse(100.0, -20_000.0, 0.002, 1.2);
        assert_eq!(look.target_pitch, -1.2);
        assert!((look.target_yaw + 0.2).abs() < 1e-6);
    }

    #[test]
    fn third_person_converges_on_offset() {
        let rig = ThirdPersonRig::default();
        let mut cam = CameraRig::default();
        let player = Vec3::new(2.0, 0.0, -1.0);
        for _ in 0..600 {
            cam.follow_third_person(player, &rig, 1.0 / 60.0);
        }
        assert!((cam.camera.eye - Vec3::new(8.0, 6.0, 7.0)).length() < 1e-3);
        assert_eq!(cam.camera.target, Vec3::new(2.0, 1.8, -1.0));
    }

    #[test]
    fn first_person_looks_along_yaw() {
        let rig = FirstPersonRig::default();
        let mut cam = CameraRig::default();
        cam.look.target_yaw = std::f32::consts::FRAC_PI_2;
        for _ in 0..600 {
            cam.follow_first_person(Vec3::ZERO, &rig, 1.0 / 60.0);
        }
        let head = Vec3::new(0.0, 1.6, 0.0);
        assert!((cam.camera.eye - head).length() < 1e-3);
        let dir = (cam.camera.target - cam.camera.eye).normalize();
        assert!((dir - Vec3::X).length() < 1e-3);
    }

    #[test]
    fn pitch_tilts_about_the_view_right_axis() {
        use std::f32::consts::FRAC_PI_2;
        let down = look_direction(FRAC_PI_2, 0.5);
        assert!((down - Vec3::new(0.5f32.cos(), -0.5f32.sin(), 0.0)).length() < 1e-6);
        // The right axis stays horizontal, so the tilt never leaks into Z.
        let right = Vec3::new(-FRAC_PI_2.cos(), 0.0, FRAC_PI_2.sin());
        assert!(down.dot(right).abs() < 1e-6);
        assert!((look_direction(0.3, 0.0).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn centre_ray_points_at_target() {
        let cam = Camera::default();
        let ray = cam.screen_ray(Vec2::new(640.0, 360.0), Vec2::new(1280.0, 720.0));
        let expected = (cam.target - cam.eye).normalize();
        assert!((ray.direction - expected).length() < 1e-3);
    }
}
