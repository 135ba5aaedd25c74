//! Orbit camera
//!
//! Yaw/pitch/distance around a look-at target. Projection goes through a
//! right-handed view-projection matrix onto the viewport rectangle. Drag
//! input feeds angular velocities that decay by the damping factor each
//! frame. Auto-rotation only runs while the user is not manipulating the
//! view.

use egui::{Pos2, Rect, Vec2};
use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

/// Radians per pixel of drag
const ORBIT_SPEED: f32 = 0.005;
/// Keep the eye off the poles so the up vector stays defined
const PITCH_LIMIT: f32 = 1.5;
const NEAR: f32 = 0.01;
const FAR: f32 = 1000.0;

/// Where a world point lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub pos: Pos2,
    /// Distance along the view direction
    pub depth: f32,
    /// Screen pixels per world unit at this depth
    pub pixels_per_unit: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    fov_y: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    pub auto_rotate: bool,
    /// Orbit-control units; one unit is a full turn per minute
    pub auto_rotate_speed: f32,
    interacting: bool,
}

impl OrbitCamera {
    /// Camera at `eye` looking at `target` with a vertical fov in degrees
    pub fn looking_at(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(1e-3);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self {
            target,
            yaw,
            pitch,
            distance,
            fov_y: fov_deg.to_radians(),
            min_distance: 0.5,
            max_distance: 500.0,
            damping: 0.1,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            auto_rotate: false,
            auto_rotate_speed: 0.1,
            interacting: false,
        }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(1e-3);
        self.max_distance = max.max(self.min_distance);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self
    }

    pub fn with_auto_rotate(mut self, enabled: bool, speed: f32) -> Self {
        self.auto_rotate = enabled;
        self.auto_rotate_speed = speed;
        self
    }

    #[cfg(test)]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the look-at point, keeping angles and distance
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, NEAR, FAR) * self.view_matrix()
    }

    /// Pixels per world unit at unit depth
    fn focal_length(&self, rect: Rect) -> f32 {
        rect.height() * 0.5 / (self.fov_y * 0.5).tan()
    }

    /// Project a world point into `rect`; `None` if it is behind the eye
    pub fn project(&self, p: Vec3, rect: Rect) -> Option<Projected> {
        self.projector(rect)(p)
    }

    /// Projector with the matrix computed once, for bulk use
    pub fn projector(&self, rect: Rect) -> impl Fn(Vec3) -> Option<Projected> {
        let aspect = rect.width() / rect.height().max(1.0);
        let vp = self.view_projection_matrix(aspect);
        let focal = self.focal_length(rect);
        let center = rect.center();
        let half = rect.size() * 0.5;
        move |p| {
            let clip: Vec4 = vp * p.extend(1.0);
            // perspective_rh puts the view-space depth in w
            if clip.w <= NEAR {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            Some(Projected {
                pos: Pos2::new(center.x + ndc.x * half.x, center.y - ndc.y * half.y),
                depth: clip.w,
                pixels_per_unit: focal / clip.w,
            })
        }
    }

    /// Drag to orbit
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw_velocity = -delta.x * ORBIT_SPEED;
        self.pitch_velocity = delta.y * ORBIT_SPEED;
    }

    /// Drag to move the target in the view plane
    pub fn pan(&mut self, delta: Vec2, rect: Rect) {
        let forward = (self.target - self.eye()).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        let world_per_pixel = self.distance / self.focal_length(rect);
        self.target += right * (-delta.x * world_per_pixel) + up * (delta.y * world_per_pixel);
    }

    /// Scroll to zoom; positive scroll moves closer
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.002))
            .clamp(self.min_distance, self.max_distance);
    }

    /// Multiplicative zoom; factors above 1 move closer
    pub fn zoom_by(&mut self, factor: f32) {
        if factor > 0.0 {
            self.distance = (self.distance / factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Marks whether the user is currently dragging
    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    /// Advance one frame; returns true while the camera is still moving
    pub fn update(&mut self, dt: f32) -> bool {
        self.yaw += self.yaw_velocity;
        self.pitch = (self.pitch + self.pitch_velocity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let decay = 1.0 - self.damping;
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        if self.yaw_velocity.abs() < 1e-5 {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < 1e-5 {
            self.pitch_velocity = 0.0;
        }

        let rotating = self.auto_rotate && !self.interacting;
        if rotating {
            self.yaw += TAU / 60.0 * self.auto_rotate_speed * dt;
        }
        rotating || self.yaw_velocity != 0.0 || self.pitch_velocity != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    fn front_camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vec3::new(0.0, 0.0, 15.0), Vec3::ZERO, 45.0)
    }

    #[test]
    fn test_target_projects_to_center() {
        let p = front_camera().project(Vec3::ZERO, viewport()).unwrap();
        assert!((p.pos.x - 400.0).abs() < 1e-3);
        assert!((p.pos.y - 300.0).abs() < 1e-3);
        assert!((p.depth - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_axes_orientation() {
        let cam = front_camera();
        let right = cam.project(Vec3::X, viewport()).unwrap();
        let up = cam.project(Vec3::Y, viewport()).unwrap();
        assert!(right.pos.x > 400.0);
        assert!(up.pos.y < 300.0);
    }

    #[test]
    fn test_unit_offset_matches_pixels_per_unit() {
        let cam = front_camera();
        let right = cam.project(Vec3::X, viewport()).unwrap();
        assert!((right.pos.x - 400.0 - right.pixels_per_unit).abs() < 1e-2);
    }

    #[test]
    fn test_points_behind_eye_are_culled() {
        assert!(front_camera().project(Vec3::new(0.0, 0.0, 20.0), viewport()).is_none());
    }

    #[test]
    fn test_eye_round_trips_from_looking_at() {
        let cam = OrbitCamera::looking_at(Vec3::new(3.0, 4.0, 12.0), Vec3::ONE, 45.0);
        assert!(cam.eye().abs_diff_eq(Vec3::new(3.0, 4.0, 12.0), 1e-4));
    }

    #[test]
    fn test_zoom_and_pitch_are_clamped() {
        let mut cam = front_camera().with_distance_limits(1.0, 20.0).with_damping(1.0);
        for _ in 0..1000 {
            cam.zoom(100.0);
        }
        assert_eq!(cam.distance, 1.0);
        cam.zoom_by(0.5);
        assert_eq!(cam.distance, 2.0);
        cam.zoom_by(0.0);
        assert_eq!(cam.distance, 2.0);
        cam.orbit(Vec2::new(0.0, 10_000.0));
        cam.update(0.016);
        assert!(cam.pitch <= PITCH_LIMIT);
    }

    #[test]
    fn test_auto_rotate_pauses_while_interacting() {
        let mut cam = front_camera().with_auto_rotate(true, 0.1);
        let yaw = cam.yaw;
        cam.set_interacting(true);
        assert!(!cam.update(1.0));
        assert_eq!(cam.yaw, yaw);
        cam.set_interacting(false);
        assert!(cam.update(1.0));
        assert!(cam.yaw > yaw);
    }

    #[test]
    fn test_set_target_recenters_projection() {
        let mut cam = front_camera();
        cam.set_target(Vec3::new(2.0, 1.0, 0.0));
        let p = cam.project(Vec3::new(2.0, 1.0, 0.0), viewport()).unwrap();
        assert!((p.pos.x - 400.0).abs() < 1e-3);
        assert!((p.pos.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_pan_moves_target_in_view_plane() {
        let mut cam = front_camera();
        cam.pan(Vec2::new(-100.0, 0.0), viewport());
        assert!(cam.target.x > 0.0);
        assert!(cam.target.z.abs() < 1e-4);
    }
}
