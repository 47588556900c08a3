//! # 3D Camera
//!
//! Perspective camera described by a position and a look-at target. The
//! navigation system drives it through yaw/pitch, transition animations move
//! the position and target directly, and picking unprojects pointer
//! coordinates through it.
//!
//! ## Coordinate System
//! Right-handed, Y-up. At zero yaw and pitch the camera looks down -Z.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::physics::collision::Ray;

/// 3D Camera for perspective projection
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Field of view angle in radians
    pub fov: f32,

    /// Aspect ratio (width / height) for projection calculations
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space, keeping the target
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update camera target (look-at point)
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// Move the camera and keep its viewing direction
    pub fn translate_to(&mut self, position: Vec3) {
        let offset = self.target - self.position;
        self.position = position;
        self.target = position + offset;
    }

    /// Update camera aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Unit vector from the position toward the target
    pub fn forward(&self) -> Vec3 {
        let direction = self.target - self.position;
        if direction.norm_squared() < f32::EPSILON {
            return Vec3::new(0.0, 0.0, -1.0);
        }
        direction.normalize()
    }

    /// Unit vector to the camera's right
    pub fn right(&self) -> Vec3 {
        self.forward().cross(&self.up).normalize()
    }

    /// Yaw (about +Y) and pitch (about the camera's X axis) of the view
    /// direction, in radians
    pub fn yaw_pitch(&self) -> (f32, f32) {
        let forward = self.forward();
        let pitch = forward.y.clamp(-1.0, 1.0).asin();
        let yaw = (-forward.x).atan2(-forward.z);
        (yaw, pitch)
    }

    /// Point the camera along the direction given by yaw and pitch,
    /// keeping the target at the same distance
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        let distance = (self.target - self.position).norm().max(1.0);
        let direction = Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        self.target = self.position + direction * distance;
    }

    /// Generate view matrix for world-to-camera space transformation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Generate perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Generate combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Convert normalized device coordinates to a world-space ray
    ///
    /// `ndc_x` runs left to right and `ndc_y` bottom to top, both in `[-1, 1]`.
    /// Returns `None` if the view-projection matrix is degenerate.
    pub fn screen_to_world_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inv_view_proj = self.view_projection_matrix().try_inverse()?;

        let unproject = |depth: f32| {
            let h = inv_view_proj * Vec4::new(ndc_x, ndc_y, depth, 1.0);
            Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w)
        };
        let world_near = unproject(-1.0);
        let world_far = unproject(1.0);

        Some(Ray::new(self.position, world_far - world_near))
    }
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self::perspective(Vec3::new(0.0, 2.0, 5.0), 75.0, 16.0 / 9.0, 1.0, 1000.0);
        camera.target = Vec3::zeros();
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn assert_vec3_approx_eq(a: Vec3, b: Vec3) {
        assert!((a.x - b.x).abs() < EPSILON, "X mismatch: {} != {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPSILON, "Y mismatch: {} != {}", a.y, b.y);
        assert!((a.z - b.z).abs() < EPSILON, "Z mismatch: {} != {}", a.z, b.z);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 2.0, 10.0), 75.0, 1.5, 1.0, 1000.0);
        camera.set_target(Vec3::new(0.0, 2.0, 0.0));
        let ray = camera.screen_to_world_ray(0.0, 0.0).expect("invertible");
        assert_vec3_approx_eq(ray.direction, Vec3::new(0.0, 0.0, -1.0));
        assert_vec3_approx_eq(ray.origin, camera.position);
    }

    #[test]
    fn test_right_edge_ray_leans_right() {
        let mut camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 1.0, 100.0);
        camera.set_target(Vec3::new(0.0, 0.0, -1.0));
        let ray = camera.screen_to_world_ray(1.0, 0.0).expect("invertible");
        assert!(ray.direction.x > 0.0);
        assert_relative_eq!(ray.direction.x, -ray.direction.z, epsilon = EPSILON);
    }

    #[test]
    fn test_yaw_pitch_round_trip() {
        let mut camera = Camera::default();
        camera.set_yaw_pitch(0.7, -0.3);
        let (yaw, pitch) = camera.yaw_pitch();
        assert_relative_eq!(yaw, 0.7, epsilon = EPSILON);
        assert_relative_eq!(pitch, -0.3, epsilon = EPSILON);
    }

    #[test]
    fn test_translate_keeps_direction() {
        let mut camera = Camera::default();
        let before = camera.forward();
        camera.translate_to(Vec3::new(3.0, 1.0, -2.0));
        assert_vec3_approx_eq(camera.forward(), before);
    }
}
