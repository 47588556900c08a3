//! Orbit camera controller
//!
//! Used when first-person navigation is disabled. Pointer drags accumulate
//! a pending rotation around the target that is released gradually, a
//! `damping_factor` share per tick, so the camera glides to rest.

use crate::core::config::OrbitConfig;
use crate::foundation::math::Vec3;
use crate::render::camera::Camera;

/// Damped orbit around the camera target
#[derive(Debug, Clone)]
pub struct OrbitController {
    config: OrbitConfig,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
    enabled: bool,
}

impl OrbitController {
    /// Radians of rotation per pixel of drag
    const ROTATE_SPEED: f32 = 0.005;

    /// Create a controller
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 0.0,
            enabled: true,
        }
    }

    /// Enable or disable input handling
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            self.pending_zoom = 0.0;
        }
    }

    /// Whether the controller reacts to input
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue a rotation from a pointer drag in pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if self.enabled {
            self.pending_azimuth -= dx * Self::ROTATE_SPEED;
            self.pending_polar -= dy * Self::ROTATE_SPEED;
        }
    }

    /// Queue a distance change; positive moves away from the target
    pub fn zoom(&mut self, delta: f32) {
        if self.enabled {
            self.pending_zoom += delta;
        }
    }

    /// Release part of the pending motion into the camera
    pub fn update(&mut self, camera: &mut Camera) {
        if !self.enabled {
            return;
        }
        let damping = self.config.damping_factor.clamp(0.0, 1.0);
        let azimuth_step = self.pending_azimuth * damping;
        let polar_step = self.pending_polar * damping;
        let zoom_step = self.pending_zoom * damping;
        self.pending_azimuth -= azimuth_step;
        self.pending_polar -= polar_step;
        self.pending_zoom -= zoom_step;

        let offset = camera.position - camera.target;
        let radius = offset.norm();
        if radius < f32::EPSILON {
            return;
        }

        // Polar angle measured from +Y
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let mut azimuth = offset.x.atan2(offset.z);
        azimuth += azimuth_step;
        polar = (polar + polar_step).clamp(0.01, self.config.max_polar_angle);
        let radius = (radius + zoom_step).clamp(self.config.min_distance, self.config.max_distance);

        let new_offset = Vec3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );
        camera.position = camera.target + new_offset;
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_is_clamped() {
        let mut controller = OrbitController::default();
        let mut camera = Camera::default();
        controller.zoom(500.0);
        for _ in 0..500 {
            controller.update(&mut camera);
        }
        assert_relative_eq!((camera.position - camera.target).norm(), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_camera_stays_above_target_plane() {
        let mut controller = OrbitController::default();
        let mut camera = Camera::default();
        controller.rotate(0.0, -10_000.0);
        for _ in 0..500 {
            controller.update(&mut camera);
        }
        assert!(camera.position.y >= camera.target.y - 1e-4);
    }

    #[test]
    fn test_disabled_controller_ignores_input() {
        let mut controller = OrbitController::default();
        controller.set_enabled(false);
        let mut camera = Camera::default();
        let before = camera.position;
        controller.rotate(100.0, 0.0);
        controller.update(&mut camera);
        assert_eq!(camera.position, before);
    }
}
