//! Narrow-phase ray tests for pointer picking
//!
//! Nodes are tested as oriented boxes: the ray is moved into the node's local
//! space with the inverse world matrix and tested against the geometry's
//! local bounds. The ray parameter is preserved by that transform, so hit
//! distances from different nodes stay comparable.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Point3, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized by [`Ray::new`])
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Move the ray through `matrix` without renormalising the direction
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point(&Point3::from(self.origin)).coords,
            direction: matrix.transform_vector(&self.direction),
        }
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The node that was hit
    pub node: NodeId,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box centred on the origin with the given half extents
    pub fn from_half_extents(half: Vec3) -> Self {
        Self { min: -half, max: half }
    }

    /// Slab test; returns the nearest non-negative ray parameter
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            if direction.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Test a world-space ray against this box placed by `world`
    pub fn intersect_oriented(&self, ray: &Ray, world: &Mat4) -> Option<f32> {
        let inverse = world.try_inverse()?;
        self.intersect_ray(&ray.transformed(&inverse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_hits_box_in_front() {
        let aabb = Aabb::from_half_extents(Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(aabb.intersect_ray(&ray).unwrap_or(-1.0), 4.0);
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let aabb = Aabb::from_half_extents(Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_oriented_box_distance_is_world_distance() {
        // Thin plane rotated to face +X and scaled up, sitting at x = -4
        let aabb = Aabb::from_half_extents(Vec3::new(0.5, 0.5, 0.01));
        let world = Transform::from_position(Vec3::new(-4.0, 0.0, 0.0))
            .with_yaw(std::f32::consts::FRAC_PI_2)
            .with_uniform_scale(2.0)
            .to_matrix();
        let ray = Ray::new(Vec3::zeros(), Vec3::new(-1.0, 0.0, 0.0));
        let t = aabb.intersect_oriented(&ray, &world).unwrap_or(-1.0);
        assert_relative_eq!(t, 3.98, epsilon = 1e-4);
    }
}
