//! Ray casting primitives used by pointer picking

pub mod collision;

pub use collision::{Aabb, Ray, RayHit};
