//! # Rendering-side state
//!
//! Everything the engine keeps about what will be drawn, without drawing it:
//!
//! - [`camera`]: perspective camera and pointer unprojection
//! - [`resources`]: allocation registry for geometries, materials, textures
//! - [`material`]: preset catalog and cached material factory
//! - [`lighting`]: light presets and the light registry
//! - [`backend`]: the seam a rasterizer plugs into
//! - [`orbit`]: damped orbit controller for navigation-less scenes

pub mod backend;
pub mod camera;
pub mod lighting;
pub mod material;
pub mod orbit;
pub mod resources;

pub use backend::{BackendResult, DrawItem, HeadlessBackend, RenderBackend, RenderError, RenderFrame};
pub use camera::Camera;
pub use lighting::{Light, LightKind, LightManager, LightSpec};
pub use material::{Material, MaterialManager, MaterialParams, MaterialPreset};
pub use orbit::OrbitController;
pub use resources::{GeometryKind, ResourceError, ResourceRegistry, ResourceStats};
