//! Scene lighting: light archetypes and the light registry

pub mod light;
pub mod manager;

pub use light::{Light, LightKind, LightPreset, LightSpec, ShadowSettings};
pub use manager::{LightManager, LightStats, LightUpdate, SceneMood};
