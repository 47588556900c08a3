//! Materials and the material cache

pub mod material_type;
pub mod manager;

pub use manager::{MaterialManager, MaterialPreset, MaterialStats};
pub use material_type::{Material, MaterialParams, Side};
