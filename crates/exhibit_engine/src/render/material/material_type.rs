//! Surface description shared by every drawable node

use serde::{Deserialize, Serialize};

use crate::foundation::collections::TextureHandle;
use crate::foundation::color::Color;

/// Which faces of a surface are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Front faces only
    #[default]
    Front,
    /// Both faces
    Double,
}

/// Parameterised physically-inspired surface
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Cache key or descriptive name
    pub name: String,
    /// Base colour
    pub color: Color,
    /// Microfacet roughness in `[0, 1]`
    pub roughness: f32,
    /// Metalness in `[0, 1]`
    pub metalness: f32,
    /// Base opacity in `[0, 1]`
    pub opacity: f32,
    /// Blend with what is behind it
    pub transparent: bool,
    /// Emitted colour
    pub emissive: Color,
    /// Emitted colour multiplier
    pub emissive_intensity: f32,
    /// Face culling
    pub side: Side,
    /// Colour texture, if any
    pub texture: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::WHITE,
            roughness: 0.5,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            emissive: Color::BLACK,
            emissive_intensity: 0.0,
            side: Side::Front,
            texture: None,
        }
    }
}

impl Material {
    /// Material with the given name and colour
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            ..Self::default()
        }
    }

    /// Set roughness and metalness
    pub fn with_surface(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness = roughness;
        self.metalness = metalness;
        self
    }

    /// Make the material translucent
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    /// Draw both faces
    pub fn double_sided(mut self) -> Self {
        self.side = Side::Double;
        self
    }

    /// Apply every override that is set
    pub fn apply(&mut self, params: &MaterialParams) {
        if let Some(color) = params.color {
            self.color = color;
        }
        if let Some(roughness) = params.roughness {
            self.roughness = roughness;
        }
        if let Some(metalness) = params.metalness {
            self.metalness = metalness;
        }
        if let Some(opacity) = params.opacity {
            self.opacity = opacity;
        }
        if let Some(transparent) = params.transparent {
            self.transparent = transparent;
        }
        if let Some(emissive) = params.emissive {
            self.emissive = emissive;
        }
        if let Some(intensity) = params.emissive_intensity {
            self.emissive_intensity = intensity;
        }
        if let Some(side) = params.side {
            self.side = side;
        }
    }

    /// Copy of `self` with the overrides applied
    pub fn merged(&self, params: &MaterialParams) -> Self {
        let mut material = self.clone();
        material.apply(params);
        material
    }
}

/// Optional per-field overrides for a material
///
/// Used both for preset overrides and for the per-surface material tables
/// of a hall configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Base colour
    pub color: Option<Color>,
    /// Roughness
    pub roughness: Option<f32>,
    /// Metalness
    pub metalness: Option<f32>,
    /// Opacity
    pub opacity: Option<f32>,
    /// Transparency flag
    pub transparent: Option<bool>,
    /// Emitted colour
    pub emissive: Option<Color>,
    /// Emitted colour multiplier
    pub emissive_intensity: Option<f32>,
    /// Face culling
    pub side: Option<Side>,
}

impl MaterialParams {
    /// Overrides with only the colour set
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Overrides for colour, roughness and metalness
    pub fn surface(color: u32, roughness: f32, metalness: f32) -> Self {
        Self {
            color: Some(Color::from_hex(color)),
            roughness: Some(roughness),
            metalness: Some(metalness),
            ..Self::default()
        }
    }

    /// Add translucency
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self.transparent = Some(opacity < 1.0);
        self
    }

    /// Draw both faces
    pub fn double_sided(mut self) -> Self {
        self.side = Some(Side::Double);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_touch_set_fields() {
        let base = Material::new("frame", Color::from_hex(0x8b7355)).with_surface(0.6, 0.3);
        let merged = base.merged(&MaterialParams {
            metalness: Some(0.9),
            ..MaterialParams::default()
        });
        assert_eq!(merged.color, base.color);
        assert_eq!(merged.roughness, 0.6);
        assert_eq!(merged.metalness, 0.9);
    }

    #[test]
    fn test_opacity_marks_transparent() {
        let params = MaterialParams::surface(0xf0e6d2, 0.2, 0.7).with_opacity(0.9);
        assert_eq!(params.transparent, Some(true));
    }
}
