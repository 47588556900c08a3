//! Light archetypes and parameter records

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::math::{constants::PI, Vec3};

/// Default group for lights that do not name one
pub const DEFAULT_GROUP: &str = "default";

/// Group used for per-artwork spotlights
pub const ARTWORK_GROUP: &str = "artworks";

/// Group holding ambient fill lights of a hall
pub const AMBIENT_GROUP: &str = "ambient";

/// Group holding key (main) lights of a hall
pub const MAIN_GROUP: &str = "main";

/// Type-specific light parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightKind {
    /// Uniform light from every direction
    Ambient,
    /// Parallel rays from `position` toward the target
    Directional,
    /// Omnidirectional light with falloff
    Point {
        /// Range, 0 for unlimited
        distance: f32,
        /// Falloff exponent
        decay: f32,
    },
    /// Cone of light toward the target
    Spot {
        /// Half-angle of the cone in radians
        angle: f32,
        /// Fraction of the cone that is softened
        penumbra: f32,
        /// Range, 0 for unlimited
        distance: f32,
        /// Falloff exponent
        decay: f32,
    },
    /// Sky/ground gradient light
    Hemisphere {
        /// Colour from below
        ground_color: Color,
    },
}

impl LightKind {
    /// Whether this kind can cast shadows at all
    pub const fn supports_shadows(&self) -> bool {
        matches!(self, Self::Directional | Self::Spot { .. } | Self::Point { .. })
    }
}

/// Shadow map parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Shadow map resolution
    pub map_size: u32,
    /// Depth bias
    pub bias: f32,
}

impl ShadowSettings {
    /// Square shadow map with the default bias
    pub const fn new(map_size: u32) -> Self {
        Self { map_size, bias: -0.0001 }
    }
}

/// One light in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Registration key
    pub key: String,
    /// Type and type-specific parameters
    pub kind: LightKind,
    /// Light colour (sky colour for hemisphere lights)
    pub color: Color,
    /// Brightness multiplier
    pub intensity: f32,
    /// World position
    pub position: Vec3,
    /// Point the light aims at, for directional and spot lights
    pub target: Option<Vec3>,
    /// Shadow casting, if enabled
    pub shadow: Option<ShadowSettings>,
    /// Group used for bulk updates
    pub group: String,
}

impl Light {
    /// Bare light of the given kind
    pub fn new(kind: LightKind, color: Color, intensity: f32) -> Self {
        Self {
            key: String::new(),
            kind,
            color,
            intensity,
            position: Vec3::zeros(),
            target: None,
            shadow: None,
            group: DEFAULT_GROUP.to_string(),
        }
    }

    /// Set position
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set aim point
    pub fn aimed_at(mut self, target: Vec3) -> Self {
        self.target = Some(target);
        self
    }

    /// Enable shadows with the given map size
    pub fn with_shadow(mut self, map_size: u32) -> Self {
        self.shadow = Some(ShadowSettings::new(map_size));
        self
    }

    /// Whether the light currently casts shadows
    pub const fn casts_shadow(&self) -> bool {
        self.shadow.is_some()
    }
}

/// Named light archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightPreset {
    /// Soft white ambient
    Ambient,
    /// Key directional light with shadows
    Main,
    /// Warm directional fill
    Fill,
    /// White spotlight with shadows
    Spotlight,
    /// Gold spotlight
    WarmSpotlight,
    /// Sky-blue spotlight
    CoolSpotlight,
    /// Point light
    Point,
    /// Sky/ground gradient
    Hemisphere,
}

impl LightPreset {
    /// Every preset in catalog order
    pub const ALL: [Self; 8] = [
        Self::Ambient,
        Self::Main,
        Self::Fill,
        Self::Spotlight,
        Self::WarmSpotlight,
        Self::CoolSpotlight,
        Self::Point,
        Self::Hemisphere,
    ];

    /// Catalog name
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Main => "main",
            Self::Fill => "fill",
            Self::Spotlight => "spotlight",
            Self::WarmSpotlight => "warm-spotlight",
            Self::CoolSpotlight => "cool-spotlight",
            Self::Point => "point",
            Self::Hemisphere => "hemisphere",
        }
    }

    /// Look a preset up by name; "key" is accepted for the main light and
    /// the bare kind names map onto their basic preset
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "key" | "directional" => Some(Self::Main),
            "spot" => Some(Self::Spotlight),
            _ => Self::ALL.into_iter().find(|preset| preset.key() == name),
        }
    }

    /// Default light for the preset; `shadow_map_size` sizes its shadow map
    pub fn light(self, shadow_map_size: u32) -> Light {
        let spot = |color: u32, intensity: f32, penumbra: f32| {
            Light::new(
                LightKind::Spot {
                    angle: PI / 6.0,
                    penumbra,
                    distance: 10.0,
                    decay: 2.0,
                },
                Color::from_hex(color),
                intensity,
            )
            .at(Vec3::new(0.0, 5.0, 3.0))
            .aimed_at(Vec3::zeros())
        };

        match self {
            Self::Ambient => Light::new(LightKind::Ambient, Color::WHITE, 0.4),
            Self::Main => Light::new(LightKind::Directional, Color::WHITE, 0.8)
                .at(Vec3::new(5.0, 10.0, 5.0))
                .aimed_at(Vec3::zeros())
                .with_shadow(shadow_map_size),
            Self::Fill => Light::new(LightKind::Directional, Color::from_hex(0xffd700), 0.3)
                .at(Vec3::new(-5.0, 5.0, -5.0))
                .aimed_at(Vec3::zeros()),
            Self::Spotlight => spot(0xffffff, 2.0, 0.3).with_shadow(shadow_map_size),
            Self::WarmSpotlight => spot(0xffd700, 1.5, 0.5),
            Self::CoolSpotlight => spot(0x87ceeb, 1.5, 0.5),
            Self::Point => Light::new(LightKind::Point { distance: 10.0, decay: 2.0 }, Color::WHITE, 1.0)
                .at(Vec3::new(0.0, 3.0, 0.0)),
            Self::Hemisphere => Light::new(
                LightKind::Hemisphere {
                    ground_color: Color::from_hex(0x444444),
                },
                Color::WHITE,
                0.5,
            ),
        }
    }
}

/// Request for a light: a preset plus optional overrides
///
/// This is also the light-recipe entry of a hall configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSpec {
    /// Preset name
    pub preset: String,
    /// Colour override
    pub color: Option<Color>,
    /// Intensity override
    pub intensity: Option<f32>,
    /// Position override
    pub position: Option<Vec3>,
    /// Aim point override
    pub target: Option<Vec3>,
    /// Force shadows on or off
    pub cast_shadow: Option<bool>,
    /// Spot cone half-angle override
    pub angle: Option<f32>,
    /// Spot penumbra override
    pub penumbra: Option<f32>,
    /// Range override for point and spot lights
    pub distance: Option<f32>,
    /// Shadow map size override
    pub shadow_map_size: Option<u32>,
    /// Group, "default" when not set
    pub group: Option<String>,
}

impl Default for LightSpec {
    fn default() -> Self {
        Self::preset(LightPreset::Ambient.key())
    }
}

impl LightSpec {
    /// Request for a preset without overrides
    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            preset: name.into(),
            color: None,
            intensity: None,
            position: None,
            target: None,
            cast_shadow: None,
            angle: None,
            penumbra: None,
            distance: None,
            shadow_map_size: None,
            group: None,
        }
    }

    /// Override colour
    pub fn color(mut self, hex: u32) -> Self {
        self.color = Some(Color::from_hex(hex));
        self
    }

    /// Override intensity
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// Override position
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// Override aim point
    pub fn target(mut self, target: Vec3) -> Self {
        self.target = Some(target);
        self
    }

    /// Force shadows on or off
    pub fn shadow(mut self, enabled: bool) -> Self {
        self.cast_shadow = Some(enabled);
        self
    }

    /// Override range
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Override spot cone
    pub fn cone(mut self, angle: f32, penumbra: f32) -> Self {
        self.angle = Some(angle);
        self.penumbra = Some(penumbra);
        self
    }

    /// Override shadow map size
    pub fn shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = Some(size);
        self
    }

    /// Put the light into a group
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Build the light this request describes
    pub fn build(&self, key: &str, default_shadow_map_size: u32) -> Option<Light> {
        let preset = LightPreset::from_name(&self.preset)?;
        let map_size = self.shadow_map_size.unwrap_or(default_shadow_map_size);
        let mut light = preset.light(map_size);

        light.key = key.to_string();
        if let Some(color) = self.color {
            light.color = color;
        }
        if let Some(intensity) = self.intensity {
            light.intensity = intensity;
        }
        if let Some(position) = self.position {
            light.position = position;
        }
        if let Some(target) = self.target {
            light.target = Some(target);
        }
        match self.cast_shadow {
            Some(true) if light.kind.supports_shadows() => light.shadow = Some(ShadowSettings::new(map_size)),
            Some(_) => light.shadow = None,
            None => {}
        }
        match &mut light.kind {
            LightKind::Spot { angle, penumbra, distance, .. } => {
                *angle = self.angle.unwrap_or(*angle);
                *penumbra = self.penumbra.unwrap_or(*penumbra);
                *distance = self.distance.unwrap_or(*distance);
            }
            LightKind::Point { distance, .. } => {
                *distance = self.distance.unwrap_or(*distance);
            }
            _ => {}
        }
        light.group = self.group.clone().unwrap_or_else(|| DEFAULT_GROUP.to_string());

        Some(light)
    }
}
