//! # Hall Configuration
//!
//! Everything that distinguishes one hall from another is data: size,
//! surface materials, the light recipe, where the camera starts, what hangs
//! on the walls and which area builders run. The same record is used by the
//! built-in catalog and by hall files loaded through [`Config`].

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::error::HallError;
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::render::lighting::LightSpec;
use crate::render::material::MaterialParams;

/// Artist credited when an artwork names none
pub const DEFAULT_ARTIST: &str = "Huang Binhong";

/// Overrides for the three hall-owned surfaces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceMaterials {
    /// Outer walls and partitions
    pub wall: MaterialParams,
    /// Floor
    pub floor: MaterialParams,
    /// Ceiling
    pub ceiling: MaterialParams,
}

/// Camera pose a hall starts from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    /// Eye position
    pub position: Vec3,
    /// Look-at point
    pub target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::zeros(),
        }
    }
}

/// One painting on display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Catalog id, unique within the hall
    pub id: String,
    /// Title
    pub title: String,
    /// Artist
    pub artist: String,
    /// Year or range
    pub year: String,
    /// Popup text
    pub description: String,
    /// Image reference of the canvas
    pub image_url: Option<String>,
    /// Area id the painting belongs to
    pub area: Option<String>,
    /// Explicit placement; laid out along the walls when absent
    pub position: Option<Vec3>,
    /// Rotation around Y in radians
    pub rotation_y: f32,
    /// Canvas width
    pub width: f32,
    /// Canvas height
    pub height: f32,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            artist: DEFAULT_ARTIST.to_string(),
            year: String::new(),
            description: String::new(),
            image_url: None,
            area: None,
            position: None,
            rotation_y: 0.0,
            width: 2.0,
            height: 2.0,
        }
    }
}

/// Thematic area inside a hall
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    /// Area id
    pub id: String,
    /// Display name
    pub name: String,
    /// Year range covered
    pub year: String,
    /// Free text
    pub description: String,
    /// Centre used for membership queries
    pub center: Vec3,
}

/// Positioned block of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoPanelConfig {
    /// Node name suffix, unique within the hall
    pub id: String,
    /// Heading
    pub title: String,
    /// Body; newlines separate paragraphs
    pub body: String,
    /// Panel centre
    pub position: Vec3,
    /// Rotation around Y in radians
    pub rotation_y: f32,
    /// Panel width
    pub width: f32,
    /// Panel height
    pub height: f32,
}

impl Default for InfoPanelConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            body: String::new(),
            position: Vec3::zeros(),
            rotation_y: 0.0,
            width: 3.0,
            height: 2.0,
        }
    }
}

/// Pillar leading to another hall
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntranceMarkerConfig {
    /// Hall id the marker leads to
    pub destination: String,
    /// Caption
    pub label: String,
    /// Ground position of the pillar
    pub position: Vec3,
}

/// Free-standing wall slab
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionWallConfig {
    /// Centre along X
    pub x: f32,
    /// Centre along Z
    pub z: f32,
    /// Thickness along X
    pub width: f32,
    /// Height; the slab stands on the floor
    pub height: f32,
    /// Extent along Z
    pub depth: f32,
}

impl Default for PartitionWallConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            z: 0.0,
            width: 0.3,
            height: 12.0,
            depth: 10.0,
        }
    }
}

/// Framed feature panel such as a panorama or a final-work display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturePanelConfig {
    /// Node name prefix
    pub name: String,
    /// Heading shown in the popup
    pub title: String,
    /// Popup text
    pub description: String,
    /// Panel centre
    pub position: Vec3,
    /// Rotation around Y in radians
    pub rotation_y: f32,
    /// Panel width
    pub width: f32,
    /// Panel height
    pub height: f32,
    /// Panel colour
    pub panel_color: Color,
    /// Frame colour
    pub frame_color: Color,
}

impl Default for FeaturePanelConfig {
    fn default() -> Self {
        Self {
            name: "panorama".into(),
            title: String::new(),
            description: String::new(),
            position: Vec3::zeros(),
            rotation_y: 0.0,
            width: 4.0,
            height: 3.0,
            panel_color: Color::from_hex(0x9c8b6e),
            frame_color: Color::from_hex(0xffd700),
        }
    }
}

/// Achievement panel of the closing hall
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementConfig {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
    /// Panel centre
    pub position: Vec3,
    /// Rotation around Y in radians
    pub rotation_y: f32,
}

/// Area builder selected by data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaBuilderSpec {
    /// Frames and canvases for every configured artwork
    WallGallery,
    /// One spotlight per artwork
    ArtworkSpotlights,
    /// Free-standing partitions
    PartitionWalls(Vec<PartitionWallConfig>),
    /// Framed feature panel
    Panorama(FeaturePanelConfig),
    /// Central platform, achievement panels and their lights
    AchievementDisplays(Vec<AchievementConfig>),
}

/// # Hall Configuration
///
/// Complete description of one hall. Lengths are in metres; the floor is
/// centred on the origin with the long side along Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HallConfig {
    /// Hall id used by `switch_scene`
    pub id: String,
    /// Display name
    pub name: String,
    /// Free text
    pub description: String,
    /// Extent along X
    pub width: f32,
    /// Extent along Z
    pub length: f32,
    /// Ceiling height
    pub height: f32,
    /// Outer wall thickness
    pub wall_thickness: f32,
    /// Draw a helper grid on the floor
    pub show_grid: bool,
    /// Surface material overrides
    pub materials: SurfaceMaterials,
    /// Light recipe; empty means the default ambient, main and fill lights
    pub lighting: Vec<LightSpec>,
    /// Camera pose once the hall is ready
    pub camera: CameraPose,
    /// Offset of the intro start position from `camera.position`
    pub entrance_offset: Vec3,
    /// Play the intro on activation
    pub enable_intro: bool,
    /// Intro length in seconds
    pub intro_duration: f32,
    /// Paintings
    pub artworks: Vec<ArtworkConfig>,
    /// Thematic areas
    pub areas: Vec<AreaConfig>,
    /// Text panels
    pub info_panels: Vec<InfoPanelConfig>,
    /// Links to other halls
    pub entrance_markers: Vec<EntranceMarkerConfig>,
    /// Area builders, run in order
    pub builders: Vec<AreaBuilderSpec>,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            width: 20.0,
            length: 30.0,
            height: 8.0,
            wall_thickness: 0.2,
            show_grid: false,
            materials: SurfaceMaterials::default(),
            lighting: Vec::new(),
            camera: CameraPose::default(),
            entrance_offset: Vec3::new(0.0, 0.0, 5.0),
            enable_intro: true,
            intro_duration: 1.5,
            artworks: Vec::new(),
            areas: Vec::new(),
            info_panels: Vec::new(),
            entrance_markers: Vec::new(),
            builders: Vec::new(),
        }
    }
}

impl HallConfig {
    /// Create a hall of the given size
    pub fn new(id: impl Into<String>, width: f32, length: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            width,
            length,
            height,
            ..Self::default()
        }
    }

    /// Set the display name and description
    pub fn with_name(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    /// Set the starting camera pose
    pub fn with_camera(mut self, position: Vec3, target: Vec3) -> Self {
        self.camera = CameraPose { position, target };
        self
    }

    /// Enable or disable the intro
    pub fn with_intro(mut self, enabled: bool, duration: f32) -> Self {
        self.enable_intro = enabled;
        self.intro_duration = duration;
        self
    }

    /// Append an area builder
    pub fn with_builder(mut self, builder: AreaBuilderSpec) -> Self {
        self.builders.push(builder);
        self
    }

    /// Where the intro camera flight starts
    pub fn intro_start(&self) -> Vec3 {
        self.camera.position + self.entrance_offset
    }

    /// Check the record for inconsistencies
    pub fn check(&self) -> Result<(), HallError> {
        if self.id.is_empty() {
            return Err(HallError::InvalidConfig("hall id must not be empty".into()));
        }
        if self.width <= 0.0 || self.length <= 0.0 || self.height <= 0.0 {
            return Err(HallError::InvalidConfig(format!(
                "hall '{}' has non-positive size {}x{}x{}",
                self.id, self.width, self.length, self.height
            )));
        }
        if self.intro_duration < 0.0 {
            return Err(HallError::InvalidConfig(format!(
                "hall '{}' has a negative intro duration",
                self.id
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for artwork in &self.artworks {
            if artwork.id.is_empty() || !seen.insert(artwork.id.as_str()) {
                return Err(HallError::InvalidConfig(format!(
                    "hall '{}' has a missing or duplicate artwork id '{}'",
                    self.id, artwork.id
                )));
            }
            if artwork.width <= 0.0 || artwork.height <= 0.0 {
                return Err(HallError::InvalidConfig(format!(
                    "artwork '{}' has a non-positive size",
                    artwork.id
                )));
            }
        }
        for marker in &self.entrance_markers {
            if marker.destination.is_empty() {
                return Err(HallError::InvalidConfig(format!(
                    "hall '{}' has an entrance marker without destination",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

impl Config for HallConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = HallConfig::from_ron_str(
            r#"(
                id: "annex",
                width: 12.0,
                length: 18.0,
                artworks: [(id: "a1", title: "Study", image_url: Some("/images/study.jpg"))],
                builders: [WallGallery, PartitionWalls([(x: 2.0, z: 0.0)])],
            )"#,
        )
        .expect("valid hall");

        assert_eq!(config.height, 8.0);
        assert_relative_eq!(config.intro_duration, 1.5);
        assert_eq!(config.artworks[0].artist, DEFAULT_ARTIST);
        assert_eq!(config.artworks[0].width, 2.0);
        assert_eq!(
            config.builders[1],
            AreaBuilderSpec::PartitionWalls(vec![PartitionWallConfig {
                x: 2.0,
                ..PartitionWallConfig::default()
            }])
        );
    }

    #[test]
    fn test_duplicate_artwork_ids_rejected() {
        let mut config = HallConfig::new("dup", 10.0, 10.0, 5.0);
        config.artworks = vec![
            ArtworkConfig {
                id: "1".into(),
                ..ArtworkConfig::default()
            },
            ArtworkConfig {
                id: "1".into(),
                ..ArtworkConfig::default()
            },
        ];
        assert!(matches!(config.check(), Err(HallError::InvalidConfig(_))));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_intro_start_applies_offset() {
        let config = HallConfig::new("h", 10.0, 10.0, 5.0).with_camera(Vec3::new(0.0, 4.0, -30.0), Vec3::zeros());
        assert_relative_eq!(config.intro_start(), Vec3::new(0.0, 4.0, -25.0));
    }

    #[test]
    fn test_empty_size_rejected() {
        let config = HallConfig::new("flat", 10.0, 0.0, 5.0);
        assert!(config.check().is_err());
    }
}
