//! Area builders
//!
//! Halls differ in more than their tables: one has partition walls, another
//! a panorama, the closing hall has no paintings at all. Those differences
//! are small strategies plugged into the hall's construction steps. Each
//! hook has an empty default, so a builder only implements the steps it
//! contributes to.

use crate::error::HallError;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{constants::PI, Quat, Transform, Vec3};
use crate::hall::build::{panel_tag, HallBuildContext};
use crate::hall::config::{AchievementConfig, AreaBuilderSpec, FeaturePanelConfig, PartitionWallConfig};
use crate::navigation::Obstacle;
use crate::render::lighting::LightSpec;
use crate::render::material::{MaterialParams, MaterialPreset};
use crate::render::resources::GeometryKind;
use crate::scene::context::EngineContext;
use crate::scene::node::{AchievementInfo, NodeFlags, NodeTag};

/// Distance kept clear at both ends of a wall gallery
const GALLERY_END_MARGIN: f32 = 8.0;

/// Gap between a wall and the frames hung on it
const GALLERY_WALL_GAP: f32 = 0.15;

/// Light group of the closing hall's spot lights
pub const ACHIEVEMENT_GROUP: &str = "achievements";

/// Strategy contributing to one or more hall construction steps
pub trait AreaBuilder {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Whether this builder is responsible for the artwork step
    fn places_artworks(&self) -> bool {
        false
    }

    /// Extra structure after floor, walls and ceiling
    fn build_structure(&mut self, _hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        Ok(())
    }

    /// Hang or place the exhibits
    fn place_artworks(&mut self, _hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        Ok(())
    }

    /// Lights beyond the hall's light recipe
    fn configure_lights(&mut self, _hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        Ok(())
    }

    /// Pickable areas and navigation hints
    fn configure_interaction(&mut self, _hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        Ok(())
    }

    /// Per-tick animation of builder-owned decoration
    fn update(&mut self, _engine: &mut EngineContext, _dt: f32) {}
}

/// Instantiate the builder a spec names
pub fn from_spec(spec: &AreaBuilderSpec) -> Box<dyn AreaBuilder> {
    match spec {
        AreaBuilderSpec::WallGallery => Box::new(WallGallery),
        AreaBuilderSpec::ArtworkSpotlights => Box::new(ArtworkSpotlights),
        AreaBuilderSpec::PartitionWalls(walls) => Box::new(PartitionWalls::new(walls.clone())),
        AreaBuilderSpec::Panorama(panel) => Box::new(Panorama::new(panel.clone())),
        AreaBuilderSpec::AchievementDisplays(items) => Box::new(AchievementDisplays::new(items.clone())),
    }
}

// ===== Wall gallery =====

/// Hangs every configured artwork.
///
/// Artworks with an explicit position are hung there; the rest alternate
/// between the left and right long walls, evenly spaced along Z and facing
/// into the hall.
#[derive(Debug, Default)]
pub struct WallGallery;

impl WallGallery {
    /// Wall slots for `count` artworks in a hall of the given size
    pub fn layout(width: f32, length: f32, height: f32, count: usize) -> Vec<(Vec3, f32)> {
        let per_side = count.div_ceil(2).max(1);
        let usable = (length - 2.0 * GALLERY_END_MARGIN).max(length * 0.5);
        let spacing = usable / per_side as f32;
        let start = -usable * 0.5;
        let y = (height * 0.5).min(3.0);
        let x = width * 0.5 - GALLERY_WALL_GAP;

        (0..count)
            .map(|index| {
                let slot = index / 2;
                let z = start + (slot as f32 + 0.5) * spacing;
                if index % 2 == 0 {
                    (Vec3::new(-x, y, z), PI / 2.0)
                } else {
                    (Vec3::new(x, y, z), -PI / 2.0)
                }
            })
            .collect()
    }
}

impl AreaBuilder for WallGallery {
    fn name(&self) -> &'static str {
        "wall-gallery"
    }

    fn places_artworks(&self) -> bool {
        true
    }

    fn place_artworks(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let config = hall.config;
        let unplaced = config.artworks.iter().filter(|a| a.position.is_none()).count();
        let mut slots = Self::layout(config.width, config.length, config.height, unplaced).into_iter();

        for artwork in &config.artworks {
            let (position, rotation_y) = match artwork.position {
                Some(position) => (position, artwork.rotation_y),
                None => slots
                    .next()
                    .ok_or_else(|| HallError::Build(format!("no wall slot left for artwork '{}'", artwork.id)))?,
            };
            hall.hang_artwork(artwork, position, rotation_y)?;
        }
        log::debug!("Hung {} artworks in '{}'", config.artworks.len(), config.id);
        Ok(())
    }
}

// ===== Artwork spotlights =====

/// One spotlight per hung artwork, above and in front of it
#[derive(Debug, Default)]
pub struct ArtworkSpotlights;

impl AreaBuilder for ArtworkSpotlights {
    fn name(&self) -> &'static str {
        "artwork-spotlights"
    }

    fn configure_lights(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let placements: Vec<(String, Vec3, Vec3)> = hall
            .contents()
            .artworks()
            .iter()
            .map(|artwork| {
                let light = artwork.position + artwork.facing() * 2.0 + Vec3::new(0.0, 3.0, 0.0);
                (artwork.info.id.clone(), light, artwork.position)
            })
            .collect();
        for (id, position, target) in placements {
            hall.add_artwork_spotlight(&id, position, target)?;
        }
        Ok(())
    }
}

// ===== Partition walls =====

/// Free-standing wall slabs, recorded as navigation obstacles
#[derive(Debug)]
pub struct PartitionWalls {
    walls: Vec<PartitionWallConfig>,
}

impl PartitionWalls {
    /// Builder for the given slabs
    pub fn new(walls: Vec<PartitionWallConfig>) -> Self {
        Self { walls }
    }
}

impl AreaBuilder for PartitionWalls {
    fn name(&self) -> &'static str {
        "partition-walls"
    }

    fn build_structure(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let material = hall.owned_material(MaterialPreset::Wall, &MaterialParams::surface(0xf5f5f5, 0.9, 0.1));
        for (index, wall) in self.walls.iter().enumerate() {
            hall.add_mesh(
                format!("partition-{index}"),
                GeometryKind::Box {
                    width: wall.width,
                    height: wall.height,
                    depth: wall.depth,
                },
                material,
                Transform::from_position(Vec3::new(wall.x, wall.height * 0.5, wall.z)),
                NodeFlags::CAST_SHADOW | NodeFlags::RECEIVE_SHADOW,
            );
        }
        Ok(())
    }

    fn configure_interaction(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        if let Some(navigation) = hall.engine.navigation.as_mut() {
            for wall in &self.walls {
                navigation.add_obstacle(Obstacle {
                    x: wall.x,
                    z: wall.z,
                    radius: wall.width.max(wall.depth) * 0.5,
                });
            }
        }
        Ok(())
    }
}

// ===== Feature panel =====

/// Framed feature panel with popup text
#[derive(Debug)]
pub struct Panorama {
    panel: FeaturePanelConfig,
}

impl Panorama {
    /// Builder for one panel
    pub fn new(panel: FeaturePanelConfig) -> Self {
        Self { panel }
    }
}

impl AreaBuilder for Panorama {
    fn name(&self) -> &'static str {
        "panorama"
    }

    fn build_structure(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let panel = &self.panel;
        let facing = Vec3::new(panel.rotation_y.sin(), 0.0, panel.rotation_y.cos());

        let frame_material = hall.owned_material(
            MaterialPreset::GildedFrame,
            &MaterialParams {
                color: Some(panel.frame_color),
                ..MaterialParams::default()
            },
        );
        hall.add_mesh(
            format!("{}-frame", panel.name),
            GeometryKind::Box {
                width: panel.width + 0.2,
                height: panel.height + 0.2,
                depth: 0.1,
            },
            frame_material,
            Transform::from_position(panel.position - facing * 0.05).with_yaw(panel.rotation_y),
            NodeFlags::CAST_SHADOW,
        );

        let panel_material = hall.owned_material(
            MaterialPreset::Canvas,
            &MaterialParams {
                color: Some(panel.panel_color),
                roughness: Some(0.7),
                metalness: Some(0.2),
                ..MaterialParams::default()
            },
        );
        let node = hall.add_mesh(
            format!("{}-panel", panel.name),
            GeometryKind::Plane {
                width: panel.width,
                height: panel.height,
            },
            panel_material,
            Transform::from_position(panel.position).with_yaw(panel.rotation_y),
            NodeFlags::RECEIVE_SHADOW,
        );
        if let Some(scene_node) = hall.engine.graph.get_mut(node) {
            scene_node.tag = panel_tag(&panel.title, &panel.description);
        }
        hall.register_interactable(node);
        Ok(())
    }
}

// ===== Achievement displays =====

/// Closing-hall layout: a central platform and monument, achievement
/// panels and their spot lights. Claims the artwork step without hanging
/// anything.
#[derive(Debug)]
pub struct AchievementDisplays {
    items: Vec<AchievementConfig>,
    monument_top: Option<NodeId>,
    spin: f32,
}

impl AchievementDisplays {
    /// Radians per second the monument top turns
    const SPIN_SPEED: f32 = 0.2;

    /// Builder for the given panels
    pub fn new(items: Vec<AchievementConfig>) -> Self {
        Self {
            items,
            monument_top: None,
            spin: 0.0,
        }
    }
}

impl AreaBuilder for AchievementDisplays {
    fn name(&self) -> &'static str {
        "achievement-displays"
    }

    fn places_artworks(&self) -> bool {
        true
    }

    fn build_structure(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let stone = hall.owned_material(MaterialPreset::WallDark, &MaterialParams::surface(0x8b7355, 0.6, 0.3));
        hall.add_mesh(
            "central-platform",
            GeometryKind::Cylinder {
                radius_top: 8.0,
                radius_bottom: 9.0,
                height: 0.5,
            },
            stone,
            Transform::from_position(Vec3::new(0.0, 0.25, 0.0)),
            NodeFlags::RECEIVE_SHADOW,
        );
        hall.add_mesh(
            "central-monument",
            GeometryKind::Box {
                width: 3.0,
                height: 5.0,
                depth: 3.0,
            },
            stone,
            Transform::from_position(Vec3::new(0.0, 2.5, 0.0)),
            NodeFlags::CAST_SHADOW | NodeFlags::RECEIVE_SHADOW,
        );
        let gold = hall.shared_preset(MaterialPreset::GildedFrame);
        self.monument_top = Some(hall.add_mesh(
            "central-top",
            GeometryKind::Cylinder {
                radius_top: 0.0,
                radius_bottom: 2.0,
                height: 1.0,
            },
            gold,
            Transform::from_position(Vec3::new(0.0, 6.0, 0.0)),
            NodeFlags::CAST_SHADOW,
        ));
        Ok(())
    }

    fn place_artworks(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        log::info!("'{}' has no artworks; placing achievement displays", hall.config.id);
        let gold = hall.shared_preset(MaterialPreset::GildedFrame);

        for (index, item) in self.items.iter().enumerate() {
            let facing = Vec3::new(item.rotation_y.sin(), 0.0, item.rotation_y.cos());
            hall.add_mesh(
                format!("achievement-frame-{index}"),
                GeometryKind::Box {
                    width: 4.2,
                    height: 3.2,
                    depth: 0.1,
                },
                gold,
                Transform::from_position(item.position - facing * 0.06).with_yaw(item.rotation_y),
                NodeFlags::CAST_SHADOW,
            );
            let text = format!("{}\n{}", item.title, item.description);
            let panel = hall.text_panel(
                format!("achievement-{index}"),
                (4.0, 3.0),
                0x5c3030,
                Transform::from_position(item.position).with_yaw(item.rotation_y),
                NodeTag::Achievement(AchievementInfo {
                    title: item.title.clone(),
                    description: item.description.clone(),
                }),
                &text,
            );
            hall.register_interactable(panel);
        }
        Ok(())
    }

    fn configure_lights(&mut self, hall: &mut HallBuildContext<'_>) -> Result<(), HallError> {
        let spot = |color: u32, intensity: f32, position: Vec3, target: Vec3| {
            LightSpec::preset("warm-spotlight")
                .color(color)
                .intensity(intensity)
                .position(position)
                .target(target)
                .cone(PI / 6.0, 0.5)
                .distance(30.0)
                .group(ACHIEVEMENT_GROUP)
        };
        hall.add_light(
            "central-spot",
            &spot(0xffd700, 2.0, Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 3.0, 0.0)).shadow(true),
        )?;
        hall.add_light(
            "left-spot",
            &spot(0xffffff, 1.5, Vec3::new(-15.0, 8.0, 0.0), Vec3::new(-20.0, 4.0, 0.0)),
        )?;
        hall.add_light(
            "right-spot",
            &spot(0xffffff, 1.5, Vec3::new(15.0, 8.0, 0.0), Vec3::new(20.0, 4.0, 0.0)),
        )?;
        hall.add_light(
            "thanks-spot",
            &spot(0xfff8e1, 1.2, Vec3::new(0.0, 8.0, 10.0), Vec3::new(0.0, 3.0, 15.0)),
        )?;
        Ok(())
    }

    fn update(&mut self, engine: &mut EngineContext, dt: f32) {
        let Some(top) = self.monument_top else {
            return;
        };
        self.spin = (self.spin + Self::SPIN_SPEED * dt) % (2.0 * PI);
        if let Some(node) = engine.graph.get_mut(top) {
            node.transform.rotation = Quat::from_axis_angle(&Vec3::y_axis(), self.spin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_alternates_walls() {
        let slots = WallGallery::layout(16.0, 80.0, 12.0, 9);
        assert_eq!(slots.len(), 9);
        assert!(slots[0].0.x < 0.0);
        assert!(slots[1].0.x > 0.0);
        assert_relative_eq!(slots[0].1, PI / 2.0);
        assert_relative_eq!(slots[1].1, -PI / 2.0);
        assert_relative_eq!(slots[0].0.y, 3.0);
        for (position, _) in &slots {
            assert!(position.z.abs() < 40.0 - GALLERY_END_MARGIN + 1e-4);
        }
    }

    #[test]
    fn test_layout_faces_into_the_hall() {
        for (position, rotation) in WallGallery::layout(16.0, 80.0, 12.0, 4) {
            let facing = Vec3::new(rotation.sin(), 0.0, rotation.cos());
            assert!(facing.x * position.x < 0.0);
        }
    }

    #[test]
    fn test_spec_selects_builder() {
        assert!(from_spec(&AreaBuilderSpec::WallGallery).places_artworks());
        assert!(!from_spec(&AreaBuilderSpec::ArtworkSpotlights).places_artworks());
        assert!(from_spec(&AreaBuilderSpec::AchievementDisplays(Vec::new())).places_artworks());
        assert_eq!(from_spec(&AreaBuilderSpec::PartitionWalls(Vec::new())).name(), "partition-walls");
    }
}
