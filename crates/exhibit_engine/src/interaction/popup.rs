//! Info popup
//!
//! A text plane that floats in front of the camera while open. The popup
//! owns its node, geometry and material; closing it disposes all three.

use crate::assets::DecodedImage;
use crate::core::config::InteractionConfig;
use crate::foundation::collections::{GeometryHandle, MaterialHandle, NodeId, TextureHandle};
use crate::foundation::math::{Transform, Vec3};
use crate::hall::build::{text_texture, wrap_text, PANEL_COLUMNS};
use crate::render::material::Material;
use crate::render::resources::GeometryKind;
use crate::scene::context::EngineContext;
use crate::scene::node::{NodeTag, SceneNode};

/// Text shown by a popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    /// Heading
    pub title: String,
    /// Body lines
    pub lines: Vec<String>,
}

impl PopupContent {
    /// Content for a node tag, `None` for tags that do not open a popup
    pub fn from_tag(tag: &NodeTag) -> Option<Self> {
        match tag {
            NodeTag::Artwork(info) => {
                let mut lines = vec![format!("{} ({})", info.artist, info.year)];
                lines.extend(wrap_text(&info.description, PANEL_COLUMNS));
                Some(Self {
                    title: info.title.clone(),
                    lines,
                })
            }
            NodeTag::InfoPanel(info) => Some(Self {
                title: info.title.clone(),
                lines: info.lines.clone(),
            }),
            NodeTag::Achievement(info) => Some(Self {
                title: info.title.clone(),
                lines: wrap_text(&info.description, PANEL_COLUMNS),
            }),
            NodeTag::EntranceMarker(_) | NodeTag::Generic => None,
        }
    }

    /// Title and body joined for texture generation
    pub fn text(&self) -> String {
        let mut text = self.title.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// An open popup
#[derive(Debug)]
pub struct InfoPopup {
    source: NodeId,
    node: NodeId,
    geometry: GeometryHandle,
    material: MaterialHandle,
    content: PopupContent,
}

impl InfoPopup {
    /// Create the popup plane for `source` and anchor it in front of the
    /// camera; also returns the text texture to upload
    pub fn open(
        engine: &mut EngineContext,
        config: &InteractionConfig,
        source: NodeId,
        content: PopupContent,
    ) -> (Self, (TextureHandle, DecodedImage)) {
        let geometry = engine.resources.create_geometry(GeometryKind::Plane {
            width: config.popup_width,
            height: config.popup_height,
        });
        let material = engine.resources.create_material(
            Material::new("popup", config.popup_color)
                .with_opacity(0.95)
                .double_sided(),
        );
        let upload = text_texture(&mut engine.resources, material, &content.text());
        let node = engine
            .graph
            .insert(SceneNode::new("info-popup").with_mesh(geometry, material));

        let popup = Self {
            source,
            node,
            geometry,
            material,
            content,
        };
        popup.anchor(engine, config.popup_distance);
        log::debug!("Popup opened: {}", popup.content.title);
        (popup, upload)
    }

    /// Node the popup describes
    pub const fn source(&self) -> NodeId {
        self.source
    }

    /// Scene node of the popup plane
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Displayed text
    pub const fn content(&self) -> &PopupContent {
        &self.content
    }

    /// Place the popup `distance` in front of the camera, turned to face it
    pub fn anchor(&self, engine: &mut EngineContext, distance: f32) {
        let camera = &engine.camera;
        let position = camera.position + camera.forward() * distance;
        let (yaw, _) = camera.yaw_pitch();
        if let Some(node) = engine.graph.get_mut(self.node) {
            node.transform = Transform::from_position(position).with_yaw(yaw);
        }
    }

    /// World position of the popup plane
    pub fn position(&self, engine: &EngineContext) -> Option<Vec3> {
        engine.graph.world_position(self.node)
    }

    /// Remove the popup and dispose what it allocated
    pub fn close(self, engine: &mut EngineContext) {
        engine.animations.cancel_where(|target| target.touches_node(self.node));
        engine.graph.remove_subtree(self.node);
        if let Err(err) = engine.resources.dispose_geometry(self.geometry) {
            log::warn!("Popup geometry already gone: {}", err);
        }
        if let Err(err) = engine.resources.dispose_material(self.material) {
            log::warn!("Popup material already gone: {}", err);
        }
        log::debug!("Popup closed: {}", self.content.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImageSource;
    use crate::core::config::ExhibitionConfig;
    use crate::scene::node::{AchievementInfo, EntranceInfo};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_content_for_tags() {
        let achievement = NodeTag::Achievement(AchievementInfo {
            title: "Legacy".into(),
            description: "Short".into(),
        });
        let content = PopupContent::from_tag(&achievement).expect("opens");
        assert_eq!(content.text(), "Legacy\nShort");

        let marker = NodeTag::EntranceMarker(EntranceInfo {
            destination: "early".into(),
            label: "Early".into(),
        });
        assert!(PopupContent::from_tag(&marker).is_none());
        assert!(PopupContent::from_tag(&NodeTag::Generic).is_none());
    }

    #[test]
    fn test_popup_floats_in_front_of_camera_and_cleans_up() {
        let config = ExhibitionConfig::default();
        let mut engine = EngineContext::new(&config, Arc::new(MemoryImageSource::new()));
        let source = engine.graph.insert(SceneNode::new("painting"));
        let before = engine.resources.stats();

        let content = PopupContent {
            title: "Title".into(),
            lines: vec!["line".into()],
        };
        let (popup, (texture, image)) = InfoPopup::open(&mut engine, &config.interaction, source, content);
        assert!(engine.resources.texture(texture).is_some());
        assert_eq!((image.width, image.height), (512, 384));

        let expected = engine.camera.position + engine.camera.forward() * config.interaction.popup_distance;
        assert_relative_eq!(popup.position(&engine).expect("live"), expected, epsilon = 1e-4);

        engine.camera.set_position(Vec3::new(3.0, 2.0, 5.0));
        popup.anchor(&mut engine, config.interaction.popup_distance);
        let expected = engine.camera.position + engine.camera.forward() * config.interaction.popup_distance;
        assert_relative_eq!(popup.position(&engine).expect("live"), expected, epsilon = 1e-4);

        let node = popup.node();
        popup.close(&mut engine);
        assert!(!engine.graph.contains(node));
        let after = engine.resources.stats();
        assert_eq!(
            after.allocated() - before.allocated(),
            after.disposed() - before.disposed()
        );
    }
}
