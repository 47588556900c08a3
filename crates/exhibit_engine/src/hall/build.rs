//! Construction helpers shared by the hall and its area builders
//!
//! Every geometry, material, node and light a hall creates goes through
//! [`HallBuildContext`], which records it in the hall's [`HallContents`].
//! Destroying the hall walks that record, so nothing it allocated can leak
//! and nothing it did not allocate (cached presets) is disposed.

use crate::assets::DecodedImage;
use crate::error::HallError;
use crate::foundation::collections::{GeometryHandle, LightId, MaterialHandle, NodeId, TextureHandle};
use crate::foundation::color::Color;
use crate::foundation::math::{Transform, Vec3};
use crate::hall::config::{ArtworkConfig, HallConfig};
use crate::render::lighting::LightSpec;
use crate::render::material::{Material, MaterialParams, MaterialPreset};
use crate::render::resources::{GeometryKind, ResourceRegistry, TextureResource, TextureSource};
use crate::scene::context::EngineContext;
use crate::scene::node::{ArtworkInfo, EntranceInfo, NodeFlags, NodeTag, PanelInfo, SceneNode};

/// Characters per line of panel text
pub const PANEL_COLUMNS: usize = 24;

/// Size of generated text textures
pub const PANEL_TEXTURE_SIZE: (u32, u32) = (512, 384);

/// Canvas inset in front of its frame
const CANVAS_OFFSET: f32 = 0.06;

/// Artwork hung in a hall
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkPlacement {
    /// Popup metadata
    pub info: ArtworkInfo,
    /// Canvas node, the pick target
    pub node: NodeId,
    /// Centre of the canvas in hall space
    pub position: Vec3,
    /// Rotation around Y
    pub rotation_y: f32,
}

impl ArtworkPlacement {
    /// Unit vector the painted side faces
    pub fn facing(&self) -> Vec3 {
        Vec3::new(self.rotation_y.sin(), 0.0, self.rotation_y.cos())
    }
}

/// Entrance marker placed in a hall
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPlacement {
    /// Destination and caption
    pub info: EntranceInfo,
    /// Clickable caption panel
    pub node: NodeId,
    /// Ground position of the pillar
    pub position: Vec3,
}

/// Everything a hall has allocated
#[derive(Debug, Default)]
pub struct HallContents {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) lights: Vec<LightId>,
    pub(crate) geometries: Vec<GeometryHandle>,
    pub(crate) materials: Vec<MaterialHandle>,
    pub(crate) artworks: Vec<ArtworkPlacement>,
    pub(crate) markers: Vec<MarkerPlacement>,
    pub(crate) interactables: Vec<NodeId>,
    pub(crate) uploads: Vec<(TextureHandle, DecodedImage)>,
}

impl HallContents {
    /// Whether nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.lights.is_empty() && self.geometries.is_empty() && self.materials.is_empty()
    }

    /// Nodes created by the hall, parents first
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Lights created by the hall
    pub fn lights(&self) -> &[LightId] {
        &self.lights
    }

    /// Placed artworks in placement order
    pub fn artworks(&self) -> &[ArtworkPlacement] {
        &self.artworks
    }
}

/// Mutable view used while a hall is being built
pub struct HallBuildContext<'a> {
    /// Engine state the hall builds into
    pub engine: &'a mut EngineContext,
    /// Configuration of the hall under construction
    pub config: &'a HallConfig,
    contents: &'a mut HallContents,
}

impl<'a> HallBuildContext<'a> {
    /// Wrap engine state for one construction step
    pub fn new(engine: &'a mut EngineContext, config: &'a HallConfig, contents: &'a mut HallContents) -> Self {
        Self {
            engine,
            config,
            contents,
        }
    }

    /// What has been allocated so far
    pub fn contents(&self) -> &HallContents {
        self.contents
    }

    // ===== Resources =====

    /// Allocate a geometry owned by the hall
    pub fn geometry(&mut self, kind: GeometryKind) -> GeometryHandle {
        let handle = self.engine.resources.create_geometry(kind);
        self.contents.geometries.push(handle);
        handle
    }

    /// Allocate a material owned by the hall, starting from a preset
    pub fn owned_material(&mut self, preset: MaterialPreset, params: &MaterialParams) -> MaterialHandle {
        let mut material = preset.material().merged(params);
        material.name = format!("{}:{}", self.config.id, preset.key());
        self.own_material(material)
    }

    /// Register an already assembled material as owned by the hall
    pub fn own_material(&mut self, material: Material) -> MaterialHandle {
        let handle = self.engine.resources.create_material(material);
        self.contents.materials.push(handle);
        handle
    }

    /// Shared preset material from the cache; never disposed by the hall
    pub fn shared_preset(&mut self, preset: MaterialPreset) -> MaterialHandle {
        let engine = &mut *self.engine;
        engine
            .materials
            .get_preset(&mut engine.resources, preset, &MaterialParams::default())
    }

    /// Give `material` a generated texture showing `text`.
    ///
    /// The texture is owned by the material and disposed with it. A flat
    /// image in the material colour is queued for upload.
    pub fn attach_text_texture(&mut self, material: MaterialHandle, text: &str) {
        let upload = text_texture(&mut self.engine.resources, material, text);
        self.contents.uploads.push(upload);
    }

    // ===== Nodes =====

    /// Insert a node under the render root
    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        let id = self.engine.graph.insert(node);
        self.contents.nodes.push(id);
        id
    }

    /// Insert a node under one of the hall's nodes
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, HallError> {
        let name = node.name.clone();
        let id = self
            .engine
            .graph
            .insert_child(parent, node)
            .ok_or_else(|| HallError::Build(format!("parent of '{name}' is gone")))?;
        self.contents.nodes.push(id);
        Ok(id)
    }

    /// Insert a mesh node with a fresh geometry
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        kind: GeometryKind,
        material: MaterialHandle,
        transform: Transform,
        flags: NodeFlags,
    ) -> NodeId {
        let geometry = self.geometry(kind);
        self.add_node(
            SceneNode::new(name)
                .with_transform(transform)
                .with_mesh(geometry, material)
                .with_flags(flags),
        )
    }

    /// Make a node pickable
    pub fn register_interactable(&mut self, node: NodeId) {
        if let Some(scene_node) = self.engine.graph.get_mut(node) {
            scene_node.flags |= NodeFlags::INTERACTIVE;
        }
        if !self.contents.interactables.contains(&node) {
            self.contents.interactables.push(node);
        }
    }

    // ===== Lights =====

    /// Create a light registered under `<hall id>:<key>`
    pub fn add_light(&mut self, key: &str, spec: &LightSpec) -> Result<LightId, HallError> {
        let id = self
            .engine
            .lights
            .create_light(&format!("{}:{}", self.config.id, key), spec)?;
        self.track_light(id);
        Ok(id)
    }

    /// Spotlight aimed at an artwork, in the "artworks" group
    pub fn add_artwork_spotlight(&mut self, artwork_id: &str, position: Vec3, target: Vec3) -> Result<LightId, HallError> {
        let id = self
            .engine
            .lights
            .create_artwork_spotlight(artwork_id, position, target)?;
        self.track_light(id);
        Ok(id)
    }

    fn track_light(&mut self, id: LightId) {
        if !self.contents.lights.contains(&id) {
            self.contents.lights.push(id);
        }
    }

    // ===== Composite objects =====

    /// Hang a framed, textured canvas for `artwork`.
    ///
    /// The frame uses the shared "frame" preset; the canvas material and its
    /// image texture belong to the hall.
    pub fn hang_artwork(
        &mut self,
        artwork: &ArtworkConfig,
        position: Vec3,
        rotation_y: f32,
    ) -> Result<NodeId, HallError> {
        let frame_material = self.shared_preset(MaterialPreset::Frame);
        let frame = self.add_mesh(
            format!("artwork-frame-{}", artwork.id),
            GeometryKind::Box {
                width: artwork.width + 0.2,
                height: artwork.height + 0.2,
                depth: 0.1,
            },
            frame_material,
            Transform::from_position(position).with_yaw(rotation_y),
            NodeFlags::CAST_SHADOW | NodeFlags::RECEIVE_SHADOW,
        );

        let canvas_material = self.owned_material(MaterialPreset::Canvas, &MaterialParams::default());
        if let Some(url) = &artwork.image_url {
            let engine = &mut *self.engine;
            engine
                .materials
                .load_exclusive_texture(&mut engine.textures, canvas_material, url);
        }

        let info = ArtworkInfo {
            id: artwork.id.clone(),
            title: artwork.title.clone(),
            artist: artwork.artist.clone(),
            year: artwork.year.clone(),
            description: artwork.description.clone(),
            area: artwork.area.clone(),
            image_url: artwork.image_url.clone(),
        };
        let geometry = self.geometry(GeometryKind::Plane {
            width: artwork.width,
            height: artwork.height,
        });
        let canvas = self.add_child(
            frame,
            SceneNode::new(format!("artwork-{}", artwork.id))
                .at(Vec3::new(0.0, 0.0, CANVAS_OFFSET))
                .with_mesh(geometry, canvas_material)
                .with_flags(NodeFlags::RECEIVE_SHADOW)
                .with_tag(NodeTag::Artwork(info.clone())),
        )?;
        self.register_interactable(canvas);

        let facing = Vec3::new(rotation_y.sin(), 0.0, rotation_y.cos());
        self.contents.artworks.push(ArtworkPlacement {
            info,
            node: canvas,
            position: position + facing * CANVAS_OFFSET,
            rotation_y,
        });
        Ok(canvas)
    }

    /// Flat text panel with a generated texture; returns the panel node
    pub fn text_panel(
        &mut self,
        name: impl Into<String>,
        size: (f32, f32),
        color: u32,
        transform: Transform,
        tag: NodeTag,
        text: &str,
    ) -> NodeId {
        let material = self.owned_material(
            MaterialPreset::InfoPanel,
            &MaterialParams::color(Color::from_hex(color)).double_sided(),
        );
        self.attach_text_texture(material, text);
        let node = self.add_mesh(
            name,
            GeometryKind::Plane {
                width: size.0,
                height: size.1,
            },
            material,
            transform,
            NodeFlags::RECEIVE_SHADOW,
        );
        if let Some(scene_node) = self.engine.graph.get_mut(node) {
            scene_node.tag = tag;
        }
        node
    }

    /// Pillar with a clickable caption leading to another hall
    pub fn entrance_marker(&mut self, destination: &str, label: &str, position: Vec3) -> Result<NodeId, HallError> {
        let gilded = self.shared_preset(MaterialPreset::GildedFrame);
        self.add_mesh(
            format!("marker-pillar-{destination}"),
            GeometryKind::Cylinder {
                radius_top: 0.3,
                radius_bottom: 0.3,
                height: 4.0,
            },
            gilded,
            Transform::from_position(Vec3::new(position.x, 2.0, position.z)),
            NodeFlags::CAST_SHADOW,
        );

        let info = EntranceInfo {
            destination: destination.to_string(),
            label: label.to_string(),
        };
        let panel = self.add_mesh(
            format!("marker-{destination}"),
            GeometryKind::Plane {
                width: 2.0,
                height: 1.0,
            },
            gilded,
            Transform::from_position(Vec3::new(position.x, 3.5, position.z)),
            NodeFlags::empty(),
        );
        if let Some(node) = self.engine.graph.get_mut(panel) {
            node.tag = NodeTag::EntranceMarker(info.clone());
        }
        self.register_interactable(panel);
        self.contents.markers.push(MarkerPlacement {
            info,
            node: panel,
            position,
        });
        Ok(panel)
    }
}

/// Popup tag for a text block
pub fn panel_tag(title: &str, body: &str) -> NodeTag {
    NodeTag::InfoPanel(PanelInfo {
        title: title.to_string(),
        lines: wrap_text(body, PANEL_COLUMNS),
    })
}

/// Break `text` into lines of at most `columns` characters.
///
/// Explicit newlines start a new line; longer paragraphs are cut by
/// character count, which suits both spaced and unspaced scripts.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let chars: Vec<char> = paragraph.trim().chars().collect();
        if chars.is_empty() {
            continue;
        }
        for chunk in chars.chunks(columns) {
            let line: String = chunk.iter().collect();
            lines.push(line.trim().to_string());
        }
    }
    lines
}

/// Create a generated texture showing `text`, owned by `material`, and
/// return it with the flat image to upload
pub fn text_texture(
    resources: &mut ResourceRegistry,
    material: MaterialHandle,
    text: &str,
) -> (TextureHandle, DecodedImage) {
    let (width, height) = PANEL_TEXTURE_SIZE;
    let texture = resources.create_texture(
        TextureResource::new(TextureSource::Generated(text.to_string()), width, height).owned_by(material),
    );
    let mut background = [255_u8; 4];
    if let Some(material) = resources.material_mut(material) {
        material.texture = Some(texture);
        background = color_bytes(material.color);
    }
    (texture, DecodedImage::solid_color(width, height, background))
}

fn color_bytes(color: Color) -> [u8; 4] {
    let [r, g, b] = color.to_array();
    let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
    [byte(r), byte(g), byte(b), 255]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImageSource;
    use crate::core::config::ExhibitionConfig;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn engine() -> EngineContext {
        EngineContext::new(&ExhibitionConfig::default(), Arc::new(MemoryImageSource::new()))
    }

    #[test]
    fn test_wrap_respects_columns_and_newlines() {
        let lines = wrap_text("abcdefghij\nxyz", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xyz"]);
        assert!(wrap_text("", 4).is_empty());
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let lines = wrap_text("黄宾虹山水画", 4);
        assert_eq!(lines, vec!["黄宾虹山", "水画"]);
    }

    #[test]
    fn test_hang_artwork_tracks_everything() {
        let mut engine = engine();
        let config = HallConfig::new("test", 10.0, 10.0, 5.0);
        let mut contents = HallContents::default();
        let artwork = ArtworkConfig {
            id: "7".into(),
            title: "Ink Bamboo".into(),
            image_url: Some("/images/ink_bamboo.jpg".into()),
            ..ArtworkConfig::default()
        };

        let canvas = {
            let mut hall = HallBuildContext::new(&mut engine, &config, &mut contents);
            hall.hang_artwork(&artwork, Vec3::new(0.0, 3.0, -4.0), 0.0)
                .expect("frame exists")
        };

        assert_eq!(contents.nodes.len(), 2);
        assert_eq!(contents.geometries.len(), 2);
        assert_eq!(contents.materials.len(), 1);
        assert_eq!(contents.interactables, vec![canvas]);
        assert_eq!(contents.artworks[0].info.title, "Ink Bamboo");
        assert_relative_eq!(contents.artworks[0].position.z, -4.0 + CANVAS_OFFSET);
        assert_eq!(engine.materials.stats().pending_loads, 1);
        let node = engine.graph.get(canvas).expect("live");
        assert!(node.flags.contains(NodeFlags::INTERACTIVE));
        assert!(node.tag.opens_popup());
    }

    #[test]
    fn test_text_panel_texture_belongs_to_material() {
        let mut engine = engine();
        let config = HallConfig::new("test", 10.0, 10.0, 5.0);
        let mut contents = HallContents::default();
        let panel = {
            let mut hall = HallBuildContext::new(&mut engine, &config, &mut contents);
            hall.text_panel(
                "panel-guide",
                (3.0, 2.0),
                0x5c3030,
                Transform::identity(),
                panel_tag("Guide", "Three halls"),
                "Guide",
            )
        };
        let material = engine.graph.get(panel).and_then(|node| node.material).expect("mesh");
        let texture = engine.resources.material(material).and_then(|m| m.texture).expect("attached");
        assert_eq!(engine.resources.texture(texture).expect("live").owner, Some(material));
        assert_eq!(contents.uploads.len(), 1);
        assert_eq!(contents.uploads[0].1.pixels[0], 0x5c);

        engine.resources.dispose_material(material).expect("live");
        assert!(engine.resources.texture(texture).is_none());
    }

    #[test]
    fn test_hall_lights_are_namespaced() {
        let mut engine = engine();
        let config = HallConfig::new("early", 10.0, 10.0, 5.0);
        let mut contents = HallContents::default();
        let mut hall = HallBuildContext::new(&mut engine, &config, &mut contents);
        hall.add_light("ambient", &LightSpec::preset("ambient")).expect("known preset");
        assert!(matches!(
            hall.add_light("odd", &LightSpec::preset("laser")),
            Err(HallError::Resource(_))
        ));
        assert!(engine.lights.get("early:ambient").is_some());
        assert_eq!(contents.lights.len(), 1);
    }
}
