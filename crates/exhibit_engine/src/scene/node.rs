//! Scene nodes and their typed metadata
//!
//! A node carries its local transform, an optional mesh (geometry plus
//! material), render flags and a [`NodeTag`] saying what the node means to
//! the exhibition. Fades and highlights write the node's own `opacity` and
//! `color_override` so that materials shared between halls are never
//! mutated by per-node effects.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::collections::{GeometryHandle, MaterialHandle, NodeId};
use crate::foundation::color::Color;
use crate::foundation::math::{Transform, Vec3};

bitflags! {
    /// Render and interaction flags of a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Drawn and pickable
        const VISIBLE = 1 << 0;
        /// Casts shadows
        const CAST_SHADOW = 1 << 1;
        /// Receives shadows
        const RECEIVE_SHADOW = 1 << 2;
        /// Registered for pointer interaction
        const INTERACTIVE = 1 << 3;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Description of one artwork on display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkInfo {
    /// Catalog id
    pub id: String,
    /// Title
    pub title: String,
    /// Artist
    pub artist: String,
    /// Year or year range
    pub year: String,
    /// Free text shown in the popup
    pub description: String,
    /// Area the artwork belongs to
    pub area: Option<String>,
    /// Image reference of the canvas texture
    pub image_url: Option<String>,
}

/// Link to another hall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceInfo {
    /// Hall the marker leads to
    pub destination: String,
    /// Caption shown on the marker
    pub label: String,
}

/// Text panel content, already wrapped into lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInfo {
    /// Heading
    pub title: String,
    /// Wrapped body lines
    pub lines: Vec<String>,
}

/// Achievement shown in the closing hall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementInfo {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
}

/// What a node means to the exhibition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeTag {
    /// Structure, decoration or helper geometry
    #[default]
    Generic,
    /// Framed artwork
    Artwork(ArtworkInfo),
    /// Marker leading to another hall
    EntranceMarker(EntranceInfo),
    /// Text panel
    InfoPanel(PanelInfo),
    /// Achievement display
    Achievement(AchievementInfo),
}

/// Discriminant of [`NodeTag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// [`NodeTag::Generic`]
    Generic,
    /// [`NodeTag::Artwork`]
    Artwork,
    /// [`NodeTag::EntranceMarker`]
    EntranceMarker,
    /// [`NodeTag::InfoPanel`]
    InfoPanel,
    /// [`NodeTag::Achievement`]
    Achievement,
}

impl NodeTag {
    /// Discriminant
    pub const fn kind(&self) -> TagKind {
        match self {
            Self::Generic => TagKind::Generic,
            Self::Artwork(_) => TagKind::Artwork,
            Self::EntranceMarker(_) => TagKind::EntranceMarker,
            Self::InfoPanel(_) => TagKind::InfoPanel,
            Self::Achievement(_) => TagKind::Achievement,
        }
    }

    /// Whether clicking the node opens an info popup
    pub const fn opens_popup(&self) -> bool {
        matches!(self, Self::Artwork(_) | Self::InfoPanel(_) | Self::Achievement(_))
    }

    /// Heading shown for the node, if it has one
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Generic => None,
            Self::Artwork(info) => Some(&info.title),
            Self::EntranceMarker(info) => Some(&info.label),
            Self::InfoPanel(info) => Some(&info.title),
            Self::Achievement(info) => Some(&info.title),
        }
    }
}

/// One node of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Name, unique within its hall by convention
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Shape, if the node draws anything
    pub geometry: Option<GeometryHandle>,
    /// Surface, if the node draws anything
    pub material: Option<MaterialHandle>,
    /// Render flags
    pub flags: NodeFlags,
    /// Opacity multiplier driven by fades, in `[0, 1]`
    pub opacity: f32,
    /// Colour drawn instead of the material colour while highlighted
    pub color_override: Option<Color>,
    /// Exhibition metadata
    pub tag: NodeTag,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    /// Empty, visible node at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            geometry: None,
            material: None,
            flags: NodeFlags::default(),
            opacity: 1.0,
            color_override: None,
            tag: NodeTag::Generic,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the local position
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Attach a mesh
    pub fn with_mesh(mut self, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        self.geometry = Some(geometry);
        self.material = Some(material);
        self
    }

    /// Add flags
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the metadata tag
    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = tag;
        self
    }

    /// Whether the node itself is visible
    pub const fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Show or hide the node
    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(NodeFlags::VISIBLE, visible);
    }

    /// Parent node, if any
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_visible_and_opaque() {
        let node = SceneNode::new("floor");
        assert!(node.is_visible());
        assert_eq!(node.opacity, 1.0);
        assert_eq!(node.tag.kind(), TagKind::Generic);
    }

    #[test]
    fn test_flags_accumulate() {
        let mut node = SceneNode::new("frame").with_flags(NodeFlags::CAST_SHADOW | NodeFlags::INTERACTIVE);
        assert!(node.flags.contains(NodeFlags::VISIBLE | NodeFlags::CAST_SHADOW));
        node.set_visible(false);
        assert!(!node.is_visible());
        assert!(node.flags.contains(NodeFlags::INTERACTIVE));
    }

    #[test]
    fn test_popup_worthy_tags() {
        let marker = NodeTag::EntranceMarker(EntranceInfo {
            destination: "early".into(),
            label: "Early hall".into(),
        });
        let panel = NodeTag::InfoPanel(PanelInfo {
            title: "Guide".into(),
            lines: vec![],
        });
        assert!(!marker.opens_popup());
        assert!(panel.opens_popup());
        assert!(!NodeTag::Generic.opens_popup());
        assert_eq!(marker.title(), Some("Early hall"));
    }
}
