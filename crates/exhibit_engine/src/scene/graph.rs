//! Hierarchical scene graph
//!
//! Nodes live in a slot map; hierarchy is kept as parent links plus ordered
//! child lists. Everything under the render root is reachable from
//! [`SceneGraph::roots`]. Removing a node removes its whole subtree and
//! hands the removed nodes back, so the caller can dispose whatever
//! resources it owns.

use slotmap::SlotMap;

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Vec3};
use crate::physics::collision::{Ray, RayHit};
use crate::render::backend::DrawItem;
use crate::render::resources::ResourceRegistry;
use crate::scene::node::{NodeFlags, SceneNode};

/// Node storage with parent/child links
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under the render root
    pub fn insert(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`; returns `None` if the parent is gone
    pub fn insert_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Node by id
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Node by id, for mutation
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Whether the id still resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no node
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// First node with the given name, depth-first
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.depth_first().into_iter().find(|&id| self.nodes[id].name == name)
    }

    /// `id` and all of its descendants, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every node, depth-first in insertion order
    pub fn depth_first(&self) -> Vec<NodeId> {
        self.roots.iter().flat_map(|&root| self.subtree(root)).collect()
    }

    /// Remove `id` with its subtree; returns the removed nodes, parents first
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<(NodeId, SceneNode)> {
        let ids = self.subtree(id);
        if ids.is_empty() {
            return Vec::new();
        }

        match self.nodes[id].parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        ids.into_iter()
            .filter_map(|id| self.nodes.remove(id).map(|node| (id, node)))
            .collect()
    }

    /// Remove every node; returns them, parents first
    pub fn drain(&mut self) -> Vec<(NodeId, SceneNode)> {
        let order = self.depth_first();
        self.roots.clear();
        order
            .into_iter()
            .filter_map(|id| self.nodes.remove(id).map(|node| (id, node)))
            .collect()
    }

    /// Model matrix of a node including all ancestors
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|parent| self.nodes.get(parent)) {
            matrix = parent.transform.to_matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// World-space position of a node
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id)
            .map(|matrix| Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]))
    }

    /// Whether the node and every ancestor are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            if !node.is_visible() {
                return false;
            }
            current = node.parent;
        }
        current.is_none() && self.nodes.contains_key(id)
    }

    /// Visible meshes as backend draw items, depth-first
    pub fn draw_items(&self, registry: &ResourceRegistry) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for &root in &self.roots {
            self.collect_items(root, Mat4::identity(), 1.0, registry, &mut items);
        }
        items
    }

    fn collect_items(
        &self,
        id: NodeId,
        parent_world: Mat4,
        parent_opacity: f32,
        registry: &ResourceRegistry,
        items: &mut Vec<DrawItem>,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        let world = parent_world * node.transform.to_matrix();
        let opacity = parent_opacity * node.opacity;

        if let (Some(geometry), Some(material_handle)) = (node.geometry, node.material) {
            match registry.material(material_handle) {
                Some(material) if registry.contains_geometry(geometry) => items.push(DrawItem {
                    node: id,
                    world,
                    geometry,
                    material: material_handle,
                    color: node.color_override.unwrap_or(material.color),
                    opacity: (opacity * material.opacity).clamp(0.0, 1.0),
                    cast_shadow: node.flags.contains(NodeFlags::CAST_SHADOW),
                    receive_shadow: node.flags.contains(NodeFlags::RECEIVE_SHADOW),
                }),
                _ => log::warn!("Node '{}' references a disposed resource; skipping draw", node.name),
            }
        }

        for &child in &node.children {
            self.collect_items(child, world, opacity, registry, items);
        }
    }

    /// Nearest visible candidate hit by `ray`
    pub fn raycast(&self, ray: &Ray, candidates: &[NodeId], registry: &ResourceRegistry) -> Option<RayHit> {
        candidates
            .iter()
            .filter(|&&id| self.is_effectively_visible(id))
            .filter_map(|&id| {
                let geometry = self.nodes.get(id)?.geometry?;
                let bounds = registry.geometry(geometry)?.local_bounds();
                let world = self.world_matrix(id)?;
                let distance = bounds.intersect_oriented(ray, &world)?;
                Some(RayHit {
                    node: id,
                    distance,
                    point: ray.point_at(distance),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::render::material::Material;
    use crate::render::resources::GeometryKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_position_composes_parents() {
        let mut graph = SceneGraph::new();
        let parent = graph.insert(SceneNode::new("pillar").at(Vec3::new(1.0, 2.0, 3.0)));
        let child = graph
            .insert_child(parent, SceneNode::new("panel").at(Vec3::new(0.0, 1.5, 0.0)))
            .expect("parent exists");
        let position = graph.world_position(child).expect("live");
        assert_relative_eq!(position, Vec3::new(1.0, 3.5, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_remove_subtree_returns_descendants() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(SceneNode::new("root"));
        let a = graph.insert_child(root, SceneNode::new("a")).expect("parent");
        graph.insert_child(a, SceneNode::new("a1")).expect("parent");
        let other = graph.insert(SceneNode::new("other"));

        let removed = graph.remove_subtree(root);
        let names: Vec<&str> = removed.iter().map(|(_, node)| node.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "a1"]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.roots(), &[other]);
        assert!(graph.remove_subtree(root).is_empty());
    }

    #[test]
    fn test_hidden_parent_hides_children() {
        let mut graph = SceneGraph::new();
        let mut registry = ResourceRegistry::new();
        let geometry = registry.create_geometry(GeometryKind::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        });
        let material = registry.create_material(Material::default());

        let parent = graph.insert(SceneNode::new("group"));
        let child = graph
            .insert_child(parent, SceneNode::new("box").with_mesh(geometry, material))
            .expect("parent");
        assert_eq!(graph.draw_items(&registry).len(), 1);

        graph.get_mut(parent).expect("live").set_visible(false);
        assert!(graph.draw_items(&registry).is_empty());
        assert!(!graph.is_effectively_visible(child));
    }

    #[test]
    fn test_raycast_picks_nearest() {
        let mut graph = SceneGraph::new();
        let mut registry = ResourceRegistry::new();
        let geometry = registry.create_geometry(GeometryKind::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        });
        let material = registry.create_material(Material::default());
        let near = graph.insert(
            SceneNode::new("near")
                .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, -5.0)))
                .with_mesh(geometry, material),
        );
        let far = graph.insert(
            SceneNode::new("far")
                .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, -10.0)))
                .with_mesh(geometry, material),
        );

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        let hit = graph.raycast(&ray, &[far, near], &registry).expect("hit");
        assert_eq!(hit.node, near);
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-5);

        graph.get_mut(near).expect("live").set_visible(false);
        assert_eq!(graph.raycast(&ray, &[far, near], &registry).expect("hit").node, far);
    }

    #[test]
    fn test_draw_item_uses_node_overrides() {
        let mut graph = SceneGraph::new();
        let mut registry = ResourceRegistry::new();
        let geometry = registry.create_geometry(GeometryKind::Sphere { radius: 1.0 });
        let material = registry.create_material(Material::default());
        let id = graph.insert(SceneNode::new("ball").with_mesh(geometry, material));
        {
            let node = graph.get_mut(id).expect("live");
            node.opacity = 0.25;
            node.color_override = Some(crate::foundation::color::Color::from_hex(0xffd700));
        }
        let items = graph.draw_items(&registry);
        assert_relative_eq!(items[0].opacity, 0.25);
        assert_eq!(items[0].color.to_hex(), 0xffd700);
        assert_eq!(registry.material(material).expect("live").color.to_hex(), 0xffffff);
    }
}
