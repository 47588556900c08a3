//! Engine context
//!
//! Every cache and registry the engine uses lives in one [`EngineContext`]
//! owned by a scene manager and lent by `&mut` to halls, builders and the
//! interaction layer. Nothing is global, so two engines never share state.

use std::sync::Arc;

use crate::animation::{
    AnimatedValue, AnimationFrame, AnimationOwner, AnimationScheduler, AnimationSpec, AnimationTarget, CompletionTag,
    Easing,
};
use crate::assets::{DecodedImage, ImageSource, TextureLoader};
use crate::core::config::ExhibitionConfig;
use crate::foundation::collections::{AnimationGroupId, AnimationId, TextureHandle};
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::navigation::NavigationManager;
use crate::render::backend::RenderFrame;
use crate::render::camera::Camera;
use crate::render::lighting::LightManager;
use crate::render::material::MaterialManager;
use crate::render::resources::ResourceRegistry;
use crate::scene::graph::SceneGraph;

/// Camera position used on reset
pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(0.0, 2.0, 5.0);

/// Scene state owned by one engine instance
pub struct EngineContext {
    /// Scene graph under the render root
    pub graph: SceneGraph,
    /// Active camera
    pub camera: Camera,
    /// Geometry, material and texture allocations
    pub resources: ResourceRegistry,
    /// Preset material cache
    pub materials: MaterialManager,
    /// Light registry
    pub lights: LightManager,
    /// Running animations
    pub animations: AnimationScheduler,
    /// Background image decoding
    pub textures: TextureLoader,
    /// First-person navigation, when enabled
    pub navigation: Option<NavigationManager>,
    stale_writes: u64,
}

impl EngineContext {
    /// Create an empty context from configuration
    pub fn new(config: &ExhibitionConfig, images: Arc<dyn ImageSource>) -> Self {
        let engine = &config.engine;
        let mut camera = Camera::perspective(
            DEFAULT_CAMERA_POSITION,
            engine.camera_fov,
            engine.aspect_ratio(),
            engine.camera_near,
            engine.camera_far,
        );
        camera.set_target(Vec3::zeros());

        let mut lighting = config.lighting.clone();
        lighting.enable_shadows &= engine.enable_shadows;

        Self {
            graph: SceneGraph::new(),
            camera,
            resources: ResourceRegistry::new(),
            materials: MaterialManager::new(config.materials.clone()),
            lights: LightManager::new(lighting),
            animations: AnimationScheduler::new(),
            textures: TextureLoader::new(images, config.materials.threaded_loading),
            navigation: engine
                .enable_navigation
                .then(|| NavigationManager::new(config.navigation.clone())),
            stale_writes: 0,
        }
    }

    // ===== Animation plumbing =====

    /// Current value of an animatable property, `None` if its owner is gone
    pub fn current_value(&self, target: AnimationTarget) -> Option<AnimatedValue> {
        match target {
            AnimationTarget::NodeOpacity(id) => self.graph.get(id).map(|node| AnimatedValue::Scalar(node.opacity)),
            AnimationTarget::NodeScale(id) => self
                .graph
                .get(id)
                .map(|node| AnimatedValue::Scalar(node.transform.scale.x)),
            AnimationTarget::LightIntensity(id) => {
                self.lights.light(id).map(|light| AnimatedValue::Scalar(light.intensity))
            }
            AnimationTarget::CameraPosition => Some(AnimatedValue::Vector(self.camera.position)),
            AnimationTarget::CameraTarget => Some(AnimatedValue::Vector(self.camera.target)),
        }
    }

    /// Animate a property from its current value to `to`
    pub fn animate_to(
        &mut self,
        target: AnimationTarget,
        to: AnimatedValue,
        duration: f32,
        easing: Easing,
        owner: AnimationOwner,
        group: Option<AnimationGroupId>,
    ) -> Option<AnimationId> {
        let from = self.current_value(target)?;
        let mut spec = AnimationSpec {
            target,
            from,
            to,
            duration,
            easing,
            owner,
            group: None,
        };
        if let Some(group) = group {
            spec = spec.in_group(group);
        }
        Some(self.animations.animate(spec))
    }

    /// Step animations and write their samples into the scene
    pub fn advance_animations(&mut self, dt: f32) -> Vec<CompletionTag> {
        let frame = self.animations.advance(dt);
        self.apply_samples(frame)
    }

    fn apply_samples(&mut self, frame: AnimationFrame) -> Vec<CompletionTag> {
        for sample in frame.samples {
            let written = match (sample.target, sample.value) {
                (AnimationTarget::NodeOpacity(id), AnimatedValue::Scalar(value)) => {
                    self.graph.get_mut(id).map(|node| node.opacity = value.clamp(0.0, 1.0))
                }
                (AnimationTarget::NodeScale(id), AnimatedValue::Scalar(value)) => self
                    .graph
                    .get_mut(id)
                    .map(|node| node.transform.scale = Vec3::new(value, value, value)),
                (AnimationTarget::LightIntensity(id), AnimatedValue::Scalar(value)) => {
                    self.lights.light_mut(id).map(|light| light.intensity = value.max(0.0))
                }
                (AnimationTarget::CameraPosition, AnimatedValue::Vector(value)) => {
                    self.camera.position = value;
                    Some(())
                }
                (AnimationTarget::CameraTarget, AnimatedValue::Vector(value)) => {
                    self.camera.target = value;
                    Some(())
                }
                (target, value) => {
                    log::warn!("Animation sample {:?} does not fit target {:?}", value, target);
                    Some(())
                }
            };
            if written.is_none() {
                self.stale_writes += 1;
                log::warn!("Animation wrote to {:?} after it was destroyed", sample.target);
            }
        }
        frame.completed
    }

    /// Samples that found no live target since creation
    pub const fn stale_writes(&self) -> u64 {
        self.stale_writes
    }

    // ===== Textures =====

    /// Merge finished image loads into waiting materials; returns the new
    /// textures for upload
    pub fn resolve_textures(&mut self) -> Vec<(TextureHandle, DecodedImage)> {
        let completed = self.textures.poll();
        if completed.is_empty() {
            return Vec::new();
        }
        self.materials.resolve_loads(&mut self.resources, completed)
    }

    // ===== Frame assembly =====

    /// Everything the backend needs to draw the current state
    pub fn build_frame(&self, clear_color: Color, shadows_enabled: bool) -> RenderFrame<'_> {
        RenderFrame {
            camera: &self.camera,
            clear_color,
            items: self.graph.draw_items(&self.resources),
            lights: self.lights.iter().map(|(_, light)| light).collect(),
            shadows_enabled,
        }
    }

    // ===== Cleanup =====

    /// Remove every node still under the render root and dispose what they
    /// reference, except cached materials. Returns the number of nodes
    /// removed.
    pub fn clear_orphans(&mut self) -> usize {
        let orphans = self.graph.drain();
        if orphans.is_empty() {
            return 0;
        }

        for (id, node) in &orphans {
            self.animations.cancel_where(|target| target.touches_node(*id));
            if let Some(geometry) = node.geometry {
                if self.resources.contains_geometry(geometry) {
                    if let Err(err) = self.resources.dispose_geometry(geometry) {
                        log::warn!("Orphan geometry of '{}' could not be disposed: {}", node.name, err);
                    }
                }
            }
            if let Some(material) = node.material {
                if !self.materials.is_cached(material) && self.resources.contains_material(material) {
                    if let Err(err) = self.resources.dispose_material(material) {
                        log::warn!("Orphan material of '{}' could not be disposed: {}", node.name, err);
                    }
                }
            }
        }

        log::warn!("Cleared {} orphaned scene nodes", orphans.len());
        orphans.len()
    }

    /// Put the camera back at its default pose
    pub fn reset_camera(&mut self) {
        self.animations.cancel_where(AnimationTarget::is_camera);
        self.camera.set_position(DEFAULT_CAMERA_POSITION);
        self.camera.set_target(Vec3::zeros());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImageSource;
    use crate::render::material::{Material, MaterialParams};
    use crate::render::resources::GeometryKind;
    use crate::scene::node::SceneNode;
    use approx::assert_relative_eq;

    fn context() -> EngineContext {
        EngineContext::new(&ExhibitionConfig::default(), Arc::new(MemoryImageSource::new()))
    }

    #[test]
    fn test_opacity_animation_writes_node() {
        let mut ctx = context();
        let id = ctx.graph.insert(SceneNode::new("panel"));
        ctx.animate_to(
            AnimationTarget::NodeOpacity(id),
            AnimatedValue::Scalar(0.0),
            1.0,
            Easing::Linear,
            AnimationOwner::Engine,
            None,
        )
        .expect("node is live");

        ctx.advance_animations(0.5);
        assert_relative_eq!(ctx.graph.get(id).expect("live").opacity, 0.5);
        ctx.advance_animations(0.5);
        assert_eq!(ctx.graph.get(id).expect("live").opacity, 0.0);
        assert_eq!(ctx.stale_writes(), 0);
    }

    #[test]
    fn test_missing_target_counts_stale_write() {
        let mut ctx = context();
        let id = ctx.graph.insert(SceneNode::new("doomed"));
        ctx.animate_to(
            AnimationTarget::NodeScale(id),
            AnimatedValue::Scalar(2.0),
            1.0,
            Easing::Linear,
            AnimationOwner::Engine,
            None,
        );
        ctx.graph.remove_subtree(id);
        ctx.advance_animations(0.1);
        assert_eq!(ctx.stale_writes(), 1);
    }

    #[test]
    fn test_clear_orphans_keeps_cached_materials() {
        let mut ctx = context();
        let shared = ctx
            .materials
            .get_material(&mut ctx.resources, "wall", &MaterialParams::default());
        let private = ctx.resources.create_material(Material::default());
        let geometry = ctx.resources.create_geometry(GeometryKind::Sphere { radius: 1.0 });
        ctx.graph.insert(SceneNode::new("a").with_mesh(geometry, shared));
        ctx.graph.insert(SceneNode::new("b").with_mesh(geometry, private));

        assert_eq!(ctx.clear_orphans(), 2);
        assert!(ctx.graph.is_empty());
        assert!(ctx.resources.contains_material(shared));
        assert!(!ctx.resources.contains_material(private));
        assert!(!ctx.resources.contains_geometry(geometry));
        assert_eq!(ctx.clear_orphans(), 0);
    }

    #[test]
    fn test_navigation_follows_config() {
        let ctx = context();
        assert!(ctx.navigation.is_some());

        let mut config = ExhibitionConfig::default();
        config.engine = config.engine.with_navigation(false);
        let ctx = EngineContext::new(&config, Arc::new(MemoryImageSource::new()));
        assert!(ctx.navigation.is_none());
    }
}
