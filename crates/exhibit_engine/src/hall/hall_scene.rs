//! # Hall Scene
//!
//! One exhibition hall: builds its structure, hangs its artworks, lights
//! itself, registers what can be clicked and owns everything it allocated.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> Loading -> StructureBuilt -> ArtworksPlaced -> LightsConfigured
//!   -> InteractionAreasConfigured -> CameraPositioned -> IntroPlaying -> Ready
//! ```
//!
//! `destroy()` moves any state to `Destroyed`. It first cancels every
//! animation touching the hall's nodes or lights, then removes the lights,
//! then the nodes, and only then disposes geometries, materials and
//! textures. Calling it again, or on a hall that never started, does
//! nothing.

use std::collections::HashSet;

use crate::animation::{AnimatedValue, AnimationOwner, AnimationSpec, AnimationTarget, CompletionTag, Easing};
use crate::assets::DecodedImage;
use crate::error::HallError;
use crate::foundation::collections::{AnimationGroupId, LightId, NodeId, TextureHandle};
use crate::foundation::math::{constants::PI, Transform, Vec3};
use crate::hall::build::{panel_tag, ArtworkPlacement, HallBuildContext, HallContents, MarkerPlacement};
use crate::hall::builders::{self, AreaBuilder};
use crate::hall::config::{AreaConfig, HallConfig};
use crate::render::lighting::LightSpec;
use crate::render::material::MaterialPreset;
use crate::render::resources::GeometryKind;
use crate::scene::context::EngineContext;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{ArtworkInfo, NodeFlags};

/// Horizontal distance within which an artwork belongs to an area
pub const AREA_RADIUS: f32 = 15.0;

/// Construction progress of a hall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HallState {
    /// Created, nothing allocated
    Uninitialized,
    /// Construction started
    Loading,
    /// Floor, walls, ceiling and builder structure exist
    StructureBuilt,
    /// Exhibits placed
    ArtworksPlaced,
    /// Lights created and capped
    LightsConfigured,
    /// Panels, markers and pick targets registered
    InteractionAreasConfigured,
    /// Camera at the starting pose, navigation bounds installed
    CameraPositioned,
    /// Intro fade and camera flight running
    IntroPlaying,
    /// Fully visible and interactive
    Ready,
    /// Everything released
    Destroyed,
}

/// A hall built from a [`HallConfig`]
pub struct HallScene {
    config: HallConfig,
    serial: u64,
    state: HallState,
    builders: Vec<Box<dyn AreaBuilder>>,
    contents: HallContents,
    intro_group: Option<AnimationGroupId>,
}

impl HallScene {
    /// Create a hall; `serial` distinguishes successive halls for
    /// animation ownership
    pub fn new(config: HallConfig, serial: u64) -> Result<Self, HallError> {
        config.check()?;
        let builders = config.builders.iter().map(builders::from_spec).collect();
        Ok(Self {
            config,
            serial,
            state: HallState::Uninitialized,
            builders,
            contents: HallContents::default(),
            intro_group: None,
        })
    }

    /// Hall id
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the hall was built from
    pub const fn config(&self) -> &HallConfig {
        &self.config
    }

    /// Serial number given at creation
    pub const fn serial(&self) -> u64 {
        self.serial
    }

    /// Owner tag of the hall's animations
    pub const fn owner(&self) -> AnimationOwner {
        AnimationOwner::Hall(self.serial)
    }

    /// Current lifecycle state
    pub const fn state(&self) -> HallState {
        self.state
    }

    /// Whether the hall is fully built and its intro is over
    pub fn is_ready(&self) -> bool {
        self.state == HallState::Ready
    }

    /// What the hall has allocated
    pub const fn contents(&self) -> &HallContents {
        &self.contents
    }

    // ===== Construction =====

    /// Run every construction step up to [`HallState::CameraPositioned`].
    ///
    /// On error the hall keeps what it already built; the caller is expected
    /// to `destroy()` it.
    pub fn initialize(&mut self, engine: &mut EngineContext) -> Result<(), HallError> {
        if self.state != HallState::Uninitialized {
            log::warn!("Hall '{}' initialized twice; ignoring", self.config.id);
            return Ok(());
        }

        log::info!("Building hall '{}'", self.config.id);
        self.state = HallState::Loading;
        if let Some(navigation) = engine.navigation.as_mut() {
            navigation.clear_obstacles();
        }

        self.build_structure(engine)?;
        self.state = HallState::StructureBuilt;

        self.place_artworks(engine)?;
        self.state = HallState::ArtworksPlaced;

        self.configure_lights(engine)?;
        self.state = HallState::LightsConfigured;

        self.configure_interaction_areas(engine)?;
        self.state = HallState::InteractionAreasConfigured;

        self.position_camera(engine);
        self.state = HallState::CameraPositioned;

        log::info!(
            "Hall '{}' built: {} nodes, {} lights, {} artworks",
            self.config.id,
            self.contents.nodes.len(),
            self.contents.lights.len(),
            self.contents.artworks.len()
        );
        Ok(())
    }

    fn run_builders(
        &mut self,
        engine: &mut EngineContext,
        step: impl Fn(&mut dyn AreaBuilder, &mut HallBuildContext<'_>) -> Result<(), HallError>,
    ) -> Result<(), HallError> {
        let mut hall = HallBuildContext::new(engine, &self.config, &mut self.contents);
        for builder in &mut self.builders {
            step(builder.as_mut(), &mut hall)?;
        }
        Ok(())
    }

    /// Floor, walls and ceiling, then builder structure
    fn build_structure(&mut self, engine: &mut EngineContext) -> Result<(), HallError> {
        {
            let config = &self.config;
            let mut hall = HallBuildContext::new(engine, config, &mut self.contents);
            let (width, length, height) = (config.width, config.length, config.height);

            let floor = hall.owned_material(MaterialPreset::Floor, &config.materials.floor);
            hall.add_mesh(
                "floor",
                GeometryKind::Plane { width, height: length },
                floor,
                Transform::from_position(Vec3::zeros()).with_pitch(-PI / 2.0),
                NodeFlags::RECEIVE_SHADOW,
            );
            if config.show_grid {
                let grid = hall.owned_material(MaterialPreset::Frame, &config.materials.floor);
                hall.add_mesh(
                    "floor-grid",
                    GeometryKind::Grid {
                        size: width,
                        divisions: width.max(1.0) as u32,
                    },
                    grid,
                    Transform::from_position(Vec3::new(0.0, 0.01, 0.0)),
                    NodeFlags::empty(),
                );
            }

            let wall = hall.owned_material(MaterialPreset::Wall, &config.materials.wall);
            let walls = [
                ("wall-back", width, Vec3::new(0.0, height * 0.5, -length * 0.5), 0.0),
                ("wall-front", width, Vec3::new(0.0, height * 0.5, length * 0.5), PI),
                ("wall-left", length, Vec3::new(-width * 0.5, height * 0.5, 0.0), PI / 2.0),
                ("wall-right", length, Vec3::new(width * 0.5, height * 0.5, 0.0), -PI / 2.0),
            ];
            for (name, span, position, yaw) in walls {
                hall.add_mesh(
                    name,
                    GeometryKind::Plane { width: span, height },
                    wall,
                    Transform::from_position(position).with_yaw(yaw),
                    NodeFlags::RECEIVE_SHADOW,
                );
            }

            let ceiling = hall.owned_material(MaterialPreset::Ceiling, &config.materials.ceiling);
            hall.add_mesh(
                "ceiling",
                GeometryKind::Plane { width, height: length },
                ceiling,
                Transform::from_position(Vec3::new(0.0, height, 0.0)).with_pitch(PI / 2.0),
                NodeFlags::RECEIVE_SHADOW,
            );
        }

        self.run_builders(engine, |builder, hall| builder.build_structure(hall))
    }

    /// Exhibits, by whichever builder claims the step
    fn place_artworks(&mut self, engine: &mut EngineContext) -> Result<(), HallError> {
        if !self.builders.iter().any(|builder| builder.places_artworks()) {
            log::warn!(
                "Hall '{}' has no artwork placement step; {} configured artworks are not shown",
                self.config.id,
                self.config.artworks.len()
            );
            return Ok(());
        }
        self.run_builders(engine, |builder, hall| builder.place_artworks(hall))
    }

    /// Light recipe, builder lights, then the renderer caps
    fn configure_lights(&mut self, engine: &mut EngineContext) -> Result<(), HallError> {
        {
            let config = &self.config;
            let mut hall = HallBuildContext::new(engine, config, &mut self.contents);
            if config.lighting.is_empty() {
                hall.add_light("ambient", &LightSpec::preset("ambient"))?;
                hall.add_light("main", &LightSpec::preset("main"))?;
                hall.add_light("fill", &LightSpec::preset("fill"))?;
            } else {
                for (index, spec) in config.lighting.iter().enumerate() {
                    hall.add_light(&format!("{}-{index}", spec.preset), spec)?;
                }
            }
        }
        self.run_builders(engine, |builder, hall| builder.configure_lights(hall))?;

        let removed = engine.lights.enforce_caps();
        if !removed.is_empty() {
            self.contents.lights.retain(|id| !removed.contains(id));
        }
        Ok(())
    }

    /// Info panels, entrance markers and builder pick targets
    fn configure_interaction_areas(&mut self, engine: &mut EngineContext) -> Result<(), HallError> {
        {
            let config = &self.config;
            let mut hall = HallBuildContext::new(engine, config, &mut self.contents);
            for panel in &config.info_panels {
                let text = format!("{}\n{}", panel.title, panel.body);
                let node = hall.text_panel(
                    format!("panel-{}", panel.id),
                    (panel.width, panel.height),
                    0xfaf0e6,
                    Transform::from_position(panel.position).with_yaw(panel.rotation_y),
                    panel_tag(&panel.title, &panel.body),
                    &text,
                );
                hall.register_interactable(node);
            }
            for marker in &config.entrance_markers {
                hall.entrance_marker(&marker.destination, &marker.label, marker.position)?;
            }
        }
        self.run_builders(engine, |builder, hall| builder.configure_interaction(hall))
    }

    /// Camera to its starting pose; navigation bounds from the hall size
    fn position_camera(&self, engine: &mut EngineContext) {
        engine.camera.set_position(self.config.camera.position);
        engine.camera.set_target(self.config.camera.target);
        if let Some(navigation) = engine.navigation.as_mut() {
            navigation.install_hall_bounds(self.config.width, self.config.length);
        }
    }

    // ===== Intro and fades =====

    /// Start the intro.
    ///
    /// Objects fade in, lights ramp up and the camera flies from the
    /// entrance offset to the starting pose, all in one completion group
    /// tagged [`CompletionTag::IntroFinished`] with this hall's serial. A
    /// disabled intro makes the hall ready immediately and returns `None`.
    pub fn play_intro(&mut self, engine: &mut EngineContext) -> Option<AnimationGroupId> {
        if self.state != HallState::CameraPositioned {
            log::warn!("Intro of '{}' requested in state {:?}", self.config.id, self.state);
            return None;
        }
        let duration = self.config.intro_duration;
        if !self.config.enable_intro || duration <= 0.0 {
            self.state = HallState::Ready;
            return None;
        }

        let group = engine.animations.begin_group(CompletionTag::IntroFinished(self.serial));
        self.fade_in_scaled(engine, duration * 0.8, duration * 0.6, group);

        let start = self.config.intro_start();
        let pose = self.config.camera;
        engine.camera.set_position(start);
        engine.animations.animate(
            AnimationSpec::vector(AnimationTarget::CameraPosition, start, pose.position, duration)
                .with_easing(Easing::QuadInOut)
                .owned_by(self.owner())
                .in_group(group),
        );
        engine.animations.animate(
            AnimationSpec::vector(AnimationTarget::CameraTarget, pose.target, pose.target, duration)
                .owned_by(self.owner())
                .in_group(group),
        );

        self.intro_group = Some(group);
        self.state = HallState::IntroPlaying;
        log::debug!("Intro of '{}' started ({:.2}s)", self.config.id, duration);
        Some(group)
    }

    /// Completion group of the running intro
    pub const fn intro_group(&self) -> Option<AnimationGroupId> {
        self.intro_group
    }

    /// Mark the intro as finished
    pub fn finish_intro(&mut self) {
        if self.state == HallState::IntroPlaying {
            self.intro_group = None;
            self.state = HallState::Ready;
            log::info!("Hall '{}' ready", self.config.id);
        }
    }

    /// Fade every top-level node and light from zero to its current value
    /// over `duration`, joining `group`
    pub fn fade_in(&mut self, engine: &mut EngineContext, duration: f32, group: AnimationGroupId) {
        self.fade_in_scaled(engine, duration, duration, group);
        if self.state == HallState::CameraPositioned {
            self.state = HallState::Ready;
        }
    }

    fn fade_in_scaled(&self, engine: &mut EngineContext, objects: f32, lights: f32, group: AnimationGroupId) {
        for id in self.top_level_nodes(&engine.graph) {
            let Some(node) = engine.graph.get_mut(id) else {
                continue;
            };
            let nominal = node.opacity;
            node.opacity = 0.0;
            engine.animations.animate(
                AnimationSpec::scalar(AnimationTarget::NodeOpacity(id), 0.0, nominal, objects)
                    .with_easing(Easing::QuadOut)
                    .owned_by(self.owner())
                    .in_group(group),
            );
        }
        for &id in &self.contents.lights {
            let Some(light) = engine.lights.light_mut(id) else {
                continue;
            };
            let nominal = light.intensity;
            light.intensity = 0.0;
            engine.animations.animate(
                AnimationSpec::scalar(AnimationTarget::LightIntensity(id), 0.0, nominal, lights)
                    .with_easing(Easing::QuadOut)
                    .owned_by(self.owner())
                    .in_group(group),
            );
        }
    }

    /// Fade every top-level node and light to zero over `duration`,
    /// joining `group`
    pub fn fade_out(&self, engine: &mut EngineContext, duration: f32, group: AnimationGroupId) -> usize {
        let mut started = 0;
        for id in self.top_level_nodes(&engine.graph) {
            if engine
                .animate_to(
                    AnimationTarget::NodeOpacity(id),
                    AnimatedValue::Scalar(0.0),
                    duration,
                    Easing::QuadIn,
                    self.owner(),
                    Some(group),
                )
                .is_some()
            {
                started += 1;
            }
        }
        for &id in &self.contents.lights {
            if engine
                .animate_to(
                    AnimationTarget::LightIntensity(id),
                    AnimatedValue::Scalar(0.0),
                    duration,
                    Easing::QuadIn,
                    self.owner(),
                    Some(group),
                )
                .is_some()
            {
                started += 1;
            }
        }
        started
    }

    fn top_level_nodes(&self, graph: &SceneGraph) -> Vec<NodeId> {
        self.contents
            .nodes
            .iter()
            .copied()
            .filter(|&id| graph.get(id).is_some_and(|node| node.parent().is_none()))
            .collect()
    }

    // ===== Per tick =====

    /// Advance builder decoration
    pub fn update(&mut self, engine: &mut EngineContext, dt: f32) {
        if matches!(self.state, HallState::Uninitialized | HallState::Destroyed) {
            return;
        }
        for builder in &mut self.builders {
            builder.update(engine, dt);
        }
    }

    /// Generated textures waiting for upload
    pub fn take_uploads(&mut self) -> Vec<(TextureHandle, DecodedImage)> {
        std::mem::take(&mut self.contents.uploads)
    }

    // ===== Teardown =====

    /// Release everything the hall created. Safe to call repeatedly.
    pub fn destroy(&mut self, engine: &mut EngineContext) {
        match self.state {
            HallState::Destroyed => return,
            HallState::Uninitialized => {
                self.state = HallState::Destroyed;
                return;
            }
            _ => {}
        }
        log::info!("Destroying hall '{}'", self.config.id);

        // Animations first: nothing may sample into a disposed target
        let nodes: HashSet<NodeId> = self
            .contents
            .nodes
            .iter()
            .flat_map(|&id| engine.graph.subtree(id))
            .collect();
        let lights: HashSet<LightId> = self.contents.lights.iter().copied().collect();
        engine.animations.cancel_owner(self.owner());
        engine.animations.cancel_where(|target| match *target {
            AnimationTarget::NodeOpacity(id) | AnimationTarget::NodeScale(id) => nodes.contains(&id),
            AnimationTarget::LightIntensity(id) => lights.contains(&id),
            AnimationTarget::CameraPosition | AnimationTarget::CameraTarget => false,
        });
        if let Some(group) = self.intro_group.take() {
            engine.animations.abandon_group(group);
        }

        for &id in &self.contents.lights {
            engine.lights.remove_id(id);
        }

        for &id in &self.contents.nodes {
            engine.graph.remove_subtree(id);
        }

        for &geometry in &self.contents.geometries {
            if let Err(err) = engine.resources.dispose_geometry(geometry) {
                log::warn!("Geometry of '{}' already gone: {}", self.config.id, err);
            }
        }
        for &material in &self.contents.materials {
            if let Err(err) = engine.resources.dispose_material(material) {
                log::warn!("Material of '{}' already gone: {}", self.config.id, err);
            }
        }

        if let Some(navigation) = engine.navigation.as_mut() {
            navigation.clear_obstacles();
        }
        self.contents = HallContents::default();
        self.state = HallState::Destroyed;
    }

    // ===== Queries =====

    /// Metadata of an artwork by catalog id
    pub fn artwork_info(&self, id: &str) -> Option<&ArtworkInfo> {
        self.contents
            .artworks
            .iter()
            .find(|artwork| artwork.info.id == id)
            .map(|artwork| &artwork.info)
    }

    /// Hung artworks
    pub fn artworks(&self) -> &[ArtworkPlacement] {
        &self.contents.artworks
    }

    /// Area by id
    pub fn area_info(&self, id: &str) -> Option<&AreaConfig> {
        self.config.areas.iter().find(|area| area.id == id)
    }

    /// Artworks within [`AREA_RADIUS`] of an area centre on the floor plane
    pub fn artworks_in_area(&self, area_id: &str) -> Vec<&ArtworkInfo> {
        let Some(area) = self.area_info(area_id) else {
            return Vec::new();
        };
        self.contents
            .artworks
            .iter()
            .filter(|artwork| {
                let dx = artwork.position.x - area.center.x;
                let dz = artwork.position.z - area.center.z;
                dx.hypot(dz) < AREA_RADIUS
            })
            .map(|artwork| &artwork.info)
            .collect()
    }

    /// Markers leading to other halls
    pub fn entrance_markers(&self) -> &[MarkerPlacement] {
        &self.contents.markers
    }

    /// Nodes registered for picking
    pub fn interactable_nodes(&self) -> &[NodeId] {
        &self.contents.interactables
    }

    /// One of the hall's nodes by name
    pub fn node_by_name(&self, graph: &SceneGraph, name: &str) -> Option<NodeId> {
        self.contents
            .nodes
            .iter()
            .copied()
            .find(|&id| graph.get(id).is_some_and(|node| node.name == name))
    }

    /// Show or hide a named node; returns whether it was found
    pub fn set_node_visible(&self, graph: &mut SceneGraph, name: &str, visible: bool) -> bool {
        let Some(id) = self.node_by_name(graph, name) else {
            return false;
        };
        match graph.get_mut(id) {
            Some(node) => {
                node.set_visible(visible);
                true
            }
            None => false,
        }
    }

    /// Flip the visibility of a named node; returns the new visibility
    pub fn toggle_node_visible(&self, graph: &mut SceneGraph, name: &str) -> Option<bool> {
        let id = self.node_by_name(graph, name)?;
        let node = graph.get_mut(id)?;
        let visible = !node.is_visible();
        node.set_visible(visible);
        Some(visible)
    }
}

impl std::fmt::Debug for HallScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HallScene")
            .field("id", &self.config.id)
            .field("serial", &self.serial)
            .field("state", &self.state)
            .field("builders", &self.builders.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
