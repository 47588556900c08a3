//! # Interaction Manager
//!
//! Resolves pointer and touch input against the nodes the active hall
//! registered as interactable.
//!
//! ## Rules
//!
//! - At most one node is hovered. Moving straight from one node onto
//!   another reports `Leave` for the old node before `Hover` for the new.
//! - Clicking toggles selection. Selection outranks hover when both apply.
//! - The look a node had before it was first highlighted is remembered,
//!   so repeated hover cycles always restore the true original.
//! - At most one popup is open. Opening another closes the first; a click
//!   on empty space or Escape closes it. While open it is re-anchored in
//!   front of the camera every tick.

use std::collections::HashMap;

use crate::animation::{AnimatedValue, AnimationOwner, AnimationSpec, AnimationTarget, CompletionTag, Easing};
use crate::assets::DecodedImage;
use crate::core::config::InteractionConfig;
use crate::foundation::collections::{AnimationGroupId, NodeId, TextureHandle};
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::hall::catalog::hall_for_digit;
use crate::input::{InputEvent, KeyCode, PointerButton, PointerState, TouchPoint};
use crate::interaction::popup::{InfoPopup, PopupContent};
use crate::physics::collision::RayHit;
use crate::scene::context::EngineContext;
use crate::scene::node::NodeTag;

/// Something the host may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// Pointer entered a node
    Hover {
        /// Hovered node
        node: NodeId,
        /// Its metadata
        tag: NodeTag,
    },
    /// Pointer left a node
    Leave {
        /// Node no longer hovered
        node: NodeId,
    },
    /// Node clicked
    Click {
        /// Clicked node
        node: NodeId,
        /// Its metadata
        tag: NodeTag,
        /// Selection state after the click
        selected: bool,
    },
    /// Node double-clicked; the camera flies to it
    DoubleClick {
        /// Target node
        node: NodeId,
        /// Its metadata
        tag: NodeTag,
    },
    /// Popup opened for a node
    PopupOpened {
        /// Node the popup describes
        node: NodeId,
        /// Popup heading
        title: String,
    },
    /// The open popup closed
    PopupClosed,
    /// Entrance marker or number key asked for another hall
    HallSwitchRequested(String),
    /// Two-finger pinch; ratio of finger spread since the last report
    Zoom(f32),
    /// Space bar
    PauseToggled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OriginalLook {
    color: Option<Color>,
    scale: f32,
}

/// Hover, selection and popup state
pub struct InteractionManager {
    config: InteractionConfig,
    pointer: PointerState,
    interactables: Vec<NodeId>,
    hovered: Option<NodeId>,
    selected: Vec<NodeId>,
    originals: HashMap<NodeId, OriginalLook>,
    popup: Option<InfoPopup>,
    tap_start: Option<(f32, f32)>,
    uploads: Vec<(TextureHandle, DecodedImage)>,
    events: Vec<InteractionEvent>,
    enabled: bool,
}

impl InteractionManager {
    /// Create a manager for a surface of the given size
    pub fn new(config: InteractionConfig, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            config,
            pointer: PointerState::new(viewport_width, viewport_height),
            interactables: Vec::new(),
            hovered: None,
            selected: Vec::new(),
            originals: HashMap::new(),
            popup: None,
            tap_start: None,
            uploads: Vec::new(),
            events: Vec::new(),
            enabled: true,
        }
    }

    /// Interaction tuning
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Surface resized
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pointer.update_viewport(width, height);
    }

    /// Ignore input while disabled, e.g. during a transition
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.tap_start = None;
        }
    }

    /// Whether input is processed
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ===== Registry =====

    /// Add a node to hit testing
    pub fn register(&mut self, node: NodeId) {
        if !self.interactables.contains(&node) {
            self.interactables.push(node);
        }
    }

    /// Replace the registry with `nodes`
    pub fn set_interactables(&mut self, nodes: &[NodeId]) {
        self.interactables.clear();
        for &node in nodes {
            self.register(node);
        }
        log::debug!("{} interactable nodes registered", self.interactables.len());
    }

    /// Remove a node from hit testing and restore its look
    pub fn unregister(&mut self, engine: &mut EngineContext, node: NodeId) {
        self.interactables.retain(|&id| id != node);
        self.selected.retain(|&id| id != node);
        if self.hovered == Some(node) {
            self.hovered = None;
            self.events.push(InteractionEvent::Leave { node });
        }
        self.refresh_look(engine, node);
        self.originals.remove(&node);
    }

    /// Drop hover and selection while the nodes still exist: every touched
    /// node gets its original look back and the hovered one reports
    /// `Leave`. The registry is kept.
    pub fn release(&mut self, engine: &mut EngineContext) {
        self.set_hovered(engine, None);
        self.clear_selection(engine);
        self.tap_start = None;
    }

    /// Forget every node without touching the scene.
    ///
    /// Used once the nodes are gone; a node still hovered reports `Leave`.
    /// The popup is left to [`Self::close_popup`].
    pub fn clear(&mut self) {
        self.interactables.clear();
        if let Some(node) = self.hovered.take() {
            self.events.push(InteractionEvent::Leave { node });
        }
        self.selected.clear();
        self.originals.clear();
        self.tap_start = None;
    }

    /// Registered nodes
    pub fn interactables(&self) -> &[NodeId] {
        &self.interactables
    }

    /// Hovered node
    pub const fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Selected nodes in selection order
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Whether `node` is selected
    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected.contains(&node)
    }

    /// Open popup
    pub const fn popup(&self) -> Option<&InfoPopup> {
        self.popup.as_ref()
    }

    // ===== Input =====

    /// Feed one host event; returns whether it was consumed
    pub fn handle_input(&mut self, engine: &mut EngineContext, event: &InputEvent) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            InputEvent::KeyDown(key) => self.handle_key(engine, *key),
            InputEvent::KeyUp(_) => false,
            InputEvent::PointerMove { x, y } => {
                self.pointer.update_position(*x, *y);
                if !self.pointer.is_dragging() {
                    self.hover_at_pointer(engine);
                }
                false
            }
            InputEvent::PointerDown { button, x, y } => {
                self.pointer.update_position(*x, *y);
                if *button == PointerButton::Left {
                    self.pointer.start_drag();
                }
                false
            }
            InputEvent::PointerUp { .. } => {
                self.pointer.end_drag();
                false
            }
            InputEvent::PointerLeave => {
                self.pointer.leave();
                self.set_hovered(engine, None);
                false
            }
            InputEvent::Click { x, y } => self.click(engine, *x, *y),
            InputEvent::DoubleClick { x, y } => self.double_click(engine, *x, *y),
            InputEvent::TouchStart(touches) => {
                self.touch_start(touches);
                false
            }
            InputEvent::TouchMove(touches) => {
                self.touch_move(engine, touches);
                false
            }
            InputEvent::TouchEnd(remaining) => self.touch_end(engine, remaining),
        }
    }

    fn handle_key(&mut self, engine: &mut EngineContext, key: KeyCode) -> bool {
        match key {
            KeyCode::Escape => self.close_popup(engine),
            KeyCode::Digit(digit) => match hall_for_digit(digit) {
                Some(hall) => {
                    self.events.push(InteractionEvent::HallSwitchRequested(hall.to_string()));
                    true
                }
                None => false,
            },
            KeyCode::Space => {
                self.events.push(InteractionEvent::PauseToggled);
                true
            }
            _ => false,
        }
    }

    fn touch_start(&mut self, touches: &[TouchPoint]) {
        self.pointer.update_pinch(touches);
        match touches {
            [touch] => {
                self.pointer.update_position(touch.x, touch.y);
                self.tap_start = Some((touch.x, touch.y));
            }
            _ => self.tap_start = None,
        }
    }

    fn touch_move(&mut self, engine: &mut EngineContext, touches: &[TouchPoint]) {
        if let Some(ratio) = self.pointer.update_pinch(touches) {
            self.events.push(InteractionEvent::Zoom(ratio));
            return;
        }
        if let [touch] = touches {
            if let Some((x, y)) = self.tap_start {
                if (touch.x - x).hypot(touch.y - y) >= PointerState::DRAG_THRESHOLD {
                    self.tap_start = None;
                }
            }
            self.pointer.update_position(touch.x, touch.y);
            self.hover_at_pointer(engine);
        }
    }

    fn touch_end(&mut self, engine: &mut EngineContext, remaining: &[TouchPoint]) -> bool {
        self.pointer.update_pinch(remaining);
        if !remaining.is_empty() {
            return false;
        }
        match self.tap_start.take() {
            Some((x, y)) => self.click(engine, x, y),
            None => false,
        }
    }

    // ===== Picking =====

    /// Nearest registered node under a pixel position
    pub fn pick(&self, engine: &EngineContext, x: f32, y: f32) -> Option<RayHit> {
        let (ndc_x, ndc_y) =
            PointerState::pixel_to_ndc(x, y, self.pointer.viewport_width, self.pointer.viewport_height);
        let ray = engine.camera.screen_to_world_ray(ndc_x, ndc_y)?;
        engine.graph.raycast(&ray, &self.interactables, &engine.resources)
    }

    fn hover_at_pointer(&mut self, engine: &mut EngineContext) {
        let hit = self
            .pick(engine, self.pointer.screen_x, self.pointer.screen_y)
            .map(|hit| hit.node);
        self.set_hovered(engine, hit);
    }

    fn set_hovered(&mut self, engine: &mut EngineContext, node: Option<NodeId>) {
        if node == self.hovered {
            return;
        }
        if let Some(old) = self.hovered.take() {
            self.refresh_look(engine, old);
            self.events.push(InteractionEvent::Leave { node: old });
        }
        if let Some(new) = node {
            self.hovered = Some(new);
            self.refresh_look(engine, new);
            log::trace!("Hover {:?}", new);
            self.events.push(InteractionEvent::Hover {
                node: new,
                tag: tag_of(engine, new),
            });
        }
    }

    /// Click at a pixel position; returns whether a node or the popup
    /// took it
    pub fn click(&mut self, engine: &mut EngineContext, x: f32, y: f32) -> bool {
        self.pointer.update_position(x, y);
        let Some(hit) = self.pick(engine, x, y) else {
            return self.close_popup(engine);
        };
        let node = hit.node;
        let tag = tag_of(engine, node);
        let selected = self.toggle_selection(engine, node);
        self.events.push(InteractionEvent::Click {
            node,
            tag: tag.clone(),
            selected,
        });

        if let NodeTag::EntranceMarker(info) = &tag {
            log::info!("Entrance marker to '{}' clicked", info.destination);
            self.events
                .push(InteractionEvent::HallSwitchRequested(info.destination.clone()));
        } else if let Some(content) = PopupContent::from_tag(&tag) {
            let same_source = self.popup.as_ref().is_some_and(|popup| popup.source() == node);
            if same_source && !selected {
                self.close_popup(engine);
            } else {
                self.open_popup(engine, node, content);
            }
        }
        true
    }

    /// Double click at a pixel position; flies the camera to the node hit
    pub fn double_click(&mut self, engine: &mut EngineContext, x: f32, y: f32) -> bool {
        self.pointer.update_position(x, y);
        let Some(hit) = self.pick(engine, x, y) else {
            return false;
        };
        if self.fly_to(engine, hit.node).is_none() {
            return false;
        }
        self.events.push(InteractionEvent::DoubleClick {
            node: hit.node,
            tag: tag_of(engine, hit.node),
        });
        true
    }

    /// Fly the camera to `zoom_offset` in front of `node`, looking at it.
    /// The group reports [`CompletionTag::CameraFlightFinished`].
    pub fn fly_to(&self, engine: &mut EngineContext, node: NodeId) -> Option<AnimationGroupId> {
        let target = engine.graph.world_position(node)?;
        let mut away = engine.camera.position - target;
        away.y = 0.0;
        let away = if away.norm_squared() < f32::EPSILON {
            Vec3::z()
        } else {
            away.normalize()
        };
        let destination = target + away * self.config.zoom_offset;
        let duration = self.config.zoom_duration;

        let group = engine.animations.begin_group(CompletionTag::CameraFlightFinished);
        let camera = &engine.camera;
        let position = AnimationSpec::vector(AnimationTarget::CameraPosition, camera.position, destination, duration);
        let look = AnimationSpec::vector(AnimationTarget::CameraTarget, camera.target, target, duration);
        for spec in [position, look] {
            engine.animations.animate(
                spec.with_easing(Easing::QuadInOut)
                    .owned_by(AnimationOwner::Interaction)
                    .in_group(group),
            );
        }
        log::debug!("Camera flight to {:?}", target);
        Some(group)
    }

    // ===== Selection and highlight =====

    fn toggle_selection(&mut self, engine: &mut EngineContext, node: NodeId) -> bool {
        let selected = if let Some(index) = self.selected.iter().position(|&id| id == node) {
            self.selected.remove(index);
            false
        } else {
            self.selected.push(node);
            true
        };
        self.refresh_look(engine, node);
        selected
    }

    /// Deselect everything
    pub fn clear_selection(&mut self, engine: &mut EngineContext) {
        for node in std::mem::take(&mut self.selected) {
            self.refresh_look(engine, node);
        }
    }

    /// Apply the look matching the node's current state
    fn refresh_look(&mut self, engine: &mut EngineContext, node: NodeId) {
        if !self.config.highlight_enabled {
            return;
        }
        let Some(scene_node) = engine.graph.get(node) else {
            return;
        };
        let original = *self.originals.entry(node).or_insert(OriginalLook {
            color: scene_node.color_override,
            scale: scene_node.transform.scale.x,
        });

        let (color, scale) = if self.selected.contains(&node) {
            (Some(self.config.selected_color), original.scale * self.config.select_scale)
        } else if self.hovered == Some(node) {
            (Some(self.config.hover_color), original.scale * self.config.hover_scale)
        } else {
            (original.color, original.scale)
        };

        if let Some(scene_node) = engine.graph.get_mut(node) {
            scene_node.color_override = color;
        }
        engine.animate_to(
            AnimationTarget::NodeScale(node),
            AnimatedValue::Scalar(scale),
            self.config.scale_duration,
            Easing::QuadOut,
            AnimationOwner::Interaction,
            None,
        );
    }

    // ===== Popup =====

    /// Open a popup for `source`, closing any open popup first
    pub fn open_popup(&mut self, engine: &mut EngineContext, source: NodeId, content: PopupContent) {
        self.close_popup(engine);
        let title = content.title.clone();
        let (popup, upload) = InfoPopup::open(engine, &self.config, source, content);
        self.popup = Some(popup);
        self.uploads.push(upload);
        self.events.push(InteractionEvent::PopupOpened { node: source, title });
    }

    /// Close the popup; returns whether one was open
    pub fn close_popup(&mut self, engine: &mut EngineContext) -> bool {
        let Some(popup) = self.popup.take() else {
            return false;
        };
        popup.close(engine);
        self.events.push(InteractionEvent::PopupClosed);
        true
    }

    // ===== Per tick =====

    /// Re-anchor the popup and drop references to nodes that are gone
    pub fn update(&mut self, engine: &mut EngineContext) {
        if let Some(popup) = &self.popup {
            popup.anchor(engine, self.config.popup_distance);
        }
        if let Some(node) = self.hovered {
            if !engine.graph.contains(node) {
                self.hovered = None;
                self.events.push(InteractionEvent::Leave { node });
            }
        }
        self.selected.retain(|&node| engine.graph.contains(node));
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Generated popup textures waiting for upload
    pub fn take_uploads(&mut self) -> Vec<(TextureHandle, DecodedImage)> {
        std::mem::take(&mut self.uploads)
    }
}

impl std::fmt::Debug for InteractionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionManager")
            .field("interactables", &self.interactables.len())
            .field("hovered", &self.hovered)
            .field("selected", &self.selected)
            .field("popup", &self.popup.as_ref().map(InfoPopup::source))
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

fn tag_of(engine: &EngineContext, node: NodeId) -> NodeTag {
    engine
        .graph
        .get(node)
        .map_or(NodeTag::Generic, |scene_node| scene_node.tag.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImageSource;
    use crate::core::config::ExhibitionConfig;
    use crate::foundation::math::Vec4;
    use crate::render::material::Material;
    use crate::render::resources::GeometryKind;
    use crate::scene::node::{ArtworkInfo, EntranceInfo, SceneNode};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    struct Fixture {
        engine: EngineContext,
        manager: InteractionManager,
        left: NodeId,
        right: NodeId,
    }

    fn artwork(id: &str) -> NodeTag {
        NodeTag::Artwork(ArtworkInfo {
            id: id.into(),
            title: format!("Painting {id}"),
            artist: "Huang Binhong".into(),
            year: "1950".into(),
            description: String::new(),
            area: None,
            image_url: None,
        })
    }

    fn fixture() -> Fixture {
        let config = ExhibitionConfig::default();
        let mut engine = EngineContext::new(&config, Arc::new(MemoryImageSource::new()));
        engine.camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        engine.camera.set_target(Vec3::zeros());

        let geometry = engine.resources.create_geometry(GeometryKind::Box {
            width: 3.0,
            height: 3.0,
            depth: 1.0,
        });
        let material = engine
            .resources
            .create_material(Material::new("painting", Color::WHITE));
        let left = engine.graph.insert(
            SceneNode::new("left")
                .at(Vec3::new(-3.0, 0.0, 0.0))
                .with_mesh(geometry, material)
                .with_tag(artwork("1")),
        );
        let right = engine.graph.insert(
            SceneNode::new("right")
                .at(Vec3::new(3.0, 0.0, 0.0))
                .with_mesh(geometry, material)
                .with_tag(artwork("2")),
        );

        let mut manager = InteractionManager::new(
            config.interaction.clone(),
            config.engine.viewport_width,
            config.engine.viewport_height,
        );
        manager.set_interactables(&[left, right]);
        Fixture {
            engine,
            manager,
            left,
            right,
        }
    }

    /// Pixel position of a world point on the manager's surface
    fn pixel(fixture: &Fixture, world: Vec3) -> (f32, f32) {
        let clip = fixture.engine.camera.view_projection_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        let (ndc_x, ndc_y) = (clip.x / clip.w, clip.y / clip.w);
        let width = fixture.manager.pointer.viewport_width as f32;
        let height = fixture.manager.pointer.viewport_height as f32;
        ((ndc_x + 1.0) * 0.5 * width, (1.0 - ndc_y) * 0.5 * height)
    }

    fn move_to(fixture: &mut Fixture, world: Vec3) {
        let (x, y) = pixel(fixture, world);
        fixture
            .manager
            .handle_input(&mut fixture.engine, &InputEvent::PointerMove { x, y });
    }

    fn click(fixture: &mut Fixture, world: Vec3) -> bool {
        let (x, y) = pixel(fixture, world);
        fixture.manager.handle_input(&mut fixture.engine, &InputEvent::Click { x, y })
    }

    fn popup_nodes(engine: &EngineContext) -> usize {
        engine
            .graph
            .roots()
            .iter()
            .filter(|&&id| engine.graph.get(id).is_some_and(|node| node.name == "info-popup"))
            .count()
    }

    #[test]
    fn test_leave_fires_before_hover_when_moving_between_nodes() {
        let mut f = fixture();
        move_to(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        assert_eq!(f.manager.hovered(), Some(f.left));
        f.manager.drain_events();

        move_to(&mut f, Vec3::new(3.0, 0.0, 0.5));
        let events = f.manager.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], InteractionEvent::Leave { node: f.left });
        assert!(matches!(events[1], InteractionEvent::Hover { node, .. } if node == f.right));
        assert_eq!(f.manager.hovered(), Some(f.right));

        move_to(&mut f, Vec3::new(0.0, 0.0, 0.5));
        assert_eq!(f.manager.hovered(), None);
        assert_eq!(f.manager.drain_events(), vec![InteractionEvent::Leave { node: f.right }]);
    }

    #[test]
    fn test_original_color_survives_repeated_highlights() {
        let mut f = fixture();
        let red = Color::from_hex(0xff0000);
        f.engine.graph.get_mut(f.left).expect("live").color_override = Some(red);
        let hover = f.manager.config().hover_color;
        let selected = f.manager.config().selected_color;

        for _ in 0..3 {
            move_to(&mut f, Vec3::new(-3.0, 0.0, 0.5));
            assert_eq!(f.engine.graph.get(f.left).expect("live").color_override, Some(hover));
            move_to(&mut f, Vec3::new(0.0, 0.0, 0.5));
            assert_eq!(f.engine.graph.get(f.left).expect("live").color_override, Some(red));
        }

        move_to(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        click(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        assert!(f.manager.is_selected(f.left));
        assert_eq!(f.engine.graph.get(f.left).expect("live").color_override, Some(selected));
        click(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        assert!(!f.manager.is_selected(f.left));
        // Still under the pointer
        assert_eq!(f.engine.graph.get(f.left).expect("live").color_override, Some(hover));

        f.engine.advance_animations(1.0);
        let scale = f.engine.graph.get(f.left).expect("live").transform.scale.x;
        assert_relative_eq!(scale, f.manager.config().hover_scale, epsilon = 1e-5);
    }

    #[test]
    fn test_only_one_popup_is_ever_open() {
        let mut f = fixture();
        assert!(click(&mut f, Vec3::new(-3.0, 0.0, 0.5)));
        assert_eq!(popup_nodes(&f.engine), 1);

        assert!(click(&mut f, Vec3::new(3.0, 0.0, 0.5)));
        assert_eq!(popup_nodes(&f.engine), 1);
        assert_eq!(f.manager.popup().map(InfoPopup::source), Some(f.right));

        let events = f.manager.drain_events();
        let closed = events
            .iter()
            .position(|event| *event == InteractionEvent::PopupClosed)
            .expect("first popup closed");
        let reopened = events
            .iter()
            .rposition(|event| matches!(event, InteractionEvent::PopupOpened { node, .. } if *node == f.right))
            .expect("second popup opened");
        assert!(closed < reopened);
        assert_eq!(f.manager.take_uploads().len(), 2);
    }

    #[test]
    fn test_empty_click_and_escape_close_popup() {
        let mut f = fixture();
        click(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        assert!(click(&mut f, Vec3::new(0.0, 0.0, 0.5)));
        assert!(f.manager.popup().is_none());
        assert_eq!(popup_nodes(&f.engine), 0);
        assert!(!click(&mut f, Vec3::new(0.0, 0.0, 0.5)));

        click(&mut f, Vec3::new(3.0, 0.0, 0.5));
        assert!(f
            .manager
            .handle_input(&mut f.engine, &InputEvent::KeyDown(KeyCode::Escape)));
        assert!(f.manager.popup().is_none());
        assert!(!f
            .manager
            .handle_input(&mut f.engine, &InputEvent::KeyDown(KeyCode::Escape)));
    }

    #[test]
    fn test_popup_follows_camera_each_tick() {
        let mut f = fixture();
        click(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        f.engine.camera.set_position(Vec3::new(2.0, 1.0, 12.0));
        f.manager.update(&mut f.engine);

        let popup = f.manager.popup().expect("open");
        let distance = f.manager.config().popup_distance;
        let expected = f.engine.camera.position + f.engine.camera.forward() * distance;
        assert_relative_eq!(popup.position(&f.engine).expect("live"), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_marker_click_and_digits_request_halls() {
        let mut f = fixture();
        f.engine.graph.get_mut(f.right).expect("live").tag = NodeTag::EntranceMarker(EntranceInfo {
            destination: "middle".into(),
            label: "Middle hall".into(),
        });
        click(&mut f, Vec3::new(3.0, 0.0, 0.5));
        assert!(f.manager.popup().is_none());
        assert!(f
            .manager
            .drain_events()
            .contains(&InteractionEvent::HallSwitchRequested("middle".into())));

        f.manager
            .handle_input(&mut f.engine, &InputEvent::KeyDown(KeyCode::Digit(5)));
        f.manager
            .handle_input(&mut f.engine, &InputEvent::KeyDown(KeyCode::Digit(9)));
        f.manager
            .handle_input(&mut f.engine, &InputEvent::KeyDown(KeyCode::Space));
        assert_eq!(
            f.manager.drain_events(),
            vec![
                InteractionEvent::HallSwitchRequested("end".into()),
                InteractionEvent::PauseToggled
            ]
        );
    }

    #[test]
    fn test_double_click_flies_camera_to_node() {
        let mut f = fixture();
        let (x, y) = pixel(&f, Vec3::new(-3.0, 0.0, 0.5));
        assert!(f
            .manager
            .handle_input(&mut f.engine, &InputEvent::DoubleClick { x, y }));
        assert!(f.engine.animations.is_animating(AnimationTarget::CameraPosition));

        let completed = f.engine.advance_animations(2.0);
        assert!(completed.contains(&CompletionTag::CameraFlightFinished));
        let node = Vec3::new(-3.0, 0.0, 0.0);
        assert_relative_eq!(f.engine.camera.target, node, epsilon = 1e-4);
        assert_relative_eq!(
            (f.engine.camera.position - node).norm(),
            f.manager.config().zoom_offset,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_touch_tap_and_pinch() {
        let mut f = fixture();
        let (x, y) = pixel(&f, Vec3::new(3.0, 0.0, 0.5));
        let touch = TouchPoint::new(1, x, y);
        f.manager
            .handle_input(&mut f.engine, &InputEvent::TouchStart(vec![touch]));
        assert!(f.manager.handle_input(&mut f.engine, &InputEvent::TouchEnd(Vec::new())));
        assert!(f.manager.is_selected(f.right));
        f.manager.drain_events();

        let a = TouchPoint::new(1, 100.0, 100.0);
        let b = TouchPoint::new(2, 200.0, 100.0);
        f.manager
            .handle_input(&mut f.engine, &InputEvent::TouchStart(vec![a, b]));
        let spread = TouchPoint::new(2, 300.0, 100.0);
        f.manager
            .handle_input(&mut f.engine, &InputEvent::TouchMove(vec![a, spread]));
        assert_eq!(f.manager.drain_events(), vec![InteractionEvent::Zoom(2.0)]);
        assert!(!f.manager.handle_input(&mut f.engine, &InputEvent::TouchEnd(vec![a])));
    }

    #[test]
    fn test_disabled_manager_ignores_input() {
        let mut f = fixture();
        f.manager.set_enabled(false);
        assert!(!click(&mut f, Vec3::new(-3.0, 0.0, 0.5)));
        assert!(f.manager.drain_events().is_empty());
        assert!(f.manager.selected().is_empty());
    }

    #[test]
    fn test_release_pairs_hover_with_leave_and_restores_look() {
        let mut f = fixture();
        move_to(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        click(&mut f, Vec3::new(3.0, 0.0, 0.5));
        f.manager.drain_events();

        f.manager.release(&mut f.engine);
        assert_eq!(f.manager.hovered(), None);
        assert!(f.manager.selected().is_empty());
        assert_eq!(f.engine.graph.get(f.left).expect("live").color_override, None);
        assert_eq!(f.engine.graph.get(f.right).expect("live").color_override, None);
        assert_eq!(f.manager.drain_events(), vec![InteractionEvent::Leave { node: f.left }]);
        assert_eq!(f.manager.interactables().len(), 2);

        f.manager.clear();
        assert!(f.manager.drain_events().is_empty());
    }

    #[test]
    fn test_clear_reports_leave_for_hovered_node() {
        let mut f = fixture();
        move_to(&mut f, Vec3::new(3.0, 0.0, 0.5));
        f.manager.drain_events();

        f.manager.clear();
        assert_eq!(f.manager.drain_events(), vec![InteractionEvent::Leave { node: f.right }]);
        assert!(f.manager.interactables().is_empty());
    }

    #[test]
    fn test_unregister_restores_look() {
        let mut f = fixture();
        move_to(&mut f, Vec3::new(-3.0, 0.0, 0.5));
        let left = f.left;
        f.manager.unregister(&mut f.engine, left);
        assert_eq!(f.manager.hovered(), None);
        assert_eq!(f.engine.graph.get(left).expect("live").color_override, None);
        assert_eq!(f.manager.interactables(), &[f.right]);
    }
}
