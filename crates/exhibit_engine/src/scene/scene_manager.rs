//! Scene manager
//!
//! Owns the engine context, the active hall and the in-flight transition,
//! and drives everything from one `update` tick:
//!
//! 1. camera control (navigation or orbit)
//! 2. animations
//! 3. the transition state machine
//! 4. texture uploads
//! 5. hall and interaction per-frame work
//! 6. event delivery
//! 7. frame-rate tracking and rendering
//!
//! At most one hall is active and at most one transition runs at a time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::{AnimatedValue, AnimationOwner, AnimationTarget, CompletionTag, Easing};
use crate::assets::ImageSource;
use crate::config::Config;
use crate::core::config::ExhibitionConfig;
use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::{AnimationGroupId, NodeId};
use crate::foundation::math::Vec3;
use crate::foundation::time::{FrameRateMonitor, MAX_DELTA_TIME};
use crate::hall::{builtin_halls, AreaConfig, HallConfig, HallScene, MarkerPlacement};
use crate::input::InputEvent;
use crate::interaction::{InteractionEvent, InteractionManager};
use crate::navigation::NavigationMode;
use crate::render::backend::{HeadlessBackend, RenderBackend};
use crate::render::orbit::OrbitController;
use crate::scene::context::EngineContext;
use crate::scene::events::{EngineCallbacks, EngineEvent};
use crate::scene::node::ArtworkInfo;
use crate::scene::transition::{self, Transition, TransitionPhase, TransitionTicket};

/// Frame statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceStats {
    /// Frames per second over the last closed window
    pub fps: f32,
    /// Length of the last tick in milliseconds
    pub frame_time_ms: f32,
    /// Ticks run
    pub frames: u64,
    /// Ticks that reached the backend
    pub rendered_frames: u64,
    /// Ticks whose render was skipped by adaptive quality
    pub skipped_frames: u64,
    /// Draw items in the last rendered frame
    pub draw_items: usize,
    /// Lights in the last rendered frame
    pub lights: usize,
    /// Whether adaptive quality is currently skipping renders
    pub throttled: bool,
}

impl PerformanceStats {
    /// Within 5% of the target frame rate
    pub fn is_performance_good(&self, target_fps: f32) -> bool {
        self.fps >= target_fps * 0.95
    }
}

/// Top-level engine object
pub struct SceneManager<B: RenderBackend = HeadlessBackend> {
    config: ExhibitionConfig,
    images: Arc<dyn ImageSource>,
    backend: B,
    engine: Option<EngineContext>,
    interaction: Option<InteractionManager>,
    orbit: Option<OrbitController>,
    orbit_drag: Option<(f32, f32)>,
    halls: HashMap<String, HallConfig>,
    active: Option<HallScene>,
    transition: Option<Transition>,
    next_serial: u64,
    running: bool,
    paused: bool,
    frame_rate: FrameRateMonitor,
    skip_toggle: bool,
    stats: PerformanceStats,
    callbacks: EngineCallbacks,
    pending: Vec<EngineEvent>,
    delivered: Vec<EngineEvent>,
}

impl<B: RenderBackend> SceneManager<B> {
    /// Create an uninitialized manager with the built-in halls registered
    pub fn new(config: ExhibitionConfig, backend: B, images: Arc<dyn ImageSource>) -> Self {
        let halls = builtin_halls()
            .into_iter()
            .map(|hall| (hall.id.clone(), hall))
            .collect();
        let frame_rate = FrameRateMonitor::new(config.engine.target_fps as f32);

        Self {
            config,
            images,
            backend,
            engine: None,
            interaction: None,
            orbit: None,
            orbit_drag: None,
            halls,
            active: None,
            transition: None,
            next_serial: 0,
            running: false,
            paused: false,
            frame_rate,
            skip_toggle: false,
            stats: PerformanceStats::default(),
            callbacks: EngineCallbacks::new(),
            pending: Vec::new(),
            delivered: Vec::new(),
        }
    }

    // ===== Lifecycle =====

    /// Validate the configuration, create the surface and the engine
    /// context. A second call only logs a warning.
    pub fn initialize(&mut self) -> EngineResult<()> {
        if self.engine.is_some() {
            log::warn!("Scene manager already initialized");
            return Ok(());
        }

        self.config.validate()?;
        let (width, height) = (self.config.engine.viewport_width, self.config.engine.viewport_height);
        self.backend.create_surface(width, height)?;

        self.engine = Some(EngineContext::new(&self.config, Arc::clone(&self.images)));
        self.interaction = Some(InteractionManager::new(self.config.interaction.clone(), width, height));
        self.orbit = self
            .config
            .engine
            .enable_orbit_controls
            .then(|| OrbitController::new(self.config.engine.orbit.clone()));
        self.frame_rate = FrameRateMonitor::new(self.config.engine.target_fps as f32);
        self.stats = PerformanceStats::default();
        self.running = true;
        self.paused = false;

        log::info!(
            "Scene manager initialized ({}x{}, {} halls registered)",
            width,
            height,
            self.halls.len()
        );
        Ok(())
    }

    /// Whether `initialize` succeeded and `destroy` has not run since
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Resume ticking after `stop`
    pub fn start(&mut self) -> EngineResult<()> {
        if self.engine.is_none() {
            return Err(EngineError::NotInitialized);
        }
        self.running = true;
        log::info!("Scene manager started");
        Ok(())
    }

    /// Make `update` a no-op until `start`
    pub fn stop(&mut self) {
        self.running = false;
        log::info!("Scene manager stopped");
    }

    /// Whether ticks do work
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether hall animations and navigation are paused
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume hall animations and navigation
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            log::info!("Scene manager {}", if paused { "paused" } else { "resumed" });
        }
    }

    /// Cancel any transition, destroy the active hall, release every cached
    /// resource and the drawing surface. Safe to call more than once.
    pub fn destroy(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            log::debug!("Scene manager already destroyed");
            return;
        };
        self.running = false;

        if let Some(transition) = self.transition.take() {
            transition.cancel();
        }
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.close_popup(&mut engine);
            interaction.clear();
        }
        if let Some(mut hall) = self.active.take() {
            hall.destroy(&mut engine);
        }

        engine.clear_orphans();
        engine.animations.clear();
        engine.lights.clear();
        engine.materials.clear(&mut engine.resources);

        let stats = engine.resources.stats();
        if stats.is_balanced() {
            log::info!("Scene manager destroyed; all resources released");
        } else {
            log::warn!("Scene manager destroyed with leaked resources: {:?}", stats);
        }

        self.backend.release_surface();
        self.interaction = None;
        self.orbit = None;
        self.orbit_drag = None;
        self.pending.clear();
    }

    // ===== Halls =====

    /// Add or replace a hall definition
    pub fn register_hall(&mut self, config: HallConfig) -> EngineResult<()> {
        config.check().map_err(EngineError::Hall)?;
        log::debug!("Registered hall '{}'", config.id);
        self.halls.insert(config.id.clone(), config);
        Ok(())
    }

    /// Registered hall ids in sorted order
    pub fn hall_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.halls.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Begin switching to `hall_id`.
    ///
    /// `config` overrides the registered definition. The returned ticket
    /// resolves once the new hall is ready or its construction failed.
    /// Only one transition runs at a time; a request made while another is
    /// in flight is rejected.
    pub fn switch_scene(&mut self, hall_id: &str, config: Option<HallConfig>) -> EngineResult<TransitionTicket> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(EngineError::NotInitialized);
        };
        if let Some(transition) = &self.transition {
            log::warn!(
                "Switch to '{}' rejected: transition to '{}' still in progress",
                hall_id,
                transition.to
            );
            return Err(EngineError::TransitionInProgress(transition.to.clone()));
        }

        let mut config = match config {
            Some(config) => config,
            None => self
                .halls
                .get(hall_id)
                .cloned()
                .ok_or_else(|| EngineError::UnknownHall(hall_id.to_string()))?,
        };
        if config.id != hall_id {
            log::debug!("Hall config '{}' activated as '{}'", config.id, hall_id);
            config.id = hall_id.to_string();
        }
        let incoming = HallScene::new(config, self.next_serial + 1)?;
        self.next_serial += 1;

        if let Some(interaction) = self.interaction.as_mut() {
            interaction.close_popup(engine);
            interaction.release(engine);
            interaction.set_enabled(false);
        }
        if let Some(navigation) = engine.navigation.as_mut() {
            navigation.release_all();
        }
        self.orbit_drag = None;

        let from = self.active.as_ref().map(|hall| hall.id().to_string());
        let phase = match &self.active {
            Some(outgoing) => {
                let group = engine.animations.begin_group(CompletionTag::FadeOutFinished);
                let fading = outgoing.fade_out(engine, self.config.engine.fade_out_duration, group);
                log::debug!("Fading out '{}' ({} animations)", outgoing.id(), fading);
                TransitionPhase::FadingOut(group)
            }
            None => TransitionPhase::Constructing,
        };

        log::info!("Transition {:?} -> '{}' started", from, hall_id);
        let (ticket, resolver) = transition::ticket(hall_id);
        self.pending.push(EngineEvent::TransitionStarted {
            from: from.clone(),
            to: hall_id.to_string(),
        });
        self.transition = Some(Transition::new(from, incoming, phase, resolver));
        Ok(ticket)
    }

    /// Whether a switch is in flight
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Phase of the switch in flight
    pub fn transition_phase(&self) -> Option<TransitionPhase> {
        self.transition.as_ref().map(|transition| transition.phase)
    }

    /// The active hall
    pub fn current_hall(&self) -> Option<&HallScene> {
        self.active.as_ref()
    }

    /// Id of the active hall
    pub fn current_hall_id(&self) -> Option<&str> {
        self.active.as_ref().map(HallScene::id)
    }

    /// Artwork of the active hall by id
    pub fn artwork_info(&self, id: &str) -> Option<&ArtworkInfo> {
        self.active.as_ref()?.artwork_info(id)
    }

    /// Area of the active hall by id
    pub fn area_info(&self, id: &str) -> Option<&AreaConfig> {
        self.active.as_ref()?.area_info(id)
    }

    /// Entrance markers of the active hall
    pub fn entrance_markers(&self) -> &[MarkerPlacement] {
        self.active.as_ref().map_or(&[], HallScene::entrance_markers)
    }

    /// Pickable nodes of the active hall
    pub fn interactable_objects(&self) -> &[NodeId] {
        self.active.as_ref().map_or(&[], HallScene::interactable_nodes)
    }

    // ===== Tick =====

    /// Advance everything by `dt` seconds and render one frame
    pub fn update(&mut self, dt: f32) -> EngineResult<()> {
        if self.engine.is_none() {
            return Err(EngineError::NotInitialized);
        }
        if !self.running {
            return Ok(());
        }
        self.with_engine(|manager, engine| manager.tick(engine, dt))
    }

    fn tick(&mut self, engine: &mut EngineContext, dt: f32) -> EngineResult<()> {
        let dt = dt.clamp(0.0, MAX_DELTA_TIME);

        self.drive_camera(engine, dt);
        let completed = engine.advance_animations(dt);
        self.advance_transition(engine, &completed);
        self.upload_textures(engine);

        if !self.paused {
            if let Some(hall) = self.active.as_mut() {
                hall.update(engine, dt);
            }
        }
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.update(engine);
        }

        self.collect_events(engine);
        self.deliver_events();
        self.render(engine, dt)
    }

    fn drive_camera(&mut self, engine: &mut EngineContext, dt: f32) {
        let free_roam = engine
            .navigation
            .as_ref()
            .is_some_and(|navigation| navigation.mode() == NavigationMode::FreeRoam);
        if let Some(orbit) = self.orbit.as_mut() {
            if orbit.is_enabled() == free_roam {
                orbit.set_enabled(!free_roam);
            }
        }

        let camera_busy = self.transition.is_some()
            || engine.animations.is_animating(AnimationTarget::CameraPosition)
            || engine.animations.is_animating(AnimationTarget::CameraTarget);
        if self.paused || camera_busy {
            return;
        }

        if free_roam {
            if let Some(navigation) = engine.navigation.as_mut() {
                navigation.update(&mut engine.camera, dt);
            }
        } else if let Some(orbit) = self.orbit.as_mut() {
            orbit.update(&mut engine.camera);
        }
    }

    fn advance_transition(&mut self, engine: &mut EngineContext, completed: &[CompletionTag]) {
        loop {
            let Some(phase) = self.transition_phase() else {
                return;
            };

            let next = match phase {
                TransitionPhase::FadingOut(_) if self.phase_done(engine, completed, CompletionTag::FadeOutFinished) => {
                    TransitionPhase::Destroying
                }
                TransitionPhase::Destroying => {
                    self.destroy_outgoing(engine);
                    TransitionPhase::Constructing
                }
                TransitionPhase::Constructing => match self.construct_incoming(engine) {
                    Some(next) => next,
                    None => return,
                },
                TransitionPhase::IntroPlaying(serial)
                    if self.phase_done(engine, completed, CompletionTag::IntroFinished(serial)) =>
                {
                    if let Some(hall) = self.active.as_mut() {
                        hall.finish_intro();
                    }
                    self.finish_transition();
                    return;
                }
                TransitionPhase::FadingIn(_) if self.phase_done(engine, completed, CompletionTag::FadeInFinished) => {
                    self.finish_transition();
                    return;
                }
                _ => return,
            };

            log::debug!("Transition phase {:?} -> {:?}", phase, next);
            if let Some(transition) = self.transition.as_mut() {
                transition.phase = next;
            }
        }
    }

    /// Whether the phase waiting on `tag` may move on: its group reported,
    /// or another animation took over one of its members and it never will
    fn phase_done(&self, engine: &EngineContext, completed: &[CompletionTag], tag: CompletionTag) -> bool {
        if completed.contains(&tag) {
            return true;
        }
        let group = match self.transition_phase() {
            Some(TransitionPhase::FadingOut(group) | TransitionPhase::FadingIn(group)) => Some(group),
            Some(TransitionPhase::IntroPlaying(_)) => self.active.as_ref().and_then(HallScene::intro_group),
            _ => None,
        };
        let interrupted = group.is_some_and(|group| !engine.animations.is_group_live(group));
        if interrupted {
            log::warn!("{:?} will never report: a member was replaced; moving on", tag);
        }
        interrupted
    }

    fn destroy_outgoing(&mut self, engine: &mut EngineContext) {
        if let Some(mut outgoing) = self.active.take() {
            outgoing.destroy(engine);
        }
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.clear();
        }
        let orphans = engine.clear_orphans();
        if orphans > 0 {
            log::debug!("Removed {} nodes left behind by the outgoing hall", orphans);
        }
    }

    /// Build the incoming hall and start its intro or fade-in. Returns the
    /// next phase, or `None` when construction failed and the transition
    /// was rolled back.
    fn construct_incoming(&mut self, engine: &mut EngineContext) -> Option<TransitionPhase> {
        let incoming = self.transition.as_mut().and_then(|transition| transition.incoming.take());
        let Some(mut hall) = incoming else {
            log::error!("Transition reached construction without an incoming hall");
            self.fail_transition(EngineError::TransitionCancelled);
            return None;
        };

        if let Err(err) = hall.initialize(engine) {
            log::error!("Building hall '{}' failed: {}", hall.id(), err);
            hall.destroy(engine);
            engine.clear_orphans();
            self.fail_transition(err.into());
            return None;
        }

        if let Some(interaction) = self.interaction.as_mut() {
            interaction.set_interactables(hall.interactable_nodes());
        }

        let next = match hall.play_intro(engine) {
            Some(_) => TransitionPhase::IntroPlaying(hall.serial()),
            None => {
                let group = engine.animations.begin_group(CompletionTag::FadeInFinished);
                hall.fade_in(engine, self.config.engine.fade_in_duration, group);
                TransitionPhase::FadingIn(group)
            }
        };
        self.active = Some(hall);
        Some(next)
    }

    fn finish_transition(&mut self) {
        let Some(transition) = self.transition.take() else {
            return;
        };
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.set_enabled(true);
        }
        log::info!("Transition {} finished", transition.route());
        self.pending.push(EngineEvent::HallReady(transition.to.clone()));
        transition.resolver.resolve(Ok(transition.to));
    }

    fn fail_transition(&mut self, err: EngineError) {
        let Some(transition) = self.transition.take() else {
            return;
        };
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.set_enabled(true);
        }
        log::warn!("Transition {} failed", transition.route());
        self.pending.push(EngineEvent::TransitionFailed {
            hall: transition.to.clone(),
            reason: err.to_string(),
        });
        transition.resolver.resolve(Err(err));
    }

    fn upload_textures(&mut self, engine: &mut EngineContext) {
        let mut uploads = engine.resolve_textures();
        if let Some(hall) = self.active.as_mut() {
            uploads.extend(hall.take_uploads());
        }
        if let Some(interaction) = self.interaction.as_mut() {
            uploads.extend(interaction.take_uploads());
        }

        for (texture, image) in uploads {
            if engine.resources.texture(texture).is_none() {
                log::trace!("Skipping upload for disposed texture {:?}", texture);
                continue;
            }
            if let Err(err) = self.backend.upload_texture(texture, &image) {
                log::warn!("Texture upload failed: {}", err);
            }
        }
    }

    fn collect_events(&mut self, engine: &mut EngineContext) {
        if let Some(interaction) = self.interaction.as_mut() {
            for event in interaction.drain_events() {
                if event == InteractionEvent::PauseToggled {
                    self.paused = !self.paused;
                    log::info!("Scene manager {}", if self.paused { "paused" } else { "resumed" });
                }
                self.pending.push(event.into());
            }
        }
        if let Some(navigation) = engine.navigation.as_mut() {
            self.pending
                .extend(navigation.drain_events().into_iter().map(EngineEvent::from));
        }
    }

    fn deliver_events(&mut self) {
        for event in std::mem::take(&mut self.pending) {
            self.callbacks.dispatch(&event);
            self.delivered.push(event);
        }
    }

    fn render(&mut self, engine: &EngineContext, dt: f32) -> EngineResult<()> {
        if let Some(fps) = self.frame_rate.record_frame(dt) {
            self.stats.fps = fps;
        } else {
            self.stats.fps = self.frame_rate.fps();
        }
        self.stats.frames = self.frame_rate.total_frames();
        self.stats.frame_time_ms = dt * 1000.0;

        let engine_config = &self.config.engine;
        let throttled = engine_config.adaptive_quality && self.stats.fps < engine_config.min_fps as f32;
        self.stats.throttled = throttled;
        let draw = if throttled {
            self.skip_toggle = !self.skip_toggle;
            !self.skip_toggle
        } else {
            self.skip_toggle = false;
            true
        };

        if !draw {
            self.stats.skipped_frames += 1;
            log::trace!("Render skipped at {} fps", self.stats.fps);
            return Ok(());
        }

        let frame = engine.build_frame(engine_config.background_color, engine_config.enable_shadows);
        self.backend.render(&frame)?;
        self.stats.rendered_frames += 1;
        self.stats.draw_items = frame.items.len();
        self.stats.lights = frame.lights.len();
        Ok(())
    }

    // ===== Input =====

    /// Route one input event: interaction first, then navigation or orbit.
    /// Returns whether anything consumed it.
    pub fn handle_input(&mut self, event: &InputEvent) -> EngineResult<bool> {
        self.with_engine(|manager, engine| {
            let consumed = manager
                .interaction
                .as_mut()
                .is_some_and(|interaction| interaction.handle_input(engine, event));
            if consumed {
                return Ok(true);
            }
            if manager.transition.is_some() {
                return Ok(false);
            }
            Ok(manager.route_camera_input(engine, event))
        })
    }

    fn route_camera_input(&mut self, engine: &mut EngineContext, event: &InputEvent) -> bool {
        let free_roam = engine
            .navigation
            .as_ref()
            .is_some_and(|navigation| navigation.mode() == NavigationMode::FreeRoam);

        match event {
            InputEvent::KeyDown(key) => engine
                .navigation
                .as_mut()
                .is_some_and(|navigation| navigation.handle_key(*key, true)),
            InputEvent::KeyUp(key) => engine
                .navigation
                .as_mut()
                .is_some_and(|navigation| navigation.handle_key(*key, false)),
            InputEvent::PointerDown { button, x, y } => {
                if free_roam {
                    if let Some(navigation) = engine.navigation.as_mut() {
                        navigation.pointer_down(*button, *x, *y);
                        return navigation.is_rotating();
                    }
                } else if self.orbit.is_some() {
                    self.orbit_drag = Some((*x, *y));
                    return true;
                }
                false
            }
            InputEvent::PointerMove { x, y } => {
                if free_roam {
                    if let Some(navigation) = engine.navigation.as_mut() {
                        let rotating = navigation.is_rotating();
                        navigation.pointer_move(&mut engine.camera, *x, *y);
                        return rotating;
                    }
                } else if let (Some(orbit), Some((last_x, last_y))) = (self.orbit.as_mut(), self.orbit_drag) {
                    orbit.rotate(x - last_x, y - last_y);
                    self.orbit_drag = Some((*x, *y));
                    return true;
                }
                false
            }
            InputEvent::PointerUp { .. } | InputEvent::PointerLeave => {
                if let Some(navigation) = engine.navigation.as_mut() {
                    navigation.pointer_up();
                }
                self.orbit_drag.take().is_some()
            }
            _ => false,
        }
    }

    /// Change the viewport size
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(EngineError::NotInitialized);
        };
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }

        self.backend.resize(width, height)?;
        engine.camera.set_aspect_ratio(width as f32 / height as f32);
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.resize(width, height);
        }
        log::debug!("Viewport resized to {}x{}", width, height);
        Ok(())
    }

    // ===== Camera =====

    /// Fly the camera to a new pose. Returns the group that reports
    /// `CompletionTag::CameraFlightFinished`. The camera belongs to the
    /// transition while one runs, so the request is rejected then.
    pub fn animate_camera_to(&mut self, position: Vec3, target: Vec3, duration: f32) -> EngineResult<AnimationGroupId> {
        self.ensure_camera_free("Camera flight")?;
        let engine = self.engine.as_mut().ok_or(EngineError::NotInitialized)?;
        let group = engine.animations.begin_group(CompletionTag::CameraFlightFinished);
        engine.animate_to(
            AnimationTarget::CameraPosition,
            AnimatedValue::Vector(position),
            duration,
            Easing::QuadInOut,
            AnimationOwner::Engine,
            Some(group),
        );
        engine.animate_to(
            AnimationTarget::CameraTarget,
            AnimatedValue::Vector(target),
            duration,
            Easing::QuadInOut,
            AnimationOwner::Engine,
            Some(group),
        );
        Ok(group)
    }

    /// Put the camera back at its default pose, (0, 2, 5) looking at the
    /// origin. Rejected while a transition runs.
    pub fn reset_camera(&mut self) -> EngineResult<()> {
        self.ensure_camera_free("Camera reset")?;
        let engine = self.engine.as_mut().ok_or(EngineError::NotInitialized)?;
        engine.reset_camera();
        Ok(())
    }

    fn ensure_camera_free(&self, request: &str) -> EngineResult<()> {
        if self.engine.is_none() {
            return Err(EngineError::NotInitialized);
        }
        match &self.transition {
            Some(transition) => {
                log::warn!("{} rejected: transition to '{}' in progress", request, transition.to);
                Err(EngineError::TransitionInProgress(transition.to.clone()))
            }
            None => Ok(()),
        }
    }

    /// Switch how the viewer moves
    pub fn set_navigation_mode(&mut self, mode: NavigationMode) -> EngineResult<()> {
        let engine = self.engine.as_mut().ok_or(EngineError::NotInitialized)?;
        match engine.navigation.as_mut() {
            Some(navigation) => navigation.switch_mode(mode),
            None => log::warn!("Navigation disabled; ignoring switch to {:?}", mode),
        }
        Ok(())
    }

    // ===== Accessors =====

    /// Latest frame statistics
    pub const fn performance_stats(&self) -> &PerformanceStats {
        &self.stats
    }

    /// Active configuration
    pub const fn config(&self) -> &ExhibitionConfig {
        &self.config
    }

    /// Engine context, once initialized
    pub fn engine(&self) -> Option<&EngineContext> {
        self.engine.as_ref()
    }

    /// Mutable engine context, once initialized
    pub fn engine_mut(&mut self) -> Option<&mut EngineContext> {
        self.engine.as_mut()
    }

    /// Interaction manager, once initialized
    pub fn interaction(&self) -> Option<&InteractionManager> {
        self.interaction.as_ref()
    }

    /// Orbit controller, when enabled
    pub fn orbit(&self) -> Option<&OrbitController> {
        self.orbit.as_ref()
    }

    /// Rendering backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Host callbacks
    pub fn callbacks_mut(&mut self) -> &mut EngineCallbacks {
        &mut self.callbacks
    }

    /// Events delivered since the last call
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.delivered)
    }

    fn with_engine<T>(&mut self, f: impl FnOnce(&mut Self, &mut EngineContext) -> EngineResult<T>) -> EngineResult<T> {
        let mut engine = self.engine.take().ok_or(EngineError::NotInitialized)?;
        let result = f(self, &mut engine);
        self.engine = Some(engine);
        result
    }
}

impl<B: RenderBackend> std::fmt::Debug for SceneManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("initialized", &self.engine.is_some())
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("active", &self.current_hall_id())
            .field("transition", &self.transition_phase())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationSpec;
    use crate::assets::MemoryImageSource;
    use crate::error::HallError;
    use crate::input::KeyCode;
    use crate::render::lighting::LightSpec;
    use crate::render::resources::ResourceError;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME: f32 = 1.0 / 60.0;

    fn manager() -> SceneManager {
        manager_with(ExhibitionConfig::default())
    }

    fn manager_with(config: ExhibitionConfig) -> SceneManager {
        let mut manager = SceneManager::new(config, HeadlessBackend::new(), Arc::new(MemoryImageSource::new()));
        manager.initialize().expect("initialize");
        manager
    }

    fn run_until_resolved(manager: &mut SceneManager, ticket: &TransitionTicket) -> EngineResult<String> {
        for _ in 0..600 {
            manager.update(FRAME).expect("tick");
            if let Some(result) = ticket.try_take() {
                return result;
            }
        }
        panic!("transition to '{}' never resolved", ticket.hall_id());
    }

    fn switch(manager: &mut SceneManager, hall: &str) {
        let ticket = manager.switch_scene(hall, None).expect("switch accepted");
        assert_eq!(run_until_resolved(manager, &ticket).expect("switch succeeded"), hall);
    }

    fn live_uncached(manager: &SceneManager) -> usize {
        let engine = manager.engine().expect("initialized");
        let cached = engine.materials.stats();
        engine.resources.live_count() - cached.materials - cached.textures
    }

    #[test]
    fn test_requires_initialize() {
        let mut manager = SceneManager::new(
            ExhibitionConfig::default(),
            HeadlessBackend::new(),
            Arc::new(MemoryImageSource::new()),
        );
        assert!(matches!(manager.update(FRAME), Err(EngineError::NotInitialized)));
        assert!(matches!(manager.switch_scene("entrance", None), Err(EngineError::NotInitialized)));

        manager.initialize().expect("initialize");
        manager.initialize().expect("second initialize only warns");
        assert!(manager.backend().has_surface());
    }

    #[test]
    fn test_switch_resolves_once_hall_is_ready() {
        let mut manager = manager();
        let ticket = manager.switch_scene("entrance", None).expect("switch accepted");
        assert!(manager.is_transitioning());
        assert!(!ticket.is_resolved());

        assert_eq!(run_until_resolved(&mut manager, &ticket).expect("ready"), "entrance");
        assert!(!manager.is_transitioning());
        let hall = manager.current_hall().expect("active hall");
        assert!(hall.is_ready());
        assert!(!manager.interactable_objects().is_empty());
        assert!(manager.interaction().expect("interaction").is_enabled());
        assert!(manager.backend().render_passes() > 0);

        let events = manager.drain_events();
        assert!(events.contains(&EngineEvent::TransitionStarted {
            from: None,
            to: "entrance".into()
        }));
        assert!(events.contains(&EngineEvent::HallReady("entrance".into())));
    }

    #[test]
    fn test_second_switch_rejected_while_in_flight() {
        let mut manager = manager();
        let ticket = manager.switch_scene("entrance", None).expect("switch accepted");
        manager.update(FRAME).expect("tick");

        match manager.switch_scene("early", None) {
            Err(EngineError::TransitionInProgress(hall)) => assert_eq!(hall, "entrance"),
            other => panic!("unexpected {other:?}"),
        }
        run_until_resolved(&mut manager, &ticket).expect("first switch completes");
        assert_eq!(manager.current_hall_id(), Some("entrance"));
    }

    #[test]
    fn test_unknown_hall_rejected() {
        let mut manager = manager();
        assert!(matches!(
            manager.switch_scene("basement", None),
            Err(EngineError::UnknownHall(id)) if id == "basement"
        ));
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn test_only_one_hall_ever_ready() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        let ticket = manager.switch_scene("early", None).expect("switch accepted");

        for _ in 0..600 {
            manager.update(FRAME).expect("tick");
            let ready = manager.current_hall().map_or(0, |hall| usize::from(hall.is_ready()));
            assert!(ready <= 1);
            if ticket.is_resolved() {
                break;
            }
        }
        assert_eq!(ticket.try_take().expect("resolved").expect("ready"), "early");
        assert_eq!(manager.current_hall_id(), Some("early"));
    }

    #[test]
    fn test_hall_round_trip_releases_resources() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        let baseline = live_uncached(&manager);
        let nodes = manager.engine().expect("engine").graph.len();

        switch(&mut manager, "early");
        switch(&mut manager, "entrance");

        assert_eq!(live_uncached(&manager), baseline);
        assert_eq!(manager.engine().expect("engine").graph.len(), nodes);
    }

    #[test]
    fn test_destroy_cancels_transition_and_is_idempotent() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        let ticket = manager.switch_scene("early", None).expect("switch accepted");
        manager.update(FRAME).expect("tick");

        manager.destroy();
        assert!(matches!(ticket.try_take(), Some(Err(EngineError::TransitionCancelled))));
        assert!(!manager.is_initialized());
        assert!(!manager.backend().has_surface());
        assert!(manager.current_hall().is_none());

        manager.destroy();
        assert!(matches!(manager.update(FRAME), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_construction_failure_rolls_back_and_allows_retry() {
        let mut manager = manager();
        let mut broken = HallConfig::new("broken", 10.0, 10.0, 5.0);
        broken.lighting = vec![LightSpec::preset("laser")];
        manager.register_hall(broken).expect("config itself is valid");

        let ticket = manager.switch_scene("broken", None).expect("switch accepted");
        let result = run_until_resolved(&mut manager, &ticket);
        assert!(matches!(
            result,
            Err(EngineError::Hall(HallError::Resource(ResourceError::UnknownLightType(_))))
        ));
        assert!(!manager.is_transitioning());
        assert!(manager.current_hall().is_none());
        assert!(manager.engine().expect("engine").graph.is_empty());
        assert!(manager
            .drain_events()
            .iter()
            .any(|event| matches!(event, EngineEvent::TransitionFailed { hall, .. } if hall == "broken")));

        switch(&mut manager, "entrance");
        assert!(manager.current_hall().expect("active").is_ready());
    }

    #[test]
    fn test_adaptive_quality_skips_renders_when_slow() {
        let mut config = ExhibitionConfig::default();
        config.engine = config.engine.with_frame_rates(60, 30);
        config.engine.adaptive_quality = true;
        let mut manager = manager_with(config);

        for _ in 0..40 {
            manager.update(0.05).expect("tick");
        }
        let stats = *manager.performance_stats();
        assert!(stats.throttled);
        assert!(stats.skipped_frames > 0);
        assert_eq!(stats.rendered_frames + stats.skipped_frames, stats.frames);
        assert!(!stats.is_performance_good(60.0));
    }

    #[test]
    fn test_walking_stops_at_hall_boundary() {
        let mut manager = manager();
        switch(&mut manager, "early");

        assert!(manager.handle_input(&InputEvent::KeyDown(KeyCode::KeyW)).expect("input"));
        for _ in 0..1200 {
            manager.update(FRAME).expect("tick");
        }
        let position = manager.engine().expect("engine").camera.position;
        assert_relative_eq!(position.z, 39.5, epsilon = 1e-3);
        assert!(manager
            .drain_events()
            .iter()
            .any(|event| matches!(event, EngineEvent::Navigation(_))));
    }

    #[test]
    fn test_digit_key_requests_hall_through_callback() {
        let mut manager = manager();
        switch(&mut manager, "entrance");

        let requested = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&requested);
        manager
            .callbacks_mut()
            .on_hall_switch_requested(move |hall| sink.borrow_mut().push(hall.to_string()));

        assert!(manager.handle_input(&InputEvent::KeyDown(KeyCode::Digit(3))).expect("input"));
        manager.update(FRAME).expect("tick");
        assert_eq!(*requested.borrow(), vec!["middle".to_string()]);
    }

    #[test]
    fn test_space_toggles_pause() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        manager.handle_input(&InputEvent::KeyDown(KeyCode::Space)).expect("input");
        manager.update(FRAME).expect("tick");
        assert!(manager.is_paused());
    }

    #[test]
    fn test_camera_commands_rejected_during_transition() {
        let mut manager = manager();
        let ticket = manager.switch_scene("entrance", None).expect("switch accepted");
        manager.update(FRAME).expect("tick");
        assert!(matches!(manager.transition_phase(), Some(TransitionPhase::IntroPlaying(_))));

        assert!(matches!(
            manager.reset_camera(),
            Err(EngineError::TransitionInProgress(hall)) if hall == "entrance"
        ));
        assert!(matches!(
            manager.animate_camera_to(Vec3::new(1.0, 2.0, 3.0), Vec3::zeros(), 0.5),
            Err(EngineError::TransitionInProgress(_))
        ));

        run_until_resolved(&mut manager, &ticket).expect("intro still completes");
        manager.reset_camera().expect("allowed once idle");
        switch(&mut manager, "early");
    }

    #[test]
    fn test_intro_interrupted_by_camera_animation_still_finishes() {
        let mut manager = manager();
        let ticket = manager.switch_scene("entrance", None).expect("switch accepted");
        manager.update(FRAME).expect("tick");

        let engine = manager.engine_mut().expect("engine");
        engine.reset_camera();
        assert_eq!(engine.animations.cancel_where(AnimationTarget::is_camera), 0);

        assert_eq!(run_until_resolved(&mut manager, &ticket).expect("ready"), "entrance");
        assert!(manager.current_hall().expect("active").is_ready());
        assert!(manager.interaction().expect("interaction").is_enabled());
        switch(&mut manager, "early");
    }

    #[test]
    fn test_fade_out_interrupted_by_light_ramp_still_finishes() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        let light = manager.current_hall().expect("active").contents().lights()[0];

        let ticket = manager.switch_scene("early", None).expect("switch accepted");
        assert!(matches!(manager.transition_phase(), Some(TransitionPhase::FadingOut(_))));
        let engine = manager.engine_mut().expect("engine");
        engine.animations.animate(AnimationSpec::scalar(AnimationTarget::LightIntensity(light), 1.0, 0.5, 0.2));

        assert_eq!(run_until_resolved(&mut manager, &ticket).expect("ready"), "early");
        assert_eq!(manager.current_hall_id(), Some("early"));
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn test_switch_reports_leave_for_hovered_node() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        let (width, height) = {
            let engine = &manager.config().engine;
            (engine.viewport_width as f32, engine.viewport_height as f32)
        };

        let nodes = manager.interactable_objects().to_vec();
        let directions = [Vec3::x(), -Vec3::x(), Vec3::z(), -Vec3::z()];
        'search: for node in nodes {
            let center = manager
                .engine()
                .expect("engine")
                .graph
                .world_position(node)
                .expect("live node");
            for direction in directions {
                let camera = &mut manager.engine_mut().expect("engine").camera;
                camera.set_position(center + direction * 4.0);
                camera.set_target(center);
                manager
                    .handle_input(&InputEvent::PointerMove {
                        x: width * 0.5,
                        y: height * 0.5,
                    })
                    .expect("input");
                if manager.interaction().expect("interaction").hovered().is_some() {
                    break 'search;
                }
            }
        }
        let hovered = manager
            .interaction()
            .expect("interaction")
            .hovered()
            .expect("a node under the pointer");
        manager.update(FRAME).expect("tick");
        manager.drain_events();

        switch(&mut manager, "early");
        let leaves = manager
            .drain_events()
            .iter()
            .filter(|event| **event == EngineEvent::Interaction(InteractionEvent::Leave { node: hovered }))
            .count();
        assert_eq!(leaves, 1);
        assert_eq!(manager.interaction().expect("interaction").hovered(), None);
    }

    #[test]
    fn test_camera_flight_reports_completion() {
        let mut manager = manager();
        switch(&mut manager, "entrance");
        manager
            .animate_camera_to(Vec3::new(2.0, 3.0, 4.0), Vec3::zeros(), 0.5)
            .expect("flight");
        for _ in 0..60 {
            manager.update(FRAME).expect("tick");
        }
        let camera = &manager.engine().expect("engine").camera;
        assert_relative_eq!(camera.position, Vec3::new(2.0, 3.0, 4.0), epsilon = 1e-4);
    }
}
