//! Navigation manager
//!
//! Only [`NavigationMode::FreeRoam`] runs continuous movement. Each tick
//! while a movement key is held:
//!
//! 1. forward/right are taken from the camera and flattened onto the floor
//! 2. velocity decays by `friction * dt`
//! 3. each held key adds `move_speed` along its direction
//! 4. the camera moves by `velocity * dt`
//! 5. the position is clamped into the boundary shrunk by the player radius
//!
//! Look rotation is read back from the camera on every drag event, so
//! camera flights and resets never leave a stale yaw/pitch behind.
//!
//! Obstacles are recorded and can be queried with
//! [`NavigationManager::check_collision`], but they do not block movement.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimationOwner, AnimationScheduler, AnimationSpec, AnimationTarget, CompletionTag, Easing};
use crate::core::config::NavigationConfig;
use crate::foundation::collections::AnimationGroupId;
use crate::foundation::math::Vec3;
use crate::input::{KeyCode, PointerButton};
use crate::render::camera::Camera;

/// How the viewer moves through the exhibition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Keyboard movement and drag-to-look
    #[default]
    FreeRoam,
    /// Camera driven by hall-to-hall flights
    ExhibitionGuided,
    /// Static overview of the halls
    ThumbnailOverview,
}

bitflags! {
    /// Movement keys currently held
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementKeys: u8 {
        /// W or up arrow
        const FORWARD = 1 << 0;
        /// S or down arrow
        const BACKWARD = 1 << 1;
        /// A or left arrow
        const LEFT = 1 << 2;
        /// D or right arrow
        const RIGHT = 1 << 3;
    }
}

impl MovementKeys {
    /// Movement flag bound to a key
    pub const fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Self::FORWARD),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Self::BACKWARD),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Self::LEFT),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Self::RIGHT),
            _ => None,
        }
    }
}

/// Axis-aligned walkable rectangle on the floor plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Smallest X
    pub min_x: f32,
    /// Largest X
    pub max_x: f32,
    /// Smallest Z
    pub min_z: f32,
    /// Largest Z
    pub max_z: f32,
}

impl Boundary {
    /// Rectangle centred on the origin
    pub fn centered(half_width: f32, half_length: f32) -> Self {
        Self {
            min_x: -half_width,
            max_x: half_width,
            min_z: -half_length,
            max_z: half_length,
        }
    }

    /// Rectangle shrunk by `margin` on every side
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x + margin,
            max_x: self.max_x - margin,
            min_z: self.min_z + margin,
            max_z: self.max_z - margin,
        }
    }

    /// Whether a floor position lies inside
    pub fn contains(&self, x: f32, z: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }

    /// Clamp a position into the rectangle, leaving Y alone
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.max(self.min_x).min(self.max_x),
            position.y,
            position.z.max(self.min_z).min(self.max_z),
        )
    }
}

/// Circular obstacle on the floor plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre X
    pub x: f32,
    /// Centre Z
    pub z: f32,
    /// Radius
    pub radius: f32,
}

/// Notifications produced by the navigation manager
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationEvent {
    /// Mode changed from the first value to the second
    ModeChanged(NavigationMode, NavigationMode),
    /// Camera moved to a new position
    PositionUpdated(Vec3),
}

/// First-person movement state
#[derive(Debug)]
pub struct NavigationManager {
    config: NavigationConfig,
    mode: NavigationMode,
    keys: MovementKeys,
    velocity: Vec3,
    boundary: Boundary,
    obstacles: Vec<Obstacle>,
    rotating: bool,
    last_pointer: Option<(f32, f32)>,
    events: Vec<NavigationEvent>,
}

impl NavigationManager {
    /// Seconds of the hall-to-hall flight
    pub const HALL_FLIGHT_DURATION: f32 = 2.0;
    /// Distance a hall flight stops short of the hall position
    pub const HALL_FLIGHT_OFFSET: f32 = 5.0;

    /// Create a manager with the configured default boundary
    pub fn new(config: NavigationConfig) -> Self {
        let boundary = Boundary::centered(config.default_half_width, config.default_half_length);
        Self {
            config,
            mode: NavigationMode::FreeRoam,
            keys: MovementKeys::empty(),
            velocity: Vec3::zeros(),
            boundary,
            obstacles: Vec::new(),
            rotating: false,
            last_pointer: None,
            events: Vec::new(),
        }
    }

    // ===== Input =====

    /// Key pressed or released; returns whether the key is a movement key
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let Some(flag) = MovementKeys::from_key(key) else {
            return false;
        };
        self.keys.set(flag, pressed);
        true
    }

    /// Pointer pressed; starts look rotation in free roam
    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32) {
        if self.mode == NavigationMode::FreeRoam && button == PointerButton::Left {
            self.rotating = true;
            self.last_pointer = Some((x, y));
        }
    }

    /// Pointer moved; rotates the camera while a drag is active
    pub fn pointer_move(&mut self, camera: &mut Camera, x: f32, y: f32) {
        if !self.rotating {
            return;
        }
        let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
            return;
        };
        let (mut yaw, mut pitch) = camera.yaw_pitch();
        yaw -= (x - last_x) * self.config.look_speed;
        pitch -= (y - last_y) * self.config.look_speed;
        pitch = pitch.clamp(-self.config.pitch_limit, self.config.pitch_limit);
        camera.set_yaw_pitch(yaw, pitch);
    }

    /// Pointer released or left the surface; ends look rotation
    pub fn pointer_up(&mut self) {
        self.rotating = false;
        self.last_pointer = None;
    }

    /// Whether a look drag is in progress
    pub const fn is_rotating(&self) -> bool {
        self.rotating
    }

    /// Movement keys currently held
    pub const fn held_keys(&self) -> MovementKeys {
        self.keys
    }

    /// Forget held keys and velocity, e.g. when the host loses focus
    pub fn release_all(&mut self) {
        self.keys = MovementKeys::empty();
        self.velocity = Vec3::zeros();
        self.pointer_up();
    }

    // ===== Per-tick update =====

    /// Advance movement by `dt` seconds
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        if self.mode != NavigationMode::FreeRoam || self.keys.is_empty() {
            return;
        }

        let mut forward = camera.forward();
        forward.y = 0.0;
        if forward.norm_squared() < f32::EPSILON {
            forward = Vec3::new(0.0, 0.0, -1.0);
        }
        let forward = forward.normalize();
        let right = forward.cross(&camera.up).normalize();

        self.velocity -= self.velocity * self.config.friction * dt;

        let speed = self.config.move_speed;
        if self.keys.contains(MovementKeys::FORWARD) {
            self.velocity += forward * speed;
        }
        if self.keys.contains(MovementKeys::BACKWARD) {
            self.velocity -= forward * speed;
        }
        if self.keys.contains(MovementKeys::LEFT) {
            self.velocity -= right * speed;
        }
        if self.keys.contains(MovementKeys::RIGHT) {
            self.velocity += right * speed;
        }
        self.velocity.y = 0.0;

        let mut position = camera.position + self.velocity * dt;
        if self.config.enable_collision {
            position = self.walkable_area().clamp(position);
        }
        camera.translate_to(position);

        log::trace!("Navigation moved camera to {:?}", position);
        self.events.push(NavigationEvent::PositionUpdated(position));
    }

    // ===== Modes =====

    /// Current mode
    pub const fn mode(&self) -> NavigationMode {
        self.mode
    }

    /// Switch mode; leaving free roam ends any look drag and stops movement
    pub fn switch_mode(&mut self, mode: NavigationMode) {
        if mode == self.mode {
            return;
        }
        let previous = self.mode;
        self.mode = mode;
        if previous == NavigationMode::FreeRoam {
            self.release_all();
        }
        log::info!("Navigation mode switched: {:?} -> {:?}", previous, mode);
        self.events.push(NavigationEvent::ModeChanged(previous, mode));
    }

    // ===== Camera flights =====

    /// Fly the camera to `position` over `duration` seconds, keeping its
    /// viewing direction. The returned group reports
    /// [`CompletionTag::CameraFlightFinished`].
    pub fn move_to(
        &mut self,
        scheduler: &mut AnimationScheduler,
        camera: &Camera,
        position: Vec3,
        duration: f32,
    ) -> AnimationGroupId {
        self.velocity = Vec3::zeros();
        let look = camera.target - camera.position;
        let group = scheduler.begin_group(CompletionTag::CameraFlightFinished);
        scheduler.animate(
            AnimationSpec::vector(AnimationTarget::CameraPosition, camera.position, position, duration)
                .with_easing(Easing::QuadInOut)
                .owned_by(AnimationOwner::Navigation)
                .in_group(group),
        );
        scheduler.animate(
            AnimationSpec::vector(AnimationTarget::CameraTarget, camera.target, position + look, duration)
                .with_easing(Easing::QuadInOut)
                .owned_by(AnimationOwner::Navigation)
                .in_group(group),
        );
        self.events.push(NavigationEvent::PositionUpdated(position));
        group
    }

    /// Fly to just in front of a hall position
    pub fn move_to_hall(
        &mut self,
        scheduler: &mut AnimationScheduler,
        camera: &Camera,
        hall_position: Vec3,
    ) -> AnimationGroupId {
        let destination = hall_position - Vec3::new(0.0, 0.0, Self::HALL_FLIGHT_OFFSET);
        self.move_to(scheduler, camera, destination, Self::HALL_FLIGHT_DURATION)
    }

    // ===== Tuning =====

    /// Set the acceleration per held key
    pub fn set_move_speed(&mut self, speed: f32) {
        self.config.move_speed = speed.max(0.0);
    }

    /// Set the look rotation per pixel
    pub fn set_look_speed(&mut self, speed: f32) {
        self.config.look_speed = speed.max(0.0);
    }

    /// Enable or disable boundary clamping
    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.config.enable_collision = enabled;
    }

    /// Current tuning
    pub const fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Current velocity
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    // ===== Collision =====

    /// Replace the boundary
    pub fn set_boundaries(&mut self, boundary: Boundary) {
        self.boundary = boundary;
    }

    /// Install the boundary of a hall centred on the origin
    pub fn install_hall_bounds(&mut self, width: f32, length: f32) {
        self.set_boundaries(Boundary::centered(width * 0.5, length * 0.5));
        log::debug!(
            "Navigation boundary set to {:?} (walkable {:?})",
            self.boundary,
            self.walkable_area()
        );
    }

    /// Raw boundary
    pub const fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Boundary shrunk by the player radius: where the camera may stand
    pub fn walkable_area(&self) -> Boundary {
        self.boundary.inset(self.config.player_radius)
    }

    /// Record an obstacle
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Forget every obstacle
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    /// Recorded obstacles
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Whether a position would collide with the boundary or an obstacle
    pub fn check_collision(&self, position: Vec3) -> bool {
        if !self.config.enable_collision {
            return false;
        }
        if !self.walkable_area().contains(position.x, position.z) {
            return true;
        }
        let radius = self.config.player_radius;
        self.obstacles.iter().any(|obstacle| {
            (position.x - obstacle.x).hypot(position.z - obstacle.z) < obstacle.radius + radius
        })
    }

    // ===== Events =====

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<NavigationEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for NavigationManager {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hall_camera() -> Camera {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(0.0, 4.0, 0.0));
        camera.set_target(Vec3::new(0.0, 4.0, 10.0));
        camera
    }

    #[test]
    fn test_forward_movement_clamps_exactly_at_boundary() {
        let mut navigation = NavigationManager::default();
        navigation.install_hall_bounds(16.0, 80.0);
        let mut camera = hall_camera();

        navigation.handle_key(KeyCode::KeyW, true);
        for _ in 0..2000 {
            navigation.update(&mut camera, 1.0 / 60.0);
        }

        assert_eq!(camera.position.z, 39.5);
        assert_relative_eq!(camera.position.y, 4.0);
        let area = navigation.walkable_area();
        assert_eq!((area.min_x, area.max_x, area.min_z, area.max_z), (-7.5, 7.5, -39.5, 39.5));
    }

    #[test]
    fn test_no_movement_without_keys() {
        let mut navigation = NavigationManager::default();
        let mut camera = hall_camera();
        navigation.handle_key(KeyCode::KeyW, true);
        navigation.update(&mut camera, 0.1);
        navigation.handle_key(KeyCode::KeyW, false);

        let stopped = camera.position;
        navigation.update(&mut camera, 0.1);
        assert_eq!(camera.position, stopped);
    }

    #[test]
    fn test_strafe_follows_camera_right() {
        let mut navigation = NavigationManager::default();
        let mut camera = hall_camera();
        navigation.handle_key(KeyCode::ArrowRight, true);
        navigation.update(&mut camera, 0.1);
        // Looking down +Z, right is -X
        assert!(camera.position.x < 0.0);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_look_drag_clamps_pitch() {
        let mut navigation = NavigationManager::default();
        let mut camera = hall_camera();
        navigation.pointer_down(PointerButton::Left, 100.0, 100.0);
        navigation.pointer_move(&mut camera, 100.0, -100_000.0);
        let (_, pitch) = camera.yaw_pitch();
        assert_relative_eq!(pitch, navigation.config().pitch_limit, epsilon = 1e-4);

        navigation.pointer_up();
        let before = camera.target;
        navigation.pointer_move(&mut camera, 500.0, 500.0);
        assert_eq!(camera.target, before);
    }

    #[test]
    fn test_obstacles_do_not_block_movement() {
        let mut navigation = NavigationManager::default();
        navigation.add_obstacle(Obstacle { x: 0.0, z: 1.0, radius: 2.0 });
        let mut camera = hall_camera();
        assert!(navigation.check_collision(Vec3::new(0.0, 4.0, 1.0)));

        navigation.handle_key(KeyCode::KeyW, true);
        for _ in 0..30 {
            navigation.update(&mut camera, 1.0 / 60.0);
        }
        assert!(camera.position.z > 1.0);
    }

    #[test]
    fn test_switch_mode_ends_drag_and_reports() {
        let mut navigation = NavigationManager::default();
        navigation.pointer_down(PointerButton::Left, 0.0, 0.0);
        navigation.handle_key(KeyCode::KeyA, true);
        navigation.switch_mode(NavigationMode::ThumbnailOverview);

        assert!(!navigation.is_rotating());
        assert!(navigation.held_keys().is_empty());
        assert_eq!(
            navigation.drain_events(),
            vec![NavigationEvent::ModeChanged(
                NavigationMode::FreeRoam,
                NavigationMode::ThumbnailOverview
            )]
        );
    }

    #[test]
    fn test_move_to_hall_schedules_flight() {
        let mut navigation = NavigationManager::default();
        let mut scheduler = AnimationScheduler::new();
        let camera = hall_camera();
        navigation.move_to_hall(&mut scheduler, &camera, Vec3::new(0.0, 4.0, 20.0));

        assert!(scheduler.is_animating(AnimationTarget::CameraPosition));
        let frame = scheduler.advance(NavigationManager::HALL_FLIGHT_DURATION);
        assert_eq!(frame.completed, vec![CompletionTag::CameraFlightFinished]);
        let end = frame
            .samples
            .iter()
            .find(|sample| sample.target == AnimationTarget::CameraPosition)
            .and_then(|sample| sample.value.as_vector())
            .expect("position sample");
        assert_relative_eq!(end, Vec3::new(0.0, 4.0, 15.0));
    }
}
