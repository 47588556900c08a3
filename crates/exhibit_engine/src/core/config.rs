//! # Unified Configuration System
//!
//! Every tunable of the scene engine lives here, grouped by subsystem. All
//! records are serde-serialisable and fall back to the exhibition defaults
//! field by field, so a configuration file only needs to name what it changes.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: scene manager, render loop, transitions, logging
//! - **Navigation Config**: first-person movement and look
//! - **Interaction Config**: highlight, popup and camera fly-to behaviour
//! - **Lighting Config**: shadow and light-count caps
//! - **Material Config**: texture handling and load fallback

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::math::constants::{HALF_PI, PI};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Scene manager behaviour: camera projection, render loop pacing and the
/// durations of the transition fades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter passed to `env_logger`
    pub log_level: String,
    /// Clear colour behind every hall
    pub background_color: Color,
    /// Vertical field of view in degrees
    pub camera_fov: f32,
    /// Near clip plane
    pub camera_near: f32,
    /// Far clip plane
    pub camera_far: f32,
    /// Initial surface width in pixels
    pub viewport_width: u32,
    /// Initial surface height in pixels
    pub viewport_height: u32,
    /// Whether lights may cast shadows at all
    pub enable_shadows: bool,
    /// Seconds spent fading the outgoing hall
    pub fade_out_duration: f32,
    /// Seconds spent fading the incoming hall when it has no intro
    pub fade_in_duration: f32,
    /// Desired frame rate
    pub target_fps: u32,
    /// Below this measured rate the loop starts skipping render passes
    pub min_fps: u32,
    /// Enable render-pass skipping when the frame rate drops
    pub adaptive_quality: bool,
    /// Create the first-person navigation manager on initialize
    pub enable_navigation: bool,
    /// Create the orbit controller on initialize
    pub enable_orbit_controls: bool,
    /// Orbit controller tuning
    pub orbit: OrbitConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            background_color: Color::from_hex(0x2a1f1a),
            camera_fov: 75.0,
            camera_near: 1.0,
            camera_far: 1000.0,
            viewport_width: 1280,
            viewport_height: 720,
            enable_shadows: true,
            fade_out_duration: 0.5,
            fade_in_duration: 0.5,
            target_fps: 60,
            min_fps: 30,
            adaptive_quality: true,
            enable_navigation: true,
            enable_orbit_controls: true,
            orbit: OrbitConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set both fade durations
    pub fn with_fades(mut self, fade_out: f32, fade_in: f32) -> Self {
        self.fade_out_duration = fade_out;
        self.fade_in_duration = fade_in;
        self
    }

    /// Set the frame rate target and floor
    pub fn with_frame_rates(mut self, target_fps: u32, min_fps: u32) -> Self {
        self.target_fps = target_fps;
        self.min_fps = min_fps;
        self
    }

    /// Enable or disable first-person navigation
    pub fn with_navigation(mut self, enabled: bool) -> Self {
        self.enable_navigation = enabled;
        self
    }

    /// Seconds per frame at the target rate
    pub fn target_frame_time(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Width over height of the initial surface
    pub fn aspect_ratio(&self) -> f32 {
        self.viewport_width.max(1) as f32 / self.viewport_height.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera_near <= 0.0 || self.camera_far <= self.camera_near {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far (near {}, far {})",
                self.camera_near, self.camera_far
            )));
        }
        if self.target_fps == 0 || self.min_fps > self.target_fps {
            return Err(ConfigError::Invalid(format!(
                "min_fps {} must not exceed a non-zero target_fps {}",
                self.min_fps, self.target_fps
            )));
        }
        if self.fade_out_duration < 0.0 || self.fade_in_duration < 0.0 {
            return Err(ConfigError::Invalid("fade durations must not be negative".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit controller tuning, used when first-person navigation is off
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Fraction of the pending rotation applied per tick
    pub damping_factor: f32,
    /// Closest allowed distance to the target
    pub min_distance: f32,
    /// Farthest allowed distance to the target
    pub max_distance: f32,
    /// Largest polar angle in radians (keeps the camera above the floor)
    pub max_polar_angle: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 20.0,
            max_polar_angle: HALF_PI,
        }
    }
}

/// # Navigation Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Acceleration added per held key, units per second
    pub move_speed: f32,
    /// Radians of look rotation per pixel of drag
    pub look_speed: f32,
    /// Velocity decay rate per second
    pub friction: f32,
    /// Radius of the viewer used to keep the camera off the walls
    pub player_radius: f32,
    /// Maximum absolute pitch in radians
    pub pitch_limit: f32,
    /// Boundary used before a hall installs its own: half width along X
    pub default_half_width: f32,
    /// Boundary used before a hall installs its own: half length along Z
    pub default_half_length: f32,
    /// Clamp the camera into the installed boundary
    pub enable_collision: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            look_speed: 0.002,
            friction: 5.0,
            player_radius: 0.5,
            pitch_limit: PI / 2.5,
            default_half_width: 20.0,
            default_half_length: 40.0,
            enable_collision: true,
        }
    }
}

impl NavigationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_radius < 0.0 || self.move_speed < 0.0 || self.friction < 0.0 {
            return Err(ConfigError::Invalid(
                "navigation speeds, friction and radius must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// # Interaction Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Recolour hovered and selected nodes
    pub highlight_enabled: bool,
    /// Colour applied while hovered
    pub hover_color: Color,
    /// Colour applied while selected
    pub selected_color: Color,
    /// Uniform scale applied while hovered
    pub hover_scale: f32,
    /// Uniform scale applied while selected
    pub select_scale: f32,
    /// Seconds for scale highlight animations
    pub scale_duration: f32,
    /// Popup plane width
    pub popup_width: f32,
    /// Popup plane height
    pub popup_height: f32,
    /// Distance in front of the camera at which the popup floats
    pub popup_distance: f32,
    /// Popup background colour
    pub popup_color: Color,
    /// Distance the camera stops in front of a double-clicked node
    pub zoom_offset: f32,
    /// Seconds for the double-click camera flight
    pub zoom_duration: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            highlight_enabled: true,
            hover_color: Color::from_hex(0xffd700),
            selected_color: Color::from_hex(0x00ff00),
            hover_scale: 1.05,
            select_scale: 1.1,
            scale_duration: 0.3,
            popup_width: 4.0,
            popup_height: 3.0,
            popup_distance: 3.0,
            popup_color: Color::from_hex(0x2a1f1a),
            zoom_offset: 5.0,
            zoom_duration: 1.0,
        }
    }
}

/// # Lighting Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Allow shadow casting
    pub enable_shadows: bool,
    /// Shadow map resolution for the surviving shadow casters
    pub shadow_map_size: u32,
    /// Cap on shadow-casting lights
    pub max_shadow_lights: usize,
    /// Cap on point lights
    pub max_point_lights: usize,
    /// Cap on spot lights
    pub max_spot_lights: usize,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            enable_shadows: true,
            shadow_map_size: 2048,
            max_shadow_lights: 4,
            max_point_lights: 10,
            max_spot_lights: 8,
        }
    }
}

/// # Material Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Decoded images larger than this are recorded as downscaled
    pub max_texture_size: u32,
    /// Anisotropic filtering level recorded on textures
    pub anisotropy: u8,
    /// Whether textures request mipmaps
    pub enable_mipmaps: bool,
    /// Colour shown when an image cannot be loaded
    pub placeholder_color: Color,
    /// Decode images on a background thread
    pub threaded_loading: bool,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            max_texture_size: 2048,
            anisotropy: 4,
            enable_mipmaps: true,
            placeholder_color: Color::from_hex(0xcccccc),
            threaded_loading: true,
        }
    }
}

/// # Complete Exhibition Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhibitionConfig {
    /// Scene manager and render loop
    pub engine: EngineConfig,
    /// First-person navigation
    pub navigation: NavigationConfig,
    /// Pointer interaction
    pub interaction: InteractionConfig,
    /// Light manager caps
    pub lighting: LightingConfig,
    /// Material manager and texture loading
    pub materials: MaterialConfig,
}

impl Config for ExhibitionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.navigation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_exhibition_values() {
        let config = ExhibitionConfig::default();
        assert_eq!(config.engine.camera_fov, 75.0);
        assert_eq!(config.engine.background_color.to_hex(), 0x2a1f1a);
        assert_eq!(config.navigation.player_radius, 0.5);
        assert_eq!(config.lighting.max_spot_lights, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExhibitionConfig::from_toml_str(
            "[engine]\nfade_out_duration = 0.25\nbackground_color = 0x000000\n\n[navigation]\nmove_speed = 8.0\n",
        )
        .expect("valid config");
        assert_eq!(config.engine.fade_out_duration, 0.25);
        assert_eq!(config.engine.fade_in_duration, 0.5);
        assert_eq!(config.engine.background_color, Color::BLACK);
        assert_eq!(config.navigation.move_speed, 8.0);
        assert_eq!(config.navigation.look_speed, 0.002);
    }

    #[test]
    fn test_invalid_clip_planes_rejected() {
        let result = ExhibitionConfig::from_ron_str("(engine: (camera_near: 5.0, camera_far: 1.0))");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
