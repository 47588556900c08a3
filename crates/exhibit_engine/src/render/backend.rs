//! Rendering backend seam
//!
//! The engine never rasterizes anything itself. Once per rendered tick it
//! hands a [`RenderFrame`] (camera, visible draw items and lights) to a
//! [`RenderBackend`]. The [`HeadlessBackend`] records what it was given and
//! is what tests and the scripted tour run against.

use crate::assets::DecodedImage;
use crate::foundation::collections::{GeometryHandle, MaterialHandle, NodeId, TextureHandle};
use crate::foundation::color::Color;
use crate::foundation::math::Mat4;
use crate::render::camera::Camera;
use crate::render::lighting::Light;

/// Errors raised by rendering backends
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The drawing surface could not be created
    #[error("Surface initialization failed: {0}")]
    InitializationFailed(String),

    /// A frame could not be drawn
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// A texture upload failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// One visible mesh as the backend should draw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Scene node that produced the item
    pub node: NodeId,
    /// Model matrix
    pub world: Mat4,
    /// Shape
    pub geometry: GeometryHandle,
    /// Surface
    pub material: MaterialHandle,
    /// Colour to draw with, after any highlight override
    pub color: Color,
    /// Opacity after node fades, in `[0, 1]`
    pub opacity: f32,
    /// Whether the item casts shadows
    pub cast_shadow: bool,
    /// Whether the item receives shadows
    pub receive_shadow: bool,
}

/// Everything a backend needs for one frame
#[derive(Debug)]
pub struct RenderFrame<'a> {
    /// Viewpoint
    pub camera: &'a Camera,
    /// Background colour
    pub clear_color: Color,
    /// Visible meshes in scene order
    pub items: Vec<DrawItem>,
    /// Active lights in creation order
    pub lights: Vec<&'a Light>,
    /// Whether shadow maps should be rendered
    pub shadows_enabled: bool,
}

/// Capability implemented by rasterizers
pub trait RenderBackend {
    /// Create the drawing surface
    fn create_surface(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Resize the drawing surface
    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Make decoded pixels available for a texture handle
    fn upload_texture(&mut self, texture: TextureHandle, image: &DecodedImage) -> BackendResult<()>;

    /// Draw one frame
    fn render(&mut self, frame: &RenderFrame<'_>) -> BackendResult<()>;

    /// Release the surface and everything uploaded to it
    fn release_surface(&mut self);

    /// Current surface size
    fn extent(&self) -> (u32, u32);
}

/// Backend that draws nothing and records what it was asked to do
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    surface: Option<(u32, u32)>,
    passes: u64,
    uploads: usize,
    last_item_count: usize,
    last_light_count: usize,
    last_min_opacity: Option<f32>,
}

impl HeadlessBackend {
    /// Create a backend with no surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far
    pub const fn render_passes(&self) -> u64 {
        self.passes
    }

    /// Textures uploaded so far
    pub const fn uploads(&self) -> usize {
        self.uploads
    }

    /// Draw items of the last frame
    pub const fn last_item_count(&self) -> usize {
        self.last_item_count
    }

    /// Lights of the last frame
    pub const fn last_light_count(&self) -> usize {
        self.last_light_count
    }

    /// Lowest item opacity of the last frame
    pub const fn last_min_opacity(&self) -> Option<f32> {
        self.last_min_opacity
    }

    /// Whether a surface exists
    pub const fn has_surface(&self) -> bool {
        self.surface.is_some()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_surface(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InitializationFailed(format!(
                "surface must not be empty ({width}x{height})"
            )));
        }
        self.surface = Some((width, height));
        log::debug!("Headless surface created at {}x{}", width, height);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if self.surface.is_none() {
            return Err(RenderError::RenderingFailed("resize before surface creation".into()));
        }
        self.surface = Some((width.max(1), height.max(1)));
        Ok(())
    }

    fn upload_texture(&mut self, texture: TextureHandle, image: &DecodedImage) -> BackendResult<()> {
        if image.pixels.len() != (image.width * image.height * 4) as usize {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {texture:?} has {} bytes for {}x{}",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }
        self.uploads += 1;
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> BackendResult<()> {
        if self.surface.is_none() {
            return Err(RenderError::RenderingFailed("no surface".into()));
        }
        self.passes += 1;
        self.last_item_count = frame.items.len();
        self.last_light_count = frame.lights.len();
        self.last_min_opacity = frame.items.iter().map(|item| item.opacity).reduce(f32::min);
        Ok(())
    }

    fn release_surface(&mut self) {
        self.surface = None;
    }

    fn extent(&self) -> (u32, u32) {
        self.surface.unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_requires_surface() {
        let mut backend = HeadlessBackend::new();
        let camera = Camera::default();
        let frame = RenderFrame {
            camera: &camera,
            clear_color: Color::BLACK,
            items: Vec::new(),
            lights: Vec::new(),
            shadows_enabled: false,
        };
        assert!(backend.render(&frame).is_err());

        backend.create_surface(640, 480).expect("non-empty surface");
        backend.render(&frame).expect("surface exists");
        assert_eq!(backend.render_passes(), 1);
        assert_eq!(backend.extent(), (640, 480));
    }

    #[test]
    fn test_upload_checks_pixel_count() {
        let mut backend = HeadlessBackend::new();
        let good = DecodedImage::solid_color(2, 2, [0; 4]);
        let bad = DecodedImage {
            width: 4,
            height: 4,
            pixels: vec![0; 3],
        };
        backend.upload_texture(TextureHandle::default(), &good).expect("well formed");
        assert!(backend.upload_texture(TextureHandle::default(), &bad).is_err());
        assert_eq!(backend.uploads(), 1);
    }
}
