//! Cached, preset-driven material factory
//!
//! Materials requested by key are created once and handed out again on
//! every later request for the same key, so every hall asking for "frame"
//! draws with the same instance. Textures referenced by URL are cached the
//! same way and loads for a URL that is already in flight are merged.

use std::collections::HashMap;

use crate::assets::{CompletedLoad, DecodedImage, LoadRequestId, TextureLoader};
use crate::core::config::MaterialConfig;
use crate::foundation::collections::{MaterialHandle, TextureHandle};
use crate::foundation::color::Color;
use crate::render::material::{Material, MaterialParams};
use crate::render::resources::{ResourceError, ResourceRegistry, TextureResource, TextureSource};

/// Named material archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialPreset {
    /// Light plaster wall
    Wall,
    /// Warm brown wall
    WallDark,
    /// Dark polished floor
    Floor,
    /// Wooden floor
    FloorWood,
    /// Plain ceiling
    Ceiling,
    /// Wooden picture frame
    Frame,
    /// Gilded frame, also used for entrance markers
    GildedFrame,
    /// Painting canvas
    Canvas,
    /// Background of text panels
    InfoPanel,
    /// Self-lit surface
    Emissive,
    /// Translucent glass
    Glass,
}

impl MaterialPreset {
    /// Every preset in catalog order
    pub const ALL: [Self; 11] = [
        Self::Wall,
        Self::WallDark,
        Self::Floor,
        Self::FloorWood,
        Self::Ceiling,
        Self::Frame,
        Self::GildedFrame,
        Self::Canvas,
        Self::InfoPanel,
        Self::Emissive,
        Self::Glass,
    ];

    /// Cache key of the preset
    pub const fn key(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::WallDark => "wall-dark",
            Self::Floor => "floor",
            Self::FloorWood => "floor-wood",
            Self::Ceiling => "ceiling",
            Self::Frame => "frame",
            Self::GildedFrame => "gilded-frame",
            Self::Canvas => "canvas",
            Self::InfoPanel => "info-panel",
            Self::Emissive => "emissive",
            Self::Glass => "glass",
        }
    }

    /// Look a preset up by key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.key() == key)
    }

    /// Default parameters of the preset
    pub fn material(self) -> Material {
        let base = |hex: u32, roughness: f32, metalness: f32| {
            Material::new(self.key(), Color::from_hex(hex)).with_surface(roughness, metalness)
        };
        match self {
            Self::Wall => base(0xf5f5f5, 0.9, 0.0),
            Self::WallDark => base(0x8b7355, 0.8, 0.1),
            Self::Floor => base(0x3d2817, 0.7, 0.2),
            Self::FloorWood => base(0x5c4033, 0.8, 0.1),
            Self::Ceiling => base(0xffffff, 0.6, 0.1),
            Self::Frame => base(0x8b7355, 0.6, 0.3),
            Self::GildedFrame => base(0xd4af37, 0.3, 0.8),
            Self::Canvas => base(0xffffff, 0.8, 0.0),
            Self::InfoPanel => base(0xfaf0e6, 0.8, 0.1),
            Self::Emissive => Material {
                emissive: Color::WHITE,
                emissive_intensity: 1.0,
                ..base(0xffffff, 0.5, 0.5)
            },
            Self::Glass => base(0xffffff, 0.0, 0.0).with_opacity(0.3),
        }
    }
}

/// Who receives a texture once its image arrives
#[derive(Debug, Clone, Copy)]
enum TextureBinding {
    /// Cached by URL, shared by every material listed
    Shared(MaterialHandle),
    /// A private copy owned by (and disposed with) the material
    Exclusive(MaterialHandle),
}

impl TextureBinding {
    const fn material(self) -> MaterialHandle {
        match self {
            Self::Shared(material) | Self::Exclusive(material) => material,
        }
    }
}

#[derive(Debug)]
struct PendingTexture {
    request: LoadRequestId,
    bindings: Vec<TextureBinding>,
}

/// Cache sizes reported by [`MaterialManager::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialStats {
    /// Cached materials
    pub materials: usize,
    /// Cached textures
    pub textures: usize,
    /// Image loads not yet resolved
    pub pending_loads: usize,
}

/// Cached material and texture factory
pub struct MaterialManager {
    config: MaterialConfig,
    materials: HashMap<String, MaterialHandle>,
    textures: HashMap<String, TextureHandle>,
    pending: HashMap<String, PendingTexture>,
}

impl MaterialManager {
    /// Create an empty manager
    pub fn new(config: MaterialConfig) -> Self {
        Self {
            config,
            materials: HashMap::new(),
            textures: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Keys of the preset catalog
    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        MaterialPreset::ALL.into_iter().map(MaterialPreset::key)
    }

    /// Get or create the material cached under `key`.
    ///
    /// A key naming a preset starts from the preset parameters; any other key
    /// starts from neutral defaults. Overrides only apply on creation: a
    /// cached material is returned unchanged.
    pub fn get_material(
        &mut self,
        registry: &mut ResourceRegistry,
        key: &str,
        overrides: &MaterialParams,
    ) -> MaterialHandle {
        if let Some(&handle) = self.materials.get(key) {
            if registry.contains_material(handle) {
                return handle;
            }
            log::warn!("Cached material '{}' was disposed behind the cache; recreating", key);
        }

        let mut material = MaterialPreset::from_key(key)
            .map_or_else(|| Material::new(key, Color::WHITE), MaterialPreset::material);
        material.name = key.to_string();
        material.apply(overrides);

        let handle = registry.create_material(material);
        self.materials.insert(key.to_string(), handle);
        log::debug!("Created material '{}'", key);
        handle
    }

    /// Get or create a preset under its own key
    pub fn get_preset(
        &mut self,
        registry: &mut ResourceRegistry,
        preset: MaterialPreset,
        overrides: &MaterialParams,
    ) -> MaterialHandle {
        self.get_material(registry, preset.key(), overrides)
    }

    /// Create a material of archetype `kind` cached under `key`
    pub fn create_material(
        &mut self,
        registry: &mut ResourceRegistry,
        kind: &str,
        key: &str,
        overrides: &MaterialParams,
    ) -> Result<MaterialHandle, ResourceError> {
        let preset =
            MaterialPreset::from_key(kind).ok_or_else(|| ResourceError::UnknownMaterialType(kind.to_string()))?;

        if let Some(&handle) = self.materials.get(key) {
            return Ok(handle);
        }

        let mut material = preset.material().merged(overrides);
        material.name = key.to_string();
        let handle = registry.create_material(material);
        self.materials.insert(key.to_string(), handle);
        Ok(handle)
    }

    /// Get or create a cached material whose colour texture comes from `url`.
    ///
    /// The material is usable immediately; the texture is attached when the
    /// image arrives.
    pub fn textured_material(
        &mut self,
        registry: &mut ResourceRegistry,
        loader: &mut TextureLoader,
        key: &str,
        url: &str,
        overrides: &MaterialParams,
    ) -> MaterialHandle {
        let is_new = !self.materials.contains_key(key);
        let handle = self.get_material(registry, key, overrides);
        if !is_new {
            return handle;
        }

        if let Some(&texture) = self.textures.get(url) {
            if let Some(material) = registry.material_mut(handle) {
                material.texture = Some(texture);
            }
        } else {
            self.queue_load(loader, url, TextureBinding::Shared(handle));
        }
        handle
    }

    /// Load `url` into a private texture for a material the caller owns.
    ///
    /// The texture is owned by the material and disposed with it. If the
    /// material is gone by the time the image arrives the result is dropped.
    pub fn load_exclusive_texture(&mut self, loader: &mut TextureLoader, material: MaterialHandle, url: &str) {
        self.queue_load(loader, url, TextureBinding::Exclusive(material));
    }

    fn queue_load(&mut self, loader: &mut TextureLoader, url: &str, binding: TextureBinding) {
        if let Some(pending) = self.pending.get_mut(url) {
            log::trace!("Joining in-flight load {:?} for {}", pending.request, url);
            pending.bindings.push(binding);
            return;
        }
        let request = loader.request(url);
        self.pending.insert(
            url.to_string(),
            PendingTexture {
                request,
                bindings: vec![binding],
            },
        );
    }

    /// Merge finished image loads into the materials waiting for them.
    ///
    /// Returns the textures created together with their pixels so the render
    /// backend can upload them. Failed loads turn the waiting materials into
    /// flat placeholders.
    pub fn resolve_loads(
        &mut self,
        registry: &mut ResourceRegistry,
        completed: Vec<CompletedLoad>,
    ) -> Vec<(TextureHandle, DecodedImage)> {
        let mut uploads = Vec::new();

        for load in completed {
            let Some(pending) = self.pending.remove(&load.url) else {
                log::debug!("Dropping image for {} nobody is waiting for", load.url);
                continue;
            };

            let live: Vec<TextureBinding> = pending
                .bindings
                .into_iter()
                .filter(|binding| registry.contains_material(binding.material()))
                .collect();

            let image = match load.result {
                Ok(image) => image.fit_within(self.config.max_texture_size),
                Err(err) => {
                    log::warn!("Texture load failed, using placeholder: {}", err);
                    for binding in live {
                        if let Some(material) = registry.material_mut(binding.material()) {
                            material.color = self.config.placeholder_color;
                            material.texture = None;
                        }
                    }
                    continue;
                }
            };

            for binding in live {
                let texture = match binding {
                    TextureBinding::Shared(_) => match self.textures.get(&load.url) {
                        Some(&texture) => texture,
                        None => {
                            let texture = registry.create_texture(self.texture_for(&load.url, &image));
                            self.textures.insert(load.url.clone(), texture);
                            uploads.push((texture, image.clone()));
                            texture
                        }
                    },
                    TextureBinding::Exclusive(material) => {
                        let texture =
                            registry.create_texture(self.texture_for(&load.url, &image).owned_by(material));
                        uploads.push((texture, image.clone()));
                        texture
                    }
                };
                if let Some(material) = registry.material_mut(binding.material()) {
                    material.texture = Some(texture);
                }
            }
            log::debug!("Resolved texture {} ({}x{})", load.url, image.width, image.height);
        }

        uploads
    }

    fn texture_for(&self, url: &str, image: &DecodedImage) -> TextureResource {
        TextureResource {
            anisotropy: self.config.anisotropy,
            mipmaps: self.config.enable_mipmaps,
            ..TextureResource::new(TextureSource::Image(url.to_string()), image.width, image.height)
        }
    }

    /// Handle cached under `key`
    pub fn material_handle(&self, key: &str) -> Option<MaterialHandle> {
        self.materials.get(key).copied()
    }

    /// Whether `handle` is one of the cached (shared) materials
    pub fn is_cached(&self, handle: MaterialHandle) -> bool {
        self.materials.values().any(|&cached| cached == handle)
    }

    /// Change parameters of a cached material
    pub fn update_material(
        &self,
        registry: &mut ResourceRegistry,
        key: &str,
        params: &MaterialParams,
    ) -> Result<(), ResourceError> {
        let handle = self.existing(key)?;
        let material = registry
            .material_mut(handle)
            .ok_or(ResourceError::UnknownMaterial(handle))?;
        material.apply(params);
        Ok(())
    }

    /// Copy a cached material under a new key
    pub fn clone_material(
        &mut self,
        registry: &mut ResourceRegistry,
        key: &str,
        new_key: &str,
    ) -> Result<MaterialHandle, ResourceError> {
        let handle = self.existing(key)?;
        let mut copy = registry
            .material(handle)
            .cloned()
            .ok_or(ResourceError::UnknownMaterial(handle))?;
        copy.name = new_key.to_string();
        let clone = registry.create_material(copy);
        self.materials.insert(new_key.to_string(), clone);
        Ok(clone)
    }

    /// Dispose a cached material
    pub fn remove_material(&mut self, registry: &mut ResourceRegistry, key: &str) -> Result<(), ResourceError> {
        let handle = self
            .materials
            .remove(key)
            .ok_or_else(|| ResourceError::UnknownMaterialKey(key.to_string()))?;
        registry.dispose_material(handle)
    }

    /// Dispose a cached texture and detach it from cached materials
    pub fn remove_texture(&mut self, registry: &mut ResourceRegistry, url: &str) -> Result<(), ResourceError> {
        let texture = self
            .textures
            .remove(url)
            .ok_or_else(|| ResourceError::UnknownTextureUrl(url.to_string()))?;
        for &handle in self.materials.values() {
            if let Some(material) = registry.material_mut(handle) {
                if material.texture == Some(texture) {
                    material.texture = None;
                }
            }
        }
        registry.dispose_texture(texture)
    }

    /// Dispose every cached material and texture and forget pending loads.
    ///
    /// Must not be called while a hall still draws with a cached material.
    pub fn clear(&mut self, registry: &mut ResourceRegistry) {
        let materials = self.materials.len();
        let textures = self.textures.len();

        for (key, handle) in self.materials.drain() {
            if let Err(err) = registry.dispose_material(handle) {
                log::warn!("Material '{}' already disposed: {}", key, err);
            }
        }
        for (url, texture) in self.textures.drain() {
            if let Err(err) = registry.dispose_texture(texture) {
                log::warn!("Texture '{}' already disposed: {}", url, err);
            }
        }
        self.pending.clear();

        log::info!("Material cache cleared ({} materials, {} textures)", materials, textures);
    }

    /// Cache sizes
    pub fn stats(&self) -> MaterialStats {
        MaterialStats {
            materials: self.materials.len(),
            textures: self.textures.len(),
            pending_loads: self.pending.len(),
        }
    }

    fn existing(&self, key: &str) -> Result<MaterialHandle, ResourceError> {
        self.material_handle(key)
            .ok_or_else(|| ResourceError::UnknownMaterialKey(key.to_string()))
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new(MaterialConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImageSource;
    use std::sync::Arc;

    fn inline_loader(source: MemoryImageSource) -> TextureLoader {
        TextureLoader::new(Arc::new(source), false)
    }

    #[test]
    fn test_preset_cache_identity() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();

        let first = manager.get_material(&mut registry, "wall", &MaterialParams::default());
        let second = manager.get_material(&mut registry, "wall", &MaterialParams::default());

        assert_eq!(first, second);
        assert_eq!(registry.stats().materials.allocated, 1);
        let wall = registry.material(first).expect("cached");
        assert_eq!(wall.color.to_hex(), 0xf5f5f5);
        assert_eq!(wall.roughness, 0.9);
    }

    #[test]
    fn test_overrides_apply_on_creation() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let handle = manager.get_preset(
            &mut registry,
            MaterialPreset::GildedFrame,
            &MaterialParams { metalness: Some(0.5), ..MaterialParams::default() },
        );
        let material = registry.material(handle).expect("cached");
        assert_eq!(material.color.to_hex(), 0xd4af37);
        assert_eq!(material.metalness, 0.5);
    }

    #[test]
    fn test_unknown_material_type_is_scoped_error() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let result = manager.create_material(&mut registry, "marble", "lobby", &MaterialParams::default());
        assert!(matches!(result, Err(ResourceError::UnknownMaterialType(kind)) if kind == "marble"));

        let glass = manager
            .create_material(&mut registry, "glass", "vitrine", &MaterialParams::default())
            .expect("known type");
        assert!(registry.material(glass).expect("created").transparent);
    }

    #[test]
    fn test_remove_unknown_material_fails() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        assert!(matches!(
            manager.remove_material(&mut registry, "never"),
            Err(ResourceError::UnknownMaterialKey(_))
        ));
    }

    #[test]
    fn test_shared_texture_loads_once_and_attaches_on_resolve() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let mut loader = inline_loader(
            MemoryImageSource::new().with_image("/images/a.jpg", DecodedImage::solid_color(8, 8, [9; 4])),
        );

        let a = manager.textured_material(&mut registry, &mut loader, "a", "/images/a.jpg", &MaterialParams::default());
        let b = manager.textured_material(&mut registry, &mut loader, "b", "/images/a.jpg", &MaterialParams::default());
        assert_eq!(loader.in_flight(), 1);
        assert_eq!(manager.stats().pending_loads, 1);
        assert!(registry.material(a).expect("live").texture.is_none());

        let uploads = manager.resolve_loads(&mut registry, loader.poll());
        assert_eq!(uploads.len(), 1);
        let texture = registry.material(a).expect("live").texture;
        assert!(texture.is_some());
        assert_eq!(registry.material(b).expect("live").texture, texture);
        assert_eq!(manager.stats().textures, 1);
    }

    #[test]
    fn test_failed_load_falls_back_to_placeholder() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let mut loader = inline_loader(MemoryImageSource::new());

        let handle =
            manager.textured_material(&mut registry, &mut loader, "lost", "/images/lost.jpg", &MaterialParams::default());
        let uploads = manager.resolve_loads(&mut registry, loader.poll());

        assert!(uploads.is_empty());
        let material = registry.material(handle).expect("live");
        assert_eq!(material.color, MaterialConfig::default().placeholder_color);
        assert!(material.texture.is_none());
    }

    #[test]
    fn test_exclusive_texture_dropped_when_material_gone() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let mut loader = inline_loader(
            MemoryImageSource::new().with_image("/images/a.jpg", DecodedImage::solid_color(2, 2, [0; 4])),
        );

        let owned = registry.create_material(Material::default());
        manager.load_exclusive_texture(&mut loader, owned, "/images/a.jpg");
        registry.dispose_material(owned).expect("live");

        let uploads = manager.resolve_loads(&mut registry, loader.poll());
        assert!(uploads.is_empty());
        assert_eq!(registry.stats().textures.allocated, 0);
    }

    #[test]
    fn test_clear_disposes_every_cached_resource() {
        let mut registry = ResourceRegistry::new();
        let mut manager = MaterialManager::default();
        let mut loader = inline_loader(
            MemoryImageSource::new().with_image("/images/a.jpg", DecodedImage::solid_color(2, 2, [0; 4])),
        );
        for preset in MaterialPreset::ALL {
            manager.get_preset(&mut registry, preset, &MaterialParams::default());
        }
        manager.textured_material(&mut registry, &mut loader, "painting", "/images/a.jpg", &MaterialParams::default());
        manager.resolve_loads(&mut registry, loader.poll());
        manager.clone_material(&mut registry, "wall", "wall-copy").expect("cached");

        manager.clear(&mut registry);

        assert!(registry.stats().is_balanced());
        assert_eq!(manager.stats().materials, 0);
    }
}
