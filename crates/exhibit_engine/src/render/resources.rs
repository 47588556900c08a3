//! Resource registry for geometries, materials and textures
//!
//! The registry is the single place where drawable resources are allocated
//! and disposed. It counts both, per kind, so ownership bugs show up as an
//! imbalance instead of a silent leak. Disposing a handle that was never
//! allocated (or was already disposed) is an error.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::foundation::collections::{GeometryHandle, MaterialHandle, TextureHandle};
use crate::foundation::math::Vec3;
use crate::physics::collision::Aabb;
use crate::render::material::Material;

/// Errors raised by resource creation and disposal
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Geometry handle does not resolve
    #[error("Unknown geometry handle {0:?}")]
    UnknownGeometry(GeometryHandle),

    /// Material handle does not resolve
    #[error("Unknown material handle {0:?}")]
    UnknownMaterial(MaterialHandle),

    /// Texture handle does not resolve
    #[error("Unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    /// No cached material under this key
    #[error("No material cached under key '{0}'")]
    UnknownMaterialKey(String),

    /// No cached texture for this URL
    #[error("No texture cached for '{0}'")]
    UnknownTextureUrl(String),

    /// Material archetype name not in the preset catalog
    #[error("Unknown material type '{0}'")]
    UnknownMaterialType(String),

    /// Light archetype name not in the preset catalog
    #[error("Unknown light type '{0}'")]
    UnknownLightType(String),

    /// No light registered under this key
    #[error("No light registered under key '{0}'")]
    UnknownLightKey(String),
}

/// Shape of a geometry resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum GeometryKind {
    /// Flat rectangle in the local XY plane, facing +Z
    Plane {
        /// Extent along X
        width: f32,
        /// Extent along Y
        height: f32,
    },
    /// Axis-aligned box centred on the origin
    Box {
        /// Extent along X
        width: f32,
        /// Extent along Y
        height: f32,
        /// Extent along Z
        depth: f32,
    },
    /// Cylinder along the local Y axis
    Cylinder {
        /// Radius of the top cap
        radius_top: f32,
        /// Radius of the bottom cap
        radius_bottom: f32,
        /// Extent along Y
        height: f32,
    },
    /// Sphere centred on the origin
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Reference grid in the local XZ plane
    Grid {
        /// Side length
        size: f32,
        /// Line count per side
        divisions: u32,
    },
}

impl GeometryKind {
    /// Thickness given to flat shapes so they can be picked edge-on
    const FLAT_HALF_THICKNESS: f32 = 0.01;

    /// Local-space bounds used for picking
    pub fn local_bounds(&self) -> Aabb {
        let half = match *self {
            Self::Plane { width, height } => {
                Vec3::new(width * 0.5, height * 0.5, Self::FLAT_HALF_THICKNESS)
            }
            Self::Box { width, height, depth } => Vec3::new(width, height, depth) * 0.5,
            Self::Cylinder { radius_top, radius_bottom, height } => {
                let radius = radius_top.max(radius_bottom);
                Vec3::new(radius, height * 0.5, radius)
            }
            Self::Sphere { radius } => Vec3::new(radius, radius, radius),
            Self::Grid { size, .. } => Vec3::new(size * 0.5, Self::FLAT_HALF_THICKNESS, size * 0.5),
        };
        Aabb::from_half_extents(half)
    }
}

/// Where a texture's pixels came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Decoded from an image reference
    Image(String),
    /// Generated in memory, e.g. a text panel
    Generated(String),
}

/// A texture resource
#[derive(Debug, Clone)]
pub struct TextureResource {
    /// Origin of the pixel data
    pub source: TextureSource,
    /// Width in pixels after any downscale
    pub width: u32,
    /// Height in pixels after any downscale
    pub height: u32,
    /// Anisotropic filtering level
    pub anisotropy: u8,
    /// Whether mipmaps are requested
    pub mipmaps: bool,
    /// Material that exclusively owns this texture, disposed with it
    pub owner: Option<MaterialHandle>,
}

impl TextureResource {
    /// Texture of the given size with default sampling
    pub fn new(source: TextureSource, width: u32, height: u32) -> Self {
        Self {
            source,
            width,
            height,
            anisotropy: 1,
            mipmaps: false,
            owner: None,
        }
    }

    /// Mark the texture as owned by one material
    pub fn owned_by(mut self, material: MaterialHandle) -> Self {
        self.owner = Some(material);
        self
    }
}

/// Allocation counters for one resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounter {
    /// Total allocations
    pub allocated: u64,
    /// Total disposals
    pub disposed: u64,
}

impl ResourceCounter {
    /// Resources currently alive
    pub const fn live(&self) -> u64 {
        self.allocated - self.disposed
    }
}

/// Counters for every resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Geometry counters
    pub geometries: ResourceCounter,
    /// Material counters
    pub materials: ResourceCounter,
    /// Texture counters
    pub textures: ResourceCounter,
}

impl ResourceStats {
    /// Sum of allocations across kinds
    pub const fn allocated(&self) -> u64 {
        self.geometries.allocated + self.materials.allocated + self.textures.allocated
    }

    /// Sum of disposals across kinds
    pub const fn disposed(&self) -> u64 {
        self.geometries.disposed + self.materials.disposed + self.textures.disposed
    }

    /// Every allocation has been disposed
    pub const fn is_balanced(&self) -> bool {
        self.allocated() == self.disposed()
    }
}

/// Slot-map backed store of drawable resources
#[derive(Default)]
pub struct ResourceRegistry {
    geometries: SlotMap<GeometryHandle, GeometryKind>,
    materials: SlotMap<MaterialHandle, Material>,
    textures: SlotMap<TextureHandle, TextureResource>,
    stats: ResourceStats,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Geometry =====

    /// Allocate a geometry
    pub fn create_geometry(&mut self, kind: GeometryKind) -> GeometryHandle {
        self.stats.geometries.allocated += 1;
        self.geometries.insert(kind)
    }

    /// Look up a geometry
    pub fn geometry(&self, handle: GeometryHandle) -> Option<&GeometryKind> {
        self.geometries.get(handle)
    }

    /// Whether the handle still resolves
    pub fn contains_geometry(&self, handle: GeometryHandle) -> bool {
        self.geometries.contains_key(handle)
    }

    /// Dispose a geometry
    pub fn dispose_geometry(&mut self, handle: GeometryHandle) -> Result<(), ResourceError> {
        self.geometries
            .remove(handle)
            .ok_or(ResourceError::UnknownGeometry(handle))?;
        self.stats.geometries.disposed += 1;
        Ok(())
    }

    // ===== Materials =====

    /// Allocate a material
    pub fn create_material(&mut self, material: Material) -> MaterialHandle {
        self.stats.materials.allocated += 1;
        self.materials.insert(material)
    }

    /// Look up a material
    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Look up a material for mutation
    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    /// Whether the handle still resolves
    pub fn contains_material(&self, handle: MaterialHandle) -> bool {
        self.materials.contains_key(handle)
    }

    /// Dispose a material and any texture it exclusively owns
    pub fn dispose_material(&mut self, handle: MaterialHandle) -> Result<(), ResourceError> {
        let material = self
            .materials
            .remove(handle)
            .ok_or(ResourceError::UnknownMaterial(handle))?;
        self.stats.materials.disposed += 1;

        if let Some(texture) = material.texture {
            let owned = self
                .textures
                .get(texture)
                .is_some_and(|t| t.owner == Some(handle));
            if owned {
                self.dispose_texture(texture)?;
            }
        }
        Ok(())
    }

    // ===== Textures =====

    /// Allocate a texture
    pub fn create_texture(&mut self, texture: TextureResource) -> TextureHandle {
        self.stats.textures.allocated += 1;
        self.textures.insert(texture)
    }

    /// Look up a texture
    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureResource> {
        self.textures.get(handle)
    }

    /// Dispose a texture
    pub fn dispose_texture(&mut self, handle: TextureHandle) -> Result<(), ResourceError> {
        self.textures
            .remove(handle)
            .ok_or(ResourceError::UnknownTexture(handle))?;
        self.stats.textures.disposed += 1;
        Ok(())
    }

    // ===== Diagnostics =====

    /// Allocation counters
    pub const fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// Number of resources of all kinds still alive
    pub fn live_count(&self) -> usize {
        self.geometries.len() + self.materials.len() + self.textures.len()
    }
}
