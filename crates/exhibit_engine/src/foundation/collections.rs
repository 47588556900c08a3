//! Typed handles for scene and resource objects
//!
//! Every object the engine creates lives in a slot map and is referred to
//! through one of these keys. A stale key simply fails to resolve, which is
//! what makes "dispose once, then ignore" checks cheap.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Node in the scene graph
    pub struct NodeId;
    /// Light owned by the light manager
    pub struct LightId;
    /// Geometry resource
    pub struct GeometryHandle;
    /// Material resource
    pub struct MaterialHandle;
    /// Texture resource
    pub struct TextureHandle;
    /// Active animation in the scheduler
    pub struct AnimationId;
    /// Completion group in the scheduler
    pub struct AnimationGroupId;
}
