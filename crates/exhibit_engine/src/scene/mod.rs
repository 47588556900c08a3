//! # Scene
//!
//! The scene graph, the engine context that owns every subsystem's state,
//! and the [`SceneManager`] that ties halls, transitions and input together.

pub mod context;
pub mod events;
pub mod graph;
pub mod node;
pub mod scene_manager;
pub mod transition;

pub use context::EngineContext;
pub use events::{EngineCallbacks, EngineEvent};
pub use graph::SceneGraph;
pub use node::{AchievementInfo, ArtworkInfo, EntranceInfo, NodeFlags, NodeTag, PanelInfo, SceneNode, TagKind};
pub use scene_manager::{PerformanceStats, SceneManager};
pub use transition::{TransitionPhase, TransitionTicket};
