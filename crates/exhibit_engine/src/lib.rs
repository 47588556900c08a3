//! # Exhibit Engine
//!
//! Scene engine for navigable virtual art exhibitions.
//!
//! ## Features
//!
//! - **Halls**: parameterized exhibition rooms assembled from area builders
//! - **Transitions**: fade-out, rebuild and intro between halls, one at a time
//! - **Navigation**: first-person walking clamped to the hall walls
//! - **Interaction**: hover and selection highlights, info popups, shortcuts
//! - **Resources**: cached materials, light presets and leak-checked disposal
//! - **Headless**: a backend seam so the whole engine runs without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use exhibit_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = SceneManager::new(
//!         ExhibitionConfig::default(),
//!         HeadlessBackend::new(),
//!         Arc::new(MemoryImageSource::new()),
//!     );
//!     engine.initialize()?;
//!     let ticket = engine.switch_scene("entrance", None)?;
//!     while !ticket.is_resolved() {
//!         engine.update(1.0 / 60.0)?;
//!     }
//!     engine.destroy();
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod config;
pub mod core;
pub mod error;
pub mod foundation;
pub mod hall;
pub mod input;
pub mod interaction;
pub mod navigation;
pub mod physics;
pub mod render;
pub mod scene;

pub use error::{EngineError, EngineResult, HallError};
pub use scene::{SceneManager, TransitionTicket};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{AnimationOwner, AnimationTarget, CompletionTag, Easing},
        assets::{DecodedImage, FileImageSource, ImageSource, MemoryImageSource},
        core::{Config, ExhibitionConfig},
        error::{EngineError, EngineResult},
        foundation::{
            color::Color,
            math::{Transform, Vec3},
        },
        hall::{builtin_halls, AreaBuilderSpec, HallConfig, HallScene, HallState},
        input::{InputEvent, KeyCode, PointerButton, TouchPoint},
        interaction::InteractionEvent,
        navigation::NavigationMode,
        render::{HeadlessBackend, RenderBackend},
        scene::{EngineCallbacks, EngineEvent, NodeTag, PerformanceStats, SceneManager, TransitionTicket},
    };
}
