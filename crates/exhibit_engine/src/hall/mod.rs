//! Exhibition halls
//!
//! A hall is described by a [`HallConfig`], assembled by a [`HallScene`]
//! and decorated by the [`AreaBuilder`]s its configuration lists. The five
//! halls of the tour ship in [`catalog`].

pub mod build;
pub mod builders;
pub mod catalog;
pub mod config;
pub mod hall_scene;

pub use build::{ArtworkPlacement, HallBuildContext, HallContents, MarkerPlacement};
pub use builders::AreaBuilder;
pub use catalog::{builtin_hall, builtin_halls, hall_for_digit, HALL_IDS};
pub use config::{AreaBuilderSpec, AreaConfig, ArtworkConfig, HallConfig};
pub use hall_scene::{HallScene, HallState};
