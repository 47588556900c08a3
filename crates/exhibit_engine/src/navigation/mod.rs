//! First-person navigation
//!
//! Keyboard movement with friction, drag-to-look and the hard rectangular
//! boundary that keeps the viewer inside the active hall.

pub mod navigation_manager;

pub use navigation_manager::{Boundary, MovementKeys, NavigationEvent, NavigationManager, NavigationMode, Obstacle};
