//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Colours
//! - Typed handles for scene and resource objects
//! - Frame timing
//! - Logging utilities

pub mod math;
pub mod color;
pub mod collections;
pub mod time;
pub mod logging;
