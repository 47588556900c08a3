//! # Core Engine Module
//!
//! Shared configuration records consumed by every subsystem.

pub mod config;

pub use config::{
    Config,
    ConfigError,
    EngineConfig,
    ExhibitionConfig,
    InteractionConfig,
    LightingConfig,
    MaterialConfig,
    NavigationConfig,
    OrbitConfig,
};
