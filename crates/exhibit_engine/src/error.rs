//! Engine-level error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::backend::RenderError;
use crate::render::resources::ResourceError;

/// Errors raised while building a hall
#[derive(Debug, Error)]
pub enum HallError {
    /// The hall configuration is inconsistent
    #[error("Invalid hall configuration: {0}")]
    InvalidConfig(String),

    /// A material, light or texture request failed
    #[error("Hall resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A construction step failed
    #[error("Hall construction failed: {0}")]
    Build(String),
}

/// Errors surfaced by the scene manager
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation needed `initialize()` first
    #[error("Scene manager is not initialized")]
    NotInitialized,

    /// A hall switch or camera command arrived while a transition was running
    #[error("A transition to '{0}' is already in progress")]
    TransitionInProgress(String),

    /// No hall with this id is known
    #[error("Unknown hall '{0}'")]
    UnknownHall(String),

    /// Hall construction failed
    #[error(transparent)]
    Hall(#[from] HallError),

    /// Resource registry error
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Rendering backend error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transition was abandoned before it finished
    #[error("Transition was cancelled")]
    TransitionCancelled,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
