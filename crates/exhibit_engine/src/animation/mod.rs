//! Time-based property changes
//!
//! - [`easing`]: progress curves
//! - [`scheduler`]: running tweens, completion groups and cancellation

pub mod easing;
pub mod scheduler;

pub use easing::Easing;
pub use scheduler::{
    AnimatedValue, AnimationFrame, AnimationOwner, AnimationSample, AnimationScheduler, AnimationSpec,
    AnimationTarget, CompletionTag,
};
