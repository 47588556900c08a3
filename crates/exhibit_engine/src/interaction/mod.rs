//! Pointer interaction: hit testing, hover and selection highlight, info
//! popups and keyboard shortcuts

pub mod interaction_manager;
pub mod popup;

pub use interaction_manager::{InteractionEvent, InteractionManager};
pub use popup::{InfoPopup, PopupContent};
