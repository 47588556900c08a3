//! Host input events
//!
//! The host UI layer translates its native keyboard, pointer and touch
//! events into [`InputEvent`]s and feeds them to the scene manager. Pointer
//! coordinates are pixels from the top-left corner of the surface.

pub mod pointer;

pub use pointer::PointerState;

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    KeyW,
    /// A key
    KeyA,
    /// S key
    KeyS,
    /// D key
    KeyD,
    /// Up arrow
    ArrowUp,
    /// Down arrow
    ArrowDown,
    /// Left arrow
    ArrowLeft,
    /// Right arrow
    ArrowRight,
    /// Escape key
    Escape,
    /// Space bar
    Space,
    /// Number row digit `0..=9`
    Digit(u8),
    /// Anything else
    Other,
}

/// Pointer buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary button
    Left,
    /// Wheel button
    Middle,
    /// Secondary button
    Right,
}

/// One finger of a touch gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Identifier stable for the lifetime of the touch
    pub id: u64,
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
}

impl TouchPoint {
    /// Touch at the given position
    pub const fn new(id: u64, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// Input delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Key pressed
    KeyDown(KeyCode),
    /// Key released
    KeyUp(KeyCode),
    /// Pointer moved to the given pixel position
    PointerMove {
        /// Pixels from the left edge
        x: f32,
        /// Pixels from the top edge
        y: f32,
    },
    /// Pointer button pressed
    PointerDown {
        /// Button
        button: PointerButton,
        /// Pixels from the left edge
        x: f32,
        /// Pixels from the top edge
        y: f32,
    },
    /// Pointer button released
    PointerUp {
        /// Button
        button: PointerButton,
    },
    /// Pointer left the surface
    PointerLeave,
    /// Primary click at the given position
    Click {
        /// Pixels from the left edge
        x: f32,
        /// Pixels from the top edge
        y: f32,
    },
    /// Primary double click at the given position
    DoubleClick {
        /// Pixels from the left edge
        x: f32,
        /// Pixels from the top edge
        y: f32,
    },
    /// Fingers touched down
    TouchStart(Vec<TouchPoint>),
    /// Fingers moved; carries every active touch
    TouchMove(Vec<TouchPoint>),
    /// Fingers lifted; carries the touches that are still down
    TouchEnd(Vec<TouchPoint>),
}
