//! Pointer and touch state
//!
//! Tracks where the pointer is, whether a drag is in progress and the
//! finger spread of a two-finger pinch, and converts pixel positions to
//! normalized device coordinates for ray casting.

use crate::input::TouchPoint;

/// Pointer state shared by navigation and interaction
#[derive(Debug, Clone)]
pub struct PointerState {
    /// Current X position in pixels
    pub screen_x: f32,
    /// Current Y position in pixels
    pub screen_y: f32,
    /// Surface width in pixels
    pub viewport_width: u32,
    /// Surface height in pixels
    pub viewport_height: u32,
    /// Drag start position (None if not dragging)
    pub drag_start: Option<(f32, f32)>,
    /// Whether the primary button is held
    pub button_down: bool,
    /// Whether the pointer is over the surface
    pub inside: bool,
    pinch_distance: Option<f32>,
}

impl PointerState {
    /// Pixels the pointer must travel before a press counts as a drag
    pub const DRAG_THRESHOLD: f32 = 5.0;

    /// Create pointer state for a surface
    pub const fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            screen_x: 0.0,
            screen_y: 0.0,
            viewport_width,
            viewport_height,
            drag_start: None,
            button_down: false,
            inside: false,
            pinch_distance: None,
        }
    }

    /// Convert the current position to normalized device coordinates
    ///
    /// X runs -1 (left) to +1 (right), Y runs -1 (bottom) to +1 (top).
    pub fn to_ndc(&self) -> (f32, f32) {
        Self::pixel_to_ndc(self.screen_x, self.screen_y, self.viewport_width, self.viewport_height)
    }

    /// Convert a pixel position on a surface to normalized device coordinates
    pub fn pixel_to_ndc(x: f32, y: f32, width: u32, height: u32) -> (f32, f32) {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        (x / width * 2.0 - 1.0, 1.0 - y / height * 2.0)
    }

    /// Record a new pointer position; returns the movement in pixels
    pub fn update_position(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = if self.inside {
            (x - self.screen_x, y - self.screen_y)
        } else {
            (0.0, 0.0)
        };
        self.screen_x = x;
        self.screen_y = y;
        self.inside = true;
        delta
    }

    /// Pointer left the surface
    pub fn leave(&mut self) {
        self.inside = false;
        self.end_drag();
    }

    /// Update the surface size
    pub fn update_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Start a drag at the current position
    pub fn start_drag(&mut self) {
        self.drag_start = Some((self.screen_x, self.screen_y));
        self.button_down = true;
    }

    /// End the drag
    pub fn end_drag(&mut self) {
        self.drag_start = None;
        self.button_down = false;
    }

    /// Whether the held pointer has moved far enough to count as a drag
    pub fn is_dragging(&self) -> bool {
        match self.drag_start {
            Some((start_x, start_y)) if self.button_down => {
                let dx = self.screen_x - start_x;
                let dy = self.screen_y - start_y;
                (dx * dx + dy * dy).sqrt() >= Self::DRAG_THRESHOLD
            }
            _ => false,
        }
    }

    /// Track a two-finger gesture; returns the spread ratio since the last
    /// call while a pinch is in progress
    pub fn update_pinch(&mut self, touches: &[TouchPoint]) -> Option<f32> {
        let [a, b] = touches else {
            self.pinch_distance = None;
            return None;
        };
        let distance = (a.x - b.x).hypot(a.y - b.y);
        let previous = self.pinch_distance.replace(distance)?;
        if previous <= f32::EPSILON {
            return None;
        }
        Some(distance / previous)
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
