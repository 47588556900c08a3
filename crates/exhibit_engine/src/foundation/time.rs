//! Frame timing

/// Longest delta a single tick may report; larger gaps (debugger pauses,
/// a minimised window) are clamped so animations and movement do not jump.
pub const MAX_DELTA_TIME: f32 = 0.1;

/// Frames-per-second measurement over fixed windows
///
/// Frames are counted until at least `window` seconds of tick time have
/// accumulated, then the rate for that window replaces the previous reading.
/// The reading starts at the configured target so a fresh engine is not
/// considered slow before the first window closes.
#[derive(Debug, Clone)]
pub struct FrameRateMonitor {
    window: f32,
    elapsed: f32,
    frames: u32,
    fps: f32,
    total_frames: u64,
}

impl FrameRateMonitor {
    /// Create a monitor reporting `initial_fps` until the first window closes
    pub fn new(initial_fps: f32) -> Self {
        Self {
            window: 1.0,
            elapsed: 0.0,
            frames: 0,
            fps: initial_fps,
            total_frames: 0,
        }
    }

    /// Record one tick of `delta_time` seconds.
    ///
    /// Returns the new reading when a measurement window closes.
    pub fn record_frame(&mut self, delta_time: f32) -> Option<f32> {
        self.frames += 1;
        self.total_frames += 1;
        self.elapsed += delta_time.max(0.0);

        if self.elapsed < self.window {
            return None;
        }

        self.fps = (self.frames as f32 / self.elapsed).round();
        self.frames = 0;
        self.elapsed = 0.0;
        log::trace!("Frame rate window closed: {} fps", self.fps);
        Some(self.fps)
    }

    /// Most recent reading
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Frames recorded since creation
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reports_initial_value_until_window_closes() {
        let mut monitor = FrameRateMonitor::new(60.0);
        for _ in 0..10 {
            assert!(monitor.record_frame(0.0625).is_none());
        }
        assert_eq!(monitor.fps(), 60.0);
    }

    #[test]
    fn test_monitor_measures_slow_frames() {
        let mut monitor = FrameRateMonitor::new(60.0);
        let mut reading = None;
        for _ in 0..16 {
            reading = reading.or(monitor.record_frame(0.0625));
        }
        assert_eq!(reading, Some(16.0));
        assert_eq!(monitor.total_frames(), 16);
    }
}
