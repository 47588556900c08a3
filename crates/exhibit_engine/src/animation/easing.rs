//! Easing curves mapping linear progress to eased progress

use serde::{Deserialize, Serialize};

/// Easing curve applied to an animation's normalized time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Quadratic acceleration
    QuadIn,
    /// Quadratic deceleration
    QuadOut,
    /// Quadratic acceleration then deceleration
    #[default]
    QuadInOut,
    /// Sinusoidal acceleration then deceleration
    SineInOut,
    /// Slight overshoot before settling
    BackOut,
}

impl Easing {
    /// Map `t` in `[0, 1]` to eased progress; input outside the range is clamped
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Self::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) * 0.5,
            Self::BackOut => {
                const OVERSHOOT: f32 = 1.701_58;
                let shifted = t - 1.0;
                1.0 + (OVERSHOOT + 1.0) * shifted.powi(3) + OVERSHOOT * shifted.powi(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::SineInOut,
        Easing::BackOut,
    ];

    #[test]
    fn test_every_curve_starts_at_zero_and_ends_at_one() {
        for easing in ALL {
            assert_relative_eq!(easing.apply(0.0), 0.0, epsilon = 1e-5);
            assert_relative_eq!(easing.apply(1.0), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_in_out_is_symmetric_at_midpoint() {
        assert_relative_eq!(Easing::QuadInOut.apply(0.5), 0.5, epsilon = 1e-6);
        assert_relative_eq!(Easing::SineInOut.apply(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_back_out_overshoots() {
        assert!(Easing::BackOut.apply(0.8) > 1.0);
    }
}
