use serde::{Deserialize, Serialize};

/// (amplitude, angular frequency) of each vertical term.
pub const VERTICAL_TERMS: [(f64, f64); 4] = [(-7.8, 0.12), (1.6, 0.28), (9.4, 0.37), (-10.6, 0.64)];

/// Upper bound of `|vertical_offset(t)|` for any `t`.
pub fn vertical_bound() -> f64 {
    VERTICAL_TERMS.iter().map(|(a, _)| a.abs()).sum()
}

/// Vertical target offset in world units at elapsed time `t` (seconds).
pub fn vertical_offset(t: f64) -> f64 {
    VERTICAL_TERMS
        .iter()
        .map(|(amplitude, freq)| amplitude * (freq * t).sin())
        .sum()
}

/// One evaluation of the target trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub forward: f64,
    pub vertical: f64,
}

/// Closed-form target path: linear forward drift plus the four-term sinusoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Forward speed in units per second.
    pub speed: f64,
}

impl Trajectory {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    pub fn sample(&self, t: f64) -> TrajectorySample {
        TrajectorySample {
            time: t,
            forward: self.speed * t,
            vertical: vertical_offset(t),
        }
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vertical_offset_at_zero() {
        assert_eq!(vertical_offset(0.0), 0.0);
    }

    #[test]
    fn test_vertical_offset_known_value() {
        let t = 10.0_f64;
        let expected = -7.8 * (1.2_f64).sin() + 1.6 * (2.8_f64).sin() + 9.4 * (3.7_f64).sin()
            - 10.6 * (6.4_f64).sin();
        assert!((vertical_offset(t) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bound_is_sum_of_amplitudes() {
        assert!((vertical_bound() - 29.4).abs() < 1e-12);
    }

    #[test]
    fn test_forward_is_linear() {
        let traj = Trajectory::new(10.0);
        assert_eq!(traj.sample(0.0).forward, 0.0);
        assert!((traj.sample(2.5).forward - 25.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_vertical_bounded(t in 0.0f64..100_000.0) {
            prop_assert!(vertical_offset(t).abs() <= vertical_bound() + 1e-9);
        }

        #[test]
        fn prop_sample_deterministic(t in 0.0f64..10_000.0, speed in -50.0f64..50.0) {
            let traj = Trajectory::new(speed);
            prop_assert_eq!(traj.sample(t), traj.sample(t));
        }
    }
}
