use crate::mapping::{ScreenMapping, ScreenPoint};
use crate::trajectory::Trajectory;

/// Peak opacity of the nearest preview dot.
pub const LOOKAHEAD_MAX_ALPHA: f64 = 200.0;

/// One faded preview dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookaheadDot {
    pub time: f64,
    pub point: ScreenPoint,
    pub alpha: u8,
}

/// Future target positions spaced evenly over `horizon` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookahead {
    pub horizon: f64,
    pub steps: usize,
}

impl Lookahead {
    pub fn new(horizon: f64, steps: usize) -> Self {
        Self { horizon, steps }
    }

    pub fn spacing(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.horizon / self.steps as f64
        }
    }

    pub fn alpha(&self, k: usize) -> u8 {
        let fade = 1.0 - k as f64 / self.steps as f64;
        (LOOKAHEAD_MAX_ALPHA * fade).clamp(0.0, 255.0) as u8
    }

    pub fn dots<'a>(
        &'a self,
        t: f64,
        trajectory: &'a Trajectory,
        mapping: &'a ScreenMapping,
    ) -> impl Iterator<Item = LookaheadDot> + 'a {
        let spacing = self.spacing();
        (1..=self.steps).map(move |k| {
            let time = t + k as f64 * spacing;
            LookaheadDot {
                time,
                point: mapping.to_screen(&trajectory.sample(time)),
                alpha: self.alpha(k),
            }
        })
    }
}

impl Default for Lookahead {
    fn default() -> Self {
        Self::new(2.0, 20)
    }
}
