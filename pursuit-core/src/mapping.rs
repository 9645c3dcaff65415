use crate::trajectory::TrajectorySample;
use serde::{Deserialize, Serialize};

/// Pixel position on the canvas, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Maps world units onto the canvas with one scale factor for both axes.
///
/// The vertical axis is centred on the canvas and grows downward, matching
/// screen coordinates. With `wrap` enabled the forward position is folded
/// into `[0, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMapping {
    pub width: u32,
    pub height: u32,
    pub pixels_per_unit: f64,
    pub wrap: bool,
}

impl ScreenMapping {
    pub fn new(width: u32, height: u32, pixels_per_unit: f64, wrap: bool) -> Self {
        Self {
            width,
            height,
            pixels_per_unit,
            wrap,
        }
    }

    pub fn center_y(&self) -> f64 {
        (self.height / 2) as f64
    }

    pub fn forward_to_px(&self, forward: f64) -> i32 {
        let px = (forward * self.pixels_per_unit).floor() as i64;
        if self.wrap && self.width > 0 {
            px.rem_euclid(self.width as i64) as i32
        } else {
            px.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        }
    }

    pub fn vertical_to_px(&self, vertical: f64) -> i32 {
        (self.center_y() + vertical * self.pixels_per_unit).floor() as i32
    }

    pub fn to_screen(&self, sample: &TrajectorySample) -> ScreenPoint {
        ScreenPoint::new(
            self.forward_to_px(sample.forward),
            self.vertical_to_px(sample.vertical),
        )
    }

    /// Target position in units as it is displayed (forward wrapped when wrapping).
    pub fn displayed_units(&self, sample: &TrajectorySample) -> (f64, f64) {
        let x = if self.wrap && self.width > 0 {
            let span = self.width as f64 / self.pixels_per_unit;
            sample.forward.rem_euclid(span)
        } else {
            sample.forward
        };
        (x, sample.vertical)
    }

    /// Converts a cursor pixel position into units, with y positive above the centre line.
    pub fn cursor_to_units(&self, px: f64, py: f64) -> (f64, f64) {
        (
            px / self.pixels_per_unit,
            (self.center_y() - py) / self.pixels_per_unit,
        )
    }
}
