use crate::mapping::ScreenPoint;
use std::collections::VecDeque;

pub const DEFAULT_TRAIL_CAPACITY: usize = 800;
/// Largest trail a session will accept.
pub const MAX_TRAIL_CAPACITY: usize = 1_000_000;

/// Recent target positions, oldest first. Never holds more than `capacity` points.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<ScreenPoint>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity.min(DEFAULT_TRAIL_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, point: ScreenPoint) {
        if self.capacity == 0 {
            return;
        }
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Pushes a point produced by a wrapping mapping. A horizontal jump larger
    /// than half the screen means the target wrapped, so the old segment is dropped.
    pub fn push_wrapped(&mut self, point: ScreenPoint, width: u32) {
        if let Some(last) = self.points.back() {
            if (point.x - last.x).unsigned_abs() > width / 2 {
                self.points.clear();
            }
        }
        self.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&ScreenPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScreenPoint> {
        self.points.iter()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}
