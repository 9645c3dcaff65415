use std::time::{Duration, Instant};

/// Deadline-based frame pacing for a fixed target rate.
///
/// Deadlines advance by one interval per frame; after a stall the schedule
/// restarts from the current instant instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next: Instant,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: u32, now: Instant) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next: now,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Marks a frame as started at `now`. Returns the time since the previous frame.
    pub fn begin_frame(&mut self, now: Instant) -> Option<Duration> {
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
        let since = self.last_frame.map(|last| now.saturating_duration_since(last));
        self.last_frame = Some(now);
        since
    }

    pub fn reset(&mut self, now: Instant) {
        self.next = now;
        self.last_frame = None;
    }
}
