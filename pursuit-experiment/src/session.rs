use super::config::TrackingConfig;
use chrono::Local;
use pursuit_core::{
    LogRecord, Lookahead, LookaheadDot, Participant, RunState, ScreenMapping, ScreenPoint,
    TrackingEvent, Trail, Trajectory, TrajectorySample,
};
use pursuit_timing::Timer;

/// Everything the renderer and the log need about one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub frame: u64,
    pub sample: TrajectorySample,
    pub target: ScreenPoint,
    /// Target in displayed units (forward wrapped when wrapping). The log uses `sample`.
    pub target_units: (f64, f64),
    pub cursor: Option<ScreenPoint>,
    pub cursor_units: Option<(f64, f64)>,
}

/// One trial of the tracking task.
///
/// Time comes from the timer while running and is frozen while paused. The
/// trial finishes on `Quit` or once wall-clock time passes the configured duration.
pub struct TrackingSession<T>
where
    T: Timer<Timestamp = u64>,
{
    pub state: RunState,
    pub timer: T,
    pub trial: usize,
    trajectory: Trajectory,
    mapping: ScreenMapping,
    lookahead: Lookahead,
    duration_s: f64,
    log_every: usize,
    start_ns: u64,
    last_t: f64,
    frame: u64,
    trail: Trail,
    current: Option<FrameSample>,
    completed: bool,
}

impl<T> TrackingSession<T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(config: &TrackingConfig, mapping: ScreenMapping, timer: T, trial: usize) -> Self {
        let start_ns = timer.now();
        Self {
            state: RunState::Running,
            timer,
            trial,
            trajectory: config.trajectory(),
            mapping,
            lookahead: config.lookahead(),
            duration_s: config.duration_s,
            log_every: config.log_every.max(1),
            start_ns,
            last_t: 0.0,
            frame: 0,
            trail: Trail::new(config.trail_capacity),
            current: None,
            completed: false,
        }
    }

    /// Starts the next trial on the same clock and canvas.
    pub fn restart(&mut self, trial: usize) {
        self.state = RunState::Running;
        self.trial = trial;
        self.start_ns = self.timer.now();
        self.last_t = 0.0;
        self.frame = 0;
        self.trail.clear();
        self.current = None;
        self.completed = false;
    }

    /// Switches to a new canvas mapping. Old trail points are in the old space, so they go.
    pub fn set_mapping(&mut self, mapping: ScreenMapping) {
        if mapping != self.mapping {
            self.mapping = mapping;
            self.trail.clear();
        }
    }

    pub fn handle_event(&mut self, event: TrackingEvent) -> bool {
        match (self.state, event) {
            (RunState::Finished, _) => false,
            (_, TrackingEvent::TogglePause) => {
                self.state = self.state.toggled();
                log::debug!("trial {} {:?} at t={:.3}", self.trial, self.state, self.last_t);
                true
            }
            (_, TrackingEvent::ClearTrail) => {
                self.trail.clear();
                true
            }
            (_, TrackingEvent::Quit) => {
                self.state = RunState::Finished;
                true
            }
        }
    }

    /// Advances one frame. `cursor` is the pointer position in canvas pixels.
    pub fn update(&mut self, cursor: Option<(f64, f64)>) -> Option<&FrameSample> {
        if self.state.is_finished() {
            return None;
        }

        let wall_t = self.timer.elapsed_secs(self.start_ns);
        let t = if self.state.advances_time() {
            self.last_t = wall_t;
            wall_t
        } else {
            self.last_t
        };

        let sample = self.trajectory.sample(t);
        let target = self.mapping.to_screen(&sample);
        if self.mapping.wrap {
            self.trail.push_wrapped(target, self.mapping.width);
        } else {
            self.trail.push(target);
        }

        let frame = FrameSample {
            frame: self.frame,
            sample,
            target,
            target_units: self.mapping.displayed_units(&sample),
            cursor: cursor.map(|(x, y)| ScreenPoint::new(x as i32, y as i32)),
            cursor_units: cursor.map(|(x, y)| self.mapping.cursor_to_units(x, y)),
        };
        self.frame += 1;

        if wall_t > self.duration_s {
            self.state = RunState::Finished;
            self.completed = true;
        }

        self.current = Some(frame);
        self.current.as_ref()
    }

    /// Whether the frame just produced should be written to the log.
    pub fn should_log(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|f| f.frame % self.log_every as u64 == 0)
    }

    pub fn log_record(&self, participant: &Participant) -> Option<LogRecord> {
        let frame = self.current.as_ref()?;
        Some(LogRecord {
            clock: clock_now(),
            participant_id: participant.id.clone(),
            age: participant.age,
            trial: self.trial,
            time: frame.sample.time,
            target_x: frame.sample.forward,
            target_y: frame.sample.vertical,
            cursor_x: frame.cursor_units.map(|c| c.0),
            cursor_y: frame.cursor_units.map(|c| c.1),
        })
    }

    pub fn lookahead_dots(&self) -> Vec<LookaheadDot> {
        let t = self.current.as_ref().map_or(0.0, |f| f.sample.time);
        self.lookahead
            .dots(t, &self.trajectory, &self.mapping)
            .collect()
    }

    pub fn current_frame(&self) -> Option<&FrameSample> {
        self.current.as_ref()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn mapping(&self) -> &ScreenMapping {
        &self.mapping
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// True once the trial has run its full duration. A quit trial never completes.
    pub fn completed(&self) -> bool {
        self.completed
    }
}

/// Local wall-clock timestamp for log rows.
pub fn clock_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_timing::ManualTimer;
    use std::time::Duration;

    fn session(config: &TrackingConfig) -> TrackingSession<ManualTimer> {
        TrackingSession::new(config, config.mapping(), ManualTimer::new(), 0)
    }

    #[test]
    fn test_time_follows_clock_while_running() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        assert_eq!(s.update(None).unwrap().sample.time, 0.0);
        s.timer.advance(Duration::from_millis(1500));
        assert_eq!(s.update(None).unwrap().sample.time, 1.5);
    }

    #[test]
    fn test_pause_freezes_time() {
        let cfg = TrackingConfig {
            duration_s: 100.0,
            ..Default::default()
        };
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(1));
        s.update(None);
        assert!(s.handle_event(TrackingEvent::TogglePause));
        assert!(s.is_paused());

        s.timer.advance(Duration::from_secs(3));
        let frozen = s.update(None).unwrap().sample.time;
        assert_eq!(frozen, 1.0);
        s.timer.advance(Duration::from_secs(1));
        assert_eq!(s.update(None).unwrap().sample.time, 1.0);

        s.handle_event(TrackingEvent::TogglePause);
        assert_eq!(s.update(None).unwrap().sample.time, 5.0);
    }

    #[test]
    fn test_paused_frames_still_extend_trail() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        s.handle_event(TrackingEvent::TogglePause);
        s.update(None);
        s.update(None);
        assert_eq!(s.trail().len(), 2);
    }

    #[test]
    fn test_clear_trail() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        s.update(None);
        s.update(None);
        s.handle_event(TrackingEvent::ClearTrail);
        assert!(s.trail().is_empty());
    }

    #[test]
    fn test_quit_is_terminal() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        s.handle_event(TrackingEvent::Quit);
        assert!(s.is_finished());
        assert!(s.update(None).is_none());
        assert!(!s.handle_event(TrackingEvent::TogglePause));
    }

    #[test]
    fn test_finishes_after_duration() {
        let cfg = TrackingConfig {
            duration_s: 2.0,
            ..Default::default()
        };
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(2));
        s.update(None);
        assert!(!s.is_finished());
        s.timer.advance(Duration::from_millis(10));
        assert!(s.update(None).is_some());
        assert!(s.is_finished());
    }

    #[test]
    fn test_only_full_duration_counts_as_completed() {
        let cfg = TrackingConfig {
            duration_s: 2.0,
            ..Default::default()
        };
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(1));
        s.update(None);
        s.handle_event(TrackingEvent::Quit);
        assert!(s.is_finished());
        assert!(!s.completed());

        s.restart(1);
        s.timer.advance(Duration::from_secs(3));
        s.update(None);
        assert!(s.is_finished());
        assert!(s.completed());

        s.restart(2);
        assert!(!s.completed());
    }

    #[test]
    fn test_trail_capacity_respected() {
        let cfg = TrackingConfig {
            trail_capacity: 5,
            duration_s: 1e6,
            ..Default::default()
        };
        let mut s = session(&cfg);
        for _ in 0..50 {
            s.timer.advance(Duration::from_millis(33));
            s.update(None);
        }
        assert_eq!(s.trail().len(), 5);
    }

    #[test]
    fn test_log_record_contents() {
        let cfg = TrackingConfig::default();
        let mut s = TrackingSession::new(&cfg, cfg.mapping(), ManualTimer::new(), 2);
        s.timer.advance(Duration::from_secs(1));
        s.update(Some((120.0, 500.0)));
        let participant = Participant::new("P7", "Ada", 31);
        let rec = s.log_record(&participant).unwrap();
        assert_eq!(rec.participant_id, "P7");
        assert_eq!(rec.age, 31);
        assert_eq!(rec.trial, 2);
        assert_eq!(rec.time, 1.0);
        assert_eq!(rec.target_x, 1.0);
        assert_eq!(rec.cursor_x, Some(10.0));
        assert_eq!(rec.cursor_y, Some(0.0));
    }

    #[test]
    fn test_log_keeps_unwrapped_forward_and_upward_cursor_y() {
        let cfg = TrackingConfig {
            wrap: true,
            duration_s: 1000.0,
            ..Default::default()
        };
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(130));
        s.update(Some((0.0, 380.0)));
        assert!(s.current_frame().unwrap().target_units.0 < 125.0);

        let rec = s.log_record(&Participant::anonymous()).unwrap();
        assert_eq!(rec.target_x, 130.0);
        assert_eq!(rec.target_y, pursuit_core::vertical_offset(130.0));
        assert_eq!(rec.cursor_y, Some(10.0));
    }

    #[test]
    fn test_log_every_decimates() {
        let cfg = TrackingConfig {
            log_every: 3,
            ..Default::default()
        };
        let mut s = session(&cfg);
        let logged: Vec<bool> = (0..7)
            .map(|_| {
                s.update(None);
                s.should_log()
            })
            .collect();
        assert_eq!(logged, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_restart_resets_trial() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(10));
        s.update(None);
        assert!(s.is_finished());
        s.restart(1);
        assert_eq!(s.trial, 1);
        assert!(s.trail().is_empty());
        assert_eq!(s.update(None).unwrap().sample.time, 0.0);
    }

    #[test]
    fn test_resize_drops_trail() {
        let cfg = TrackingConfig::default();
        let mut s = session(&cfg);
        s.update(None);
        s.set_mapping(cfg.mapping());
        assert_eq!(s.trail().len(), 1);
        s.set_mapping(cfg.mapping_for(800, 600));
        assert!(s.trail().is_empty());
        assert_eq!(s.mapping().center_y(), 300.0);
    }

    #[test]
    fn test_lookahead_follows_current_time() {
        let cfg = TrackingConfig {
            lookahead_steps: 4,
            lookahead_s: 2.0,
            ..Default::default()
        };
        let mut s = session(&cfg);
        s.timer.advance(Duration::from_secs(1));
        s.update(None);
        let times: Vec<f64> = s.lookahead_dots().iter().map(|d| d.time).collect();
        assert_eq!(times, vec![1.5, 2.0, 2.5, 3.0]);
    }
}
