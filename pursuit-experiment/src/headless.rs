use super::config::TrackingConfig;
use super::session::clock_now;
use anyhow::Result;
use pursuit_core::{LogRecord, Participant, Trajectory, TrajectorySample};
use pursuit_timing::Timer;

/// Samples the trajectory at the configured rate without a window.
pub struct HeadlessSampler<T>
where
    T: Timer<Timestamp = u64>,
{
    pub timer: T,
    trajectory: Trajectory,
    duration_s: f64,
    interval: std::time::Duration,
}

impl<T> HeadlessSampler<T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(config: &TrackingConfig, timer: T) -> Self {
        Self {
            timer,
            trajectory: config.trajectory(),
            duration_s: config.duration_s,
            interval: config.frame_interval(),
        }
    }

    /// Runs one trial, handing each sample to `sink` as it is taken.
    pub fn run<F>(&mut self, mut sink: F) -> Result<Vec<TrajectorySample>>
    where
        F: FnMut(&TrajectorySample) -> Result<()>,
    {
        let start = self.timer.now();
        let mut samples = Vec::new();
        let mut t = 0.0;
        let mut last_tick = start;

        while t < self.duration_s {
            let sample = self.trajectory.sample(t);
            sink(&sample)?;
            samples.push(sample);

            self.timer.sleep(self.interval);
            let now = self.timer.now();
            self.timer
                .record_frame(std::time::Duration::from_nanos(now.saturating_sub(last_tick)));
            last_tick = now;
            t = self.timer.elapsed_secs(start);
        }

        log::debug!("headless trial produced {} samples", samples.len());
        Ok(samples)
    }
}

/// Builds a log row for a headless sample; cursor columns stay empty.
pub fn headless_record(
    participant: &Participant,
    trial: usize,
    sample: &TrajectorySample,
) -> LogRecord {
    LogRecord {
        clock: clock_now(),
        participant_id: participant.id.clone(),
        age: participant.age,
        trial,
        time: sample.time,
        target_x: sample.forward,
        target_y: sample.vertical,
        cursor_x: None,
        cursor_y: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_timing::{ManualTimer, Timer as _};

    fn config(duration_s: f64, fps: u32) -> TrackingConfig {
        TrackingConfig {
            duration_s,
            fps,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_seconds_at_ten_hz() {
        let mut sampler = HeadlessSampler::new(&config(2.0, 10), ManualTimer::new());
        let samples = sampler.run(|_| Ok(())).unwrap();
        assert_eq!(samples.len(), 20);
        assert!(samples.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(samples[0].time, 0.0);
    }

    #[test]
    fn test_zero_duration_yields_nothing() {
        let mut sampler = HeadlessSampler::new(&config(0.0, 10), ManualTimer::new());
        assert!(sampler.run(|_| Ok(())).unwrap().is_empty());
    }

    #[test]
    fn test_sink_sees_every_sample() {
        let mut sampler = HeadlessSampler::new(&config(1.0, 20), ManualTimer::new());
        let mut seen = 0;
        let samples = sampler
            .run(|_| {
                seen += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, samples.len());
    }

    #[test]
    fn test_sink_error_stops_run() {
        let mut sampler = HeadlessSampler::new(&config(1.0, 20), ManualTimer::new());
        let err = sampler.run(|_| anyhow::bail!("disk full"));
        assert!(err.is_err());
    }

    #[test]
    fn test_frame_stats_match_rate() {
        let mut sampler = HeadlessSampler::new(&config(1.0, 20), ManualTimer::new());
        sampler.run(|_| Ok(())).unwrap();
        let stats = sampler.timer.frame_stats();
        assert!((stats.effective_fps - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_headless_log_record_has_no_cursor() {
        let rec = headless_record(
            &Participant::anonymous(),
            1,
            &Trajectory::new(1.0).sample(0.25),
        );
        assert_eq!(rec.trial, 1);
        assert_eq!(rec.cursor_x, None);
        assert_eq!(rec.target_x, 0.25);
    }

    #[test]
    fn test_real_clock_sample_count() {
        let mut sampler = HeadlessSampler::new(
            &config(0.5, 20),
            pursuit_timing::HighPrecisionTimer::new(),
        );
        let n = sampler.run(|_| Ok(())).unwrap().len();
        assert!((8..=11).contains(&n), "got {} samples", n);
    }
}
