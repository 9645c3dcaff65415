use anyhow::Result;
use pursuit_core::Participant;
use pursuit_experiment::{headless_record, HeadlessSampler, TrackingConfig, TrackingLog};
use pursuit_timing::{FrameStatistics, HighPrecisionTimer, ManualTimer, Timer};
use std::io::Write;

pub struct HeadlessOutcome {
    pub trials: usize,
    pub samples: usize,
    pub stats: FrameStatistics,
}

impl HeadlessOutcome {
    pub fn summary(&self) -> String {
        format!("Sampled {} points over {} trials", self.samples, self.trials)
    }

    pub fn report(&self) {
        println!("{}", self.summary());
    }
}

/// Runs every configured trial without a window, logging target positions only.
pub fn run<W: Write>(
    config: &TrackingConfig,
    participant: &Participant,
    log: &mut TrackingLog<W>,
    simulated_clock: bool,
) -> Result<HeadlessOutcome> {
    println!(
        "Headless mode: running for {}s at {} Hz (speed={} units/s)",
        config.duration_s, config.fps, config.speed
    );
    if simulated_clock {
        run_with(config, participant, log, ManualTimer::new())
    } else {
        run_with(config, participant, log, HighPrecisionTimer::new())
    }
}

fn run_with<T, W>(
    config: &TrackingConfig,
    participant: &Participant,
    log: &mut TrackingLog<W>,
    timer: T,
) -> Result<HeadlessOutcome>
where
    T: Timer<Timestamp = u64>,
    W: Write,
{
    let mut sampler = HeadlessSampler::new(config, timer);
    let log_every = config.log_every.max(1);
    let mut total = 0;

    for trial in 0..config.num_runs {
        let mut index = 0usize;
        let samples = sampler.run(|sample| {
            if index % log_every == 0 {
                log.append(&headless_record(participant, trial, sample))?;
            }
            index += 1;
            Ok(())
        })?;
        log::info!("trial {}: {} samples", trial, samples.len());
        total += samples.len();
    }

    Ok(HeadlessOutcome {
        trials: config.num_runs,
        samples: total,
        stats: sampler.timer.frame_stats(),
    })
}
