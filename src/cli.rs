use pursuit_core::{Participant, DEFAULT_TRAIL_CAPACITY};
use pursuit_experiment::TrackingConfig;
use std::path::PathBuf;

/// Moving-target pursuit tracking.
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, allow_negative_numbers = true)]
pub struct Arguments {
    /// Sample the trajectory without opening a window
    #[arg(long)]
    pub headless: bool,

    /// Seconds per trial
    #[arg(long, default_value_t = 5.0)]
    pub duration: f64,

    /// Frame rate for the window, sample rate when headless
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Pixels per unit on both axes
    #[arg(long, default_value_t = 12.0)]
    pub pixels_per_unit: f64,

    /// Forward speed in units per second
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Wrap the horizontal position when it leaves the window
    #[arg(long)]
    pub wrap: bool,

    /// Preview horizon in seconds
    #[arg(long, default_value_t = 2.0)]
    pub lookahead: f64,

    /// Number of preview dots
    #[arg(long, default_value_t = 20)]
    pub lookahead_steps: usize,

    /// CSV log path
    #[arg(long, default_value = "tracking_data.csv")]
    pub out: PathBuf,

    /// Record each trial to this video file
    #[arg(long)]
    pub save_video: Option<PathBuf>,

    #[arg(long, alias = "num_runs", default_value_t = 3)]
    pub num_runs: usize,

    #[arg(long, default_value_t = 1500)]
    pub width: u32,

    #[arg(long, default_value_t = 1000)]
    pub height: u32,

    /// Borderless fullscreen on the primary monitor
    #[arg(long)]
    pub fullscreen: bool,

    #[arg(long, default_value_t = DEFAULT_TRAIL_CAPACITY)]
    pub trail_capacity: usize,

    /// Write one log row every N frames
    #[arg(long, default_value_t = 1)]
    pub log_every: usize,

    #[arg(long)]
    pub participant_id: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub age: Option<u32>,

    /// TrueType font for on-screen text; system fonts are searched otherwise
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Headless only: advance a simulated clock instead of sleeping
    #[arg(long)]
    pub simulated_clock: bool,
}

impl Arguments {
    pub fn config(&self) -> TrackingConfig {
        TrackingConfig {
            duration_s: self.duration,
            fps: self.fps,
            pixels_per_unit: self.pixels_per_unit,
            speed: self.speed,
            wrap: self.wrap,
            lookahead_s: self.lookahead,
            lookahead_steps: self.lookahead_steps,
            trail_capacity: self.trail_capacity,
            num_runs: self.num_runs,
            width: self.width,
            height: self.height,
            log_every: self.log_every,
            out_csv: self.out.clone(),
            save_video: self.save_video.clone(),
        }
    }

    /// The participant given on the command line, if every field was supplied.
    pub fn participant(&self) -> Option<Participant> {
        match (&self.participant_id, &self.name, self.age) {
            (Some(id), Some(name), Some(age)) if !id.is_empty() && !name.is_empty() => {
                Some(Participant::new(id.as_str(), name.as_str(), age))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    fn parse(args: &[&str]) -> Arguments {
        Arguments::try_parse_from(std::iter::once("pursuit-tracker").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        assert_eq!(parse(&[]).config(), TrackingConfig::default());
    }

    #[test]
    fn test_flags_reach_config() {
        let cfg = parse(&[
            "--duration", "2", "--fps", "10", "--wrap", "--speed", "-3.5", "--num_runs", "1",
            "--save-video", "out/run.mp4",
        ])
        .config();
        assert_eq!(cfg.duration_s, 2.0);
        assert_eq!(cfg.fps, 10);
        assert!(cfg.wrap);
        assert_eq!(cfg.speed, -3.5);
        assert_eq!(cfg.num_runs, 1);
        assert_eq!(cfg.save_video, Some(PathBuf::from("out/run.mp4")));
    }

    #[test]
    fn test_participant_requires_all_fields() {
        assert!(parse(&["--participant-id", "P1", "--name", "Ada"]).participant().is_none());
        let p = parse(&["--participant-id", "P1", "--name", "Ada", "--age", "30"])
            .participant()
            .unwrap();
        assert_eq!(p, Participant::new("P1", "Ada", 30));
    }

    #[test]
    fn test_rejects_non_numeric_age() {
        let res = Arguments::try_parse_from(["pursuit-tracker", "--age", "thirty"]);
        assert!(res.is_err());
    }
}
