use anyhow::{bail, Result};
use pursuit_core::{
    Lookahead, ScreenMapping, Trajectory, DEFAULT_TRAIL_CAPACITY, MAX_TRAIL_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Seconds per trial.
    pub duration_s: f64,
    pub fps: u32,
    pub pixels_per_unit: f64,
    /// Forward speed in units per second.
    pub speed: f64,
    pub wrap: bool,
    pub lookahead_s: f64,
    pub lookahead_steps: usize,
    pub trail_capacity: usize,
    pub num_runs: usize,
    pub width: u32,
    pub height: u32,
    /// Write one log row every `log_every` frames.
    pub log_every: usize,
    pub out_csv: PathBuf,
    pub save_video: Option<PathBuf>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            duration_s: 5.0,
            fps: 30,
            pixels_per_unit: 12.0,
            speed: 1.0,
            wrap: false,
            lookahead_s: 2.0,
            lookahead_steps: 20,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            num_runs: 3,
            width: 1500,
            height: 1000,
            log_every: 1,
            out_csv: PathBuf::from("tracking_data.csv"),
            save_video: None,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            bail!("fps must be at least 1");
        }
        if !(self.pixels_per_unit > 0.0) {
            bail!("pixels per unit must be positive, got {}", self.pixels_per_unit);
        }
        if !(self.duration_s >= 0.0) {
            bail!("duration must be non-negative, got {}", self.duration_s);
        }
        if !(self.lookahead_s >= 0.0) {
            bail!("lookahead must be non-negative, got {}", self.lookahead_s);
        }
        if self.width == 0 || self.height == 0 {
            bail!("screen size must be non-zero, got {}x{}", self.width, self.height);
        }
        if self.log_every == 0 {
            bail!("log interval must be at least 1 frame");
        }
        if self.trail_capacity > MAX_TRAIL_CAPACITY {
            bail!(
                "trail capacity must be at most {}, got {}",
                MAX_TRAIL_CAPACITY,
                self.trail_capacity
            );
        }
        Ok(())
    }

    pub fn trajectory(&self) -> Trajectory {
        Trajectory::new(self.speed)
    }

    pub fn lookahead(&self) -> Lookahead {
        Lookahead::new(self.lookahead_s, self.lookahead_steps)
    }

    pub fn mapping(&self) -> ScreenMapping {
        self.mapping_for(self.width, self.height)
    }

    /// Mapping for the actual canvas, which may differ from the requested size.
    pub fn mapping_for(&self, width: u32, height: u32) -> ScreenMapping {
        ScreenMapping::new(width, height, self.pixels_per_unit, self.wrap)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    /// Video path for one trial; suffixed with the trial index when several runs share a path.
    pub fn video_path_for_trial(&self, trial: usize) -> Option<PathBuf> {
        let path = self.save_video.as_ref()?;
        if self.num_runs <= 1 {
            return Some(path.clone());
        }
        Some(with_stem_suffix(path, &format!("_trial{}", trial)))
    }
}

pub(crate) fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        TrackingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            TrackingConfig {
                fps: 0,
                ..Default::default()
            },
            TrackingConfig {
                pixels_per_unit: 0.0,
                ..Default::default()
            },
            TrackingConfig {
                pixels_per_unit: f64::NAN,
                ..Default::default()
            },
            TrackingConfig {
                duration_s: -1.0,
                ..Default::default()
            },
            TrackingConfig {
                width: 0,
                ..Default::default()
            },
            TrackingConfig {
                log_every: 0,
                ..Default::default()
            },
            TrackingConfig {
                trail_capacity: usize::MAX,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?} should be rejected", cfg);
        }
    }

    #[test]
    fn test_video_path_per_trial() {
        let cfg = TrackingConfig {
            save_video: Some(PathBuf::from("out/run.mp4")),
            num_runs: 3,
            ..Default::default()
        };
        assert_eq!(
            cfg.video_path_for_trial(1),
            Some(PathBuf::from("out/run_trial1.mp4"))
        );

        let single = TrackingConfig {
            num_runs: 1,
            ..cfg
        };
        assert_eq!(
            single.video_path_for_trial(0),
            Some(PathBuf::from("out/run.mp4"))
        );
    }

    #[test]
    fn test_no_video_by_default() {
        assert_eq!(TrackingConfig::default().video_path_for_trial(0), None);
    }
}
