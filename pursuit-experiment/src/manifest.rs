use super::config::TrackingConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use pursuit_core::Participant;
use pursuit_timing::FrameStatistics;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub frames: usize,
    pub effective_fps: f64,
    pub average_frame_ms: f64,
    pub jitter_ms: f64,
}

impl From<&FrameStatistics> for FrameSummary {
    fn from(stats: &FrameStatistics) -> Self {
        Self {
            frames: stats.frame_count,
            effective_fps: stats.effective_fps,
            average_frame_ms: stats.average_frame_time_ns / 1e6,
            jitter_ms: stats.jitter_ns / 1e6,
        }
    }
}

/// Sidecar describing one session: who, with which settings, and how it went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub participant: Participant,
    pub config: TrackingConfig,
    pub mode: String,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub trials_completed: usize,
    pub rows_logged: usize,
    pub frames: Option<FrameSummary>,
}

impl SessionManifest {
    pub fn new(participant: Participant, config: TrackingConfig, mode: &str) -> Self {
        Self {
            participant,
            config,
            mode: mode.to_string(),
            started_at: Local::now(),
            finished_at: None,
            trials_completed: 0,
            rows_logged: 0,
            frames: None,
        }
    }

    /// `data.csv` → `data.session.json`
    pub fn path_for(csv_path: &Path) -> PathBuf {
        csv_path.with_extension("session.json")
    }

    pub fn finish(&mut self, trials_completed: usize, rows_logged: usize, stats: &FrameStatistics) {
        self.finished_at = Some(Local::now());
        self.trials_completed = trials_completed;
        self.rows_logged = rows_logged;
        self.frames = (stats.frame_count > 0).then(|| FrameSummary::from(stats));
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self).context("failed to write session manifest")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_csv() {
        assert_eq!(
            SessionManifest::path_for(Path::new("out/tracking_data.csv")),
            PathBuf::from("out/tracking_data.session.json")
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.session.json");
        let participant = Participant::new("P2", "Kim", 40);
        let mut manifest = SessionManifest::new(participant, TrackingConfig::default(), "gui");
        manifest.finish(3, 450, &FrameStatistics::default());
        manifest.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: SessionManifest = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.participant.id, "P2");
        assert_eq!(loaded.trials_completed, 3);
        assert_eq!(loaded.rows_logged, 450);
        assert!(loaded.frames.is_none());
        assert_eq!(loaded.config, TrackingConfig::default());
    }
}
