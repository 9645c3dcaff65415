pub mod config;
pub mod headless;
pub mod intake;
pub mod manifest;
pub mod session;
pub mod tracking_log;

pub use config::TrackingConfig;
pub use headless::{headless_record, HeadlessSampler};
pub use intake::{IntakeField, IntakeForm};
pub use manifest::SessionManifest;
pub use session::{FrameSample, TrackingSession};
pub use tracking_log::TrackingLog;
