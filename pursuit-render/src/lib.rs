pub mod capture;
pub mod render;
pub mod text;

pub use capture::{VideoEncoder, VideoRecorder};
pub use render::{FormField, FrameStats, SkiaRenderer, TrackingScene};
pub use text::load_font;
