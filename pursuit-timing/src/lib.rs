pub mod pacer;
pub mod timer;

pub use pacer::FramePacer;
pub use timer::{FrameStatistics, HighPrecisionTimer, ManualTimer, Timer};
