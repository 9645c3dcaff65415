pub mod lookahead;
pub mod mapping;
pub mod phase;
pub mod record;
pub mod trail;
pub mod trajectory;

pub use lookahead::{Lookahead, LookaheadDot};
pub use mapping::{ScreenMapping, ScreenPoint};
pub use phase::{RunState, TrackingEvent};
pub use record::{LogRecord, Participant, LOG_HEADER};
pub use trail::{Trail, DEFAULT_TRAIL_CAPACITY, MAX_TRAIL_CAPACITY};
pub use trajectory::{vertical_bound, vertical_offset, Trajectory, TrajectorySample};
