use serde::{Deserialize, Serialize};

/// Column order of the tracking log.
pub const LOG_HEADER: [&str; 9] = [
    "clock",
    "participant_id",
    "age",
    "trial",
    "time",
    "target_x",
    "target_y",
    "cursor_x",
    "cursor_y",
];

/// Participant details, entered once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub age: u32,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "", 0)
    }
}

/// One row of the tracking log. Field order matches `LOG_HEADER`.
///
/// Cursor columns are empty when no pointer was sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub clock: String,
    pub participant_id: String,
    pub age: u32,
    pub trial: usize,
    pub time: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub cursor_x: Option<f64>,
    pub cursor_y: Option<f64>,
}
