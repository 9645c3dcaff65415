/// Tracking loop states. `Finished` is terminal.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Running,
    Paused,
    Finished,
}

impl RunState {
    /// Whether the loop should advance time from the clock.
    pub fn advances_time(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Running and Paused swap; Finished stays put.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
            Self::Finished => Self::Finished,
        }
    }
}

/// Input the tracking loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    TogglePause,
    ClearTrail,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(RunState::Running.toggled(), RunState::Paused);
        assert_eq!(RunState::Paused.toggled(), RunState::Running);
        assert_eq!(RunState::Finished.toggled(), RunState::Finished);
    }

    #[test]
    fn test_only_running_advances() {
        assert!(RunState::Running.advances_time());
        assert!(!RunState::Paused.advances_time());
        assert!(!RunState::Finished.advances_time());
    }
}
