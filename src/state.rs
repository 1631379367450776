use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a batch stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Initial state, items are being buffered
    Accepting,
    /// End-of-input was signalled and the transformation is running
    Transforming,
    /// Results were emitted and completion was signalled
    Completed,
    /// The stage failed; no further items are accepted
    Failed,
}

impl StageState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the stage still takes input
    pub fn is_accepting(&self) -> bool {
        matches!(self, Self::Accepting)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepting => write!(f, "accepting"),
            Self::Transforming => write!(f, "transforming"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for StageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepting" => Ok(Self::Accepting),
            "transforming" => Ok(Self::Transforming),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid stage state: {s}")),
        }
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::Accepting
    }
}

/// Lifecycle signals that drive a stage between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// An upstream item arrived
    Accept,
    /// A stream-backed item arrived while content streams are disabled
    Reject,
    /// Upstream signalled end-of-input
    EndOfInput,
    /// The transformation produced a result
    Resolve,
    /// The transformation failed
    Fail,
}

impl StageEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::EndOfInput => "end_of_input",
            Self::Resolve => "resolve",
            Self::Fail => "fail",
        }
    }

    /// Determine the state this event leads to from `current`, if allowed
    pub fn target_state(&self, current: StageState) -> Option<StageState> {
        match (current, self) {
            (StageState::Accepting, Self::Accept) => Some(StageState::Accepting),
            (StageState::Accepting, Self::Reject) => Some(StageState::Failed),
            (StageState::Accepting, Self::EndOfInput) => Some(StageState::Transforming),
            (StageState::Transforming, Self::Resolve) => Some(StageState::Completed),
            (StageState::Transforming, Self::Fail) => Some(StageState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for StageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
