//! Session outcomes handed to the reporting collaborator

use serde::{Deserialize, Serialize};

/// Why a session ended. Discriminants match the telemetry codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionReason {
    /// Quit before the abort threshold
    AbortedUnderThreshold = -3,
    /// Restarted after the abort threshold
    RestartedOverThreshold = -2,
    /// Quit after the abort threshold
    AbortedOverThreshold = -1,
    Failure = 0,
    Success = 1,
}

impl CompletionReason {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == CompletionReason::Success
    }

    /// Classify an abort by how long the session ran
    pub fn aborted(elapsed: f64, threshold: f64) -> Self {
        if elapsed < threshold {
            CompletionReason::AbortedUnderThreshold
        } else {
            CompletionReason::AbortedOverThreshold
        }
    }
}

/// Immutable record of one finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub score: u32,
    pub errors: u32,
    pub was_successful: bool,
    /// Active play time in seconds (pauses excluded)
    pub elapsed: f64,
    pub reason: CompletionReason,
}

/// Result plus the metadata the reporter needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub game_id: String,
    pub complexity: i32,
    pub result: SessionResult,
}
