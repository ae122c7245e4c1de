//! Score counters, success streak and the reward ladder

use serde::{Deserialize, Serialize};

/// Default success ratio: one error is cancelled by two successes
pub const DEFAULT_SUCCESS_RATIO: u32 = 2;

/// Score / error counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    score: u32,
    errors: u32,
    streak: u32,
    /// Set once the session starts completing; counters stop moving
    frozen: bool,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Consecutive successes since the last error or streak reset
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn record_success(&mut self) {
        if self.frozen {
            return;
        }
        self.score += 1;
        self.streak += 1;
    }

    pub fn record_error(&mut self) {
        if self.frozen {
            return;
        }
        self.errors += 1;
        self.streak = 0;
    }

    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// `score >= errors * ratio`
    pub fn meets_ratio(&self, ratio: u32) -> bool {
        self.score as u64 >= self.errors as u64 * ratio as u64
    }

    pub fn is_successful(&self) -> bool {
        self.meets_ratio(DEFAULT_SUCCESS_RATIO)
    }
}

/// Fixed number of reward slots; filling the last one completes the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardLadder {
    capacity: usize,
    filled: usize,
}

impl RewardLadder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled >= self.capacity
    }

    /// Fill the next slot. Returns the slot index, or None when already full.
    pub fn fill(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.filled += 1;
        Some(self.filled - 1)
    }

    /// Remove the most recently filled slot, returning its index
    pub fn drop_last(&mut self) -> Option<usize> {
        if self.filled == 0 {
            return None;
        }
        self.filled -= 1;
        Some(self.filled)
    }

    pub fn clear(&mut self) {
        self.filled = 0;
    }
}
