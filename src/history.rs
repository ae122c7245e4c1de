//! Launch history
//!
//! Owned by whoever launches mini-games and passed in by reference, so the
//! "when was a game last launched" question has no hidden global behind it.
//! Also keeps the latest session reports.

use serde::{Deserialize, Serialize};

use crate::session::SessionReport;

/// Maximum number of launches to keep
pub const MAX_LAUNCHES: usize = 10;
/// Maximum number of session reports to keep
pub const MAX_RESULTS: usize = 10;

/// A single launch entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEntry {
    pub game_id: String,
    /// Caller's wall time (seconds) at launch
    pub timestamp: f64,
}

/// Most recent launches and results, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchHistory {
    pub entries: Vec<LaunchEntry>,
    #[serde(default)]
    pub results: Vec<SessionReport>,
}

impl LaunchHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn record_launch(&mut self, game_id: &str, timestamp: f64) {
        self.entries.insert(
            0,
            LaunchEntry {
                game_id: game_id.to_string(),
                timestamp,
            },
        );
        self.entries.truncate(MAX_LAUNCHES);
    }

    pub fn record_result(&mut self, report: SessionReport) {
        self.results.insert(0, report);
        self.results.truncate(MAX_RESULTS);
    }

    pub fn last_result(&self) -> Option<&SessionReport> {
        self.results.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the latest launch of any game
    pub fn last_launched(&self) -> Option<f64> {
        self.entries.first().map(|e| e.timestamp)
    }

    /// Time of the latest launch of `game_id`
    pub fn last_launched_game(&self, game_id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.game_id == game_id)
            .map(|e| e.timestamp)
    }

    /// Whether enough time has passed to offer another mini-game
    pub fn can_offer(&self, now: f64, cooldown: f64) -> bool {
        self.last_launched()
            .map(|t| now - t >= cooldown)
            .unwrap_or(true)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| "{\"entries\":[],\"results\":[]}".to_string())
    }

    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("No usable launch history ({}), starting fresh", e);
            Self::new()
        })
    }
}
