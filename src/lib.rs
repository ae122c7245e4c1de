//! Word Tunnel - session core of an "eat the correct word" mini-game
//!
//! Core modules:
//! - `session`: Generic mini-game lifecycle (phases, clock, score, reporting)
//! - `tunnel`: Lane generation, word spawning and streak-driven difficulty
//! - `host`: Narrow interfaces to vocabulary, progression, reporting and navigation
//! - `persistence`: Key/value markers kept between sessions
//! - `settings`: Data-driven tuning loaded from JSON

pub mod audio;
pub mod error;
pub mod history;
pub mod host;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod tunnel;

pub use error::{ConfigError, ConfigResult};
pub use history::LaunchHistory;
pub use session::{SessionOrchestrator, SessionPhase, SessionReport};
pub use settings::{GameConfig, Pace};
pub use tunnel::{TunnelGame, TunnelInput};

/// Runtime constants
pub mod consts {
    /// Fixed session timestep (60 Hz)
    pub const FRAME_DT: f64 = 1.0 / 60.0;
    /// Maximum steps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Seconds between offering mini-games
    pub const OFFER_COOLDOWN: f64 = 300.0;
}
