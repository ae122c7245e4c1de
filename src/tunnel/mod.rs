//! Word tunnel: lane generation, word spawning, difficulty and the game
//! variant that plugs them into the session

pub mod difficulty;
pub mod game;
pub mod generator;
pub mod scroll;
pub mod spawn;

pub use difficulty::{DifficultyController, DifficultyState};
pub use game::{FIRST_COMPLETION_KEY, TunnelAction, TunnelGame, TunnelInput};
pub use generator::{TunnelColumn, TunnelGenerator, TunnelGeometry};
pub use scroll::Scroll;
pub use spawn::{ActiveWord, SpawnRules, SpawnScheduler, SpawnableWord, WordPools, normalize_word};
