//! Session and game configuration
//!
//! Settings are tuning values that ship with the game; params are what the
//! launcher passes for one particular session. Both load from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;

/// Pace presets for the tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pace {
    Relaxed,
    #[default]
    Normal,
    Brisk,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Relaxed => "Relaxed",
            Pace::Normal => "Normal",
            Pace::Brisk => "Brisk",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "slow" => Some(Pace::Relaxed),
            "normal" => Some(Pace::Normal),
            "brisk" | "fast" => Some(Pace::Brisk),
            _ => None,
        }
    }

    /// Base scroll speed in pixels per second
    pub fn tunnel_speed(&self) -> f32 {
        match self {
            Pace::Relaxed => 150.0,
            Pace::Normal => 200.0,
            Pace::Brisk => 260.0,
        }
    }

    /// Chance that a spawned word is eatable
    pub fn eatable_chance(&self) -> f32 {
        match self {
            Pace::Relaxed => 0.5,
            Pace::Normal => 0.4,
            Pace::Brisk => 0.35,
        }
    }
}

/// Lifecycle tuning shared by every mini-game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Show the countdown display while timed
    pub show_timer: bool,
    /// Finish with a close button (otherwise quit automatically)
    pub show_close_button: bool,
    /// Delay before the close button / automatic quit
    pub end_game_delay: f64,
    pub show_fireworks_on_complete: bool,
    /// Sessions shorter than this are "under threshold" when aborted
    pub abort_threshold: f64,
    /// Screens to go back when leaving
    pub return_steps_back: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            show_timer: false,
            show_close_button: true,
            end_game_delay: 0.0,
            show_fireworks_on_complete: true,
            abort_threshold: 10.0,
            return_steps_back: 1,
        }
    }
}

/// Launcher-provided parameters for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    pub game_id: String,
    pub complexity: i32,
    /// Seconds; negative for untimed
    pub time_limit: f64,
    pub end_game_on_timeout: bool,
    /// RNG seed for content generation
    pub seed: u64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            game_id: "tunnel".to_string(),
            complexity: 0,
            time_limit: -1.0,
            end_game_on_timeout: false,
            seed: 0x5EED,
        }
    }
}

/// Tunnel geometry, spawning and difficulty tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSettings {
    // === Geometry ===
    pub view_width: f32,
    pub view_height: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub tunnel_scale: f32,
    /// Open rows on each side of the lane center
    pub half_width: u32,
    /// Rows kept between the lane and the outer bounds
    pub wall_margin: u32,
    /// Vertical padding (pixels) between a spawned word and the walls
    pub spawn_padding: f32,
    pub player_size: f32,

    // === Spawning ===
    pub eatable_chance: f32,
    /// Pixels scrolled between spawns
    pub word_spawn_distance: f32,
    /// Relative jitter on the spawn distance
    pub word_spawn_jitter: f32,
    pub max_eatable_in_a_row: u32,
    pub max_not_eatable_in_a_row: u32,
    /// Words this far (pixels) behind the window are dropped
    pub garbage_margin: f32,

    // === Difficulty ===
    pub streak_threshold: u32,
    pub speed_factor: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Seconds for the scroll to reach full speed (or stop)
    pub acceleration_time: f32,

    // === Flow ===
    pub reward_slots: usize,
    pub intro_delay: f64,
    pub crash_recovery_delay: f64,
    pub finish_delay: f64,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            view_width: 1920.0,
            view_height: 1080.0,
            tile_width: 100.0,
            tile_height: 100.0,
            tunnel_scale: 1.0,
            half_width: 2,
            wall_margin: 2,
            spawn_padding: 50.0,
            player_size: 100.0,

            eatable_chance: 0.4,
            word_spawn_distance: 700.0,
            word_spawn_jitter: 0.3,
            max_eatable_in_a_row: 1,
            max_not_eatable_in_a_row: 3,
            garbage_margin: 200.0,

            streak_threshold: 3,
            speed_factor: 1.1,
            min_speed: 50.0,
            max_speed: 800.0,
            acceleration_time: 0.5,

            reward_slots: 5,
            intro_delay: 0.5,
            crash_recovery_delay: 1.0,
            finish_delay: 5.0,
        }
    }
}

impl TunnelSettings {
    pub fn from_pace(pace: Pace) -> Self {
        let mut settings = Self::default();
        settings.eatable_chance = pace.eatable_chance();
        settings
    }

    /// Copy with every out-of-range value pulled back into range
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let mut s = self.clone();

        fn positive(name: &str, value: &mut f32, fallback: f32) {
            if !(*value > 0.0) {
                log::warn!("{} must be positive (got {}), using {}", name, value, fallback);
                *value = fallback;
            }
        }

        positive("view_width", &mut s.view_width, d.view_width);
        positive("view_height", &mut s.view_height, d.view_height);
        positive("tile_width", &mut s.tile_width, d.tile_width);
        positive("tile_height", &mut s.tile_height, d.tile_height);
        positive("tunnel_scale", &mut s.tunnel_scale, d.tunnel_scale);
        positive("word_spawn_distance", &mut s.word_spawn_distance, d.word_spawn_distance);
        positive("min_speed", &mut s.min_speed, d.min_speed);
        positive("acceleration_time", &mut s.acceleration_time, d.acceleration_time);

        if !(0.0..=1.0).contains(&s.eatable_chance) {
            let clamped = if s.eatable_chance.is_nan() {
                d.eatable_chance
            } else {
                s.eatable_chance.clamp(0.0, 1.0)
            };
            log::warn!("eatable_chance {} out of [0, 1], using {}", s.eatable_chance, clamped);
            s.eatable_chance = clamped;
        }
        if !(0.0..1.0).contains(&s.word_spawn_jitter) {
            log::warn!(
                "word_spawn_jitter {} out of [0, 1), using {}",
                s.word_spawn_jitter,
                d.word_spawn_jitter
            );
            s.word_spawn_jitter = d.word_spawn_jitter;
        }
        if s.spawn_padding < 0.0 {
            s.spawn_padding = 0.0;
        }
        if s.garbage_margin < 0.0 {
            s.garbage_margin = 0.0;
        }
        if s.max_speed < s.min_speed {
            log::warn!("max_speed {} below min_speed {}, raising", s.max_speed, s.min_speed);
            s.max_speed = s.min_speed;
        }
        if !(s.speed_factor > 1.0) {
            log::warn!("speed_factor {} must exceed 1, using {}", s.speed_factor, d.speed_factor);
            s.speed_factor = d.speed_factor;
        }
        s.max_eatable_in_a_row = s.max_eatable_in_a_row.max(1);
        s.max_not_eatable_in_a_row = s.max_not_eatable_in_a_row.max(1);
        s.streak_threshold = s.streak_threshold.max(1);
        s.reward_slots = s.reward_slots.max(1);
        s.intro_delay = s.intro_delay.max(0.0);
        s.crash_recovery_delay = s.crash_recovery_delay.max(0.0);
        s.finish_delay = s.finish_delay.max(0.0);
        s
    }
}

/// Launcher-provided parameters specific to the tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelParams {
    /// Starting scroll speed in pixels per second
    pub tunnel_speed: f32,
    /// Vocabulary level; 0 selects the short beginner words
    pub word_complexity: i32,
    pub colorized_syllables: bool,
    pub capitalized: bool,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            tunnel_speed: Pace::Normal.tunnel_speed(),
            word_complexity: 0,
            colorized_syllables: false,
            capitalized: true,
        }
    }
}

impl TunnelParams {
    pub fn from_pace(pace: Pace) -> Self {
        Self {
            tunnel_speed: pace.tunnel_speed(),
            ..Self::default()
        }
    }
}

/// Everything needed to run a tunnel session, as one JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub session: SessionSettings,
    pub params: SessionParams,
    pub tunnel: TunnelSettings,
    pub tunnel_params: TunnelParams,
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json_str(
            r#"{ "params": { "time_limit": 30.0, "end_game_on_timeout": true } }"#,
        )
        .unwrap();
        assert_eq!(config.params.time_limit, 30.0);
        assert!(config.params.end_game_on_timeout);
        assert_eq!(config.tunnel.reward_slots, 5);
        assert_eq!(config.session.abort_threshold, 10.0);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = GameConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_sanitize_clamps() {
        let settings = TunnelSettings {
            eatable_chance: 1.7,
            word_spawn_jitter: 2.0,
            max_eatable_in_a_row: 0,
            tile_width: 0.0,
            speed_factor: 0.9,
            min_speed: 100.0,
            max_speed: 10.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.eatable_chance, 1.0);
        assert_eq!(settings.word_spawn_jitter, 0.3);
        assert_eq!(settings.max_eatable_in_a_row, 1);
        assert_eq!(settings.tile_width, 100.0);
        assert_eq!(settings.speed_factor, 1.1);
        assert_eq!(settings.max_speed, 100.0);
    }

    #[test]
    fn test_pace_roundtrip() {
        for pace in [Pace::Relaxed, Pace::Normal, Pace::Brisk] {
            assert_eq!(Pace::from_str(pace.as_str()), Some(pace));
        }
        assert_eq!(Pace::from_str("warp"), None);
        assert_eq!(TunnelParams::from_pace(Pace::Brisk).tunnel_speed, 260.0);
    }
}
