//! Streak-driven speed
//!
//! Every `streak_threshold` correct picks in a row multiply the speed by
//! `factor` and reset the streak. Errors and crashes divide by the same
//! factor. The speed stays within `[min, max]`.

use serde::{Deserialize, Serialize};

use crate::session::ScoreTracker;
use crate::settings::TunnelSettings;

/// Speed and streak at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    /// Pixels per second
    pub speed: f32,
    pub success_streak: u32,
}

#[derive(Debug, Clone)]
pub struct DifficultyController {
    speed: f32,
    factor: f32,
    threshold: u32,
    min: f32,
    max: f32,
}

impl DifficultyController {
    pub fn new(initial_speed: f32, settings: &TunnelSettings) -> Self {
        let (min, max) = (settings.min_speed, settings.max_speed.max(settings.min_speed));
        let speed = if initial_speed.is_finite() {
            initial_speed.clamp(min, max)
        } else {
            log::warn!("Invalid tunnel speed {}, using {}", initial_speed, min);
            min
        };
        Self {
            speed,
            factor: settings.speed_factor,
            threshold: settings.streak_threshold.max(1),
            min,
            max,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn state(&self, score: &ScoreTracker) -> DifficultyState {
        DifficultyState {
            speed: self.speed,
            success_streak: score.streak(),
        }
    }

    /// Call after a success was recorded. Returns true if the speed went up.
    pub fn on_success(&mut self, score: &mut ScoreTracker) -> bool {
        if score.streak() < self.threshold {
            return false;
        }
        score.reset_streak();
        self.speed_up();
        true
    }

    /// Wrong pick or crash
    pub fn on_error(&mut self, score: &mut ScoreTracker) {
        score.reset_streak();
        self.speed_down();
    }

    pub fn speed_up(&mut self) {
        self.speed = (self.speed * self.factor).clamp(self.min, self.max);
        log::debug!("Speed up to {:.1}", self.speed);
    }

    pub fn speed_down(&mut self) {
        self.speed = (self.speed / self.factor).clamp(self.min, self.max);
        log::debug!("Speed down to {:.1}", self.speed);
    }

    /// Speed in tiles per second
    pub fn scroll_speed_tiles(&self, tile_width: f32) -> f32 {
        self.speed / tile_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(speed: f32) -> DifficultyController {
        DifficultyController::new(speed, &TunnelSettings::default())
    }

    #[test]
    fn test_streak_of_three_speeds_up_once() {
        let mut difficulty = controller(200.0);
        let mut score = ScoreTracker::new();
        let mut ups = 0;
        for _ in 0..3 {
            score.record_success();
            if difficulty.on_success(&mut score) {
                ups += 1;
            }
        }
        assert_eq!(ups, 1);
        assert_eq!(score.streak(), 0);
        assert!((difficulty.speed() - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_second_streak_needs_three_more() {
        let mut difficulty = controller(200.0);
        let mut score = ScoreTracker::new();
        let ups: Vec<bool> = (0..6)
            .map(|_| {
                score.record_success();
                difficulty.on_success(&mut score)
            })
            .collect();
        assert_eq!(ups, vec![false, false, true, false, false, true]);
        assert!((difficulty.speed() - 242.0).abs() < 1e-3);
    }

    #[test]
    fn test_error_resets_streak_and_slows() {
        let mut difficulty = controller(220.0);
        let mut score = ScoreTracker::new();
        score.record_success();
        score.record_success();
        difficulty.on_error(&mut score);
        assert_eq!(difficulty.state(&score).success_streak, 0);
        assert!((difficulty.speed() - 200.0).abs() < 1e-3);

        // Two more successes do not reach the threshold after the reset
        score.record_success();
        score.record_success();
        assert!(!difficulty.on_success(&mut score));
    }

    #[test]
    fn test_speed_clamped() {
        let mut difficulty = controller(790.0);
        difficulty.speed_up();
        assert_eq!(difficulty.speed(), 800.0);

        let mut difficulty = controller(52.0);
        difficulty.speed_down();
        difficulty.speed_down();
        assert_eq!(difficulty.speed(), 50.0);
        assert!(difficulty.speed() > 0.0);

        assert_eq!(controller(f32::NAN).speed(), 50.0);
        assert_eq!(controller(5000.0).speed(), 800.0);
    }

    #[test]
    fn test_tiles_per_second() {
        assert_eq!(controller(200.0).scroll_speed_tiles(100.0), 2.0);
    }
}
