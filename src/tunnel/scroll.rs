//! Tunnel scroll position and velocity, in tiles

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scroll {
    /// Tiles scrolled since the session started
    pub offset: f64,
    /// Tiles per second
    pub velocity: f64,
}

impl Scroll {
    /// Move velocity toward `target` by at most `rate * dt`, then integrate
    pub fn step(&mut self, target: f64, rate: f64, dt: f64) {
        let max_delta = rate * dt;
        let delta = (target - self.velocity).clamp(-max_delta, max_delta);
        self.velocity += delta;
        self.offset += self.velocity * dt;
    }

    /// Whole column the window is centered on
    pub fn column(&self) -> i32 {
        self.offset.floor() as i32
    }

    pub fn scrolled_px(&self, tile_width: f32) -> f32 {
        (self.offset * tile_width as f64) as f32
    }

    pub fn stop(&mut self) {
        self.velocity = 0.0;
    }
}
