//! Session clock and countdown timer
//!
//! All times are seconds. The clock only moves when the host ticks it, so a
//! session replays identically for the same tick sequence.

use serde::{Deserialize, Serialize};

/// Game time source with pause bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClock {
    now: f64,
    paused_total: f64,
    pause_started: Option<f64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance wall time by `dt` (negative steps are ignored)
    pub fn advance(&mut self, dt: f64) {
        if dt > 0.0 {
            self.now += dt;
        }
    }

    /// Wall time since the clock was created
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started.is_some()
    }

    /// Begin a pause window. A second call while paused keeps the first start.
    pub fn pause(&mut self) {
        if self.pause_started.is_none() {
            self.pause_started = Some(self.now);
        }
    }

    /// Close the pause window, accumulating its length
    pub fn resume(&mut self) {
        if let Some(start) = self.pause_started.take() {
            self.paused_total += (self.now - start).max(0.0);
        }
    }

    /// Total time spent paused, including an open pause window
    pub fn paused_total(&self) -> f64 {
        let ongoing = self
            .pause_started
            .map(|start| (self.now - start).max(0.0))
            .unwrap_or(0.0);
        self.paused_total + ongoing
    }

    /// Wall time with every pause window removed
    #[inline]
    pub fn active_time(&self) -> f64 {
        self.now - self.paused_total()
    }

    /// Forget pause history (called when a new session starts its clock)
    pub fn clear_pauses(&mut self) {
        self.paused_total = 0.0;
        self.pause_started = None;
    }
}

/// Timer state; `Idle` and `Expired` replace the "not running" / "expired" sentinels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        start: f64,
    },
    /// Display held at a fixed elapsed value; never times out
    Frozen {
        elapsed: f64,
    },
    Expired,
}

/// Countdown over active (pause-free) time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timer {
    pub state: TimerState,
    /// Negative limit means untimed
    pub limit: f64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(-1.0)
    }
}

impl Timer {
    pub fn new(limit: f64) -> Self {
        Self {
            state: TimerState::Idle,
            limit,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.limit > 0.0
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Start counting from `now`; a negative limit leaves the timer idle
    pub fn start(&mut self, now: f64) {
        if self.limit >= 0.0 {
            self.state = TimerState::Running { start: now };
        }
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Idle;
    }

    pub fn expire(&mut self) {
        self.state = TimerState::Expired;
    }

    /// Hold the current reading
    pub fn freeze(&mut self, now: f64) {
        if let TimerState::Running { start } = self.state {
            self.state = TimerState::Frozen {
                elapsed: (now - start).max(0.0),
            };
        }
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        match self.state {
            TimerState::Idle => 0.0,
            TimerState::Running { start } => (now - start).max(0.0),
            TimerState::Frozen { elapsed } => elapsed,
            TimerState::Expired => self.limit.max(0.0),
        }
    }

    pub fn remaining(&self, now: f64) -> f64 {
        match self.state {
            TimerState::Expired => 0.0,
            TimerState::Idle => self.limit.max(0.0),
            _ => (self.limit - self.elapsed(now)).max(0.0),
        }
    }

    /// Fraction of time left in [0, 1]
    pub fn relative(&self, now: f64) -> f64 {
        match self.state {
            TimerState::Idle => 1.0,
            TimerState::Expired => 0.0,
            _ if self.limit <= 0.0 => 1.0,
            _ => (1.0 - self.elapsed(now) / self.limit).clamp(0.0, 1.0),
        }
    }

    /// True once per run, when a timed timer has run out
    pub fn should_time_out(&self, now: f64) -> bool {
        self.is_timed() && self.is_running() && self.remaining(now) <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_timer_sentinels() {
        let mut timer = Timer::new(30.0);
        assert_eq!(timer.relative(0.0), 1.0);
        assert_eq!(timer.remaining(0.0), 30.0);

        timer.start(0.0);
        assert!((timer.relative(15.0) - 0.5).abs() < 1e-9);
        assert_eq!(timer.remaining(40.0), 0.0);

        timer.expire();
        assert_eq!(timer.relative(5.0), 0.0);
        assert_eq!(timer.remaining(5.0), 0.0);
        assert!(!timer.should_time_out(100.0));
    }

    #[test]
    fn test_untimed_never_times_out() {
        let mut timer = Timer::new(-1.0);
        timer.start(0.0);
        assert!(!timer.is_running());
        assert!(!timer.should_time_out(1_000.0));
    }

    #[test]
    fn test_zero_limit_never_times_out() {
        let mut timer = Timer::new(0.0);
        timer.start(0.0);
        assert!(timer.is_running());
        assert!(!timer.should_time_out(10.0));
    }

    #[test]
    fn test_freeze_holds_reading() {
        let mut timer = Timer::new(30.0);
        timer.start(0.0);
        timer.freeze(10.0);
        assert_eq!(timer.remaining(25.0), 20.0);
        assert!(!timer.should_time_out(100.0));
    }

    #[test]
    fn test_clock_pause_accumulates() {
        let mut clock = SessionClock::new();
        clock.advance(5.0);
        clock.pause();
        clock.advance(2.0);
        assert_eq!(clock.active_time(), 5.0);
        clock.resume();
        clock.advance(1.0);
        clock.pause();
        clock.advance(3.0);
        clock.resume();
        assert_eq!(clock.paused_total(), 5.0);
        assert_eq!(clock.active_time(), 6.0);
    }

    proptest! {
        #[test]
        fn prop_pause_window_excluded(
            before in 0.0f64..100.0,
            pause in 0.0f64..100.0,
            after in 0.0f64..100.0,
        ) {
            let mut clock = SessionClock::new();
            clock.advance(before);
            clock.pause();
            clock.advance(pause);
            clock.resume();
            clock.advance(after);
            prop_assert!((clock.active_time() - (before + after)).abs() < 1e-6);
        }
    }
}
