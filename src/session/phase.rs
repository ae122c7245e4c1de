//! Session phases and the transition graph
//!
//! Phases carry a bit weight so range checks ("between Ready and InProgress")
//! compare ordinals, the same way the interaction layer masks input by phase.

use serde::{Deserialize, Serialize};

/// Current phase of a mini-game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionPhase {
    /// Content created, nothing started
    Inited = 1,
    /// Intro sequence (voice-over, player spawn)
    Intro = 2,
    /// About to start the clock
    Ready = 4,
    /// Active gameplay
    InProgress = 8,
    /// Gameplay suspended (crash recovery, menus)
    Paused = 16,
    /// Time limit reached
    TimedOut = 32,
    /// Completion predicate met, result being produced
    Completing = 64,
    /// Session over, waiting for the host to leave
    Finished = 128,
}

impl SessionPhase {
    /// Bit weight of the phase, used for masks and range checks
    #[inline]
    pub fn weight(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Inited => "Inited",
            SessionPhase::Intro => "Intro",
            SessionPhase::Ready => "Ready",
            SessionPhase::InProgress => "InProgress",
            SessionPhase::Paused => "Paused",
            SessionPhase::TimedOut => "TimedOut",
            SessionPhase::Completing => "Completing",
            SessionPhase::Finished => "Finished",
        }
    }

    /// Whether `to` is an edge of the transition graph starting at `self`
    pub fn can_enter(self, to: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, to),
            (Inited, Intro)
                | (Intro, Ready)
                | (Ready, InProgress)
                | (InProgress, Paused)
                | (Paused, InProgress)
                | (InProgress, TimedOut)
                | (InProgress, Completing)
                | (TimedOut, Completing)
                | (Completing, Finished)
        )
    }

    /// Combined mask of several phases
    pub fn mask(phases: &[SessionPhase]) -> u8 {
        phases.iter().fold(0u8, |mask, p| mask | p.weight())
    }
}

/// Owns the single active phase; transitions are the only way to change it
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    current: SessionPhase,
    transitions: u32,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self {
            current: SessionPhase::Inited,
            transitions: 0,
        }
    }

    pub fn current(&self) -> SessionPhase {
        self.current
    }

    /// Number of successful transitions since the last reset
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Move to `phase` if the graph allows it.
    ///
    /// Returns false (and leaves the phase untouched) for an unreachable target.
    pub fn enter(&mut self, phase: SessionPhase) -> bool {
        if !self.current.can_enter(phase) {
            log::debug!(
                "Ignoring transition {} -> {}",
                self.current.as_str(),
                phase.as_str()
            );
            return false;
        }
        self.current = phase;
        self.transitions += 1;
        true
    }

    /// Forced return to `Inited`, outside the graph
    pub fn reset(&mut self) {
        self.current = SessionPhase::Inited;
        self.transitions = 0;
    }

    #[inline]
    pub fn is(&self, phase: SessionPhase) -> bool {
        self.current == phase
    }

    /// Inclusive ordinal range check
    #[inline]
    pub fn in_range(&self, lo: SessionPhase, hi: SessionPhase) -> bool {
        lo <= self.current && self.current <= hi
    }

    /// Whether the current phase is part of `mask`
    #[inline]
    pub fn matches_mask(&self, mask: u8) -> bool {
        mask & self.current.weight() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut sm = GameStateMachine::new();
        for phase in [
            SessionPhase::Intro,
            SessionPhase::Ready,
            SessionPhase::InProgress,
            SessionPhase::Paused,
            SessionPhase::InProgress,
            SessionPhase::Completing,
            SessionPhase::Finished,
        ] {
            assert!(sm.enter(phase), "failed to enter {:?}", phase);
        }
        assert!(sm.is(SessionPhase::Finished));
        assert_eq!(sm.transitions(), 7);
    }

    #[test]
    fn test_unreachable_is_noop() {
        let mut sm = GameStateMachine::new();
        assert!(!sm.enter(SessionPhase::InProgress));
        assert!(sm.is(SessionPhase::Inited));
        assert!(!sm.enter(SessionPhase::Finished));
        assert_eq!(sm.transitions(), 0);
    }

    #[test]
    fn test_timeout_path() {
        let mut sm = GameStateMachine::new();
        sm.enter(SessionPhase::Intro);
        sm.enter(SessionPhase::Ready);
        sm.enter(SessionPhase::InProgress);
        assert!(sm.enter(SessionPhase::TimedOut));
        assert!(!sm.enter(SessionPhase::Paused));
        assert!(sm.enter(SessionPhase::Completing));
    }

    #[test]
    fn test_range_and_mask() {
        let mut sm = GameStateMachine::new();
        sm.enter(SessionPhase::Intro);
        sm.enter(SessionPhase::Ready);
        assert!(sm.in_range(SessionPhase::Ready, SessionPhase::InProgress));
        sm.enter(SessionPhase::InProgress);
        sm.enter(SessionPhase::Paused);
        assert!(!sm.in_range(SessionPhase::Ready, SessionPhase::InProgress));

        let not_paused = 255 - SessionPhase::Paused.weight();
        assert!(!sm.matches_mask(not_paused));
        assert_eq!(
            SessionPhase::mask(&[SessionPhase::Ready, SessionPhase::InProgress]),
            12
        );
    }

    #[test]
    fn test_reset_from_anywhere() {
        let mut sm = GameStateMachine::new();
        sm.enter(SessionPhase::Intro);
        sm.reset();
        assert!(sm.is(SessionPhase::Inited));
        assert!(sm.enter(SessionPhase::Intro));
    }
}
