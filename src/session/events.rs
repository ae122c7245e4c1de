//! Outbound events for the presentation, audio and interaction layers
//!
//! Queued during a call into the session and drained by the host afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::phase::SessionPhase;
use crate::audio::SoundCue;

/// Something the presentation layer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Player,
    Word(u32),
    RewardSlot(usize),
}

/// Visual transition request; timing curves belong to the presenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentCommand {
    Spawn { entity: Entity, at: Vec2, duration: f32 },
    Hide { entity: Entity, duration: f32 },
    MoveTo { entity: Entity, to: Vec2, duration: f32 },
    Fade { entity: Entity, alpha: f32, duration: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    Crash { at: Vec2 },
    Celebrate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Published on every phase transition (input gating hangs off this)
    PhaseChanged(SessionPhase),
    Sound(SoundCue),
    Present(PresentCommand),
    Effect(EffectKind),
    TimerVisible(bool),
    CloseButtonShown,
    ExperienceGainShown,
}
