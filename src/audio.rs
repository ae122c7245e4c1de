//! Sound cues raised by the session
//!
//! The core never plays audio itself. It emits `SessionEvent::Sound` and the
//! host hands each cue to its player, using `AudioMixer` for volumes.

use serde::{Deserialize, Serialize};

/// Mixer bus a cue is played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCategory {
    Voice,
    Music,
    Effect,
}

/// Sound cue types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Greeting voice-over at session start
    Intro,
    /// How-to-play voice-over
    Manual,
    /// Correct word eaten
    Eatable,
    /// Wrong word eaten
    NotEatable,
    /// Pronunciation of a word
    Word(String),
    /// Session completed
    EndGame,
    /// Start the mini-game music loop
    MusicStart,
    /// Stop the mini-game music loop
    MusicStop,
    /// UI button click
    Click,
}

impl SoundCue {
    pub fn category(&self) -> SoundCategory {
        match self {
            SoundCue::Intro
            | SoundCue::Manual
            | SoundCue::Eatable
            | SoundCue::NotEatable
            | SoundCue::Word(_)
            | SoundCue::EndGame => SoundCategory::Voice,
            SoundCue::MusicStart | SoundCue::MusicStop => SoundCategory::Music,
            SoundCue::Click => SoundCategory::Effect,
        }
    }
}

/// Volume settings for the host's audio player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMixer {
    master_volume: f32,
    voice_volume: f32,
    music_volume: f32,
    effect_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioMixer {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            voice_volume: 1.0,
            music_volume: 0.7,
            effect_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set a category volume (0.0 - 1.0)
    pub fn set_volume(&mut self, category: SoundCategory, vol: f32) {
        let vol = vol.clamp(0.0, 1.0);
        match category {
            SoundCategory::Voice => self.voice_volume = vol,
            SoundCategory::Music => self.music_volume = vol,
            SoundCategory::Effect => self.effect_volume = vol,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn effective_volume(&self, category: SoundCategory) -> f32 {
        if self.muted {
            return 0.0;
        }
        let bus = match category {
            SoundCategory::Voice => self.voice_volume,
            SoundCategory::Music => self.music_volume,
            SoundCategory::Effect => self.effect_volume,
        };
        self.master_volume * bus
    }

    /// Volume to play `cue` at, or None if it would be silent
    pub fn volume_for(&self, cue: &SoundCue) -> Option<f32> {
        let vol = self.effective_volume(cue.category());
        (vol > 0.0).then_some(vol)
    }
}
