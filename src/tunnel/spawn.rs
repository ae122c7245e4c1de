//! Word spawning
//!
//! Spawns are distance based: after each spawn the next one is placed a
//! jittered distance further along the scroll. Each spawn picks a category
//! (eatable or not) under run-length caps, then a word from that category's
//! pool that differs from the previous word of the same category.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generator::TunnelGenerator;
use crate::host::VocabularyEntry;
use crate::settings::TunnelSettings;

/// Strip syllable markers
pub fn normalize_word(text: &str) -> String {
    text.replace('^', "")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnableWord {
    pub text: String,
    pub eatable: bool,
    pub source_id: u32,
}

impl SpawnableWord {
    pub fn normalized(&self) -> String {
        normalize_word(&self.text)
    }
}

/// The two disjoint word pools of a session
#[derive(Debug, Clone, Default)]
pub struct WordPools {
    pub eatable: Vec<SpawnableWord>,
    pub not_eatable: Vec<SpawnableWord>,
}

impl WordPools {
    /// Split vocabulary entries by their eatable flag; unflagged ones are dropped
    pub fn from_entries(entries: &[VocabularyEntry]) -> Self {
        let mut pools = Self::default();
        for entry in entries {
            let Some(eatable) = entry.eatable else {
                continue;
            };
            let word = SpawnableWord {
                text: entry.text.clone(),
                eatable,
                source_id: entry.id,
            };
            if eatable {
                pools.eatable.push(word);
            } else {
                pools.not_eatable.push(word);
            }
        }
        pools
    }

    pub fn is_empty(&self) -> bool {
        self.eatable.is_empty() && self.not_eatable.is_empty()
    }

    fn pool(&self, eatable: bool) -> &[SpawnableWord] {
        if eatable {
            &self.eatable
        } else {
            &self.not_eatable
        }
    }
}

/// Spawn tuning, taken from `TunnelSettings`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRules {
    pub eatable_chance: f32,
    /// Pixels between spawns
    pub distance: f32,
    pub jitter: f32,
    pub max_eatable_in_a_row: u32,
    pub max_not_eatable_in_a_row: u32,
    /// Pixels behind the window before a word is dropped
    pub garbage_margin: f32,
}

impl SpawnRules {
    pub fn from_settings(settings: &TunnelSettings) -> Self {
        Self {
            eatable_chance: settings.eatable_chance,
            distance: settings.word_spawn_distance,
            jitter: settings.word_spawn_jitter,
            max_eatable_in_a_row: settings.max_eatable_in_a_row,
            max_not_eatable_in_a_row: settings.max_not_eatable_in_a_row,
            garbage_margin: settings.garbage_margin,
        }
    }
}

/// A word currently in the tunnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWord {
    pub id: u32,
    pub word: SpawnableWord,
    pub position: Vec2,
    pub eaten: bool,
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    rules: SpawnRules,
    pools: WordPools,
    rng: Pcg32,
    /// Scroll distance (pixels) the next spawn waits for
    next_spawn_at: f32,
    eatable_run: u32,
    not_eatable_run: u32,
    prev_eatable: Option<String>,
    prev_not_eatable: Option<String>,
    active: Vec<ActiveWord>,
    next_id: u32,
}

impl SpawnScheduler {
    pub fn new(rules: SpawnRules, pools: WordPools, seed: u64) -> Self {
        if pools.is_empty() {
            log::warn!("Both word pools are empty, nothing will spawn");
        }
        Self {
            rules,
            pools,
            rng: Pcg32::seed_from_u64(seed),
            next_spawn_at: 0.0,
            eatable_run: 0,
            not_eatable_run: 0,
            prev_eatable: None,
            prev_not_eatable: None,
            active: Vec::new(),
            next_id: 1,
        }
    }

    pub fn active(&self) -> &[ActiveWord] {
        &self.active
    }

    pub fn next_spawn_at(&self) -> f32 {
        self.next_spawn_at
    }

    /// Current (eatable, not eatable) run lengths
    pub fn runs(&self) -> (u32, u32) {
        (self.eatable_run, self.not_eatable_run)
    }

    #[inline]
    pub fn is_due(&self, scrolled: f32) -> bool {
        scrolled > self.next_spawn_at
    }

    /// Place the next spawn a jittered distance past `scrolled`
    pub fn schedule_next(&mut self, scrolled: f32) {
        let jitter = if self.rules.jitter > 0.0 {
            self.rng.random_range(-self.rules.jitter..=self.rules.jitter)
        } else {
            0.0
        };
        self.next_spawn_at = scrolled + self.rules.distance + self.rules.distance * jitter;
    }

    /// Random draw, overridden by the run caps
    pub fn choose_category(&mut self) -> bool {
        let drawn = self.rng.random::<f32>() < self.rules.eatable_chance;
        if self.eatable_run >= self.rules.max_eatable_in_a_row {
            false
        } else if self.not_eatable_run >= self.rules.max_not_eatable_in_a_row {
            true
        } else {
            drawn
        }
    }

    /// Pick a word of the category, falling back to the other pool if empty
    pub fn choose_word(&mut self, eatable: bool) -> Option<SpawnableWord> {
        let eatable = if self.pools.pool(eatable).is_empty() {
            !eatable
        } else {
            eatable
        };
        let prev = if eatable {
            self.prev_eatable.as_deref()
        } else {
            self.prev_not_eatable.as_deref()
        };
        let pool = self.pools.pool(eatable);
        let index = draw_avoiding(&mut self.rng, pool, prev)?;
        let word = pool[index].clone();

        if eatable {
            self.eatable_run += 1;
            self.not_eatable_run = 0;
            self.prev_eatable = Some(word.normalized());
        } else {
            self.not_eatable_run += 1;
            self.eatable_run = 0;
            self.prev_not_eatable = Some(word.normalized());
        }
        Some(word)
    }

    /// Spawn one word in the leading column of the tunnel
    pub fn spawn(&mut self, tunnel: &TunnelGenerator) -> Option<&ActiveWord> {
        // Run counters only move once a slot is known
        let position = tunnel.free_position_in_column(tunnel.leading_index(), &mut self.rng)?;
        let eatable = self.choose_category();
        let Some(word) = self.choose_word(eatable) else {
            log::warn!("No words to spawn");
            return None;
        };
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("Spawned '{}' (eatable={}) at {}", word.text, word.eatable, position);
        self.active.push(ActiveWord {
            id,
            word,
            position,
            eaten: false,
        });
        self.active.last()
    }

    /// Spawn if the scroll has reached the cursor
    pub fn update(&mut self, scrolled: f32, tunnel: &TunnelGenerator) -> Option<&ActiveWord> {
        if !self.is_due(scrolled) {
            return None;
        }
        self.schedule_next(scrolled);
        self.spawn(tunnel)
    }

    /// Consume a word. Eatable words leave at once; others stay flagged
    /// until they scroll away. Unknown or already eaten ids give None.
    pub fn eat(&mut self, id: u32) -> Option<ActiveWord> {
        let pos = self.active.iter().position(|w| w.id == id && !w.eaten)?;
        if self.active[pos].word.eatable {
            Some(self.active.remove(pos))
        } else {
            self.active[pos].eaten = true;
            Some(self.active[pos].clone())
        }
    }

    /// Drop words that are fully behind `left_edge`; returns their ids
    pub fn collect_garbage(&mut self, left_edge: f32) -> Vec<u32> {
        let limit = left_edge - self.rules.garbage_margin;
        let mut removed = Vec::new();
        self.active.retain(|w| {
            let keep = w.position.x >= limit;
            if !keep {
                removed.push(w.id);
            }
            keep
        });
        removed
    }
}

/// Uniform draw, redrawn while it matches `prev`. Pools with no
/// alternative accept any word.
fn draw_avoiding<R: Rng>(
    rng: &mut R,
    pool: &[SpawnableWord],
    prev: Option<&str>,
) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let Some(prev) = prev else {
        return Some(rng.random_range(0..pool.len()));
    };
    if pool.iter().all(|w| w.normalized() == prev) {
        return Some(rng.random_range(0..pool.len()));
    }
    loop {
        let index = rng.random_range(0..pool.len());
        if pool[index].normalized() != prev {
            return Some(index);
        }
    }
}
