//! Collaborator interfaces the session calls out to
//!
//! Each trait is one narrow capability. `SessionHost` is any type that
//! provides all of them; `RecordingHost` is an in-memory implementation used
//! by the demo runner and the tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::{KeyValueStore, MemoryStore};
use crate::session::SessionReport;

/// Vocabulary query, built from a difficulty level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyFilter {
    pub level: i32,
    /// Include every level below `level` as well
    pub and_below: bool,
    pub only_active: bool,
    /// Syllable block count, -1 for any
    pub block_count: i32,
    /// Letter count, -1 for any
    pub letter_count: i32,
}

/// One vocabulary word as the content database returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: u32,
    /// Display text; `^` marks syllable boundaries
    pub text: String,
    /// None for words that belong to neither pool
    pub eatable: Option<bool>,
}

impl VocabularyEntry {
    pub fn new(id: u32, text: impl Into<String>, eatable: Option<bool>) -> Self {
        Self {
            id,
            text: text.into(),
            eatable,
        }
    }
}

pub trait Vocabulary {
    fn words(&mut self, filter: &VocabularyFilter) -> Vec<VocabularyEntry>;
}

/// Kinds of experience credited per consumed word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditKind {
    Reading,
    UnhintedReading,
}

pub trait Progression {
    fn credit(&mut self, word: &str, kind: CreditKind, amount: f32);
}

pub trait Reporter {
    fn report(&mut self, report: &SessionReport);
}

/// Where the host should go once the session is left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationRequest {
    /// Go back the given number of screens
    Return { steps: u32 },
    /// Move on to the next screen in the path
    Advance,
}

pub trait Navigator {
    fn navigate(&mut self, request: NavigationRequest);
}

/// Everything a session needs from its surroundings
pub trait SessionHost: Vocabulary + Progression + Reporter + Navigator + KeyValueStore {}

impl<T> SessionHost for T where
    T: Vocabulary + Progression + Reporter + Navigator + KeyValueStore
{
}

/// A credited (word, kind, amount) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub word: String,
    pub kind: CreditKind,
    pub amount: f32,
}

/// Host that serves a fixed word list and records every outbound call
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub vocabulary: Vec<VocabularyEntry>,
    pub queries: Vec<VocabularyFilter>,
    pub credits: Vec<Credit>,
    pub reports: Vec<SessionReport>,
    pub navigations: Vec<NavigationRequest>,
    pub store: MemoryStore,
}

impl RecordingHost {
    pub fn new(vocabulary: Vec<VocabularyEntry>) -> Self {
        Self {
            vocabulary,
            ..Default::default()
        }
    }

    /// Build a vocabulary from two word lists
    pub fn with_words(eatable: &[&str], not_eatable: &[&str]) -> Self {
        let mut entries = Vec::with_capacity(eatable.len() + not_eatable.len());
        for (i, w) in eatable.iter().enumerate() {
            entries.push(VocabularyEntry::new(i as u32, *w, Some(true)));
        }
        let offset = eatable.len() as u32;
        for (i, w) in not_eatable.iter().enumerate() {
            entries.push(VocabularyEntry::new(offset + i as u32, *w, Some(false)));
        }
        Self::new(entries)
    }
}

impl Vocabulary for RecordingHost {
    fn words(&mut self, filter: &VocabularyFilter) -> Vec<VocabularyEntry> {
        self.queries.push(filter.clone());
        self.vocabulary.clone()
    }
}

impl Progression for RecordingHost {
    fn credit(&mut self, word: &str, kind: CreditKind, amount: f32) {
        self.credits.push(Credit {
            word: word.to_string(),
            kind,
            amount,
        });
    }
}

impl Reporter for RecordingHost {
    fn report(&mut self, report: &SessionReport) {
        self.reports.push(report.clone());
    }
}

impl Navigator for RecordingHost {
    fn navigate(&mut self, request: NavigationRequest) {
        self.navigations.push(request);
    }
}

impl KeyValueStore for RecordingHost {
    fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.store.set(key, value);
    }
}
