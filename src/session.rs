use std::time::SystemTime;

use crate::difficulty::Difficulty;
use crate::metrics::{CharStatus, Metrics, SessionSnapshot};
use crate::word_source::{join_words, WordSource, WordSourceError};

/// One typing attempt against a reference text.
#[derive(Debug, Clone, Default)]
pub struct TypingSession {
    reference: Vec<char>,
    typed: Vec<char>,
    started_at: Option<SystemTime>,
    difficulty: Difficulty,
    metrics: Metrics,
}

impl TypingSession {
    pub fn new(reference: &str, difficulty: Difficulty) -> Self {
        Self {
            reference: reference.chars().collect(),
            difficulty,
            ..Self::default()
        }
    }

    pub fn from_words<S: AsRef<str>>(words: &[S], difficulty: Difficulty) -> Self {
        Self::new(&join_words(words), difficulty)
    }

    /// Appends `c` unless there is no text or it is already fully typed.
    /// Returns whether the character was accepted.
    pub fn accept_character(&mut self, c: char) -> bool {
        self.accept_character_at(c, SystemTime::now())
    }

    pub fn accept_character_at(&mut self, c: char, now: SystemTime) -> bool {
        if self.reference.is_empty() || self.typed.len() >= self.reference.len() {
            return false;
        }

        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.typed.push(c);
        self.refresh_metrics(now);
        true
    }

    pub fn delete_last_character(&mut self) {
        self.delete_last_character_at(SystemTime::now())
    }

    pub fn delete_last_character_at(&mut self, now: SystemTime) {
        if self.typed.pop().is_some() {
            self.refresh_metrics(now);
        }
    }

    pub fn reset(&mut self) {
        self.typed.clear();
        self.started_at = None;
        self.metrics = Metrics::INITIAL;
    }

    /// Fetches new text for `difficulty`. On failure nothing changes.
    pub fn set_difficulty(
        &mut self,
        difficulty: Difficulty,
        source: &dyn WordSource,
    ) -> Result<(), WordSourceError> {
        let words = source.fetch_words(difficulty)?;
        self.load_text(difficulty, &words);
        Ok(())
    }

    /// Replaces the reference text and starts a fresh attempt.
    pub fn load_text<S: AsRef<str>>(&mut self, difficulty: Difficulty, words: &[S]) {
        self.reference = join_words(words).chars().collect();
        self.difficulty = difficulty;
        self.reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            reference: &self.reference,
            typed: &self.typed,
            started_at: self.started_at,
        }
    }

    pub fn compute_metrics(&self, now: SystemTime) -> Metrics {
        self.snapshot().metrics_at(now)
    }

    /// Metrics as of the last mutation.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn character_status(&self, idx: usize) -> CharStatus {
        self.snapshot().character_status(idx)
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn has_text(&self) -> bool {
        !self.reference.is_empty()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_text() && self.typed.len() == self.reference.len()
    }

    fn refresh_metrics(&mut self, now: SystemTime) {
        self.metrics = self.compute_metrics(now);
    }
}
