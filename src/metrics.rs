use std::time::SystemTime;

/// Standard approximation: one word is five characters, spaces included.
pub const CHARS_PER_WORD: f64 = 5.0;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub wpm: u32,
    pub accuracy: u32,
}

impl Metrics {
    pub const INITIAL: Metrics = Metrics {
        wpm: 0,
        accuracy: 100,
    };
}

impl Default for Metrics {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Display status of a single reference character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

/// Borrowed view of everything the metrics are derived from.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub reference: &'a [char],
    pub typed: &'a [char],
    pub started_at: Option<SystemTime>,
}

impl SessionSnapshot<'_> {
    pub fn correct_count(&self) -> usize {
        self.typed
            .iter()
            .zip(self.reference.iter())
            .filter(|(typed, expected)| typed == expected)
            .count()
    }

    /// Recomputes wpm and accuracy from scratch as of `now`.
    pub fn metrics_at(&self, now: SystemTime) -> Metrics {
        let started_at = match self.started_at {
            Some(t) if !self.typed.is_empty() => t,
            _ => return Metrics::INITIAL,
        };

        let typed_len = self.typed.len() as f64;

        Metrics {
            wpm: words_per_minute(typed_len, started_at, now),
            accuracy: ((self.correct_count() as f64 / typed_len) * 100.0).round() as u32,
        }
    }

    pub fn character_status(&self, idx: usize) -> CharStatus {
        match idx.cmp(&self.typed.len()) {
            std::cmp::Ordering::Less => {
                if self.reference.get(idx) == Some(&self.typed[idx]) {
                    CharStatus::Correct
                } else {
                    CharStatus::Incorrect
                }
            }
            std::cmp::Ordering::Equal => CharStatus::Cursor,
            std::cmp::Ordering::Greater => CharStatus::Pending,
        }
    }
}

fn words_per_minute(typed_len: f64, started_at: SystemTime, now: SystemTime) -> u32 {
    // a clock that went backwards counts as no time elapsed
    let elapsed_ms = match now.duration_since(started_at) {
        Ok(d) => d.as_millis() as f64,
        Err(_) => return 0,
    };

    let elapsed_minutes = elapsed_ms / MILLIS_PER_MINUTE;
    if elapsed_minutes <= 0.0 {
        return 0;
    }

    let wpm = (typed_len / CHARS_PER_WORD) / elapsed_minutes;
    if wpm.is_finite() && wpm > 0.0 {
        wpm.round() as u32
    } else {
        0
    }
}
