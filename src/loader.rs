use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::difficulty::Difficulty;
use crate::word_source::{WordSource, WordSourceError};

/// Outcome of the most recent text request.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        difficulty: Difficulty,
        words: Vec<String>,
    },
    Failed {
        difficulty: Difficulty,
        error: WordSourceError,
    },
}

struct Response {
    generation: u64,
    difficulty: Difficulty,
    result: Result<Vec<String>, WordSourceError>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u64,
    difficulty: Difficulty,
    sent_at: Instant,
}

/// Runs word source calls off the event loop.
///
/// Each request gets a new generation; only the answer to the latest one is
/// ever surfaced. Older answers, and answers that arrive after the timeout,
/// are dropped.
pub struct TextLoader {
    source: Arc<dyn WordSource>,
    timeout: Duration,
    tx: Sender<Response>,
    rx: Receiver<Response>,
    generation: u64,
    pending: Option<Pending>,
}

impl TextLoader {
    pub fn new(source: Arc<dyn WordSource>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            timeout,
            tx,
            rx,
            generation: 0,
            pending: None,
        }
    }

    /// Starts a request, superseding any request still in flight.
    pub fn request(&mut self, difficulty: Difficulty) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(stale) = self.pending {
            debug!(
                stale = stale.generation,
                generation, "superseding in-flight text request"
            );
        }
        self.pending = Some(Pending {
            generation,
            difficulty,
            sent_at: Instant::now(),
        });

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch_words(difficulty);
            // receiver gone means the loader was dropped
            let _ = tx.send(Response {
                generation,
                difficulty,
                result,
            });
        });

        info!(%difficulty, generation, "requested text");
        generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_difficulty(&self) -> Option<Difficulty> {
        self.pending.map(|p| p.difficulty)
    }

    /// Non-blocking. Returns the outcome of the current request once known.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(response) => {
                    if let Some(event) = self.accept(response) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        self.check_timeout(Instant::now())
    }

    /// Blocks up to `wait` for the current request to resolve.
    pub fn wait(&mut self, wait: Duration) -> Option<LoadEvent> {
        let deadline = Instant::now() + wait;
        while self.pending.is_some() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(response) => {
                    if let Some(event) = self.accept(response) {
                        return Some(event);
                    }
                }
                Err(_) => break,
            }
        }
        self.check_timeout(Instant::now())
    }

    fn accept(&mut self, response: Response) -> Option<LoadEvent> {
        match self.pending {
            Some(p) if p.generation == response.generation => {
                self.pending = None;
                Some(match response.result {
                    Ok(words) => {
                        info!(
                            difficulty = %response.difficulty,
                            words = words.len(),
                            "text loaded"
                        );
                        LoadEvent::Loaded {
                            difficulty: response.difficulty,
                            words,
                        }
                    }
                    Err(error) => {
                        warn!(difficulty = %response.difficulty, %error, "text unavailable");
                        LoadEvent::Failed {
                            difficulty: response.difficulty,
                            error,
                        }
                    }
                })
            }
            _ => {
                debug!(
                    generation = response.generation,
                    current = self.generation,
                    "dropping stale text response"
                );
                None
            }
        }
    }

    fn check_timeout(&mut self, now: Instant) -> Option<LoadEvent> {
        let pending = self.pending?;
        if now.duration_since(pending.sent_at) < self.timeout {
            return None;
        }

        // retire the generation so a late answer is ignored
        self.pending = None;
        warn!(
            difficulty = %pending.difficulty,
            timeout = ?self.timeout,
            "text request timed out"
        );
        Some(LoadEvent::Failed {
            difficulty: pending.difficulty,
            error: WordSourceError::TimedOut(self.timeout),
        })
    }
}
