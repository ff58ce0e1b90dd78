pub mod gemini;
pub mod local;

pub use gemini::{GeminiConfig, GeminiWordSource};
pub use local::LocalWordSource;

use crate::difficulty::Difficulty;

/// Errors that make a reference text unavailable.
#[derive(Debug, thiserror::Error)]
pub enum WordSourceError {
    #[error("no API key configured for the word source")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("word source answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("word source did not answer within {0:?}")]
    TimedOut(std::time::Duration),

    #[error("word list unavailable: {0}")]
    WordList(String),
}

/// Produces the words that make up a reference text.
///
/// An `Ok` with an empty vector is a valid (if useless) answer and is kept
/// distinct from a failure.
pub trait WordSource: Send + Sync {
    fn fetch_words(&self, difficulty: Difficulty) -> Result<Vec<String>, WordSourceError>;
}

/// Joins words with single spaces into the text the user types.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref())
        .filter(|w| !w.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}
