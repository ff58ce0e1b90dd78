// Library surface for headless/integration tests and reuse.
// Terminal setup and CLI parsing stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod loader;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod word_source;

pub use app::{App, TextStatus};
pub use difficulty::{Difficulty, DifficultyError};
pub use metrics::{CharStatus, Metrics};
pub use session::TypingSession;
pub use word_source::{WordSource, WordSourceError};
